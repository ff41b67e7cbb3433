//! End-to-end session flows over a mocked backend: the real HTTP transport,
//! the real controller, scripted responses.

use scrybe::api::HttpStoryApi;
use scrybe::capture::Recorder;
use scrybe::error::CaptureError;
use scrybe::publish::PublishOutcome;
use scrybe::session::{SessionController, TurnOutcome, TurnRole};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct SilentRecorder;

impl Recorder for SilentRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<u8>, CaptureError> {
        // A useless but well-formed payload; the mock transcriber ignores it.
        Ok(vec![0u8; 64])
    }
}

fn controller(server: &MockServer) -> SessionController {
    let api = Arc::new(HttpStoryApi::new(
        &server.uri(),
        Some("session-token"),
        &format!("{}/models/whisper", server.uri()),
        Some("hf-token"),
        10,
    ));
    SessionController::new(api, Box::new(SilentRecorder), "Orion", "Mystery")
        .with_reveal_pacing(Duration::from_millis(1), Duration::from_micros(200))
}

fn directive_json(action: &str, story_text: &str, chat: &str, chapter: Option<&str>) -> String {
    match chapter {
        Some(title) => format!(
            r#"{{"action":"{action}","story_text":"{story_text}","chat_response":"{chat}","new_chapter_title":"{title}"}}"#
        ),
        None => format!(
            r#"{{"action":"{action}","story_text":"{story_text}","chat_response":"{chat}"}}"#
        ),
    }
}

#[tokio::test]
async fn append_turns_accumulate_in_arrival_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("APPEND", "The fog rolled in. ", "Nice start!", None),
            "application/json",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("APPEND", "A door creaked open.", "Ooh, tension.", None),
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);

    let outcome = ctl.submit_turn("begin a mystery").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Applied { revealing: true, .. }));
    ctl.wait_for_reveal().await;

    ctl.submit_turn("keep going").await.unwrap();
    ctl.wait_for_reveal().await;

    let state = ctl.snapshot().await;
    assert_eq!(state.story_text(), "The fog rolled in. A door creaked open.");
    assert!(!state.is_pending());
    assert!(state.chapters().is_empty());
}

#[tokio::test]
async fn replace_directive_rewrites_story_and_registers_chapter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json(
                "APPEND",
                "He knocked twice.",
                "Setting the scene.",
                Some("The Arrival"),
            ),
            "application/json",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("REPLACE", "Chapter rewritten.", "Fixed it.", Some("Chapter 2")),
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.submit_turn("start chapter one").await.unwrap();
    ctl.wait_for_reveal().await;
    ctl.submit_turn("rewrite that").await.unwrap();

    let state = ctl.snapshot().await;
    assert_eq!(state.story_text(), "Chapter rewritten.");

    let numbers: Vec<u32> = state.chapters().iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(state.chapters()[1].title, "Chapter 2");

    // Marker lands immediately before the AI's entry for the same turn.
    let tail: Vec<(TurnRole, &str)> = state
        .transcript()
        .iter()
        .rev()
        .take(2)
        .map(|e| (e.role, e.text.as_str()))
        .collect();
    assert_eq!(tail[0], (TurnRole::Ai, "Fixed it."));
    assert_eq!(tail[1], (TurnRole::ChapterMarker, "Chapter 2"));
}

#[tokio::test]
async fn continuation_gate_rejects_second_turn_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    directive_json("CHAT", "", "patience", None),
                    "application/json",
                )
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&server)
        .await;

    let ctl = Arc::new(controller(&server));
    let first = {
        let ctl = Arc::clone(&ctl);
        tokio::spawn(async move { ctl.submit_turn("one").await })
    };

    while !ctl.is_pending().await {
        tokio::task::yield_now().await;
    }
    assert!(ctl.submit_turn("two").await.is_err());

    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, TurnOutcome::Applied { .. }));
    assert!(!ctl.is_pending().await);
}

#[tokio::test]
async fn backend_failure_recovers_with_system_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("CHAT", "", "back online", None),
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);

    let outcome = ctl.submit_turn("anyone there?").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));

    let state = ctl.snapshot().await;
    assert!(!state.is_pending());
    assert_eq!(state.transcript().last().unwrap().role, TurnRole::System);

    // Immediately retryable after the failure.
    let outcome = ctl.submit_turn("trying again").await.unwrap();
    match outcome {
        TurnOutcome::Applied { chat_response, .. } => assert_eq!(chat_response, "back online"),
        other => panic!("expected applied turn, got {other:?}"),
    }
}

#[tokio::test]
async fn voice_turn_transcribes_then_continues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/whisper"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"text":"and then she vanished"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .and(body_partial_json(serde_json::json!({
            "user_input": "and then she vanished"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("APPEND", "Gone without a sound.", "Chilling.", None),
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.begin_recording().await.unwrap();
    let outcome = ctl.finish_recording().await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Applied { .. }));

    ctl.wait_for_reveal().await;
    let state = ctl.snapshot().await;
    assert_eq!(state.transcript()[0].text, "and then she vanished");
    assert_eq!(state.story_text(), "Gone without a sound.");
}

#[tokio::test]
async fn failed_transcription_creates_no_turn_and_no_continuation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/whisper"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.begin_recording().await.unwrap();
    let err = ctl.finish_recording().await.unwrap_err();
    assert!(err.to_string().contains("transcription upload failed"));

    let state = ctl.snapshot().await;
    assert!(state.transcript().is_empty());
    assert!(!state.is_pending());

    // No continue_story call was issued.
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| r.url.path() != "/api/continue_story")
    );
}

#[tokio::test]
async fn partial_publish_reports_saved_story_and_cover_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/continue_story"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            directive_json("APPEND", "The whole tale.", "Done!", None),
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stories"))
        .and(body_partial_json(serde_json::json!({
            "title": "My New Story",
            "chapters": [{"chapter_number": 1, "title": "Chapter 1", "content": "The whole tale."}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":42,"title":"My New Story","genre":"Mystery","ai_name":"Orion","chapters":[]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stories/42/generate_cover"))
        .respond_with(ResponseTemplate::new(504).set_body_string("image model timeout"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stories/42/generate_cover"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":42,"title":"My New Story","genre":"Mystery","ai_name":"Orion","cover_image_url":"http://covers/cover_42.png","chapters":[]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.submit_turn("write it all").await.unwrap();
    ctl.wait_for_reveal().await;

    let outcome = ctl.publish("My New Story").await.unwrap();
    let story_id = match &outcome {
        PublishOutcome::PartialPublish { story, .. } => story.id,
        other => panic!("expected partial publish, got {other:?}"),
    };
    assert_eq!(story_id, 42);

    let retried = ctl.retry_cover(story_id).await.unwrap();
    assert_eq!(
        retried.cover_image_url.as_deref(),
        Some("http://covers/cover_42.png")
    );
}

#[tokio::test]
async fn publishing_an_empty_session_is_rejected_locally() {
    let server = MockServer::start().await;
    let ctl = controller(&server);

    let err = ctl.publish("Untitled").await.unwrap_err();
    assert!(err.to_string().contains("empty story"));

    // Nothing hit the backend.
    assert!(server.received_requests().await.unwrap().is_empty());
}
