//! Session-level ordering: one continuation in flight, stale responses
//! dropped, every failure recovered into a state the user can retry from.

use super::reveal::RevealScheduler;
use super::state::SessionState;
use super::turn::{Effect, apply_directive};
use crate::api::{ContinueStoryRequest, DirectiveAction, Story, StoryApi};
use crate::capture::{Recorder, TranscriptionPipeline};
use crate::error::{CaptureError, ScrybeError, SessionError};
use crate::publish::{PublishOutcome, PublishPipeline};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// What a submitted turn amounted to, once resolved.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The directive was applied. `revealing` is true when new story text
    /// is still being disclosed by the scheduler.
    Applied {
        chat_response: String,
        revealing: bool,
    },
    /// The continuation call failed; a system notice was added to the
    /// transcript and the session is ready for a retry.
    Failed { notice: String },
    /// The response arrived after the session moved on and was dropped.
    Discarded,
}

pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    reveal: Mutex<RevealScheduler>,
    capture: Mutex<TranscriptionPipeline>,
    publisher: PublishPipeline,
    api: Arc<dyn StoryApi>,
    /// Bumped when the session is abandoned; responses carrying an older
    /// generation are discarded instead of applied to stale state.
    generation: AtomicU64,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn StoryApi>,
        recorder: Box<dyn Recorder>,
        ai_name: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::new(ai_name, genre)));
        Self {
            reveal: Mutex::new(RevealScheduler::new(Arc::clone(&state))),
            capture: Mutex::new(TranscriptionPipeline::new(recorder, Arc::clone(&api))),
            publisher: PublishPipeline::new(Arc::clone(&api)),
            state,
            api,
            generation: AtomicU64::new(0),
        }
    }

    /// Overrides the reveal pacing (tests and slow terminals).
    pub fn with_reveal_pacing(mut self, initial_delay: Duration, tick: Duration) -> Self {
        self.reveal = Mutex::new(RevealScheduler::with_pacing(
            Arc::clone(&self.state),
            initial_delay,
            tick,
        ));
        self
    }

    /// A point-in-time copy of the session for rendering.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.is_pending()
    }

    pub async fn is_revealing(&self) -> bool {
        self.reveal.lock().await.is_running()
    }

    /// Blocks until an active reveal has written its whole payload.
    pub async fn wait_for_reveal(&self) {
        self.reveal.lock().await.wait_idle().await;
    }

    /// Seeds the transcript with the session's opening line.
    pub async fn seed_opening(&self) {
        let mut state = self.state.lock().await;
        let opening = format!("The {} story begins...", state.genre());
        state.push_ai(opening);
    }

    /// Submits one user turn: transcript append, continuation round trip,
    /// directive application, optional reveal kick-off.
    ///
    /// Single-flight: while a continuation is pending, further submissions
    /// are rejected with [`SessionError::TurnPending`] rather than queued.
    pub async fn submit_turn(&self, input: &str) -> Result<TurnOutcome, SessionError> {
        {
            let mut state = self.state.lock().await;
            if state.is_pending() {
                return Err(SessionError::TurnPending);
            }
            state.set_pending(true);
        }

        // A still-running reveal finishes before this turn reads the canvas,
        // so no appended payload is ever truncated by its successor.
        self.reveal.lock().await.wait_idle().await;

        let (request, generation) = {
            let mut state = self.state.lock().await;
            state.push_user(input);
            (
                ContinueStoryRequest {
                    ai_name: state.ai_name().to_string(),
                    genre: state.genre().to_string(),
                    story_context: state.story_context(),
                    user_input: input.to_string(),
                },
                self.generation.load(Ordering::Acquire),
            )
        };

        match self.api.continue_story(&request).await {
            Ok(directive) => {
                if self.is_stale(generation) {
                    return Ok(TurnOutcome::Discarded);
                }

                // A REPLACE takes the pen away from the scheduler before any
                // canonical text is rewritten.
                if directive.action == DirectiveAction::Replace {
                    self.reveal.lock().await.cancel().await;
                }

                let chat_response = directive.chat_response.clone();
                let effects = {
                    let mut state = self.state.lock().await;
                    apply_directive(&mut state, directive)
                };

                let mut revealing = false;
                for effect in effects {
                    match effect {
                        Effect::BeginReveal(text) => {
                            self.reveal.lock().await.start(text).await;
                            revealing = true;
                        }
                        Effect::MalformedAction(_) => {}
                    }
                }

                Ok(TurnOutcome::Applied {
                    chat_response,
                    revealing,
                })
            }
            Err(err) => {
                if self.is_stale(generation) {
                    return Ok(TurnOutcome::Discarded);
                }
                tracing::error!("continuation request failed: {err}");

                let notice = {
                    let mut state = self.state.lock().await;
                    let notice = format!(
                        "{} is unreachable right now. Your words are kept; try again.",
                        state.ai_name()
                    );
                    state.push_system(notice.clone());
                    state.set_pending(false);
                    notice
                };
                Ok(TurnOutcome::Failed { notice })
            }
        }
    }

    // ── Voice input ──────────────────────────────────────────────────────

    /// Starts a capture cycle. Obeys the same single-flight gate as typed
    /// input: no new recording while a continuation is pending, and a busy
    /// pipeline (recording or still uploading) rejects rather than waits.
    pub async fn begin_recording(&self) -> Result<(), ScrybeError> {
        if self.state.lock().await.is_pending() {
            return Err(SessionError::TurnPending.into());
        }
        let mut capture = self
            .capture
            .try_lock()
            .map_err(|_| CaptureError::ResourceBusy)?;
        capture.begin_capture()?;
        Ok(())
    }

    /// Ends the capture, transcribes it, and submits the text as a user
    /// turn. A transcription failure creates no turn and issues no
    /// continuation request.
    pub async fn finish_recording(&self) -> Result<TurnOutcome, ScrybeError> {
        let text = self.capture.lock().await.end_capture().await?;
        self.submit_turn(&text).await.map_err(Into::into)
    }

    pub async fn cancel_recording(&self) {
        self.capture.lock().await.abort();
    }

    // ── Publish ──────────────────────────────────────────────────────────

    pub async fn publish(&self, title: &str) -> Result<PublishOutcome, ScrybeError> {
        // Serialize against an active reveal so the freshest text ships.
        self.reveal.lock().await.wait_idle().await;

        let story = {
            let state = self.state.lock().await;
            if state.story_text().is_empty() {
                return Err(SessionError::EmptyStory.into());
            }
            state.to_story_create(title)
        };
        self.publisher.publish(&story).await.map_err(Into::into)
    }

    pub async fn retry_cover(&self, story_id: i64) -> Result<Story, ScrybeError> {
        self.publisher
            .retry_cover(story_id)
            .await
            .map_err(Into::into)
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Abandons the session: in-flight responses will be discarded, an
    /// active reveal stops, and the microphone is released.
    pub async fn abandon(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.reveal.lock().await.cancel().await;
        self.capture.lock().await.abort();
        self.state.lock().await.set_pending(false);
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) != generation
    }
}
