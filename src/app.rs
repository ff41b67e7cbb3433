//! Interactive terminal front-end for the session engine.
//!
//! The loop is deliberately thin: it renders session snapshots and forwards
//! input; all ordering and recovery lives in the controller.

use crate::api::HttpStoryApi;
use crate::capture::CpalRecorder;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::publish::PublishOutcome;
use crate::session::{SessionController, TurnOutcome};
use crate::ui::style;
use anyhow::Result;
use dialoguer::Input;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Write { ai_name, genre } => run_write(config, ai_name, genre).await,
        Commands::Library => run_library(config).await,
        Commands::Read { story_id } => run_read(config, story_id).await,
        Commands::Init => run_init(&config),
    }
}

fn build_api(config: &Config) -> Arc<HttpStoryApi> {
    Arc::new(HttpStoryApi::new(
        &config.backend_url,
        config.api_token.as_deref(),
        &config.transcription_url,
        config.transcription_token.as_deref(),
        config.request_timeout_secs,
    ))
}

// ─── write ──────────────────────────────────────────────────────────────────

async fn run_write(
    config: Config,
    ai_name: Option<String>,
    genre: Option<String>,
) -> Result<()> {
    let ai_name = match ai_name {
        Some(name) => name,
        None => Input::new()
            .with_prompt("Name your AI partner")
            .default(config.session.default_ai_name.clone())
            .interact_text()
            .unwrap_or_else(|_| config.session.default_ai_name.clone()),
    };
    let genre = match genre {
        Some(genre) => genre,
        None => Input::new()
            .with_prompt("Pick a genre")
            .default(config.session.default_genre.clone())
            .interact_text()
            .unwrap_or_else(|_| config.session.default_genre.clone()),
    };

    let api = build_api(&config);
    let controller = SessionController::new(api, Box::new(CpalRecorder::new()), &ai_name, &genre);

    controller.seed_opening().await;
    let snapshot = controller.snapshot().await;
    if let Some(opening) = snapshot.transcript().last() {
        println!("{} {}", style::ai_name(&ai_name), opening.text);
    }
    println!(
        "{}",
        style::dim("Type to continue the story. /record, /publish, /story, /quit")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", style::prompt());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" => break,
            "/story" => print_story(&controller).await,
            "/record" => record_turn(&controller, &ai_name, &mut lines).await?,
            "/publish" => publish_story(&controller, &mut lines).await?,
            command if command.starts_with("/cover ") => {
                retry_cover(&controller, command.trim_start_matches("/cover ").trim()).await;
            }
            command if command.starts_with('/') => {
                println!("{}", style::warn(format!("unknown command: {command}")));
            }
            text => submit_turn(&controller, &ai_name, text).await,
        }
    }

    controller.abandon().await;
    Ok(())
}

async fn submit_turn(controller: &SessionController, ai_name: &str, text: &str) {
    let revealed_before = controller.snapshot().await.story_text().len();
    match controller.submit_turn(text).await {
        Ok(TurnOutcome::Applied {
            chat_response,
            revealing,
        }) => {
            println!("{} {}", style::ai_name(ai_name), chat_response);
            if revealing {
                stream_reveal(controller, revealed_before).await;
            }
        }
        Ok(TurnOutcome::Failed { notice }) => {
            println!("{}", style::dim(notice));
        }
        Ok(TurnOutcome::Discarded) => {}
        Err(e) => println!("{}", style::warn(e.to_string())),
    }
}

/// Prints newly revealed story text as the scheduler discloses it — the UI
/// consumes state, it never writes it.
async fn stream_reveal(controller: &SessionController, mut printed: usize) {
    loop {
        let running = controller.is_revealing().await;
        let snapshot = controller.snapshot().await;
        let text = snapshot.story_text();
        if printed < text.len() {
            print!("{}", &text[printed..]);
            let _ = std::io::stdout().flush();
            printed = text.len();
        }
        if !running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
    println!();
}

async fn record_turn(
    controller: &SessionController,
    ai_name: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    if let Err(e) = controller.begin_recording().await {
        println!("{}", style::warn(e.to_string()));
        return Ok(());
    }

    println!("{}", style::dim("Recording... press Enter to finish."));
    let _ = lines.next_line().await?;

    let revealed_before = controller.snapshot().await.story_text().len();
    match controller.finish_recording().await {
        Ok(TurnOutcome::Applied {
            chat_response,
            revealing,
        }) => {
            // Echo what the transcription heard.
            let snapshot = controller.snapshot().await;
            if let Some(heard) = snapshot
                .transcript()
                .iter()
                .rev()
                .find(|e| e.role == crate::session::TurnRole::User)
            {
                println!("{}{}", style::prompt(), heard.text);
            }
            println!("{} {}", style::ai_name(ai_name), chat_response);
            if revealing {
                stream_reveal(controller, revealed_before).await;
            }
        }
        Ok(TurnOutcome::Failed { notice }) => println!("{}", style::dim(notice)),
        Ok(TurnOutcome::Discarded) => {}
        Err(e) => println!("{}", style::warn(e.to_string())),
    }
    Ok(())
}

async fn publish_story(
    controller: &SessionController,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    print!("Story title [My New Story]: ");
    std::io::stdout().flush()?;
    let title = match lines.next_line().await? {
        Some(line) if !line.trim().is_empty() => line.trim().to_string(),
        _ => "My New Story".to_string(),
    };

    match controller.publish(&title).await {
        Ok(PublishOutcome::Published(story)) => {
            println!(
                "{}",
                style::success(format!("Story '{}' saved, cover ready.", story.title))
            );
        }
        Ok(PublishOutcome::PartialPublish { story, .. }) => {
            println!(
                "{}",
                style::warn(format!(
                    "Story '{}' saved, but cover generation failed. Retry with /cover {}",
                    story.title, story.id
                ))
            );
        }
        Err(e) => println!("{}", style::warn(e.to_string())),
    }
    Ok(())
}

async fn retry_cover(controller: &SessionController, raw_id: &str) {
    let Ok(story_id) = raw_id.parse::<i64>() else {
        println!("{}", style::warn("usage: /cover <story-id>"));
        return;
    };
    match controller.retry_cover(story_id).await {
        Ok(story) => println!(
            "{}",
            style::success(format!("Cover ready for '{}'.", story.title))
        ),
        Err(e) => println!("{}", style::warn(e.to_string())),
    }
}

async fn print_story(controller: &SessionController) {
    let snapshot = controller.snapshot().await;
    if snapshot.chapters().is_empty() {
        println!("{}", snapshot.story_text());
        return;
    }
    for chapter in snapshot.chapters() {
        println!("{}", style::chapter_banner(&chapter.title));
        println!("{}", chapter.content);
    }
}

// ─── library / read ─────────────────────────────────────────────────────────

async fn run_library(config: Config) -> Result<()> {
    use crate::api::StoryApi;

    let api = build_api(&config);
    let stories = api.list_stories().await?;
    if stories.is_empty() {
        println!("{}", style::dim("No saved stories yet."));
        return Ok(());
    }
    for story in stories {
        let cover = if story.cover_image_url.is_some() {
            "cover ready"
        } else {
            "no cover"
        };
        println!(
            "{:>4}  {}  {}",
            story.id,
            story.title,
            style::dim(format!(
                "({}, {} chapters, {cover})",
                story.genre,
                story.chapters.len()
            ))
        );
    }
    Ok(())
}

async fn run_read(config: Config, story_id: i64) -> Result<()> {
    use crate::api::StoryApi;

    let api = build_api(&config);
    let story = api.get_story(story_id).await?;
    println!("{}", style::success(&story.title));
    println!(
        "{}",
        style::dim(format!("{} - written with {}", story.genre, story.ai_name))
    );
    for chapter in &story.chapters {
        println!();
        println!("{}", style::chapter_banner(&chapter.title));
        println!("{}", chapter.content);
    }
    Ok(())
}

// ─── init ───────────────────────────────────────────────────────────────────

fn run_init(config: &Config) -> Result<()> {
    println!(
        "{} {}",
        style::success("Config ready at"),
        config.config_path.display()
    );
    println!(
        "{}",
        style::dim("Set backend_url and tokens there, or use SCRYBE_API_TOKEN / SCRYBE_TRANSCRIPTION_TOKEN.")
    );
    Ok(())
}
