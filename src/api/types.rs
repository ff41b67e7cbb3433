//! Wire contract for the Scrybe backend.
//!
//! Field names are the serialization contract; the backend is the source of
//! truth for the JSON shapes here.

use serde::{Deserialize, Serialize};

// ─── Story continuation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ContinueStoryRequest {
    pub ai_name: String,
    pub genre: String,
    pub story_context: String,
    pub user_input: String,
}

/// How the AI wants the story canvas mutated for this turn.
///
/// The backend promises one of the four known actions, but the model behind
/// it occasionally invents new ones. An unrecognized value decodes as
/// `Unknown` so the turn can degrade to plain chat instead of failing the
/// whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveAction {
    Append,
    Replace,
    Refuse,
    Chat,
    #[serde(other)]
    Unknown,
}

/// The structured AI response instructing how to mutate the story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub action: DirectiveAction,
    #[serde(default)]
    pub story_text: String,
    #[serde(default)]
    pub chat_response: String,
    #[serde(default)]
    pub new_chapter_title: Option<String>,
}

// ─── Transcription ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    pub text: String,
}

// ─── Story persistence ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChapterPayload {
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryCreate {
    pub title: String,
    pub genre: String,
    pub ai_name: String,
    pub chapters: Vec<ChapterPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryChapter {
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub ai_name: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub chapters: Vec<StoryChapter>,
}
