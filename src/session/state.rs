//! The authoritative in-memory model of one writing session.

use crate::api::{ChapterPayload, StoryCreate};
use serde::Serialize;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Ai,
    /// Signals a chapter boundary in the conversation view.
    ChapterMarker,
    /// AI-less notices (network failures and the like).
    System,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnEntry {
    pub role: TurnRole,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub content: String,
}

/// One writing session: the canonical story, its chapters, and the chat
/// transcript. Created when a session starts and discarded on session end;
/// persistence only happens through the publish flow.
#[derive(Debug, Clone)]
pub struct SessionState {
    ai_name: String,
    genre: String,
    story_text: String,
    chapters: Vec<Chapter>,
    transcript: Vec<TurnEntry>,
    pending_continuation: bool,
}

impl SessionState {
    pub fn new(ai_name: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            ai_name: ai_name.into(),
            genre: genre.into(),
            story_text: String::new(),
            chapters: Vec::new(),
            transcript: Vec::new(),
            pending_continuation: false,
        }
    }

    pub fn ai_name(&self) -> &str {
        &self.ai_name
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn story_text(&self) -> &str {
        &self.story_text
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn transcript(&self) -> &[TurnEntry] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending_continuation
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending_continuation = pending;
    }

    /// The story-so-far handed to the AI as `story_context`.
    pub fn story_context(&self) -> String {
        self.story_text.clone()
    }

    // ── Transcript appends (insertion order is display order) ────────────

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.transcript.push(TurnEntry {
            role: TurnRole::User,
            text: text.into(),
        });
    }

    pub fn push_ai(&mut self, text: impl Into<String>) {
        self.transcript.push(TurnEntry {
            role: TurnRole::Ai,
            text: text.into(),
        });
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.transcript.push(TurnEntry {
            role: TurnRole::System,
            text: text.into(),
        });
    }

    pub fn push_chapter_marker(&mut self, title: impl Into<String>) {
        self.transcript.push(TurnEntry {
            role: TurnRole::ChapterMarker,
            text: title.into(),
        });
    }

    // ── Chapters ─────────────────────────────────────────────────────────

    /// Registers a new chapter with the next sequential number. Content
    /// starts empty and accrues from subsequent story text.
    pub fn register_chapter(&mut self, title: impl Into<String>) -> u32 {
        let number = self.chapters.len() as u32 + 1;
        self.chapters.push(Chapter {
            number,
            title: title.into(),
            content: String::new(),
        });
        number
    }

    // ── Story text mutation ──────────────────────────────────────────────

    /// Appends one revealed unit to the canonical text. The reveal
    /// scheduler is the sole caller while a reveal is active.
    pub fn reveal_char(&mut self, ch: char) {
        self.story_text.push(ch);
        if let Some(chapter) = self.chapters.last_mut() {
            chapter.content.push(ch);
        }
    }

    /// REPLACE semantics: discard the canonical text and chapter content,
    /// most recent payload wins.
    pub fn replace_story(&mut self, text: impl Into<String>) {
        self.story_text = text.into();
        for chapter in &mut self.chapters {
            chapter.content.clear();
        }
        if let Some(chapter) = self.chapters.last_mut() {
            chapter.content = self.story_text.clone();
        }
    }

    // ── Publish serialization ────────────────────────────────────────────

    /// The chapters handed to the publish flow: the explicit segmentation,
    /// or a single synthesized chapter when the session was never segmented.
    pub fn chapters_for_publish(&self) -> Vec<ChapterPayload> {
        if self.chapters.is_empty() {
            return vec![ChapterPayload {
                chapter_number: 1,
                title: "Chapter 1".to_string(),
                content: self.story_text.clone(),
            }];
        }
        self.chapters
            .iter()
            .map(|c| ChapterPayload {
                chapter_number: c.number,
                title: c.title.clone(),
                content: c.content.clone(),
            })
            .collect()
    }

    pub fn to_story_create(&self, title: impl Into<String>) -> StoryCreate {
        StoryCreate {
            title: title.into(),
            genre: self.genre.clone(),
            ai_name: self.ai_name.clone(),
            chapters: self.chapters_for_publish(),
        }
    }
}
