//! Two-phase publish: persist the story, then generate its cover.
//!
//! Deliberately non-transactional. A story that saved but has no cover is a
//! distinguished success, not a failure — the cover is retryable after the
//! fact and is not required for readers.

use crate::api::{Story, StoryApi, StoryCreate};
use crate::error::PublishError;
use std::sync::Arc;

/// Outcome of a publish attempt where step one succeeded.
#[derive(Debug)]
pub enum PublishOutcome {
    /// Story and cover both persisted.
    Published(Story),
    /// Story persisted; cover generation failed and can be retried with
    /// [`PublishPipeline::retry_cover`].
    PartialPublish {
        story: Story,
        cover_error: crate::error::ApiError,
    },
}

impl PublishOutcome {
    pub fn story(&self) -> &Story {
        match self {
            Self::Published(story) | Self::PartialPublish { story, .. } => story,
        }
    }
}

pub struct PublishPipeline {
    api: Arc<dyn StoryApi>,
}

impl PublishPipeline {
    pub fn new(api: Arc<dyn StoryApi>) -> Self {
        Self { api }
    }

    /// Persists the story, then asks the backend for a cover. If the save
    /// fails nothing was persisted and the whole publish fails; if only the
    /// cover fails, the saved story is reported as a partial publish.
    pub async fn publish(&self, story: &StoryCreate) -> Result<PublishOutcome, PublishError> {
        let saved = self
            .api
            .create_story(story)
            .await
            .map_err(PublishError::Create)?;
        tracing::info!(story_id = saved.id, "story saved");

        match self.api.generate_cover(saved.id).await {
            Ok(with_cover) => Ok(PublishOutcome::Published(with_cover)),
            Err(cover_error) => {
                tracing::warn!(
                    story_id = saved.id,
                    "cover generation failed, story remains saved: {cover_error}"
                );
                Ok(PublishOutcome::PartialPublish {
                    story: saved,
                    cover_error,
                })
            }
        }
    }

    /// Idempotent retry path for a story that saved without a cover.
    pub async fn retry_cover(&self, story_id: i64) -> Result<Story, PublishError> {
        self.api
            .generate_cover(story_id)
            .await
            .map_err(PublishError::Cover)
    }
}
