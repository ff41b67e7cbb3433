pub mod http;
pub mod types;

pub use http::{HttpStoryApi, StoryApi, build_client};
pub use types::{
    ChapterPayload, ContinueStoryRequest, Directive, DirectiveAction, Story, StoryChapter,
    StoryCreate, Transcription,
};
