use super::types::{ContinueStoryRequest, Directive, Story, StoryCreate, Transcription};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Abstract backend transport consumed by the session engine.
///
/// Calls are asynchronous and preserve request/response pairing even with
/// concurrent in-flight calls for different operations. Test doubles
/// implement this directly.
#[async_trait]
pub trait StoryApi: Send + Sync {
    async fn continue_story(&self, req: &ContinueStoryRequest) -> Result<Directive, ApiError>;

    /// Uploads raw WAV bytes and returns the transcribed text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<Transcription, ApiError>;

    async fn create_story(&self, story: &StoryCreate) -> Result<Story, ApiError>;

    async fn generate_cover(&self, story_id: i64) -> Result<Story, ApiError>;

    async fn list_stories(&self) -> Result<Vec<Story>, ApiError>;

    async fn get_story(&self, story_id: i64) -> Result<Story, ApiError>;
}

pub fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// HTTP implementation of [`StoryApi`] against the Scrybe backend plus the
/// hosted transcription endpoint.
pub struct HttpStoryApi {
    base_url: String,
    transcription_url: String,
    /// Pre-computed `"Bearer <token>"` header values (avoids `format!` per request).
    cached_auth: Option<String>,
    cached_transcription_auth: Option<String>,
    client: Client,
}

impl HttpStoryApi {
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        transcription_url: &str,
        transcription_token: Option<&str>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transcription_url: transcription_url.to_string(),
            cached_auth: api_token.map(|t| format!("Bearer {t}")),
            cached_transcription_auth: transcription_token.map(|t| format!("Bearer {t}")),
            client: build_client(timeout_secs),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cached_auth {
            Some(auth) => builder.header("Authorization", auth),
            None => builder,
        }
    }

    async fn send(
        &self,
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.into(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> Result<T, ApiError> {
        response.json().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.into(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl StoryApi for HttpStoryApi {
    async fn continue_story(&self, req: &ContinueStoryRequest) -> Result<Directive, ApiError> {
        let builder = self
            .authorize(self.client.post(self.endpoint("continue_story")))
            .json(req);
        let response = self.send("continue_story", builder).await?;
        Self::decode("continue_story", response).await
    }

    async fn transcribe(&self, audio: Vec<u8>) -> Result<Transcription, ApiError> {
        let mut builder = self
            .client
            .post(&self.transcription_url)
            .header("Content-Type", "audio/wav")
            .body(audio);
        if let Some(auth) = &self.cached_transcription_auth {
            builder = builder.header("Authorization", auth);
        }
        let response = self.send("transcribe", builder).await?;
        Self::decode("transcribe", response).await
    }

    async fn create_story(&self, story: &StoryCreate) -> Result<Story, ApiError> {
        let builder = self
            .authorize(self.client.post(self.endpoint("stories")))
            .json(story);
        let response = self.send("stories", builder).await?;
        Self::decode("stories", response).await
    }

    async fn generate_cover(&self, story_id: i64) -> Result<Story, ApiError> {
        let url = self.endpoint(&format!("stories/{story_id}/generate_cover"));
        let builder = self.authorize(self.client.post(url));
        let response = self.send("generate_cover", builder).await?;
        Self::decode("generate_cover", response).await
    }

    async fn list_stories(&self) -> Result<Vec<Story>, ApiError> {
        let builder = self.authorize(self.client.get(self.endpoint("stories")));
        let response = self.send("stories", builder).await?;
        Self::decode("stories", response).await
    }

    async fn get_story(&self, story_id: i64) -> Result<Story, ApiError> {
        let url = self.endpoint(&format!("stories/{story_id}"));
        let builder = self.authorize(self.client.get(url));
        let response = self.send("stories", builder).await?;
        Self::decode("stories", response).await
    }
}
