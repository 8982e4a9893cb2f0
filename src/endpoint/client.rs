use super::types::{ChatReply, ChatRequest, HealthReply, ImageReply, ImageRequest, ImageStyle};
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Request timeout for both endpoints
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The remote assistant service.
///
/// Both methods issue exactly one request; retries and fallbacks are the
/// caller's concern.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// `POST /chat` with the user's message
    async fn chat(&self, message: &str) -> Result<ChatReply>;

    /// `POST /generate_image` with a prompt and style
    async fn generate_image(&self, prompt: &str, style: ImageStyle) -> Result<ImageReply>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthReply>;
}

/// HTTP implementation of [`ChatEndpoint`] over a base URL
pub struct HttpEndpoint {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatEndpoint for HttpEndpoint {
    async fn chat(&self, message: &str) -> Result<ChatReply> {
        debug!("POST {}/chat", self.base_url);

        let reply = self
            .client
            .post(self.url("/chat"))
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatReply>()
            .await?;

        Ok(reply)
    }

    async fn generate_image(&self, prompt: &str, style: ImageStyle) -> Result<ImageReply> {
        debug!("POST {}/generate_image (style: {style})", self.base_url);

        let reply = self
            .client
            .post(self.url("/generate_image"))
            .json(&ImageRequest {
                prompt: prompt.to_string(),
                style,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ImageReply>()
            .await?;

        Ok(reply)
    }

    async fn health(&self) -> Result<HealthReply> {
        let reply = self
            .client
            .get(self.url("/health"))
            .send()
            .await?
            .error_for_status()?
            .json::<HealthReply>()
            .await?;

        Ok(reply)
    }
}
