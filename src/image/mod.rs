//! Image generation panel
//!
//! A simpler sibling of the message dispatcher for the image endpoint: one
//! request per `generate`, a loading placeholder while it is in flight, and
//! a placeholder image (never a raw error) when the service is unreachable.

use crate::dispatch::Dispatcher;
use crate::endpoint::{ChatEndpoint, ImageStyle};
use crate::{ParleyError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Placeholder image service used when the endpoint returns no URL
pub const PLACEHOLDER_BASE: &str = "https://picsum.photos/400/300";

/// Note attached to placeholder results after a transport failure
pub const OFFLINE_NOTE: &str =
    "This is a placeholder image. The image generator is currently offline.";

/// Bot turn announced after a degraded (placeholder) result
pub const DEGRADED_MESSAGE: &str =
    "I've generated a placeholder image for you. The AI image generator is currently experiencing high demand.";

fn placeholder_url() -> String {
    format!(
        "{PLACEHOLDER_BASE}?random={}",
        rand::thread_rng().gen::<u32>()
    )
}

/// Outcome of one image request; replaced wholesale on each new request
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub prompt: String,
    pub style: ImageStyle,
    pub image_url: String,
    pub note: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Display state of the image panel
#[derive(Debug, Clone, Default)]
pub enum ImageState {
    /// Nothing requested yet
    #[default]
    Empty,
    /// A request is in flight
    Loading,
    /// An image (real or placeholder) is ready to render
    Ready(ImageResult),
    /// The service reported an error; shown in place of an image
    Failed { message: String },
}

impl ImageState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ImageState::Loading)
    }
}

/// Image request handler.
///
/// Confirmations and degraded-service notes go through the dispatcher's
/// display primitive; no chat round trip is involved.
pub struct ImagePanel {
    endpoint: Arc<dyn ChatEndpoint>,
    dispatcher: Arc<Dispatcher>,
    state: RwLock<ImageState>,
}

impl ImagePanel {
    pub fn new(endpoint: Arc<dyn ChatEndpoint>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            endpoint,
            dispatcher,
            state: RwLock::new(ImageState::Empty),
        }
    }

    /// Current panel state
    pub fn state(&self) -> ImageState {
        self.state.read().clone()
    }

    /// Request an image for `prompt` in `style`.
    ///
    /// An empty prompt is rejected with a validation error before any
    /// request is made. Endpoint failures never error: they produce a
    /// placeholder result plus an explanatory bot turn. No retries.
    pub async fn generate(&self, prompt: &str, style: ImageStyle) -> Result<()> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ParleyError::ValidationError(
                "Please enter an image description".to_string(),
            ));
        }

        debug!("Generating image for '{prompt}' (style: {style})");
        *self.state.write() = ImageState::Loading;

        match self.endpoint.generate_image(prompt, style).await {
            Ok(reply) => {
                if let Some(message) = reply.error {
                    *self.state.write() = ImageState::Failed { message };
                } else {
                    let result = ImageResult {
                        prompt: prompt.to_string(),
                        style,
                        image_url: reply.image_url.unwrap_or_else(placeholder_url),
                        note: None,
                        generated_at: Utc::now(),
                    };
                    *self.state.write() = ImageState::Ready(result);
                    self.dispatcher.announce(format!(
                        "I've generated an image based on your description: \"{prompt}\""
                    ));
                }
            }
            Err(e) => {
                warn!("Image request failed: {e}");
                *self.state.write() = ImageState::Ready(ImageResult {
                    prompt: prompt.to_string(),
                    style,
                    image_url: placeholder_url(),
                    note: Some(OFFLINE_NOTE.to_string()),
                    generated_at: Utc::now(),
                });
                self.dispatcher.announce(DEGRADED_MESSAGE);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ChatReply, HealthReply, ImageReply};
    use crate::speech::{SharedVoicePrefs, Speaker};
    use crate::transcript::Transcript;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicBool;

    struct ScriptedImageEndpoint {
        replies: Mutex<VecDeque<Result<ImageReply>>>,
        calls: Mutex<Vec<(String, ImageStyle)>>,
    }

    impl ScriptedImageEndpoint {
        fn new(replies: Vec<Result<ImageReply>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatEndpoint for ScriptedImageEndpoint {
        async fn chat(&self, _message: &str) -> Result<ChatReply> {
            Err(ParleyError::EndpointError("not an image call".into()))
        }

        async fn generate_image(&self, prompt: &str, style: ImageStyle) -> Result<ImageReply> {
            self.calls.lock().push((prompt.to_string(), style));
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ParleyError::EndpointError("no reply scripted".into())))
        }

        async fn health(&self) -> Result<HealthReply> {
            Err(ParleyError::EndpointError("not an image call".into()))
        }
    }

    fn panel(endpoint: Arc<ScriptedImageEndpoint>) -> (ImagePanel, Transcript) {
        let transcript = Transcript::new();
        let speaker = Arc::new(Speaker::unavailable(
            SharedVoicePrefs::new(),
            Arc::new(AtomicBool::new(false)),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            endpoint.clone(),
            transcript.clone(),
            speaker,
        ));
        (ImagePanel::new(endpoint, dispatcher), transcript)
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_request() {
        let endpoint = ScriptedImageEndpoint::new(vec![]);
        let (panel, transcript) = panel(endpoint.clone());

        let err = panel.generate("   ", ImageStyle::Realistic).await.unwrap_err();
        assert!(matches!(err, ParleyError::ValidationError(_)));
        assert!(endpoint.calls.lock().is_empty());
        assert!(matches!(panel.state(), ImageState::Empty));
        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn test_success_renders_returned_url() {
        let endpoint = ScriptedImageEndpoint::new(vec![Ok(ImageReply {
            image_url: Some("https://images.example/cat.png".to_string()),
            error: None,
        })]);
        let (panel, transcript) = panel(endpoint.clone());

        panel.generate("a cat", ImageStyle::Cartoon).await.unwrap();

        match panel.state() {
            ImageState::Ready(result) => {
                assert_eq!(result.image_url, "https://images.example/cat.png");
                assert_eq!(result.prompt, "a cat");
                assert_eq!(result.style, ImageStyle::Cartoon);
                assert!(result.note.is_none());
            }
            other => panic!("Expected ready state, got {other:?}"),
        }

        assert_eq!(
            endpoint.calls.lock().as_slice(),
            [("a cat".to_string(), ImageStyle::Cartoon)]
        );
        let last = transcript.last().unwrap();
        assert!(last.text.contains("a cat"));
    }

    #[tokio::test]
    async fn test_success_without_url_uses_placeholder() {
        let endpoint = ScriptedImageEndpoint::new(vec![Ok(ImageReply::default())]);
        let (panel, _) = panel(endpoint);

        panel.generate("a dog", ImageStyle::Anime).await.unwrap();

        match panel.state() {
            ImageState::Ready(result) => {
                assert!(result.image_url.starts_with(PLACEHOLDER_BASE));
                assert!(result.note.is_none());
            }
            other => panic!("Expected ready state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_service_error_shown_in_place_of_image() {
        let endpoint = ScriptedImageEndpoint::new(vec![Ok(ImageReply {
            image_url: None,
            error: Some("prompt rejected".to_string()),
        })]);
        let (panel, transcript) = panel(endpoint);

        panel.generate("something", ImageStyle::Realistic).await.unwrap();

        match panel.state() {
            ImageState::Failed { message } => assert_eq!(message, "prompt rejected"),
            other => panic!("Expected failed state, got {other:?}"),
        }
        assert!(transcript.is_empty(), "no confirmation for a failed request");
    }

    #[tokio::test]
    async fn test_network_failure_degrades_to_placeholder() {
        let endpoint = ScriptedImageEndpoint::new(vec![Err(ParleyError::EndpointError(
            "connection refused".into(),
        ))]);
        let (panel, transcript) = panel(endpoint);

        panel.generate("a cat", ImageStyle::Cartoon).await.unwrap();

        match panel.state() {
            ImageState::Ready(result) => {
                assert!(result.image_url.starts_with(PLACEHOLDER_BASE));
                assert_eq!(result.note.as_deref(), Some(OFFLINE_NOTE));
            }
            other => panic!("Expected degraded ready state, got {other:?}"),
        }

        let last = transcript.last().unwrap();
        assert_eq!(last.text, DEGRADED_MESSAGE);
        assert!(last.text.contains("placeholder"));
    }

    #[tokio::test]
    async fn test_result_replaced_on_each_request() {
        let endpoint = ScriptedImageEndpoint::new(vec![
            Ok(ImageReply {
                image_url: Some("https://images.example/1.png".to_string()),
                error: None,
            }),
            Ok(ImageReply {
                image_url: Some("https://images.example/2.png".to_string()),
                error: None,
            }),
        ]);
        let (panel, _) = panel(endpoint);

        panel.generate("first", ImageStyle::Realistic).await.unwrap();
        panel.generate("second", ImageStyle::Realistic).await.unwrap();

        match panel.state() {
            ImageState::Ready(result) => {
                assert_eq!(result.prompt, "second");
                assert_eq!(result.image_url, "https://images.example/2.png");
            }
            other => panic!("Expected ready state, got {other:?}"),
        }
    }
}
