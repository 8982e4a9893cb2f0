use serde::{Deserialize, Serialize};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Success body of `POST /chat`
///
/// The service answers with either `response` or `error`; a body carrying
/// neither is malformed and is treated like a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    /// The text to display as the bot turn, if the body is well-formed.
    ///
    /// A service-side `error` takes precedence over `response`.
    pub fn bot_text(&self) -> Option<&str> {
        self.error.as_deref().or(self.response.as_deref())
    }
}

/// Requested rendering style for image generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStyle {
    #[default]
    Realistic,
    Anime,
    DigitalArt,
    Cartoon,
}

impl ImageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStyle::Realistic => "realistic",
            ImageStyle::Anime => "anime",
            ImageStyle::DigitalArt => "digital-art",
            ImageStyle::Cartoon => "cartoon",
        }
    }

    pub fn all() -> &'static [ImageStyle] {
        &[
            ImageStyle::Realistic,
            ImageStyle::Anime,
            ImageStyle::DigitalArt,
            ImageStyle::Cartoon,
        ]
    }
}

impl std::fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "realistic" => Ok(ImageStyle::Realistic),
            "anime" => Ok(ImageStyle::Anime),
            "digital-art" | "digital_art" | "digitalart" => Ok(ImageStyle::DigitalArt),
            "cartoon" => Ok(ImageStyle::Cartoon),
            other => Err(format!("unknown image style: {other}")),
        }
    }
}

/// Body of `POST /generate_image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: ImageStyle,
}

/// Success body of `POST /generate_image`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_reply_response() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"Hi there"}"#).unwrap();
        assert_eq!(reply.bot_text(), Some("Hi there"));
    }

    #[test]
    fn test_chat_reply_error_takes_precedence() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response":"Hi","error":"model overloaded"}"#).unwrap();
        assert_eq!(reply.bot_text(), Some("model overloaded"));
    }

    #[test]
    fn test_chat_reply_malformed() {
        let reply: ChatReply = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(reply.bot_text(), None);
    }

    #[test]
    fn test_image_style_wire_names() {
        for style in ImageStyle::all() {
            let json = serde_json::to_string(style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.as_str()));
        }
        assert_eq!(ImageStyle::DigitalArt.as_str(), "digital-art");
    }

    #[test]
    fn test_image_style_from_str() {
        assert_eq!("anime".parse::<ImageStyle>().unwrap(), ImageStyle::Anime);
        assert_eq!(
            "Digital-Art".parse::<ImageStyle>().unwrap(),
            ImageStyle::DigitalArt
        );
        assert!("watercolor".parse::<ImageStyle>().is_err());
    }

    #[test]
    fn test_image_request_body() {
        let request = ImageRequest {
            prompt: "a cat".to_string(),
            style: ImageStyle::Cartoon,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"prompt":"a cat","style":"cartoon"}"#);
    }
}
