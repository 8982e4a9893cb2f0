pub mod app;
pub mod dispatch;
pub mod endpoint;
pub mod image;
pub mod settings;
pub mod speech;
pub mod transcript;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Recognition error: {0}")]
    RecognitionError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Endpoint error: {0}")]
    EndpointError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for ParleyError {
    fn from(e: reqwest::Error) -> Self {
        ParleyError::EndpointError(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Missing platform capabilities require user intervention
            ParleyError::CapabilityUnavailable(_) => false,
            // These are typically transient errors
            ParleyError::RecognitionError(_) => true,
            ParleyError::SynthesisError(_) => true,
            ParleyError::EndpointError(_) => true,
            ParleyError::ValidationError(_) => true,
            ParleyError::ConfigError(_) => false,
            ParleyError::IOError(_) => false,
            ParleyError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::CapabilityUnavailable(_) => {
                "Voice features are not supported on this platform.".to_string()
            }
            ParleyError::RecognitionError(_) => {
                "Sorry, I had trouble understanding your voice. Please try again.".to_string()
            }
            ParleyError::SynthesisError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            ParleyError::EndpointError(_) => {
                "Could not reach the assistant service. Please check your connection.".to_string()
            }
            ParleyError::ValidationError(msg) => msg.clone(),
            ParleyError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ParleyError::IOError(_) => "File system error occurred.".to_string(),
            ParleyError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;
