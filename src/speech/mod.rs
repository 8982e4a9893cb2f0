//! Speech capabilities for voice interaction
//!
//! This module provides:
//! - Speech input: a single-shot recognition capability driven through a
//!   continuous-listening session with debounced auto-restart
//! - Speech output: best-effort synthesis of bot replies with user-tunable
//!   voice, rate, and pitch
//!
//! Both capabilities are platform features that may be absent; everything
//! here degrades to notices instead of failing.

pub mod recognizer;
pub mod synthesizer;

// Re-export commonly used types
pub use recognizer::{
    ListenState, RecognizerEvent, SpeechRecognizer, VoiceCommand, VoiceEvent, VoiceSession,
    VoiceSessionState, RESTART_DELAY,
};
pub use synthesizer::{SharedVoicePrefs, Speaker, SpeechSynthesizer, Voice, VoicePrefs};
