//! Speech output adapter
//!
//! Wraps a platform synthesis capability behind [`SpeechSynthesizer`] and
//! applies the voice-selection policy and per-utterance preferences. Output
//! is fire-and-forget: synthesis failures are logged, never surfaced.

use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A synthesis voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// BCP-47 locale tag, e.g. "en-US"
    pub lang: String,
}

impl Voice {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// User-tunable synthesis preferences
///
/// Read fresh on every utterance; changing them affects the next spoken
/// reply immediately. Not persisted.
#[derive(Debug, Clone)]
pub struct VoicePrefs {
    /// Speech rate (1.0 = normal)
    pub rate: f32,
    /// Voice pitch (1.0 = normal)
    pub pitch: f32,
    /// Explicit voice selection; falls back to the policy default when unset
    pub voice_id: Option<String>,
}

impl Default for VoicePrefs {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            voice_id: None,
        }
    }
}

/// Thread-safe shared preferences
#[derive(Clone, Default)]
pub struct SharedVoicePrefs {
    inner: Arc<RwLock<VoicePrefs>>,
}

impl SharedVoicePrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VoicePrefs {
        self.inner.read().clone()
    }

    pub fn set_rate(&self, rate: f32) {
        self.inner.write().rate = rate;
    }

    pub fn set_pitch(&self, pitch: f32) {
        self.inner.write().pitch = pitch;
    }

    pub fn set_voice_id(&self, voice_id: Option<String>) {
        self.inner.write().voice_id = voice_id;
    }
}

/// Platform speech-synthesis capability
///
/// Playback is asynchronous on the platform side; `speak` returns once the
/// utterance has been queued.
pub trait SpeechSynthesizer: Send {
    /// The voices currently offered by the platform
    fn voices(&self) -> Vec<Voice>;

    /// Queue one utterance for playback
    fn speak(&mut self, text: &str, voice: Option<&Voice>, rate: f32, pitch: f32) -> Result<()>;

    /// Whether an utterance is currently playing
    fn is_speaking(&self) -> bool;
}

/// Speech output adapter
///
/// Owns the capability (if present), the selected default voice, and the
/// shared preferences. `speak` applies the session gating rule: it is skipped
/// when the voice session is inactive and nothing is currently speaking.
pub struct Speaker {
    synth: Option<Mutex<Box<dyn SpeechSynthesizer>>>,
    prefs: SharedVoicePrefs,
    voice_active: Arc<AtomicBool>,
    default_voice: Mutex<Option<Voice>>,
}

impl Speaker {
    pub fn new(
        synth: Option<Box<dyn SpeechSynthesizer>>,
        prefs: SharedVoicePrefs,
        voice_active: Arc<AtomicBool>,
    ) -> Self {
        let speaker = Self {
            synth: synth.map(Mutex::new),
            prefs,
            voice_active,
            default_voice: Mutex::new(None),
        };
        speaker.voices_changed();
        speaker
    }

    /// Build a speaker without a synthesis capability
    pub fn unavailable(prefs: SharedVoicePrefs, voice_active: Arc<AtomicBool>) -> Self {
        Self::new(None, prefs, voice_active)
    }

    pub fn has_capability(&self) -> bool {
        self.synth.is_some()
    }

    /// Re-run voice selection against the current platform voice list.
    ///
    /// Policy: first voice whose locale tag contains "en", else the first
    /// available voice.
    pub fn voices_changed(&self) {
        let Some(synth) = &self.synth else {
            return;
        };

        let voices = synth.lock().voices();
        let chosen = voices
            .iter()
            .find(|v| v.lang.contains("en"))
            .or_else(|| voices.first())
            .cloned();

        if let Some(voice) = &chosen {
            debug!("Selected voice '{}' ({})", voice.name, voice.lang);
        }
        *self.default_voice.lock() = chosen;
    }

    /// The voice the next utterance will use
    pub fn current_voice(&self) -> Option<Voice> {
        let prefs = self.prefs.snapshot();
        if let (Some(synth), Some(id)) = (&self.synth, prefs.voice_id) {
            if let Some(voice) = synth.lock().voices().into_iter().find(|v| v.id == id) {
                return Some(voice);
            }
        }
        self.default_voice.lock().clone()
    }

    /// Speak `text` with the current voice, rate, and pitch.
    ///
    /// Best-effort: no-op without a capability, skipped when the voice
    /// session is inactive and the synthesizer is idle, and synthesis
    /// failures are swallowed after logging.
    pub fn speak(&self, text: &str) {
        let Some(synth) = &self.synth else {
            return;
        };

        let mut synth = synth.lock();
        if !self.voice_active.load(Ordering::SeqCst) && !synth.is_speaking() {
            return;
        }

        let prefs = self.prefs.snapshot();
        let voice = match prefs.voice_id {
            Some(id) => synth
                .voices()
                .into_iter()
                .find(|v| v.id == id)
                .or_else(|| self.default_voice.lock().clone()),
            None => self.default_voice.lock().clone(),
        };

        if let Err(e) = synth.speak(text, voice.as_ref(), prefs.rate, prefs.pitch) {
            warn!("Speech synthesis failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParleyError;

    /// Records every utterance it is asked to play
    struct RecordingSynth {
        voices: Vec<Voice>,
        speaking: bool,
        fail: bool,
        spoken: Arc<Mutex<Vec<(String, Option<String>, f32, f32)>>>,
    }

    impl RecordingSynth {
        fn new(voices: Vec<Voice>) -> (Self, Arc<Mutex<Vec<(String, Option<String>, f32, f32)>>>) {
            let spoken = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    voices,
                    speaking: false,
                    fail: false,
                    spoken: spoken.clone(),
                },
                spoken,
            )
        }
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(
            &mut self,
            text: &str,
            voice: Option<&Voice>,
            rate: f32,
            pitch: f32,
        ) -> Result<()> {
            if self.fail {
                return Err(ParleyError::SynthesisError("engine gone".into()));
            }
            self.spoken.lock().push((
                text.to_string(),
                voice.map(|v| v.id.clone()),
                rate,
                pitch,
            ));
            Ok(())
        }

        fn is_speaking(&self) -> bool {
            self.speaking
        }
    }

    fn active_flag(value: bool) -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(value))
    }

    fn sample_voices() -> Vec<Voice> {
        vec![
            Voice::new("fi-1", "Aino", "fi-FI"),
            Voice::new("en-1", "Daniel", "en-GB"),
            Voice::new("en-2", "Samantha", "en-US"),
        ]
    }

    #[test]
    fn test_voice_policy_prefers_english() {
        let (synth, _) = RecordingSynth::new(sample_voices());
        let speaker = Speaker::new(
            Some(Box::new(synth)),
            SharedVoicePrefs::new(),
            active_flag(true),
        );

        assert_eq!(speaker.current_voice().unwrap().id, "en-1");
    }

    #[test]
    fn test_voice_policy_falls_back_to_first() {
        let (synth, _) = RecordingSynth::new(vec![
            Voice::new("fi-1", "Aino", "fi-FI"),
            Voice::new("sv-1", "Alva", "sv-SE"),
        ]);
        let speaker = Speaker::new(
            Some(Box::new(synth)),
            SharedVoicePrefs::new(),
            active_flag(true),
        );

        assert_eq!(speaker.current_voice().unwrap().id, "fi-1");
    }

    #[test]
    fn test_speak_skipped_when_session_inactive() {
        let (synth, spoken) = RecordingSynth::new(sample_voices());
        let speaker = Speaker::new(
            Some(Box::new(synth)),
            SharedVoicePrefs::new(),
            active_flag(false),
        );

        speaker.speak("should be skipped");
        assert!(spoken.lock().is_empty());
    }

    #[test]
    fn test_speak_allowed_while_already_speaking() {
        let (mut synth, spoken) = RecordingSynth::new(sample_voices());
        synth.speaking = true;
        let speaker = Speaker::new(
            Some(Box::new(synth)),
            SharedVoicePrefs::new(),
            active_flag(false),
        );

        speaker.speak("queued behind the current utterance");
        assert_eq!(spoken.lock().len(), 1);
    }

    #[test]
    fn test_prefs_read_fresh_each_call() {
        let (synth, spoken) = RecordingSynth::new(sample_voices());
        let prefs = SharedVoicePrefs::new();
        let speaker = Speaker::new(Some(Box::new(synth)), prefs.clone(), active_flag(true));

        speaker.speak("first");
        prefs.set_rate(1.5);
        prefs.set_pitch(0.8);
        speaker.speak("second");

        let spoken = spoken.lock();
        assert_eq!(spoken[0].2, 1.0);
        assert_eq!(spoken[1].2, 1.5);
        assert_eq!(spoken[1].3, 0.8);
    }

    #[test]
    fn test_explicit_voice_selection() {
        let (synth, spoken) = RecordingSynth::new(sample_voices());
        let prefs = SharedVoicePrefs::new();
        prefs.set_voice_id(Some("fi-1".to_string()));
        let speaker = Speaker::new(Some(Box::new(synth)), prefs, active_flag(true));

        speaker.speak("terve");
        assert_eq!(spoken.lock()[0].1.as_deref(), Some("fi-1"));
    }

    #[test]
    fn test_synthesis_failure_swallowed() {
        let (mut synth, spoken) = RecordingSynth::new(sample_voices());
        synth.fail = true;
        let speaker = Speaker::new(
            Some(Box::new(synth)),
            SharedVoicePrefs::new(),
            active_flag(true),
        );

        // Must not panic or propagate
        speaker.speak("doomed");
        assert!(spoken.lock().is_empty());
    }

    #[test]
    fn test_no_capability_is_noop() {
        let speaker = Speaker::unavailable(SharedVoicePrefs::new(), active_flag(true));
        assert!(!speaker.has_capability());
        speaker.speak("nothing to hear");
        assert!(speaker.current_voice().is_none());
    }
}
