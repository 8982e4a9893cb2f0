//! Speech input adapter
//!
//! The platform recognition capability is single-shot: one `begin_utterance`
//! yields at most one result and then ends. Continuous listening is modeled
//! on top of it by a session worker that re-enters listening after a short
//! fixed delay whenever an attempt ends while the session is still active.
//!
//! State machine per attempt: Inactive -> Listening -> (Result | Error | Ended).
//! Recognition errors are non-fatal: they produce a user-visible notice and
//! revert the display state; the session itself stays active.

use crate::{ParleyError, Result};
use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Delay before re-entering listening after a recognition attempt ends
pub const RESTART_DELAY: Duration = Duration::from_millis(500);

/// Events delivered by a recognition capability.
///
/// Implementations emit `Ended` when an attempt finishes, after any
/// `Result` or `Error` for that attempt.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// A complete utterance was recognized
    Result(String),
    /// The attempt failed (transient)
    Error(String),
    /// The attempt is over; no further events for it will arrive
    Ended,
}

/// Platform speech-recognition capability (single-shot)
pub trait SpeechRecognizer: Send {
    /// Begin listening for a single utterance
    fn begin_utterance(&mut self) -> Result<()>;

    /// Stop listening immediately
    fn halt(&mut self);
}

/// Listening display state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListenState {
    /// No recognition in flight
    #[default]
    Inactive,
    /// A recognition attempt is in flight
    Listening,
}

impl ListenState {
    pub fn is_listening(&self) -> bool {
        matches!(self, ListenState::Listening)
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self, ListenState::Inactive)
    }
}

impl std::fmt::Display for ListenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenState::Inactive => write!(f, "Inactive"),
            ListenState::Listening => write!(f, "Listening"),
        }
    }
}

/// Pure voice-session state transitions
///
/// `active` is the user-facing on/off switch; `listen` tracks whether a
/// recognition attempt is in flight. At most one attempt is in flight at a
/// time: callers must check `listen` before starting another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceSessionState {
    pub listen: ListenState,
    pub active: bool,
}

impl VoiceSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the session on
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Turn the session off and drop any in-flight display state
    pub fn deactivate(&mut self) {
        self.active = false;
        self.listen = ListenState::Inactive;
    }

    /// A recognition attempt has started
    pub fn on_listening(&mut self) {
        self.listen = ListenState::Listening;
    }

    /// A result arrived; the attempt is still in flight until `Ended`
    pub fn on_result(&mut self) {}

    /// The attempt failed; revert to the inactive display, session continues
    pub fn on_error(&mut self) {
        self.listen = ListenState::Inactive;
    }

    /// The attempt ended. Returns true when listening should be re-entered
    /// (the session is still active).
    pub fn on_ended(&mut self) -> bool {
        self.listen = ListenState::Inactive;
        self.active
    }
}

/// Commands accepted by the session worker
#[derive(Debug, Clone)]
pub enum VoiceCommand {
    /// Begin continuous listening
    Start,
    /// Stop listening
    Stop,
    /// Shut down the worker
    Shutdown,
}

/// Events emitted by the voice session
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    /// The session turned on and is listening
    Activated,
    /// The session turned off
    Deactivated,
    /// A complete utterance was recognized; the owner submits it as a message
    Utterance(String),
    /// A user-visible notice (recognition trouble, capability problems)
    Notice(String),
}

/// Handle for the voice session
///
/// Owns the shared `active` flag consulted by the speech output adapter.
/// When no recognition capability is present the handle still exists, but
/// toggling reports unavailability and leaves state unchanged.
pub struct VoiceSession {
    command_tx: Option<Sender<VoiceCommand>>,
    event_rx: Receiver<VoiceEvent>,
    active: Arc<AtomicBool>,
}

impl VoiceSession {
    /// Start the session worker around a recognition capability.
    ///
    /// `recognizer_rx` carries the capability's events; the capability
    /// implementation holds the sending side.
    pub fn start(
        recognizer: Box<dyn SpeechRecognizer>,
        recognizer_rx: Receiver<RecognizerEvent>,
    ) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(64);
        let active = Arc::new(AtomicBool::new(false));

        let worker = VoiceSessionWorker {
            recognizer,
            command_rx,
            recognizer_rx,
            event_tx,
            state: VoiceSessionState::new(),
            active: active.clone(),
        };
        let handle = thread::spawn(move || worker.run());

        (
            Self {
                command_tx: Some(command_tx),
                event_rx,
                active,
            },
            handle,
        )
    }

    /// Build a session without a recognition capability
    pub fn without_capability() -> Self {
        let (_, event_rx) = bounded(1);
        Self {
            command_tx: None,
            event_rx,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.command_tx.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Shared flag consulted by the speech output adapter
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }

    /// Turn continuous listening on
    pub fn activate(&self) -> Result<()> {
        let tx = self.command_tx()?;
        self.active.store(true, Ordering::SeqCst);
        tx.send(VoiceCommand::Start)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to send start: {e}")))
    }

    /// Turn continuous listening off
    pub fn deactivate(&self) -> Result<()> {
        let tx = self.command_tx()?;
        self.active.store(false, Ordering::SeqCst);
        tx.send(VoiceCommand::Stop)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to send stop: {e}")))
    }

    /// Flip the session on/off. Returns the new `active` value.
    pub fn toggle(&self) -> Result<bool> {
        if self.is_active() {
            self.deactivate()?;
            Ok(false)
        } else {
            self.activate()?;
            Ok(true)
        }
    }

    /// Request worker shutdown
    pub fn shutdown(&self) -> Result<()> {
        let tx = self.command_tx()?;
        tx.send(VoiceCommand::Shutdown)
            .map_err(|e| ParleyError::ChannelError(format!("Failed to send shutdown: {e}")))
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<VoiceEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a receiver for session events
    pub fn event_receiver(&self) -> Receiver<VoiceEvent> {
        self.event_rx.clone()
    }

    fn command_tx(&self) -> Result<&Sender<VoiceCommand>> {
        self.command_tx.as_ref().ok_or_else(|| {
            ParleyError::CapabilityUnavailable("speech recognition".to_string())
        })
    }
}

/// Worker that drives the recognition capability in a dedicated thread
struct VoiceSessionWorker {
    recognizer: Box<dyn SpeechRecognizer>,
    command_rx: Receiver<VoiceCommand>,
    recognizer_rx: Receiver<RecognizerEvent>,
    event_tx: Sender<VoiceEvent>,
    state: VoiceSessionState,
    active: Arc<AtomicBool>,
}

impl VoiceSessionWorker {
    fn run(mut self) {
        info!("Voice session worker starting");

        let command_rx = self.command_rx.clone();
        let recognizer_rx = self.recognizer_rx.clone();

        // Pending auto-restart timer, armed when an attempt ends while active
        let mut restart: Option<Receiver<Instant>> = None;

        loop {
            let restart_rx = restart.clone().unwrap_or_else(never);

            select! {
                recv(command_rx) -> cmd => match cmd {
                    Ok(VoiceCommand::Start) => {
                        restart = None;
                        self.handle_start();
                    }
                    Ok(VoiceCommand::Stop) => {
                        restart = None;
                        self.handle_stop();
                    }
                    Ok(VoiceCommand::Shutdown) | Err(_) => {
                        self.recognizer.halt();
                        break;
                    }
                },

                recv(recognizer_rx) -> event => match event {
                    Ok(RecognizerEvent::Result(text)) => {
                        debug!("Recognized utterance: '{text}'");
                        self.state.on_result();
                        // Forwarded even if the session was toggled off while
                        // the result was pending
                        self.emit(VoiceEvent::Utterance(text));
                    }
                    Ok(RecognizerEvent::Error(error)) => {
                        warn!("Speech recognition error: {error}");
                        self.state.on_error();
                        self.emit(VoiceEvent::Notice(
                            ParleyError::RecognitionError(error).user_message(),
                        ));
                    }
                    Ok(RecognizerEvent::Ended) => {
                        if self.state.on_ended() {
                            debug!("Recognition ended while active, scheduling restart");
                            restart = Some(after(RESTART_DELAY));
                        }
                    }
                    Err(_) => {
                        warn!("Recognition capability disconnected");
                        break;
                    }
                },

                recv(restart_rx) -> _ => {
                    restart = None;
                    if self.state.active {
                        self.begin_listening(false);
                    }
                }
            }
        }

        info!("Voice session worker stopped");
    }

    fn handle_start(&mut self) {
        self.state.activate();
        self.begin_listening(true);
    }

    fn handle_stop(&mut self) {
        self.state.deactivate();
        self.recognizer.halt();
        self.emit(VoiceEvent::Deactivated);
    }

    /// Begin one recognition attempt; `announce` emits `Activated` on success
    fn begin_listening(&mut self, announce: bool) {
        if self.state.listen.is_listening() {
            // One attempt in flight at a time
            return;
        }

        match self.recognizer.begin_utterance() {
            Ok(()) => {
                self.state.on_listening();
                if announce {
                    self.emit(VoiceEvent::Activated);
                }
            }
            Err(e) => {
                warn!("Failed to start recognition: {e}");
                self.state.deactivate();
                self.active.store(false, Ordering::SeqCst);
                self.emit(VoiceEvent::Notice(e.user_message()));
                self.emit(VoiceEvent::Deactivated);
            }
        }
    }

    fn emit(&self, event: VoiceEvent) {
        if let Err(e) = self.event_tx.send(event) {
            warn!("Failed to emit voice event: {e}");
        }
    }
}
