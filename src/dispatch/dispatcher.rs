use crate::endpoint::ChatEndpoint;
use crate::speech::Speaker;
use crate::transcript::{Transcript, Turn};
use crossbeam_channel::{bounded, Receiver, Sender};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Canned replies substituted when the chat endpoint cannot be reached
pub const FALLBACK_REPLIES: [&str; 3] = [
    "I'm having trouble connecting to my neural network. Let me think... Based on my offline knowledge, I'd say that's an interesting question!",
    "It seems I'm experiencing some connectivity issues. Let me give you a general answer while I work on fixing this.",
    "While I reconnect to my main servers, here's what I think about that...",
];

/// Bot confirmation shown after the transcript is cleared
pub const CLEARED_MESSAGE: &str = "Chat cleared. How can I assist you now?";

/// Pick one fallback reply uniformly at random
pub fn fallback_reply() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..FALLBACK_REPLIES.len());
    FALLBACK_REPLIES[idx]
}

/// Transient "the bot is typing" indicator.
///
/// A depth counter rather than a flag: overlapping sends each raise and
/// lower it exactly once, and no send can clear another's indicator early.
#[derive(Clone, Debug, Default)]
pub struct TypingIndicator {
    depth: Arc<AtomicUsize>,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Events emitted by the dispatcher for UI updates
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A user turn was appended
    UserTurn(Turn),
    /// The typing indicator went up
    TypingStarted,
    /// The typing indicator came down
    TypingCleared,
    /// A bot turn was appended (reply, notice, or fallback)
    BotTurn(Turn),
}

/// Message dispatcher for the chat endpoint.
///
/// Every `send` appends exactly one bot turn — the service reply, the
/// service-reported error, or a canned fallback — and raises/lowers the
/// typing indicator exactly once around it. There are no retries; a failed
/// request is masked by the fallback and never surfaced raw.
pub struct Dispatcher {
    endpoint: Arc<dyn ChatEndpoint>,
    transcript: Transcript,
    speaker: Arc<Speaker>,
    typing: TypingIndicator,
    event_tx: Sender<DispatchEvent>,
    event_rx: Receiver<DispatchEvent>,
}

impl Dispatcher {
    pub fn new(
        endpoint: Arc<dyn ChatEndpoint>,
        transcript: Transcript,
        speaker: Arc<Speaker>,
    ) -> Self {
        let (event_tx, event_rx) = bounded(256);
        Self {
            endpoint,
            transcript,
            speaker,
            typing: TypingIndicator::new(),
            event_tx,
            event_rx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn typing(&self) -> &TypingIndicator {
        &self.typing
    }

    /// Get a receiver for dispatch events
    pub fn event_receiver(&self) -> Receiver<DispatchEvent> {
        self.event_rx.clone()
    }

    /// Send a user message to the chat endpoint.
    ///
    /// Empty or whitespace-only input is ignored: no request, no turns.
    /// Concurrent calls race independently; each appends its own bot turn
    /// when its response arrives.
    pub async fn send(&self, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            debug!("Ignoring empty message");
            return;
        }

        let user_turn = Turn::user(text);
        self.transcript.add(user_turn.clone());
        self.emit(DispatchEvent::UserTurn(user_turn));

        self.typing.begin();
        self.emit(DispatchEvent::TypingStarted);

        let bot_text = match self.endpoint.chat(text).await {
            Ok(reply) => match reply.bot_text() {
                Some(text) => text.to_string(),
                None => {
                    warn!("Malformed chat reply: neither response nor error present");
                    fallback_reply().to_string()
                }
            },
            Err(e) => {
                warn!("Chat request failed: {e}");
                fallback_reply().to_string()
            }
        };

        // The indicator comes down exactly once, before the reply is shown
        self.typing.end();
        self.emit(DispatchEvent::TypingCleared);

        let bot_turn = Turn::bot(bot_text.clone());
        self.transcript.add(bot_turn.clone());
        self.emit(DispatchEvent::BotTurn(bot_turn));
        self.speaker.speak(&bot_text);
    }

    /// Display primitive: append a bot turn and speak it, no network.
    ///
    /// Used for chat notices and by the image panel's confirmations.
    pub fn announce(&self, text: impl Into<String>) {
        let text = text.into();
        let turn = Turn::bot(text.clone());
        self.transcript.add(turn.clone());
        self.emit(DispatchEvent::BotTurn(turn));
        self.speaker.speak(&text);
    }

    /// Discard the transcript wholesale and confirm
    pub fn clear(&self) {
        self.transcript.clear();
        self.announce(CLEARED_MESSAGE);
    }

    fn emit(&self, event: DispatchEvent) {
        if self.event_tx.try_send(event).is_err() {
            debug!("Dispatch event dropped (receiver not draining)");
        }
    }
}
