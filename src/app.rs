//! Assistant session
//!
//! The central context object: transcript, speech adapters, dispatcher,
//! image panel, and settings live here instead of ambient globals so every
//! component can be exercised in isolation. Also hosts the interactive
//! console loop used by the binary.

use crate::dispatch::{DispatchEvent, Dispatcher};
use crate::endpoint::{ChatEndpoint, ChatReply, HealthReply, HttpEndpoint, ImageReply, ImageStyle};
use crate::image::{ImagePanel, ImageState};
use crate::settings::Settings;
use crate::speech::{
    RecognizerEvent, SharedVoicePrefs, Speaker, SpeechRecognizer, SpeechSynthesizer, VoiceEvent,
    VoiceSession,
};
use crate::transcript::Transcript;
use crate::Result;
use async_trait::async_trait;
use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Greeting announced (and spoken, when the session allows) at startup
pub const WELCOME_MESSAGE: &str =
    "Welcome to Parley. I'm ready to help you with any questions or tasks you might have.";

const VOICE_UNSUPPORTED_MESSAGE: &str =
    "Voice recognition is not supported on this platform.";

/// Platform speech capabilities handed to the session at startup.
///
/// Either may be absent; the session degrades to notices instead of failing.
pub struct Capabilities {
    pub recognizer: Option<(Box<dyn SpeechRecognizer>, Receiver<RecognizerEvent>)>,
    pub synthesizer: Option<Box<dyn SpeechSynthesizer>>,
}

impl Capabilities {
    /// No platform speech at all (headless environments)
    pub fn none() -> Self {
        Self {
            recognizer: None,
            synthesizer: None,
        }
    }
}

/// Endpoint wrapper that can be re-pointed while the session is running.
///
/// The dispatcher and image panel hold this; a settings change swaps the
/// inner client without rebuilding them.
struct SwitchableEndpoint {
    inner: RwLock<Arc<dyn ChatEndpoint>>,
}

impl SwitchableEndpoint {
    fn new(inner: Arc<dyn ChatEndpoint>) -> Self {
        Self {
            inner: RwLock::new(inner),
        }
    }

    fn replace(&self, inner: Arc<dyn ChatEndpoint>) {
        *self.inner.write() = inner;
    }

    fn current(&self) -> Arc<dyn ChatEndpoint> {
        self.inner.read().clone()
    }
}

#[async_trait]
impl ChatEndpoint for SwitchableEndpoint {
    async fn chat(&self, message: &str) -> Result<ChatReply> {
        self.current().chat(message).await
    }

    async fn generate_image(&self, prompt: &str, style: ImageStyle) -> Result<ImageReply> {
        self.current().generate_image(prompt, style).await
    }

    async fn health(&self) -> Result<HealthReply> {
        self.current().health().await
    }
}

/// One running assistant session
pub struct Assistant {
    settings: Settings,
    endpoint: Arc<SwitchableEndpoint>,
    transcript: Transcript,
    dispatcher: Arc<Dispatcher>,
    images: ImagePanel,
    voice: VoiceSession,
    voice_worker: Option<JoinHandle<()>>,
    speaker: Arc<Speaker>,
    prefs: SharedVoicePrefs,
    input_text: String,
    image_style: ImageStyle,
}

impl Assistant {
    /// Build a session against the endpoint from `settings`
    pub fn new(settings: Settings, capabilities: Capabilities) -> Self {
        let endpoint: Arc<dyn ChatEndpoint> = Arc::new(HttpEndpoint::new(&settings.endpoint));
        Self::with_endpoint(endpoint, settings, capabilities)
    }

    /// Build a session against an explicit endpoint implementation
    pub fn with_endpoint(
        endpoint: Arc<dyn ChatEndpoint>,
        settings: Settings,
        capabilities: Capabilities,
    ) -> Self {
        let endpoint = Arc::new(SwitchableEndpoint::new(endpoint));
        let transcript = Transcript::new();

        let (voice, voice_worker) = match capabilities.recognizer {
            Some((recognizer, recognizer_rx)) => {
                let (session, worker) = VoiceSession::start(recognizer, recognizer_rx);
                (session, Some(worker))
            }
            None => (VoiceSession::without_capability(), None),
        };

        let prefs = SharedVoicePrefs::new();
        let speaker = Arc::new(Speaker::new(
            capabilities.synthesizer,
            prefs.clone(),
            voice.active_flag(),
        ));

        let dispatcher = Arc::new(Dispatcher::new(
            endpoint.clone(),
            transcript.clone(),
            speaker.clone(),
        ));
        let images = ImagePanel::new(endpoint.clone(), dispatcher.clone());

        Self {
            settings,
            endpoint,
            transcript,
            dispatcher,
            images,
            voice,
            voice_worker,
            speaker,
            prefs,
            input_text: String::new(),
            image_style: ImageStyle::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn images(&self) -> &ImagePanel {
        &self.images
    }

    pub fn voice(&self) -> &VoiceSession {
        &self.voice
    }

    pub fn speaker(&self) -> &Arc<Speaker> {
        &self.speaker
    }

    pub fn prefs(&self) -> &SharedVoicePrefs {
        &self.prefs
    }

    pub fn image_style(&self) -> ImageStyle {
        self.image_style
    }

    pub fn set_image_style(&mut self, style: ImageStyle) {
        self.image_style = style;
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    /// Announce the startup greeting
    pub fn greet(&self) {
        self.dispatcher.announce(WELCOME_MESSAGE);
    }

    /// Probe the service's health route and log the outcome
    pub async fn probe_health(&self) {
        match self.endpoint.health().await {
            Ok(health) => info!(
                "Connected to {} {} ({})",
                health.service, health.version, health.status
            ),
            Err(e) => warn!("Assistant service unreachable: {e}"),
        }
    }

    /// Submit the current input field: trim, clear, dispatch.
    ///
    /// Whitespace-only input is left in place and nothing is sent.
    pub async fn submit_input(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.input_text.clear();
        self.dispatcher.send(&text).await;
    }

    /// Send a message directly (voice utterances, tests)
    pub async fn send_message(&self, text: &str) {
        self.dispatcher.send(text).await;
    }

    /// Request an image with the panel's current style
    pub async fn generate_image(&self, prompt: &str) -> Result<()> {
        self.images.generate(prompt, self.image_style).await
    }

    /// Flip the voice session; reports unavailability as a chat notice.
    /// Returns the new `active` value.
    pub fn toggle_voice(&self) -> bool {
        match self.voice.toggle() {
            Ok(active) => {
                info!("Voice session {}", if active { "on" } else { "off" });
                active
            }
            Err(e) => {
                warn!("Voice toggle failed: {e}");
                self.dispatcher.announce(VOICE_UNSUPPORTED_MESSAGE);
                false
            }
        }
    }

    /// Drain pending voice events; returns utterances awaiting submission
    pub fn poll_voice(&self) -> Vec<String> {
        let mut utterances = Vec::new();
        while let Some(event) = self.voice.try_recv_event() {
            match event {
                VoiceEvent::Utterance(text) => utterances.push(text),
                VoiceEvent::Notice(message) => self.dispatcher.announce(message),
                VoiceEvent::Activated => info!("Listening..."),
                VoiceEvent::Deactivated => info!("Voice session inactive"),
            }
        }
        utterances
    }

    /// Drain voice events and submit any recognized utterances
    pub async fn pump_voice(&self) {
        for utterance in self.poll_voice() {
            self.dispatcher.send(&utterance).await;
        }
    }

    pub fn clear_chat(&self) {
        self.dispatcher.clear();
    }

    /// Re-point the session at a new endpoint and persist the choice
    pub fn set_endpoint(&mut self, url: &str) {
        self.settings.update_endpoint(url);
        self.endpoint.replace(Arc::new(HttpEndpoint::new(url)));
        info!("Endpoint changed to {url}");
    }

    /// Stop the voice worker, if any
    pub fn shutdown(&mut self) {
        if self.voice.is_available() {
            if let Err(e) = self.voice.shutdown() {
                warn!("Voice session shutdown failed: {e}");
            }
        }
        if let Some(worker) = self.voice_worker.take() {
            if worker.join().is_err() {
                error!("Voice session worker panicked");
            }
        }
    }
}

/// Interactive console loop for the binary.
///
/// Plain lines are chat messages; `:`-prefixed lines are commands
/// (`:help` lists them).
pub async fn run_console(mut assistant: Assistant) -> Result<()> {
    let events = assistant.dispatcher().event_receiver();

    assistant.probe_health().await;
    assistant.greet();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        render_events(&events);

        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut assistant, line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tick.tick() => {
                assistant.pump_voice().await;
            }
        }
    }

    render_events(&events);
    assistant.shutdown();
    Ok(())
}

/// Print pending dispatch events to the console
fn render_events(events: &Receiver<DispatchEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            DispatchEvent::UserTurn(turn) => println!("you> {}", turn.text),
            DispatchEvent::TypingStarted => println!("bot is typing..."),
            DispatchEvent::TypingCleared => {}
            DispatchEvent::BotTurn(turn) => println!("bot> {}", turn.text),
        }
    }
}

/// Handle one console line. Returns false to quit.
async fn handle_line(assistant: &mut Assistant, line: &str) -> bool {
    match line {
        "" => {}
        ":quit" | ":q" => return false,
        ":help" => print_help(),
        ":clear" => assistant.clear_chat(),
        ":voice" => {
            assistant.toggle_voice();
        }
        command if command.starts_with(':') => {
            let (name, arg) = match command.split_once(' ') {
                Some((name, arg)) => (name, arg.trim()),
                None => (command, ""),
            };
            handle_command(assistant, name, arg).await;
        }
        text => {
            assistant.set_input(text);
            assistant.submit_input().await;
        }
    }
    true
}

async fn handle_command(assistant: &mut Assistant, name: &str, arg: &str) {
    match name {
        ":image" => {
            match assistant.generate_image(arg).await {
                Ok(()) => render_image_state(&assistant.images().state()),
                Err(e) => println!("! {}", e.user_message()),
            }
        }
        ":style" => match arg.parse::<ImageStyle>() {
            Ok(style) => assistant.set_image_style(style),
            Err(e) => println!("! {e}"),
        },
        ":endpoint" => {
            if arg.is_empty() {
                println!("endpoint: {}", assistant.settings().endpoint);
            } else {
                assistant.set_endpoint(arg);
            }
        }
        ":rate" => match arg.parse::<f32>() {
            Ok(rate) => assistant.prefs().set_rate(rate),
            Err(_) => println!("! rate must be a number"),
        },
        ":pitch" => match arg.parse::<f32>() {
            Ok(pitch) => assistant.prefs().set_pitch(pitch),
            Err(_) => println!("! pitch must be a number"),
        },
        other => println!("! unknown command {other} (try :help)"),
    }
}

fn render_image_state(state: &ImageState) {
    match state {
        ImageState::Ready(result) => {
            println!("image: {}", result.image_url);
            println!(
                "  prompt: {} | style: {} | generated: {}",
                result.prompt,
                result.style,
                result.generated_at.format("%H:%M:%S")
            );
            if let Some(note) = &result.note {
                println!("  note: {note}");
            }
        }
        ImageState::Failed { message } => println!("! {message}"),
        ImageState::Loading | ImageState::Empty => {}
    }
}

fn print_help() {
    println!("commands:");
    println!("  :image <prompt>    generate an image with the current style");
    println!("  :style <name>      image style (realistic, anime, digital-art, cartoon)");
    println!("  :voice             toggle the voice session");
    println!("  :rate <n>          speech rate (1.0 = normal)");
    println!("  :pitch <n>         speech pitch (1.0 = normal)");
    println!("  :endpoint [url]    show or change the assistant endpoint");
    println!("  :clear             clear the chat");
    println!("  :quit              exit");
}
