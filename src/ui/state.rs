//! Application state management
//!
//! `AppState` is the single owner of the conversation and of everything the
//! view shows. Backend workers are reached only through channels.

use crate::chat::{ChatCommand, ChatEvent};
use crate::clipboard::{ClipboardSink, ClipboardState};
use crate::config::AppConfig;
use crate::messages::{Message, MessageStorage};
use crate::speech::{ListenOptions, SpeechEvent, Speaker, Transcriber};
use crate::CHAT_ERROR_MESSAGE;
use crossbeam_channel::{Receiver, Sender};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A submitted message waiting for its reply
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub request_id: Uuid,
    pub text: String,
}

/// Central application state
pub struct AppState {
    /// Conversation for this session
    pub messages: MessageStorage,

    /// Current text input
    pub input_text: String,

    /// Input content came from speech recognition
    pub voice_transcribed: bool,

    /// Request in flight, if any
    pub pending: Option<PendingRequest>,

    /// Last error message shown in the banner
    pub last_error: Option<String>,

    /// Most recently submitted text, target of the Copy button
    pub text_to_copy: String,

    /// Whether the chat history sidebar is visible
    pub show_sidebar: bool,

    /// Read replies aloud as they arrive
    pub speak_replies: bool,

    pub clipboard: ClipboardState,

    pub listen_options: ListenOptions,

    transcriber: Box<dyn Transcriber>,

    /// Transcript seen on the previous frame
    last_transcript: String,

    speaker: Option<Box<dyn Speaker>>,

    /// Channel to send chat commands
    pub chat_command_tx: Option<Sender<ChatCommand>>,

    /// Channel to receive chat events
    pub chat_event_rx: Option<Receiver<ChatEvent>>,

    /// Channel to receive speech output events
    pub speech_event_rx: Option<Receiver<SpeechEvent>>,
}

impl AppState {
    /// Create a new application state around a recognizer
    pub fn new(transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            messages: MessageStorage::new(),
            input_text: String::new(),
            voice_transcribed: false,
            pending: None,
            last_error: None,
            text_to_copy: String::new(),
            show_sidebar: false,
            speak_replies: false,
            clipboard: ClipboardState::default(),
            listen_options: ListenOptions::default(),
            transcriber,
            last_transcript: String::new(),
            speaker: None,
            chat_command_tx: None,
            chat_event_rx: None,
            speech_event_rx: None,
        }
    }

    /// Create state with the UI, clipboard and listening settings from `config`
    pub fn from_config(config: &AppConfig, transcriber: Box<dyn Transcriber>) -> Self {
        let mut state = Self::new(transcriber);
        state.show_sidebar = config.ui.show_sidebar;
        state.speak_replies = config.ui.speak_replies;
        state.clipboard = ClipboardState::new(config.clipboard.success_duration());
        state.listen_options = ListenOptions::from(&config.speech);
        state
    }

    pub fn with_chat(mut self, command_tx: Sender<ChatCommand>, event_rx: Receiver<ChatEvent>) -> Self {
        self.chat_command_tx = Some(command_tx);
        self.chat_event_rx = Some(event_rx);
        self
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_speech_events(mut self, event_rx: Receiver<SpeechEvent>) -> Self {
        self.speech_event_rx = Some(event_rx);
        self
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.transcriber.is_listening()
    }

    /// Listening, or still finishing recognition after a stop
    pub fn is_transcribing(&self) -> bool {
        self.transcriber.is_busy()
    }

    pub fn is_speech_supported(&self) -> bool {
        self.transcriber.is_supported()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input_text.trim().is_empty()
    }

    /// Send the current input to the chatbot
    pub fn submit(&mut self) {
        if self.is_loading() {
            debug!("Submit ignored, a request is already pending");
            return;
        }

        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }

        self.text_to_copy = text.clone();
        self.reset_input();
        self.last_error = None;

        let request_id = Uuid::new_v4();
        let sent = match &self.chat_command_tx {
            Some(tx) => tx
                .send(ChatCommand::Send {
                    message: text.clone(),
                    request_id,
                })
                .map_err(|e| e.to_string()),
            None => Err("chat pipeline not connected".to_string()),
        };

        match sent {
            Ok(()) => {
                debug!("Submitted request {}", request_id);
                self.pending = Some(PendingRequest { request_id, text });
            }
            Err(e) => {
                warn!("Failed to submit message: {}", e);
                self.last_error = Some(CHAT_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Clear the input field and the transcript behind it
    pub fn clear_input(&mut self) {
        self.reset_input();
    }

    /// The user typed into the input field
    pub fn on_manual_edit(&mut self) {
        self.voice_transcribed = false;
    }

    pub fn start_listening(&mut self) {
        match self.transcriber.start(&self.listen_options) {
            Ok(()) => info!("Listening ({})", self.listen_options.locale),
            Err(e) => warn!("Failed to start listening: {}", e),
        }
    }

    pub fn stop_listening(&mut self) {
        self.transcriber.stop();
        info!("Stopped listening");
    }

    /// Copy the most recently submitted text
    pub fn copy_to_clipboard(&mut self, sink: &dyn ClipboardSink, now: Instant) {
        self.clipboard.copy(sink, &self.text_to_copy, now);
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.clipboard.is_copied(now)
    }

    /// Remove one message; returns false for unknown identifiers
    pub fn delete_message(&mut self, id: Uuid) -> bool {
        self.messages.remove(id)
    }

    pub fn delete_conversation(&mut self) {
        self.messages.clear();
        info!("Conversation deleted");
    }

    /// Read one stored message aloud
    pub fn speak_message(&self, id: Uuid) -> bool {
        let Some(message) = self.messages.get(id) else {
            return false;
        };
        self.speak(&message.content);
        true
    }

    /// Process incoming events from backend channels and the recognizer
    pub fn poll_events(&mut self) {
        self.sync_transcript();

        let events: Vec<ChatEvent> = match &self.chat_event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in events {
            self.handle_chat_event(event);
        }

        if let Some(rx) = &self.speech_event_rx {
            for event in rx.try_iter() {
                match event {
                    SpeechEvent::Spoken { chars } => debug!("Spoke {} chars", chars),
                    SpeechEvent::Error(e) => warn!("Read-aloud failed: {}", e),
                    SpeechEvent::Shutdown => debug!("Speech output shut down"),
                }
            }
        }
    }

    /// Ask every connected worker to stop
    pub fn shutdown(&mut self) {
        if self.is_listening() {
            self.transcriber.stop();
        }
        if let Some(tx) = &self.chat_command_tx {
            let _ = tx.send(ChatCommand::Shutdown);
        }
    }

    fn handle_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Reply { request_id, text } => {
                let Some(pending) = self.take_pending(request_id) else {
                    debug!("Ignoring reply for stale request {}", request_id);
                    return;
                };
                self.messages
                    .add_exchange(Message::user(pending.text), Message::assistant(text.clone()));
                if self.speak_replies {
                    self.speak(&text);
                }
            }
            ChatEvent::Error { request_id, error } => {
                if self.take_pending(request_id).is_none() {
                    debug!("Ignoring error for stale request {}", request_id);
                    return;
                }
                warn!("Chat request failed: {}", error);
                self.last_error = Some(error.user_message());
            }
            ChatEvent::Shutdown => {
                info!("Chat pipeline shut down");
                if self.pending.take().is_some() {
                    self.last_error = Some(CHAT_ERROR_MESSAGE.to_string());
                }
            }
        }
    }

    fn take_pending(&mut self, request_id: Uuid) -> Option<PendingRequest> {
        match &self.pending {
            Some(pending) if pending.request_id == request_id => self.pending.take(),
            _ => None,
        }
    }

    /// Mirror a changed transcript into the input field
    fn sync_transcript(&mut self) {
        let transcript = self.transcriber.transcript();
        if transcript == self.last_transcript {
            return;
        }
        if !transcript.is_empty() {
            self.input_text = transcript.clone();
            self.voice_transcribed = true;
        }
        self.last_transcript = transcript;
    }

    fn reset_input(&mut self) {
        self.input_text.clear();
        self.voice_transcribed = false;
        self.transcriber.reset();
        self.last_transcript.clear();
    }

    fn speak(&self, text: &str) {
        match &self.speaker {
            Some(speaker) => speaker.speak(text),
            None => debug!("No speech output connected"),
        }
    }
}
