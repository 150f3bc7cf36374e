//! Read-aloud adapter
//!
//! `speak` is fire-and-forget: utterances go to a worker thread that plays
//! them one after another, in the order they were requested.

use crate::config::SpeechConfig;
use crate::{Result, VoiceChatError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, error, info, warn};

/// Something that can read text aloud without blocking the caller
pub trait Speaker {
    fn speak(&self, text: &str);
}

/// A voice that plays one utterance to completion
pub trait SpeechBackend {
    fn name(&self) -> &'static str;

    fn say(&mut self, text: &str) -> Result<()>;
}

/// Commands that can be sent to the speech pipeline
#[derive(Debug, Clone)]
pub enum SpeechCommand {
    /// Read text aloud
    Speak(String),

    /// Shutdown the pipeline
    Shutdown,
}

/// Events sent from the speech pipeline
#[derive(Debug, Clone)]
pub enum SpeechEvent {
    /// An utterance finished playing
    Spoken { chars: usize },

    /// An utterance could not be played
    Error(VoiceChatError),

    /// Worker has shut down
    Shutdown,
}

/// Speech pipeline with channel-based communication
pub struct SpeechPipeline {
    command_tx: Sender<SpeechCommand>,
    command_rx: Receiver<SpeechCommand>,
    event_tx: Sender<SpeechEvent>,
    event_rx: Receiver<SpeechEvent>,
}

impl SpeechPipeline {
    pub fn new(queue_size: usize) -> Self {
        let (command_tx, command_rx) = bounded(queue_size.max(1));
        let (event_tx, event_rx) = bounded(queue_size.max(1));

        Self {
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    pub fn command_sender(&self) -> Sender<SpeechCommand> {
        self.command_tx.clone()
    }

    pub fn event_receiver(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }

    /// Handle the UI uses to queue utterances
    pub fn output(&self) -> SpeechOutput {
        SpeechOutput {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Start the worker; `create` builds the voice on the worker thread
    /// since audio streams are tied to the thread that opened them.
    pub fn start_worker<F>(self, create: F) -> Result<thread::JoinHandle<()>>
    where
        F: FnOnce() -> Result<Box<dyn SpeechBackend>> + Send + 'static,
    {
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;

        thread::Builder::new()
            .name("speech-output".to_string())
            .spawn(move || {
                let mut backend = match create() {
                    Ok(backend) => backend,
                    Err(e) => {
                        error!("Failed to initialize voice: {}", e);
                        let _ = event_tx.try_send(SpeechEvent::Error(e));
                        let _ = event_tx.try_send(SpeechEvent::Shutdown);
                        return;
                    }
                };

                info!("Speech output ready ({})", backend.name());

                loop {
                    match command_rx.recv() {
                        Ok(SpeechCommand::Speak(text)) => {
                            if text.trim().is_empty() {
                                continue;
                            }
                            debug!("Speaking {} chars", text.len());

                            let event = match backend.say(&text) {
                                Ok(()) => SpeechEvent::Spoken { chars: text.len() },
                                Err(e) => {
                                    warn!("Speech output failed: {}", e);
                                    SpeechEvent::Error(e)
                                }
                            };
                            // Nobody may be listening for events; never block on them
                            let _ = event_tx.try_send(event);
                        }
                        Ok(SpeechCommand::Shutdown) => {
                            info!("Speech output shutting down");
                            let _ = event_tx.try_send(SpeechEvent::Shutdown);
                            break;
                        }
                        Err(_) => break,
                    }
                }

                info!("Speech output stopped");
            })
            .map_err(|e| VoiceChatError::ChannelError(format!("Failed to spawn worker: {}", e)))
    }
}

/// [`Speaker`] that queues utterances on a [`SpeechPipeline`]
#[derive(Clone)]
pub struct SpeechOutput {
    command_tx: Sender<SpeechCommand>,
}

impl Speaker for SpeechOutput {
    fn speak(&self, text: &str) {
        match self.command_tx.try_send(SpeechCommand::Speak(text.to_string())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Speech queue full, dropping utterance"),
            Err(TrySendError::Disconnected(_)) => warn!("Speech output is not running"),
        }
    }
}

/// The platform's own speech engine, driven through its command-line tool
pub struct SystemVoice {
    program: String,
    args: Vec<String>,
}

impl SystemVoice {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Use `speech.voice_command` when set, otherwise the platform default
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let command = config
            .voice_command
            .clone()
            .unwrap_or_else(default_voice_command);

        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| VoiceChatError::ConfigError("speech.voice_command is empty".into()))?;

        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SpeechBackend for SystemVoice {
    fn name(&self) -> &'static str {
        "system voice"
    }

    fn say(&mut self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VoiceChatError::SynthesisError(format!("Failed to run {}: {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(VoiceChatError::SynthesisError(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

fn default_voice_command() -> Vec<String> {
    let parts: &[&str] = if cfg!(target_os = "macos") {
        &["say", "-f", "-"]
    } else if cfg!(target_os = "windows") {
        &[
            "powershell",
            "-NoProfile",
            "-Command",
            "Add-Type -AssemblyName System.Speech; \
             (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak([Console]::In.ReadToEnd())",
        ]
    } else {
        &["espeak-ng", "--stdin"]
    };
    parts.iter().map(|s| s.to_string()).collect()
}

/// Build the configured voice
pub fn create_backend(config: &SpeechConfig) -> Result<Box<dyn SpeechBackend>> {
    #[cfg(feature = "sherpa-tts")]
    {
        if config.has_neural_voice() {
            return Ok(Box::new(super::neural::NeuralVoice::new(config)?));
        }
    }

    Ok(Box::new(SystemVoice::from_config(config)?))
}
