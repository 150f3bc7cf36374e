//! Live recognition with Whisper on microphone audio

use crate::audio::{resample_mono, MicrophoneInput, SPEECH_SAMPLE_RATE};
use crate::config::{language_for_locale, SpeechConfig};
use crate::speech::transcription::{
    ListenOptions, LiveTranscript, SharedTranscript, Transcriber, TranscriptBuffer,
};
use crate::{Result, VoiceChatError};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper model wrapper
pub struct WhisperEngine {
    context: WhisperContext,
    n_threads: i32,
}

impl WhisperEngine {
    pub fn new(model_path: &Path, n_threads: i32) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", model_path);

        if !model_path.exists() {
            return Err(VoiceChatError::ModelLoadError(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        let path = model_path
            .to_str()
            .ok_or_else(|| VoiceChatError::ModelLoadError("Invalid model path".to_string()))?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                VoiceChatError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e))
            })?;

        info!("Whisper model loaded");
        Ok(Self { context, n_threads })
    }

    /// Recognize 16 kHz mono samples
    pub fn transcribe(&self, samples: &[f32], language: &str) -> Result<String> {
        if samples.is_empty() {
            return Ok(String::new());
        }

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some(language));

        let mut state = self.context.create_state().map_err(|e| {
            VoiceChatError::TranscriptionError(format!("Failed to create state: {:?}", e))
        })?;

        state.full(params, samples).map_err(|e| {
            VoiceChatError::TranscriptionError(format!("Transcription failed: {:?}", e))
        })?;

        let num_segments = state.full_n_segments().map_err(|e| {
            VoiceChatError::TranscriptionError(format!("Failed to get segments: {:?}", e))
        })?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                VoiceChatError::TranscriptionError(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

/// Control messages for the recognition worker
#[derive(Debug)]
enum RecognitionCommand {
    Start {
        options: ListenOptions,
        generation: u64,
    },
    Stop,
    Reset {
        generation: u64,
    },
    Shutdown,
}

/// Session state owned by the recognition worker
struct Session {
    buffer: TranscriptBuffer,
    language: String,
    generation: u64,
}

/// Microphone + Whisper implementation of [`Transcriber`]
pub struct WhisperTranscriber {
    microphone: MicrophoneInput,
    audio_tx: Sender<Vec<f32>>,
    command_tx: Sender<RecognitionCommand>,
    transcript: SharedTranscript,
    /// Set while a session is open, cleared by the worker once it has published its last words
    session_open: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl WhisperTranscriber {
    /// Open the microphone, load the model and start the worker
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let microphone = MicrophoneInput::new()?;
        let engine = WhisperEngine::new(&config.whisper_model_path, config.n_threads)?;

        let (audio_tx, audio_rx) = bounded(256);
        let (command_tx, command_rx) = bounded(16);
        let transcript = LiveTranscript::shared();
        let session_open = Arc::new(AtomicBool::new(false));

        let worker = spawn_worker(
            engine,
            config,
            microphone.sample_rate(),
            microphone.capture_flag(),
            Arc::clone(&session_open),
            Arc::clone(&transcript),
            audio_rx,
            command_rx,
        )?;

        Ok(Self {
            microphone,
            audio_tx,
            command_tx,
            transcript,
            session_open,
            worker: Some(worker),
        })
    }

    fn send(&self, command: RecognitionCommand) {
        if let Err(e) = self.command_tx.send(command) {
            warn!("Recognition worker unavailable: {}", e);
        }
    }
}

impl Transcriber for WhisperTranscriber {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&mut self, options: &ListenOptions) -> Result<()> {
        let generation = self.transcript.lock().generation();
        self.session_open.store(true, Ordering::SeqCst);
        self.send(RecognitionCommand::Start {
            options: options.clone(),
            generation,
        });
        self.microphone.start(self.audio_tx.clone())
    }

    fn stop(&mut self) {
        self.microphone.stop();
        self.send(RecognitionCommand::Stop);
    }

    fn reset(&mut self) {
        let generation = self.transcript.lock().reset();
        self.send(RecognitionCommand::Reset { generation });
    }

    fn transcript(&self) -> String {
        self.transcript.lock().text().to_string()
    }

    fn is_listening(&self) -> bool {
        self.microphone.is_capturing()
    }

    fn is_busy(&self) -> bool {
        self.is_listening() || self.session_open.load(Ordering::SeqCst)
    }
}

impl Drop for WhisperTranscriber {
    fn drop(&mut self) {
        self.microphone.stop();
        let _ = self.command_tx.send(RecognitionCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker(
    engine: WhisperEngine,
    config: SpeechConfig,
    sample_rate: u32,
    capturing: Arc<AtomicBool>,
    session_open: Arc<AtomicBool>,
    transcript: SharedTranscript,
    audio_rx: Receiver<Vec<f32>>,
    command_rx: Receiver<RecognitionCommand>,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("speech-recognition".to_string())
        .spawn(move || {
            info!("Recognition worker started ({} Hz capture)", sample_rate);

            let mut session: Option<Session> = None;

            let recognize = |samples: &[f32], language: &str| -> Result<String> {
                let resampled = resample_mono(samples, sample_rate, SPEECH_SAMPLE_RATE)?;
                engine.transcribe(&resampled, language)
            };

            let publish = |session: &Session| {
                if !transcript
                    .lock()
                    .publish(session.generation, session.buffer.transcript())
                {
                    debug!("Dropped transcript from a reset session");
                }
            };

            loop {
                select! {
                    recv(command_rx) -> command => match command {
                        Ok(RecognitionCommand::Start { options, generation }) => {
                            debug!("Listening (continuous: {}, locale: {})", options.continuous, options.locale);
                            session = Some(Session {
                                buffer: TranscriptBuffer::for_session(&config, sample_rate, options.continuous),
                                language: language_for_locale(&options.locale),
                                generation,
                            });
                            session_open.store(true, Ordering::SeqCst);
                        }
                        Ok(RecognitionCommand::Stop) => {
                            if let Some(mut current) = session.take() {
                                let language = current.language.clone();
                                match current.buffer.flush(|s| recognize(s, &language)) {
                                    Ok(true) => publish(&current),
                                    Ok(false) => {}
                                    Err(e) => warn!("Final recognition failed: {}", e),
                                }
                            }
                            session_open.store(false, Ordering::SeqCst);
                        }
                        Ok(RecognitionCommand::Reset { generation }) => {
                            if let Some(current) = session.as_mut() {
                                current.buffer.clear();
                                current.generation = generation;
                            }
                        }
                        Ok(RecognitionCommand::Shutdown) | Err(_) => {
                            info!("Recognition worker shutting down");
                            session_open.store(false, Ordering::SeqCst);
                            break;
                        }
                    },
                    recv(audio_rx) -> chunk => match chunk {
                        Ok(samples) => {
                            let mut finished = false;
                            if let Some(current) = session.as_mut() {
                                let language = current.language.clone();
                                match current.buffer.push(&samples, |s| recognize(s, &language)) {
                                    Ok(outcome) => {
                                        if outcome.updated {
                                            publish(current);
                                        }
                                        finished = outcome.finished;
                                    }
                                    Err(e) => error!("Recognition failed: {}", e),
                                }
                            }
                            if finished {
                                info!("Single utterance complete");
                                capturing.store(false, Ordering::SeqCst);
                                session = None;
                                session_open.store(false, Ordering::SeqCst);
                            }
                        }
                        Err(_) => break,
                    },
                }
            }

            info!("Recognition worker stopped");
        })
        .map_err(|e| VoiceChatError::ChannelError(format!("Failed to spawn worker: {}", e)))
}
