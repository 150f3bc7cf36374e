//! Speech recognition and read-aloud adapters

pub mod synthesis;
pub mod transcription;

#[cfg(feature = "sherpa-tts")]
pub mod neural;
#[cfg(feature = "audio-io")]
pub mod whisper;

pub use synthesis::{
    create_backend, SpeechBackend, SpeechCommand, SpeechEvent, SpeechOutput, SpeechPipeline,
    Speaker, SystemVoice,
};
pub use transcription::{
    create_transcriber, BufferOutcome, ListenOptions, LiveTranscript, SharedTranscript,
    TranscriptBuffer, Transcriber, UnsupportedTranscriber,
};

#[cfg(feature = "sherpa-tts")]
pub use neural::NeuralVoice;
#[cfg(feature = "audio-io")]
pub use whisper::{WhisperEngine, WhisperTranscriber};
