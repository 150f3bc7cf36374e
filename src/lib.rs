pub mod audio;
pub mod chat;
pub mod clipboard;
pub mod config;
pub mod integration;
pub mod messages;
pub mod speech;
pub mod ui;

use thiserror::Error;

/// Shown to the user for every chat failure, whatever the underlying cause.
pub const CHAT_ERROR_MESSAGE: &str = "Error communicating with the chatbot. Please try again.";

#[derive(Error, Debug, Clone)]
pub enum VoiceChatError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Chatbot endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed chatbot response: {0}")]
    MalformedResponse(String),

    #[error("Speech recognition unsupported: {0}")]
    SpeechUnsupported(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Speech synthesis error: {0}")]
    SynthesisError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for VoiceChatError {
    fn from(e: std::io::Error) -> Self {
        VoiceChatError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for VoiceChatError {
    fn from(e: reqwest::Error) -> Self {
        VoiceChatError::Transport(e.to_string())
    }
}

impl VoiceChatError {
    /// Whether this error came from talking to the chatbot endpoint
    pub fn is_chat_error(&self) -> bool {
        matches!(
            self,
            VoiceChatError::Transport(_)
                | VoiceChatError::HttpStatus { .. }
                | VoiceChatError::MalformedResponse(_)
        )
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The next submission gets a fresh request
            VoiceChatError::Transport(_) => true,
            VoiceChatError::HttpStatus { .. } => true,
            VoiceChatError::MalformedResponse(_) => true,
            // Recognition is withheld for the whole session
            VoiceChatError::SpeechUnsupported(_) => false,
            VoiceChatError::AudioDeviceError(_) => false,
            VoiceChatError::ModelLoadError(_) => false,
            VoiceChatError::TranscriptionError(_) => true,
            VoiceChatError::SynthesisError(_) => true,
            VoiceChatError::AudioProcessingError(_) => true,
            VoiceChatError::ConfigError(_) => false,
            VoiceChatError::ChannelError(_) => false,
            VoiceChatError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            VoiceChatError::Transport(_)
            | VoiceChatError::HttpStatus { .. }
            | VoiceChatError::MalformedResponse(_) => CHAT_ERROR_MESSAGE.to_string(),
            VoiceChatError::SpeechUnsupported(_) => {
                "Speech recognition is not available on this system.".to_string()
            }
            VoiceChatError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            VoiceChatError::ModelLoadError(_) => {
                "Failed to load speech model. Please verify model files are present.".to_string()
            }
            VoiceChatError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            VoiceChatError::SynthesisError(_) => {
                "Read-aloud failed. The reply is still shown as text.".to_string()
            }
            VoiceChatError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            VoiceChatError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            VoiceChatError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            VoiceChatError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VoiceChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_errors_share_one_user_message() {
        let errors = [
            VoiceChatError::Transport("connection refused".into()),
            VoiceChatError::HttpStatus {
                status: 500,
                body: "oops".into(),
            },
            VoiceChatError::MalformedResponse("missing text".into()),
        ];

        for error in &errors {
            assert!(error.is_chat_error());
            assert!(error.is_recoverable());
            assert_eq!(error.user_message(), CHAT_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_speech_errors_are_not_chat_errors() {
        let error = VoiceChatError::SpeechUnsupported("no microphone".into());
        assert!(!error.is_chat_error());
        assert!(!error.is_recoverable());
        assert_ne!(error.user_message(), CHAT_ERROR_MESSAGE);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: VoiceChatError = io.into();
        assert!(matches!(error, VoiceChatError::IOError(_)));
    }
}
