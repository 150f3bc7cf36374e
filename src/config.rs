//! Application configuration
//!
//! Defaults live in code. An optional TOML file and a handful of environment
//! variables override them, in that order.

use crate::{Result, VoiceChatError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "VOICECHAT_CONFIG";
/// Environment variable holding the bearer token
pub const API_TOKEN_ENV: &str = "VOICECHAT_API_TOKEN";
/// Environment variable holding the chatbot identifier
pub const CHATBOT_ID_ENV: &str = "VOICECHAT_CHATBOT_ID";
/// Environment variable overriding the chatbot endpoint
pub const ENDPOINT_ENV: &str = "VOICECHAT_ENDPOINT";

/// Chatbot endpoint configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Full URL the messages are posted to
    pub endpoint: String,

    /// Bearer token sent in the Authorization header
    pub api_token: String,

    /// Chatbot identifier sent in the request body
    pub chatbot_id: String,

    /// Model name forwarded to the endpoint
    pub model: String,

    /// Sampling temperature forwarded to the endpoint
    pub temperature: f32,

    /// Optional request timeout in milliseconds; `None` waits indefinitely
    pub request_timeout_ms: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.chatbase.co/api/v1/chat".to_string(),
            api_token: String::new(),
            chatbot_id: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            request_timeout_ms: None,
        }
    }
}

impl ChatConfig {
    /// Create a chat configuration for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the bearer token
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = api_token.into();
        self
    }

    /// Set the chatbot identifier
    pub fn with_chatbot_id(mut self, chatbot_id: impl Into<String>) -> Self {
        self.chatbot_id = chatbot_id.into();
        self
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Speech recognition and read-aloud configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP 47 locale used for recognition
    pub locale: String,

    /// Keep listening until stopped explicitly
    pub continuous: bool,

    /// Path to the Whisper model file
    pub whisper_model_path: PathBuf,

    /// Number of threads Whisper may use
    pub n_threads: i32,

    /// How much new audio triggers a transcript refresh
    pub update_interval_ms: u64,

    /// Longest utterance buffer before it is committed (continuous mode)
    pub max_segment_secs: f32,

    /// Audio heard before a non-continuous session ends by itself
    pub single_shot_secs: f32,

    /// Command used to speak text; the text is written to its standard input
    pub voice_command: Option<Vec<String>>,

    /// VITS model for the neural voice
    pub tts_model_path: String,

    /// Tokens file for the neural voice
    pub tts_tokens_path: String,

    /// espeak-ng data directory for the neural voice
    pub tts_data_dir: Option<String>,

    /// Speaker identifier for multi-speaker voices
    pub tts_speaker_id: i32,

    /// Maximum number of queued utterances
    pub queue_size: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "en-IN".to_string(),
            continuous: true,
            whisper_model_path: PathBuf::from("models/ggml-base.en.bin"),
            n_threads: 4,
            update_interval_ms: 1000,
            max_segment_secs: 30.0,
            single_shot_secs: 5.0,
            voice_command: None,
            tts_model_path: String::new(),
            tts_tokens_path: String::new(),
            tts_data_dir: None,
            tts_speaker_id: 0,
            queue_size: 32,
        }
    }
}

impl SpeechConfig {
    /// Whisper language derived from the locale's primary subtag
    pub fn language(&self) -> String {
        language_for_locale(&self.locale)
    }

    /// Whether a neural voice model has been configured
    pub fn has_neural_voice(&self) -> bool {
        !self.tts_model_path.is_empty() && !self.tts_tokens_path.is_empty()
    }
}

/// Primary language subtag of a locale (`en-IN` -> `en`), `en` when empty
pub fn language_for_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_ascii_lowercase()
}

/// Clipboard adapter configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// How long the "copied" flag stays set
    pub success_duration_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            success_duration_ms: 1000,
        }
    }
}

impl ClipboardConfig {
    pub fn success_duration(&self) -> Duration {
        Duration::from_millis(self.success_duration_ms)
    }
}

/// View configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show the chat history sidebar on startup
    pub show_sidebar: bool,

    /// Read every assistant reply aloud
    pub speak_replies: bool,

    /// Use the light color scheme instead of the dark one
    pub light_theme: bool,
}

/// Complete application configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub clipboard: ClipboardConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VoiceChatError::ConfigError(e.to_string()))
    }

    /// Load a configuration from a TOML file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VoiceChatError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            VoiceChatError::ConfigError(msg) => {
                VoiceChatError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicechat").join("config.toml"))
    }

    /// Load the configuration for this process
    ///
    /// Uses `VOICECHAT_CONFIG` when set, then the default location, then
    /// built-in defaults, and finally applies environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);

        let mut config = match explicit {
            Some(path) => Self::load_from(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        if config.chat.api_token.is_empty() {
            warn!("No API token configured; set {} or chat.api_token", API_TOKEN_ENV);
        }

        info!("Chatbot endpoint: {}", config.chat.endpoint);
        Ok(config)
    }

    /// Apply overrides from a key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(API_TOKEN_ENV) {
            self.chat.api_token = token;
        }
        if let Some(id) = lookup(CHATBOT_ID_ENV) {
            self.chat.chatbot_id = id;
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.chat.endpoint = endpoint;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chat.endpoint.trim().is_empty() {
            return Err(VoiceChatError::ConfigError(
                "chat.endpoint must not be empty".to_string(),
            ));
        }
        if self.chat.request_timeout_ms == Some(0) {
            return Err(VoiceChatError::ConfigError(
                "chat.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.speech.update_interval_ms == 0 {
            return Err(VoiceChatError::ConfigError(
                "speech.update_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.speech.queue_size == 0 {
            return Err(VoiceChatError::ConfigError(
                "speech.queue_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chat.endpoint, "https://www.chatbase.co/api/v1/chat");
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.chat.temperature, 0.0);
        assert!(config.chat.request_timeout().is_none());
        assert_eq!(config.speech.locale, "en-IN");
        assert!(config.speech.continuous);
        assert_eq!(config.clipboard.success_duration(), Duration::from_millis(1000));
        assert!(!config.ui.speak_replies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [chat]
            chatbot_id = "bot-42"

            [ui]
            speak_replies = true
            light_theme = true
            "#,
        )
        .unwrap();

        assert_eq!(config.chat.chatbot_id, "bot-42");
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert!(config.ui.speak_replies);
        assert!(config.ui.light_theme);
        assert!(!config.ui.show_sidebar);
        assert_eq!(config.clipboard.success_duration_ms, 1000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AppConfig::from_toml("[chat\nendpoint = ");
        assert!(matches!(result, Err(VoiceChatError::ConfigError(_))));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = AppConfig::from_toml("[chat]\napi_token = \"from-file\"").unwrap();
        config.apply_overrides(|key| match key {
            API_TOKEN_ENV => Some("from-env".to_string()),
            CHATBOT_ID_ENV => Some("bot-env".to_string()),
            _ => None,
        });

        assert_eq!(config.chat.api_token, "from-env");
        assert_eq!(config.chat.chatbot_id, "bot-env");
        assert_eq!(config.chat.endpoint, ChatConfig::default().endpoint);
    }

    #[test]
    fn test_language_from_locale() {
        let mut speech = SpeechConfig::default();
        assert_eq!(speech.language(), "en");

        speech.locale = "de_DE".to_string();
        assert_eq!(speech.language(), "de");

        speech.locale = String::new();
        assert_eq!(speech.language(), "en");
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut config = AppConfig::default();
        config.chat.endpoint = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chat_config_builder() {
        let config = ChatConfig::new("http://localhost:9000/chat")
            .with_api_token("token")
            .with_chatbot_id("bot")
            .with_model("gpt-4o-mini")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.endpoint, "http://localhost:9000/chat");
        assert_eq!(config.api_token, "token");
        assert_eq!(config.chatbot_id, "bot");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let config = ChatConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.chat.request_timeout_ms = Some(0);
        assert!(config.validate().is_err());

        config.chat.request_timeout_ms = Some(1);
        assert!(config.validate().is_ok());
    }
}
