//! HTTP client for hosted chatbot endpoints

use crate::config::ChatConfig;
use crate::messages::Role;
use crate::{Result, VoiceChatError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Something that turns a user message into an assistant reply
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub chatbot_id: String,
    pub stream: bool,
    pub model: String,
    pub temperature: f32,
}

impl ChatRequest {
    /// Build a single-turn request carrying only the new user message
    pub fn new(config: &ChatConfig, message: &str) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::User.as_str().to_string(),
                content: message.to_string(),
            }],
            chatbot_id: config.chatbot_id.clone(),
            stream: false,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Extract the reply text from a response body.
///
/// Accepts the chatbot shape `{"text": ...}` and falls back to the
/// chat-completions shape `{"choices": [{"message": {"content": ...}}]}`.
pub fn parse_reply(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| VoiceChatError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let reply = if let Some(text) = value.get("text").and_then(Value::as_str) {
        text.to_string()
    } else if let Some(choices) = value.get("choices") {
        let choices: Vec<Choice> = serde_json::from_value(choices.clone())
            .map_err(|e| VoiceChatError::MalformedResponse(format!("bad choices: {}", e)))?;
        choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| VoiceChatError::MalformedResponse("empty choices".to_string()))?
    } else {
        return Err(VoiceChatError::MalformedResponse(
            "no reply field in response".to_string(),
        ));
    };

    if reply.trim().is_empty() {
        return Err(VoiceChatError::MalformedResponse("empty reply".to_string()));
    }

    Ok(reply)
}

/// Client for a hosted chatbot endpoint using bearer authorization
#[derive(Clone)]
pub struct ChatbaseClient {
    client: Client,
    config: ChatConfig,
}

impl ChatbaseClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub async fn query(&self, message: &str) -> Result<String> {
        let request = ChatRequest::new(&self.config, message);

        debug!("Posting message to {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Chatbot endpoint returned {}", status);
            return Err(VoiceChatError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body)
    }
}

#[async_trait]
impl ChatBackend for ChatbaseClient {
    async fn send(&self, message: &str) -> Result<String> {
        self.query(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_shape() {
        assert_eq!(parse_reply(r#"{"text":"hi there"}"#).unwrap(), "hi there");
    }

    #[test]
    fn test_parse_choices_shape() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello, world."}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Hello, world.");
    }

    #[test]
    fn test_text_field_takes_precedence() {
        let body = r#"{"text":"from text","choices":[{"message":{"content":"from choices"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "from text");
    }

    #[test]
    fn test_malformed_bodies() {
        for body in [
            "not json",
            "{}",
            r#"{"text": 42}"#,
            r#"{"choices": []}"#,
            r#"{"choices": [{"message": {}}]}"#,
            r#"{"text": "   "}"#,
        ] {
            let result = parse_reply(body);
            assert!(
                matches!(result, Err(VoiceChatError::MalformedResponse(_))),
                "expected malformed for {}",
                body
            );
        }
    }

    #[test]
    fn test_request_body_shape() {
        let config = ChatConfig::default().with_chatbot_id("bot-1");
        let request = ChatRequest::new(&config, "hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["chatbotId"], "bot-1");
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["temperature"], 0.0);
    }
}
