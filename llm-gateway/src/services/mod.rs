//! Provider service clients and their shared wire payloads.
//!
//! Both providers speak the OpenAI chat-completion schema; the request and
//! response structs live here so the two clients serialize identically and
//! differ only in URL scheme and authentication.

pub mod azure_openai_service;
pub mod openai_compat_service;

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::config::BackendConfig;

/// Minimal request body for a non-streaming chat completion.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Builds the message array: system prompt, prior history, new user turn.
    pub fn from_parts(
        cfg: &'a BackendConfig,
        system_prompt: &'a str,
        history: &'a [ChatMessage],
        user: &'a str,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for msg in history {
            messages.push(WireMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: user,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            stream: false,
        }
    }
}

/// Chat message as serialized on the wire.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Minimal response body for a chat completion.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: WireMessageOut,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessageOut {
    /// `None` or a non-string here is a backend contract violation.
    pub content: Option<String>,
}

/// Request body for an embeddings call.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingsRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Response body for an embeddings call.
#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingsResponse {
    pub data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingItem {
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendProvider;

    fn cfg() -> BackendConfig {
        BackendConfig {
            provider: BackendProvider::OpenAiCompat,
            model: "qwen2-72b-instruct".into(),
            deployment: None,
            endpoint: "https://llm.example".into(),
            api_key: Some("key".into()),
            api_version: Some("v1".into()),
            max_tokens: Some(400),
            temperature: Some(0.0),
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn request_orders_system_history_user() {
        let cfg = cfg();
        let history = vec![
            ChatMessage::user("Hallo"),
            ChatMessage::assistant("Hi, wie kann ich helfen?"),
        ];
        let req = ChatCompletionRequest::from_parts(&cfg, "be brief", &history, "Was ist KI?");
        let roles: Vec<&str> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(req.messages.last().unwrap().content, "Was ist KI?");
        assert!(!req.stream);
    }
}
