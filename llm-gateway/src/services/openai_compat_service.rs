//! OpenAI-compatible chat service for the academic-cloud open models.
//!
//! Minimal, non-streaming client for any endpoint speaking the OpenAI chat
//! dialect (Mixtral, Llama 3, Qwen2 hosted on the academic cloud):
//! - POST {endpoint}/v1/chat/completions
//!
//! Constructor validation:
//! - `cfg.api_key` must be present (Bearer auth)
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via the unified types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use tracing::{debug, error, info};

use crate::{
    chat::ChatMessage,
    config::{BackendConfig, BackendProvider},
    error_handler::{
        GatewayError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    services::{ChatCompletionRequest, ChatCompletionResponse},
};

/// Thin client for OpenAI-compatible chat endpoints.
///
/// Constructed from a complete [`BackendConfig`]. Reuses an HTTP client with
/// a configurable timeout and Bearer authentication.
#[derive(Debug, Clone)]
pub struct OpenAiCompatService {
    client: reqwest::Client,
    cfg: BackendConfig,
    url_chat: String,
}

impl OpenAiCompatService {
    /// Creates a new [`OpenAiCompatService`] from the given config.
    ///
    /// # Errors
    /// - [`GatewayError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`GatewayError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`GatewayError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: BackendConfig) -> Result<Self, GatewayError> {
        debug_assert!(cfg.provider == BackendProvider::OpenAiCompat);

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAiCompat, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAiCompat,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAiCompat,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let version = cfg.api_version.as_deref().unwrap_or("v1");
        let url_chat = format!("{base}/{version}/chat/completions");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(30),
            "OpenAiCompatService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// The message array is: system prompt, prior `history`, new `user` turn.
    ///
    /// # Errors
    /// - [`GatewayError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`GatewayError::HttpTransport`] for client/network failures
    /// - [`GatewayError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`GatewayError::Provider`] with `EmptyChoices` if no textual choice is returned
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user: &str,
    ) -> Result<String, GatewayError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_parts(&self.cfg, system_prompt, history, user);

        debug!(
            model = %self.cfg.model,
            history_len = history.len(),
            user_len = user.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAiCompat,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completion response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAiCompat,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::new(Provider::OpenAiCompat, ProviderErrorKind::EmptyChoices)
            })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }
}
