//! Azure OpenAI service for chat completions and embeddings.
//!
//! Minimal, non-streaming client around the Azure OpenAI REST API.
//! Endpoints are derived from `BackendConfig::endpoint` and the deployment:
//! - POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={v}
//! - POST {endpoint}/openai/deployments/{deployment}/embeddings?api-version={v}
//!
//! Constructor validation:
//! - `cfg.provider` must be `BackendProvider::AzureOpenAi`
//! - `cfg.api_key` and `cfg.deployment` must be present
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
    services::{ChatCompletionRequest, ChatCompletionResponse, EmbeddingsRequest, EmbeddingsResponse},
};

/// Thin client for Azure OpenAI deployments.
///
/// Constructed from a complete [`BackendConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
///
/// High-level operations:
/// - [`AzureOpenAiService::complete`]: single, non-streaming chat completion
/// - [`AzureOpenAiService::embeddings`]: single embeddings vector retrieval
#[derive(Debug, Clone)]
pub struct AzureOpenAiService {
    client: reqwest::Client,
    cfg: BackendConfig,
    url_chat: String,
    url_embeddings: String,
}

impl AzureOpenAiService {
    /// Creates a new [`AzureOpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`GatewayError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`GatewayError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` or
    ///   the deployment name is invalid
    /// - [`GatewayError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: BackendConfig) -> Result<Self, GatewayError> {
        debug_assert!(cfg.provider == BackendProvider::AzureOpenAi);

        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::new(Provider::AzureOpenAi, ProviderErrorKind::MissingApiKey))?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::AzureOpenAi,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let deployment = cfg.deployment.clone().filter(|d| !d.trim().is_empty()).ok_or_else(|| {
            ProviderError::new(
                Provider::AzureOpenAi,
                ProviderErrorKind::InvalidEndpoint("missing Azure deployment name".into()),
            )
        })?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "api-key",
            header::HeaderValue::from_str(&api_key).map_err(|e| {
                ProviderError::new(
                    Provider::AzureOpenAi,
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
        let api_version = cfg.api_version.as_deref().unwrap_or("2023-05-15");
        let url_chat = format!(
            "{base}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
        );
        let url_embeddings =
            format!("{base}/openai/deployments/{deployment}/embeddings?api-version={api_version}");

        info!(
            model = %cfg.model,
            deployment = %deployment,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "AzureOpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
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
                "Azure chat completion returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::AzureOpenAi,
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
                    "failed to decode Azure chat completion response"
                );
                return Err(ProviderError::new(
                    Provider::AzureOpenAi,
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
                ProviderError::new(Provider::AzureOpenAi, ProviderErrorKind::EmptyChoices)
            })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves a single embeddings vector.
    ///
    /// Deterministic for identical input (temperature does not apply).
    ///
    /// # Errors
    /// - [`GatewayError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`GatewayError::HttpTransport`] for client/network failures
    /// - [`GatewayError::Provider`] with `Decode` if the JSON cannot be parsed
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(
            model = %self.cfg.model,
            input_len = input.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Azure embeddings returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::AzureOpenAi,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode Azure embeddings response"
                );
                return Err(ProviderError::new(
                    Provider::AzureOpenAi,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `data[0].embedding`"
                    )),
                )
                .into());
            }
        };

        let first = out.data.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                Provider::AzureOpenAi,
                ProviderErrorKind::Decode("empty `data` in embeddings response".into()),
            )
        })?;

        info!(
            model = %self.cfg.model,
            dim = first.embedding.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(first.embedding)
    }
}
