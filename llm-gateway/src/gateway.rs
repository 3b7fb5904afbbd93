//! Gateway over the configured LLM backends: lookup, chat, failover.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Maps logical [`ModelId`]s to concrete [`BackendClient`]s via a lookup
//!   table built at startup.
//! - Bounds every non-primary chat call with a wall-clock timeout and falls
//!   back to the primary backend on transient failure, tripping the shared
//!   circuit breaker so concurrent requests skip the dead backend.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::backend::BackendClient;
use crate::breaker::FailoverBreaker;
use crate::chat::ChatMessage;
use crate::config::{GatewayConfig, ModelId};
use crate::embedder::Embedder;
use crate::error_handler::{GatewayError, Result};
use crate::services::azure_openai_service::AzureOpenAiService;

/// Shared gateway that owns one client per supported model plus the
/// embeddings handle and the failover breaker.
pub struct LlmGateway {
    backends: HashMap<ModelId, BackendClient>,
    embedder: Embedder,
    breaker: FailoverBreaker,
    call_timeout: Duration,
}

impl LlmGateway {
    /// Builds all backend clients from the given configuration.
    ///
    /// # Errors
    /// Returns [`GatewayError`] if any client fails validation (missing key,
    /// bad endpoint, unbuildable HTTP client).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let mut backends = HashMap::with_capacity(ModelId::ALL.len());
        backends.insert(ModelId::Gpt4, BackendClient::from_config(cfg.gpt4)?);
        backends.insert(ModelId::Mistral8, BackendClient::from_config(cfg.mistral8)?);
        backends.insert(ModelId::Llama3, BackendClient::from_config(cfg.llama3)?);
        backends.insert(ModelId::Qwen2, BackendClient::from_config(cfg.qwen2)?);

        let embedder = Embedder::new(AzureOpenAiService::new(cfg.embedding)?);

        Ok(Self {
            backends,
            embedder,
            breaker: FailoverBreaker::new(Duration::from_secs(cfg.circuit_reset_secs)),
            call_timeout: Duration::from_secs(cfg.backend_timeout_secs),
        })
    }

    /// Resolves a logical model to its backend client.
    ///
    /// # Errors
    /// Returns [`GatewayError::UnsupportedModel`] when no backend is
    /// configured for `model`.
    pub fn model(&self, model: ModelId) -> Result<&BackendClient> {
        self.backends
            .get(&model)
            .ok_or_else(|| GatewayError::UnsupportedModel(model.to_string()))
    }

    /// Returns the embeddings accessor built from the same credentials.
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Breaker-aware routing decision for one call.
    ///
    /// A non-primary model whose circuit is open is silently substituted by
    /// the primary backend until the reset window elapses.
    pub fn effective_model(&self, requested: ModelId) -> ModelId {
        if !requested.is_primary() && self.breaker.is_open(requested) {
            ModelId::Gpt4
        } else {
            requested
        }
    }

    /// Performs a chat completion with failover.
    ///
    /// The system prompt, prior `history`, and the new user `query` are sent
    /// to the backend selected for `model`. Non-primary calls run on a
    /// spawned task bounded by the failover timeout; on timeout or transient
    /// error the breaker is tripped and the same request is retried against
    /// the primary backend before returning, so callers only ever observe
    /// added latency. The abandoned in-flight call is left to complete and
    /// its result is discarded.
    ///
    /// # Errors
    /// - [`GatewayError::Provider`] with `Decode`/`EmptyChoices` on backend
    ///   contract violations (fatal, never failed over)
    /// - [`GatewayError::BackendUnavailable`] when the fallback tier fails too
    /// - [`GatewayError::UnsupportedModel`] for unconfigured models
    pub async fn chat(
        &self,
        query: &str,
        history: &[ChatMessage],
        model: ModelId,
        system_prompt: &str,
    ) -> Result<ChatMessage> {
        let routed = self.effective_model(model);
        if routed != model {
            debug!(requested = %model, routed = %routed, "circuit open, redirecting to primary");
        }

        if routed.is_primary() {
            return self
                .call_primary(query, history, system_prompt, model)
                .await;
        }

        let client = self.model(routed)?.clone();
        let sys = system_prompt.to_owned();
        let hist = history.to_vec();
        let q = query.to_owned();
        // Spawned so the abandoned call keeps running past the deadline; the
        // underlying HTTP request has no cooperative cancellation.
        let call = tokio::spawn(async move { client.complete(&sys, &hist, &q).await });

        let cause = match timeout(self.call_timeout, call).await {
            Ok(Ok(Ok(text))) => return Ok(ChatMessage::assistant(text)),
            Ok(Ok(Err(e))) if !e.is_transient() => return Err(e),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join_err)) => format!("backend task failed: {join_err}"),
            Err(_) => GatewayError::Timeout(self.call_timeout).to_string(),
        };

        self.breaker.trip(model);
        warn!(
            model = %model,
            fallback = %ModelId::Gpt4,
            cause = %cause,
            "backend failed, retrying against primary"
        );

        self.call_primary(query, history, system_prompt, model).await
    }

    /// Calls the primary backend directly, mapping transient failures to
    /// [`GatewayError::BackendUnavailable`] (there is no further tier).
    async fn call_primary(
        &self,
        query: &str,
        history: &[ChatMessage],
        system_prompt: &str,
        requested: ModelId,
    ) -> Result<ChatMessage> {
        match self
            .model(ModelId::Gpt4)?
            .complete(system_prompt, history, query)
            .await
        {
            Ok(text) => Ok(ChatMessage::assistant(text)),
            Err(e) if e.is_transient() => Err(GatewayError::BackendUnavailable {
                model: requested.to_string(),
                detail: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, BackendProvider};

    fn backend(provider: BackendProvider, model: &str) -> BackendConfig {
        BackendConfig {
            provider,
            model: model.into(),
            deployment: matches!(provider, BackendProvider::AzureOpenAi)
                .then(|| format!("{model}-deployment")),
            endpoint: "http://localhost:9".into(),
            api_key: Some("test-key".into()),
            api_version: Some("v1".into()),
            max_tokens: Some(400),
            temperature: Some(0.0),
            timeout_secs: Some(1),
        }
    }

    fn gateway(circuit_reset_secs: u64) -> LlmGateway {
        // Endpoints are never contacted in these tests.
        LlmGateway::new(GatewayConfig {
            gpt4: backend(BackendProvider::AzureOpenAi, "gpt-4"),
            mistral8: backend(BackendProvider::OpenAiCompat, "mixtral-8x7b-instruct"),
            llama3: backend(BackendProvider::OpenAiCompat, "meta-llama-3-70b-instruct"),
            qwen2: backend(BackendProvider::OpenAiCompat, "qwen2-72b-instruct"),
            embedding: backend(BackendProvider::AzureOpenAi, "text-embedding"),
            backend_timeout_secs: 7,
            circuit_reset_secs,
        })
        .unwrap()
    }

    #[test]
    fn resolves_all_supported_models() {
        let gw = gateway(300);
        for id in ModelId::ALL {
            assert!(gw.model(id).is_ok(), "missing backend for {id}");
        }
    }

    #[test]
    fn open_circuit_routes_to_primary_until_reset() {
        let gw = gateway(300);
        assert_eq!(gw.effective_model(ModelId::Mistral8), ModelId::Mistral8);

        gw.breaker.trip(ModelId::Mistral8);
        assert_eq!(gw.effective_model(ModelId::Mistral8), ModelId::Gpt4);
        // Other backends and the primary are unaffected.
        assert_eq!(gw.effective_model(ModelId::Qwen2), ModelId::Qwen2);
        assert_eq!(gw.effective_model(ModelId::Gpt4), ModelId::Gpt4);
    }

    #[tokio::test]
    async fn chat_failure_trips_breaker_and_maps_to_unavailable() {
        // Both the requested backend and the primary point at a closed port,
        // so the first call fails over and the fallback fails too.
        let gw = gateway(300);

        let err = gw
            .chat("Was ist KI?", &[], ModelId::Mistral8, "You are a test bot.")
            .await
            .unwrap_err();
        match err {
            GatewayError::BackendUnavailable { model, .. } => {
                assert_eq!(model, ModelId::Mistral8.to_string());
            }
            other => panic!("expected BackendUnavailable, got {other}"),
        }

        // The breaker tripped: later calls skip the dead backend.
        assert_eq!(gw.effective_model(ModelId::Mistral8), ModelId::Gpt4);
    }

    #[test]
    fn circuit_round_trip_reopens_backend() {
        let gw = LlmGateway {
            call_timeout: Duration::from_secs(7),
            breaker: FailoverBreaker::new(Duration::from_millis(5)),
            ..gateway(300)
        };

        gw.breaker.trip(ModelId::Llama3);
        assert_eq!(gw.effective_model(ModelId::Llama3), ModelId::Gpt4);

        std::thread::sleep(Duration::from_millis(10));
        // Window elapsed: the original backend is attempted again.
        assert_eq!(gw.effective_model(ModelId::Llama3), ModelId::Llama3);
    }
}
