//! Embeddings accessor handed out by the gateway.

use crate::error_handler::GatewayError;
use crate::services::azure_openai_service::AzureOpenAiService;

/// Cheap-to-clone handle for computing query embeddings.
///
/// Wraps the Azure embeddings deployment configured on the gateway. The
/// underlying HTTP client is shared, so clones can be passed to long-lived
/// consumers (the retriever) without re-reading configuration.
#[derive(Debug, Clone)]
pub struct Embedder {
    svc: AzureOpenAiService,
}

impl Embedder {
    pub(crate) fn new(svc: AzureOpenAiService) -> Self {
        Self { svc }
    }

    /// Computes the embedding vector for `input`.
    ///
    /// Deterministic for identical input.
    ///
    /// # Errors
    /// Returns [`GatewayError`] on transport, status, or decode failures.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
        self.svc.embeddings(input).await
    }
}
