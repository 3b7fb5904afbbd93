//! Filtered vector retrieval over the content index.
//!
//! This crate provides a clean API to:
//! - Embed a query string through the gateway's embeddings deployment
//! - Compose a metadata filter from the optional course/module scope
//! - Fetch and decode the top-K nearest chunks from Qdrant
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod errors;
mod filters;
mod qdrant_facade;
mod record;

pub use config::RetrievalConfig;
pub use errors::RetrieveError;
pub use filters::ScopeFilter;
pub use record::{ChunkMetadata, ContentType, SourceChunk, SourceSystem};

use llm_gateway::Embedder;
use tracing::{debug, trace};

/// High-level facade that wires configuration, the Qdrant client, and the
/// embeddings handle.
///
/// This is the single entry point recommended for application code.
pub struct Retriever {
    cfg: RetrievalConfig,
    client: qdrant_facade::QdrantFacade,
    embedder: Embedder,
}

impl Retriever {
    /// Constructs a new retriever from the given configuration and the
    /// gateway's embeddings handle.
    ///
    /// # Errors
    /// Returns `RetrieveError::Config` or `RetrieveError::Qdrant` if client
    /// initialization fails.
    pub fn new(cfg: RetrievalConfig, embedder: Embedder) -> Result<Self, RetrieveError> {
        trace!("Retriever::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self {
            cfg,
            client,
            embedder,
        })
    }

    /// Retrieves the top-K chunks for `query` under the given scope.
    ///
    /// The result is ordered by similarity score descending (the index's
    /// native order). Zero hits is not an error: an empty vector is
    /// returned and downstream answering degrades gracefully.
    ///
    /// # Errors
    /// Returns embedding errors or Qdrant failures.
    pub async fn retrieve(
        &self,
        query: &str,
        scope: &ScopeFilter,
    ) -> Result<Vec<SourceChunk>, RetrieveError> {
        debug!(
            top_k = self.cfg.top_k,
            scoped = scope.is_scoped(),
            "Retriever::retrieve"
        );

        let vector = self.embedder.embed(query).await?;
        let filter = filters::to_qdrant_filter(scope);

        let hits = self.client.search(vector, self.cfg.top_k, filter).await?;

        let chunks: Vec<SourceChunk> = hits
            .into_iter()
            .filter_map(|(score, payload)| SourceChunk::from_payload(payload, score))
            .collect();

        trace!("Retriever::retrieve hits={}", chunks.len());
        Ok(chunks)
    }
}
