//! Runtime configuration for the content index.

use std::env;

use crate::errors::RetrieveError;

/// Configuration for vector retrieval.
#[derive(Clone, Debug)]
pub struct RetrievalConfig {
    /// Qdrant HTTP endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Number of nearest neighbors fetched per query.
    pub top_k: u64,
}

impl RetrievalConfig {
    /// Reads the configuration from the environment.
    ///
    /// `QDRANT_URL` is required. `QDRANT_API_KEY` is optional (local
    /// instances run without auth). `QDRANT_COLLECTION` defaults to
    /// `web_assistant` and `RETRIEVAL_TOP_K` to 10.
    ///
    /// # Errors
    /// Returns `RetrieveError::Config` on missing or malformed variables.
    pub fn from_env() -> Result<Self, RetrieveError> {
        let qdrant_url = must_env("QDRANT_URL")?;
        let qdrant_api_key = env::var("QDRANT_API_KEY").ok().filter(|v| !v.is_empty());
        let collection =
            env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "web_assistant".to_string());
        let top_k = match env::var("RETRIEVAL_TOP_K") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                RetrieveError::Config(format!("RETRIEVAL_TOP_K is not an integer: {raw}"))
            })?,
            Err(_) => 10,
        };

        let cfg = Self {
            qdrant_url,
            qdrant_api_key,
            collection,
            top_k,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RetrieveError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RetrieveError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RetrieveError::Config("collection is empty".into()));
        }
        if self.top_k == 0 {
            return Err(RetrieveError::Config("top_k must be > 0".into()));
        }
        Ok(())
    }
}

fn must_env(name: &str) -> Result<String, RetrieveError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RetrieveError::Config(format!("missing required env var: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_collection() {
        let cfg = RetrievalConfig {
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "  ".into(),
            top_k: 10,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_top_k() {
        let cfg = RetrievalConfig {
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "web_assistant".into(),
            top_k: 0,
        };
        assert!(cfg.validate().is_err());
    }
}
