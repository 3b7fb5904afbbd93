//! Unified error handling for `llm-gateway`.
//!
//! This module exposes a single top-level error type [`GatewayError`] for the
//! whole library, and groups domain-specific errors in nested types (e.g.,
//! [`ConfigError`], [`ProviderError`]). Small helpers for reading/validating
//! environment variables are provided and return the unified [`Result<T>`]
//! alias.
//!
//! All messages include the prefix `[LLM Gateway]` to simplify attribution in
//! logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-gateway` crate.
///
/// Variants wrap domain-specific types (config/provider) and a few common
/// cases (HTTP transport, timeouts). Prefer adding new sub-enums for distinct
/// domains instead of growing this type indefinitely.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider-level errors (HTTP status, decoding, contract violations).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[LLM Gateway] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Backend call exceeded the configured failover timeout.
    #[error("[LLM Gateway] backend call timed out after {0:?}")]
    Timeout(Duration),

    /// Logical model identifier is not known to this gateway.
    #[error("[LLM Gateway] unsupported model: {0}")]
    UnsupportedModel(String),

    /// Both the requested backend and the primary fallback failed.
    #[error("[LLM Gateway] backend unavailable for model {model}: {detail}")]
    BackendUnavailable {
        /// Public identifier of the model that was requested.
        model: String,
        /// Short description of the terminal failure.
        detail: String,
    },
}

impl GatewayError {
    /// Whether the error indicates transient backend unavailability.
    ///
    /// Transient failures (timeouts, transport errors, upstream HTTP status)
    /// are recovered via failover to the primary backend. Contract violations
    /// (undecodable payloads, empty choices) are never retried: retrying a
    /// non-deterministic LLM call would mask a real integration bug.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::HttpTransport(_) => true,
            GatewayError::Provider(p) => matches!(p.kind, ProviderErrorKind::HttpStatus(_)),
            _ => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Gateway] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[LLM Gateway] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `BACKEND_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[LLM Gateway] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `AZURE_OPENAI_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[LLM Gateway] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Which concrete provider produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Azure OpenAI (GPT-4 deployments and embeddings).
    AzureOpenAi,
    /// OpenAI-compatible endpoint (academic cloud open models).
    OpenAiCompat,
}

/// Structured provider error with a provider tag and a specific kind.
#[derive(Debug, Error)]
#[error("[LLM Gateway] {provider:?} provider error: {kind}")]
pub struct ProviderError {
    /// Provider that produced the error.
    pub provider: Provider,
    /// Specific failure kind.
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    /// Creates a new provider error.
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Specific provider failure kinds.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// The config is missing an API key required by this provider.
    #[error("missing API key")]
    MissingApiKey,

    /// The endpoint is empty or does not start with http/https.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("{0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected. This is a backend
    /// contract violation and is surfaced as fatal, never failed over.
    #[error("decode error: {0}")]
    Decode(String),

    /// The completion response carried no usable message content.
    #[error("no choices with content in completion response")]
    EmptyChoices,
}

/// Details of a non-2xx upstream response.
#[derive(Debug)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Trims an upstream body to a short, log-friendly snippet.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let t = body.trim();
    if t.len() <= MAX {
        t.to_string()
    } else {
        let mut end = MAX;
        while end > 0 && !t.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &t[..end])
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`GatewayError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`GatewayError::Config`] with [`ConfigError::InvalidNumber`] if the
/// variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u64>().map(Some).map_err(|_| {
            GatewayError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`GatewayError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let timeout = GatewayError::Timeout(Duration::from_secs(7));
        assert!(timeout.is_transient());

        let decode = GatewayError::from(ProviderError::new(
            Provider::AzureOpenAi,
            ProviderErrorKind::Decode("bad json".into()),
        ));
        assert!(!decode.is_transient());

        let status = GatewayError::from(ProviderError::new(
            Provider::OpenAiCompat,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::TOO_MANY_REQUESTS,
                url: "https://llm.example/v1/chat/completions".into(),
                snippet: "quota exceeded".into(),
            }),
        ));
        assert!(status.is_transient());

        let unsupported = GatewayError::UnsupportedModel("gpt-5".into());
        assert!(!unsupported.is_transient());
    }

    #[test]
    fn http_status_error_renders_status_url_and_snippet() {
        let err = GatewayError::from(ProviderError::new(
            Provider::OpenAiCompat,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                url: "https://llm.example/v1/chat/completions".into(),
                snippet: "upstream down".into(),
            }),
        ));
        let rendered = err.to_string();
        assert!(rendered.contains("503"));
        assert!(rendered.contains("https://llm.example/v1/chat/completions"));
        assert!(rendered.contains("upstream down"));
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(1000);
        assert!(make_snippet(&long).len() < 250 + 4);
        assert_eq!(make_snippet("  short  "), "short");
    }
}
