//! Unified gateway over the chat and embeddings backends.
//!
//! This crate provides a clean API to:
//! - Run non-streaming chat completions against Azure OpenAI and
//!   OpenAI-compatible endpoints behind one facade
//! - Fail over to the primary backend when an open-model backend times out
//!   or errors, with a per-backend circuit breaker
//! - Compute query embeddings through the same credentials
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod backend;
mod breaker;
mod chat;
mod config;
mod embedder;
mod error_handler;
mod gateway;
mod services;
pub mod telemetry;

pub use backend::BackendClient;
pub use breaker::FailoverBreaker;
pub use chat::{ChatMessage, ChatRole};
pub use config::{BackendConfig, BackendProvider, GatewayConfig, ModelId};
pub use embedder::Embedder;
pub use error_handler::{GatewayError, Result};
pub use gateway::LlmGateway;
