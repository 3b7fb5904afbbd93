//! Logical model identifiers exposed to callers.

use std::str::FromStr;

use crate::error_handler::GatewayError;

/// Logical model identifier, decoupled from concrete deployments.
///
/// [`ModelId::Gpt4`] is the always-available primary backend every failover
/// lands on; the open models live on the academic cloud and are guarded by
/// the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// Azure OpenAI GPT-4 deployment (primary).
    Gpt4,
    /// Mixtral 8x7B instruct on the academic cloud.
    Mistral8,
    /// Llama 3 70B instruct on the academic cloud.
    Llama3,
    /// Qwen2 72B instruct on the academic cloud.
    Qwen2,
}

impl ModelId {
    /// All supported identifiers, in priority order.
    pub const ALL: [ModelId; 4] = [
        ModelId::Gpt4,
        ModelId::Mistral8,
        ModelId::Llama3,
        ModelId::Qwen2,
    ];

    /// Public identifier string (as accepted by [`ModelId::from_str`]).
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4 => "gpt-4",
            ModelId::Mistral8 => "mistral8",
            ModelId::Llama3 => "llama3",
            ModelId::Qwen2 => "qwen2",
        }
    }

    /// Whether this is the primary backend (the failover target).
    pub fn is_primary(&self) -> bool {
        matches!(self, ModelId::Gpt4)
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpt-4" | "gpt4" => Ok(ModelId::Gpt4),
            "mistral8" | "mistral" => Ok(ModelId::Mistral8),
            "llama3" => Ok(ModelId::Llama3),
            "qwen2" => Ok(ModelId::Qwen2),
            other => Err(GatewayError::UnsupportedModel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_identifiers() {
        assert_eq!("gpt-4".parse::<ModelId>().unwrap(), ModelId::Gpt4);
        assert_eq!("Mistral8".parse::<ModelId>().unwrap(), ModelId::Mistral8);
        assert_eq!("llama3".parse::<ModelId>().unwrap(), ModelId::Llama3);
        assert_eq!("qwen2".parse::<ModelId>().unwrap(), ModelId::Qwen2);
    }

    #[test]
    fn rejects_unknown_identifier() {
        let err = "luminous".parse::<ModelId>().unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedModel(_)));
    }
}
