//! Runtime configuration loaded from environment variables.

/// Config bag for the chat pipeline. All fields have defaults via `from_env`.
#[derive(Clone, Copy, Debug)]
pub struct AssistantConfig {
    /// Number of most recent history messages kept before any LLM call.
    pub history_limit: usize,
    /// Character budget for concatenated source text in the compact prompt
    /// variant used by the smaller open models.
    pub compact_prompt_char_budget: usize,
}

impl AssistantConfig {
    /// Build from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            history_limit: parse("HISTORY_LIMIT", 10usize),
            compact_prompt_char_budget: parse("COMPACT_PROMPT_CHAR_BUDGET", 8000usize),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            compact_prompt_char_budget: 8000,
        }
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(dflt)
}
