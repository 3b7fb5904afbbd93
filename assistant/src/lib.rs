//! End-to-end RAG chat pipeline for the learning platform.
//!
//! One chat invocation runs sequentially: contextualize the query against
//! the chat history, retrieve scoped sources from the content index, answer
//! from those sources, rewrite the citation markers. The stages are
//! stateless; shared state (circuit breaker, HTTP clients) lives inside the
//! gateway and retriever facades.

mod cfg;
mod citation_parser;
mod contextualizer;
mod error;
mod language_detector;
mod prompt;
mod question_answerer;

pub use cfg::AssistantConfig;
pub use error::AssistantError;
pub use question_answerer::AnswerScope;

use std::sync::Arc;

use llm_gateway::{ChatMessage, LlmGateway, ModelId};
use rag_retriever::{Retriever, ScopeFilter};
use tracing::{debug, info};
use uuid::Uuid;

use contextualizer::Contextualizer;
use language_detector::LanguageDetector;
use question_answerer::QuestionAnswerer;

/// Result of one chat invocation.
#[derive(Clone, Debug)]
pub struct ChatOutcome {
    /// Final answer with rendered citations.
    pub message: String,
    /// Identifier for correlating the exchange in downstream layers.
    pub conversation_id: String,
}

/// High-level facade composing the pipeline stages.
///
/// This is the single entry point recommended for application code.
pub struct Assistant {
    retriever: Retriever,
    contextualizer: Contextualizer,
    question_answerer: QuestionAnswerer,
    language_detector: LanguageDetector,
    history_limit: usize,
}

impl Assistant {
    /// Wires the pipeline from the shared gateway and retriever facades.
    pub fn new(gateway: Arc<LlmGateway>, retriever: Retriever, cfg: AssistantConfig) -> Self {
        Self {
            retriever,
            contextualizer: Contextualizer::new(Arc::clone(&gateway)),
            question_answerer: QuestionAnswerer::new(gateway, cfg.compact_prompt_char_budget),
            language_detector: LanguageDetector::new(),
            history_limit: cfg.history_limit,
        }
    }

    /// General website chat: retrieval restricted to website content only.
    ///
    /// # Errors
    /// Propagates `AssistantError` from contextualization, retrieval, or
    /// answering.
    pub async fn chat(
        &self,
        query: &str,
        model: ModelId,
        history: &[ChatMessage],
    ) -> Result<ChatOutcome, AssistantError> {
        self.run(query, model, ScopeFilter::unscoped(), history).await
    }

    /// Chat scoped to one course or module.
    ///
    /// # Errors
    /// Propagates `AssistantError` from contextualization, retrieval, or
    /// answering.
    pub async fn chat_with_scope(
        &self,
        query: &str,
        model: ModelId,
        scope: ScopeFilter,
        history: &[ChatMessage],
    ) -> Result<ChatOutcome, AssistantError> {
        self.run(query, model, scope, history).await
    }

    async fn run(
        &self,
        query: &str,
        model: ModelId,
        scope: ScopeFilter,
        history: &[ChatMessage],
    ) -> Result<ChatOutcome, AssistantError> {
        let conversation_id = Uuid::new_v4().to_string();
        info!(
            conversation_id = %conversation_id,
            model = %model,
            scoped = scope.is_scoped(),
            "chat started"
        );

        // Bound token cost before any LLM call; keeps the most recent turns.
        let history = limit_history(history, self.history_limit);

        let rag_query = self
            .contextualizer
            .contextualize(query, history, model)
            .await?;

        let sources = self.retriever.retrieve(&rag_query, &scope).await?;
        debug!(sources = sources.len(), "sources retrieved");

        // Language and answer follow the original query, not the
        // contextualized one: that one is for retrieval only.
        let language = self.language_detector.detect(query);
        let answer_scope = AnswerScope {
            course_id: scope.course_id(),
            module_id: scope.module_id(),
        };

        let answer = self
            .question_answerer
            .answer_question(query, history, &sources, model, language, answer_scope)
            .await?;

        let message = citation_parser::parse(&answer, &sources);

        info!(conversation_id = %conversation_id, "chat completed");
        Ok(ChatOutcome {
            message,
            conversation_id,
        })
    }
}

/// Keeps the last `limit` messages of `history`, dropping the oldest.
fn limit_history(history: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    if history.len() > limit {
        &history[history.len() - limit..]
    } else {
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_truncated_to_most_recent() {
        let history: Vec<ChatMessage> = (0..14)
            .map(|i| ChatMessage::user(format!("msg {i}")))
            .collect();
        let limited = limit_history(&history, 10);
        assert_eq!(limited.len(), 10);
        assert_eq!(limited[0].content, "msg 4");
        assert_eq!(limited[9].content, "msg 13");
    }

    #[test]
    fn short_history_is_kept_as_is() {
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];
        let limited = limit_history(&history, 10);
        assert_eq!(limited.len(), 2);
    }
}
