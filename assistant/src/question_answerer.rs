//! Answer generation over the retrieved sources.
//!
//! Selects a system template by scope, a prompt variant by model capability,
//! and maps the model's "no answer found" sentinel to a staged user-facing
//! fallback.

use std::sync::Arc;

use llm_gateway::{ChatMessage, ChatRole, LlmGateway, ModelId};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AssistantError;
use crate::prompt;

/// Answering scope, derived from the retrieval scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnswerScope {
    pub course_id: Option<i64>,
    pub module_id: Option<i64>,
}

impl AnswerScope {
    pub fn is_scoped(&self) -> bool {
        self.course_id.is_some()
    }
}

/// Which fallback message the user gets when the model finds no answer.
///
/// The first failure asks the user to rephrase; when the previous assistant
/// turn was already that exact message, the rephrasing attempt failed too
/// and the fallback escalates to support or the course page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackStage {
    FirstFailure,
    RepeatedFailure,
}

impl FallbackStage {
    /// Derives the stage from the previous assistant turn in `history`.
    pub fn from_history(history: &[ChatMessage]) -> Self {
        let previous_assistant = history
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant);

        match previous_assistant {
            Some(m)
                if m.content == prompt::first_fallback("German")
                    || m.content == prompt::first_fallback("English") =>
            {
                Self::RepeatedFailure
            }
            _ => Self::FirstFailure,
        }
    }
}

/// Shape of the compact variant's JSON response.
#[derive(Deserialize)]
struct CompactAnswer {
    answer: String,
}

pub struct QuestionAnswerer {
    gateway: Arc<LlmGateway>,
    compact_char_budget: usize,
}

impl QuestionAnswerer {
    pub fn new(gateway: Arc<LlmGateway>, compact_char_budget: usize) -> Self {
        Self {
            gateway,
            compact_char_budget,
        }
    }

    /// Answers `query` from the retrieved `sources`.
    ///
    /// The query passed here is the user's original message, not the
    /// contextualized retrieval query: the answer must address the literal
    /// question asked. Zero sources is not an error; the model is shown an
    /// empty source block and signals the sentinel, which resolves to a
    /// graceful fallback.
    ///
    /// # Errors
    /// - [`AssistantError::Gateway`] on backend failures
    /// - [`AssistantError::EmptyAnswer`] on empty model output
    pub async fn answer_question(
        &self,
        query: &str,
        history: &[ChatMessage],
        sources: &[rag_retriever::SourceChunk],
        model: ModelId,
        language: &str,
        scope: AnswerScope,
    ) -> Result<String, AssistantError> {
        let compact = !model.is_primary();

        let template = if scope.module_id.is_some() {
            prompt::MODULE_SYSTEM_PROMPT
        } else if scope.course_id.is_some() {
            prompt::COURSE_SYSTEM_PROMPT
        } else {
            prompt::WEBSITE_SYSTEM_PROMPT
        };
        let template = if compact {
            prompt::COMPACT_SYSTEM_PROMPT
        } else {
            template
        };
        let system_prompt = prompt::render_system_prompt(template, language);

        let char_budget = compact.then_some(self.compact_char_budget);
        let sources_block = prompt::format_sources(sources, char_budget);
        let user_query = prompt::build_user_query(query, &sources_block);

        debug!(
            model = %model,
            compact,
            sources = sources.len(),
            scoped = scope.is_scoped(),
            "answering question"
        );

        let response = self
            .gateway
            .chat(&user_query, history, model, &system_prompt)
            .await?;

        let raw = if compact {
            extract_compact_answer(&response.content)
        } else {
            response.content
        };

        let answer = raw.trim();
        if answer.is_empty() {
            return Err(AssistantError::EmptyAnswer);
        }

        Ok(resolve_answer(answer, history, language, scope))
    }
}

/// Extracts the `answer` field from the compact variant's JSON response.
///
/// Smaller models regularly emit malformed JSON; in that case the raw text
/// is used as the answer instead of failing the request.
fn extract_compact_answer(content: &str) -> String {
    match serde_json::from_str::<CompactAnswer>(content.trim()) {
        Ok(parsed) => parsed.answer,
        Err(e) => {
            warn!(error = %e, "compact answer is not valid JSON, using raw text");
            content.to_string()
        }
    }
}

/// Maps the sentinel to the staged fallback; any other answer passes through.
fn resolve_answer(
    answer: &str,
    history: &[ChatMessage],
    language: &str,
    scope: AnswerScope,
) -> String {
    if answer != prompt::NO_ANSWER_FOUND {
        return answer.to_string();
    }

    match FallbackStage::from_history(history) {
        FallbackStage::FirstFailure => prompt::first_fallback(language),
        FallbackStage::RepeatedFailure => prompt::escalation_fallback(language, scope.course_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_answer_parses_strict_json() {
        let out = extract_compact_answer(r#"{"answer": "Der Kurs behandelt Deep Learning."}"#);
        assert_eq!(out, "Der Kurs behandelt Deep Learning.");
    }

    #[test]
    fn compact_answer_falls_back_to_raw_text() {
        let out = extract_compact_answer("Der Kurs behandelt Deep Learning. [doc1]");
        assert_eq!(out, "Der Kurs behandelt Deep Learning. [doc1]");
    }

    #[test]
    fn first_sentinel_asks_to_rephrase() {
        let out = resolve_answer("NO_ANSWER_FOUND", &[], "German", AnswerScope::default());
        assert_eq!(out, prompt::first_fallback("German"));
    }

    #[test]
    fn repeated_sentinel_escalates_to_support() {
        let history = vec![
            ChatMessage::user("Was ist XY?"),
            ChatMessage::assistant(prompt::first_fallback("German")),
            ChatMessage::user("Ich meine das Thema XY."),
        ];
        let out = resolve_answer("NO_ANSWER_FOUND", &history, "German", AnswerScope::default());
        assert!(out.contains("support@ki-campus.org"));
    }

    #[test]
    fn repeated_sentinel_in_course_scope_links_the_course() {
        let history = vec![ChatMessage::assistant(prompt::first_fallback("English"))];
        let scope = AnswerScope {
            course_id: Some(79),
            module_id: None,
        };
        let out = resolve_answer("NO_ANSWER_FOUND", &history, "English", scope);
        assert!(out.contains("course/view.php?id=79"));
    }

    #[test]
    fn stage_is_first_when_last_assistant_turn_is_ordinary() {
        let history = vec![
            ChatMessage::assistant(prompt::first_fallback("German")),
            ChatMessage::user("Und was noch?"),
            ChatMessage::assistant("Der Kurs behandelt neuronale Netze."),
        ];
        assert_eq!(
            FallbackStage::from_history(&history),
            FallbackStage::FirstFailure
        );
    }

    #[test]
    fn non_sentinel_answer_passes_through() {
        let out = resolve_answer(
            "Der Kurs startet im Mai. [doc1]",
            &[],
            "German",
            AnswerScope::default(),
        );
        assert_eq!(out, "Der Kurs startet im Mai. [doc1]");
    }
}
