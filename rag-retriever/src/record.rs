//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Originating system of an indexed chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSystem {
    /// Website pages and blog posts.
    Drupal,
    /// Course content from the learning platform.
    Moodle,
    /// Aggregated external course metadata.
    Moochup,
}

/// Content category of an indexed chunk.
///
/// The index carries a small open set of categories; unknown values decode
/// to [`ContentType::Other`] instead of failing the whole hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Course,
    Blogpost,
    Page,
    AboutUs,
    DvvPage,
    #[serde(other)]
    Other,
}

/// Metadata stored alongside each chunk in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub source: SourceSystem,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub module_id: Option<i64>,
}

/// A retrieved unit of content, ordered by similarity score descending.
///
/// Ephemeral: lives only for the duration of one answer-generation call.
/// List position is significant downstream, where reference numbers are
/// assigned by 1-based index.
#[derive(Clone, Debug)]
pub struct SourceChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: Option<f32>,
}

/// Flat payload shape as stored in the index: `text` next to the metadata fields.
#[derive(Deserialize)]
struct FlatPayload {
    #[serde(default)]
    text: String,
    #[serde(flatten)]
    metadata: ChunkMetadata,
}

impl SourceChunk {
    /// Decodes one search hit payload into a chunk.
    ///
    /// Hits with undecodable payloads (missing url/source, wrong types) are
    /// dropped with a debug log rather than failing the whole retrieval.
    pub fn from_payload(payload: serde_json::Value, score: f32) -> Option<Self> {
        match serde_json::from_value::<FlatPayload>(payload) {
            Ok(flat) => Some(Self {
                text: flat.text,
                metadata: flat.metadata,
                score: Some(score),
            }),
            Err(e) => {
                debug!(error = %e, "dropping hit with undecodable payload");
                None
            }
        }
    }

    /// Renders the chunk the way it is shown to the model: the content
    /// followed by the metadata as one JSON object.
    pub fn render(&self) -> String {
        let metadata = serde_json::to_string(&self.metadata).unwrap_or_else(|_| "{}".into());
        format!("Content: {}\nMetadata: {}", self.text, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_flat_payload() {
        let payload = json!({
            "text": "KI-Campus bietet kostenlose Online-Kurse.",
            "url": "https://ki-campus.org/about",
            "title": "Über uns",
            "source": "drupal",
            "type": "about_us",
            "date_created": "2023-04-01",
        });
        let chunk = SourceChunk::from_payload(payload, 0.87).unwrap();
        assert_eq!(chunk.metadata.source, SourceSystem::Drupal);
        assert_eq!(chunk.metadata.content_type, ContentType::AboutUs);
        assert_eq!(chunk.metadata.course_id, None);
        assert_eq!(chunk.score, Some(0.87));
    }

    #[test]
    fn unknown_content_type_maps_to_other() {
        let payload = json!({
            "text": "t",
            "url": "https://ki-campus.org/x",
            "source": "moodle",
            "type": "video_transcript",
            "course_id": 79,
            "module_id": 422,
        });
        let chunk = SourceChunk::from_payload(payload, 0.5).unwrap();
        assert_eq!(chunk.metadata.content_type, ContentType::Other);
        assert_eq!(chunk.metadata.course_id, Some(79));
        assert_eq!(chunk.metadata.module_id, Some(422));
    }

    #[test]
    fn undecodable_payload_is_dropped() {
        let payload = json!({ "text": "no url or source here" });
        assert!(SourceChunk::from_payload(payload, 0.1).is_none());
    }

    #[test]
    fn render_shows_content_then_metadata_json() {
        let chunk = SourceChunk {
            text: "Der Kurs startet im Mai.".into(),
            metadata: ChunkMetadata {
                url: "https://moodle.ki-campus.org/course/view.php?id=79".into(),
                title: "Kursstart".into(),
                source: SourceSystem::Moodle,
                content_type: ContentType::Course,
                date_created: None,
                course_id: Some(79),
                module_id: None,
            },
            score: Some(0.9),
        };
        let rendered = chunk.render();
        assert!(rendered.starts_with("Content: Der Kurs startet im Mai.\nMetadata: {"));
        assert!(rendered.contains(r#""url":"https://moodle.ki-campus.org/course/view.php?id=79""#));
        assert!(rendered.contains(r#""type":"course""#));
    }
}
