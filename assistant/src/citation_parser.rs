//! Citation post-processing: rewrite inline `[docN]` markers into
//! deduplicated, sequentially numbered footnote links.
//!
//! Pure string transformation, deterministic, and idempotent: the first pass
//! leaves no bracket markers behind, so a second pass is an identity
//! transform. Unresolvable references are dropped with a warning instead of
//! failing, a broken citation must not break the user-facing answer.

use std::sync::LazyLock;

use rag_retriever::SourceChunk;
use regex::Regex;
use tracing::warn;

/// Rendered citation: link to the source URL with a superscript footnote.
const CITATION_TEXT: &str = r#"<a href="{url}"><sup>[{index}]</sup></a>"#;

// Markers with a decimal suffix, e.g. [doc2.3] or [doc1.2.3].
static MALFORMED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[doc\d+(?:\.\d+)+\]").expect("valid regex"));
// Markers whose suffix is a single non-digit, e.g. [docX].
static MALFORMED_NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[doc\D\]").expect("valid regex"));
// Well-formed markers.
static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[doc(\d+)\]").expect("valid regex"));
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Rewrites all `[docN]` markers in `answer` against `sources`.
///
/// - `N` resolves to `sources[N-1]`; out-of-range markers are hallucinated
///   and removed without trace
/// - the first marker per source URL becomes a footnote link; later markers
///   for the same URL are removed (no duplicate footnotes)
/// - footnotes display `1, 2, 3, ...` in order of first appearance,
///   regardless of the original `N` values
/// - malformed markers (`[doc2.3]`, `[docX]`) are stripped outright
pub fn parse(answer: &str, sources: &[SourceChunk]) -> String {
    let cleaned = MALFORMED_DECIMAL.replace_all(answer, "");
    let cleaned = MALFORMED_NON_DIGIT.replace_all(&cleaned, "");

    let mut out = String::with_capacity(cleaned.len());
    let mut seen_urls: Vec<&str> = Vec::new();
    let mut last_end = 0;

    for caps in MARKER.captures_iter(&cleaned) {
        let marker = caps.get(0).map(|m| (m.start(), m.end()));
        let n = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
        let Some(((start, end), n)) = marker.zip(n) else {
            continue;
        };

        let segment = &cleaned[last_end..start];
        last_end = end;

        match n.checked_sub(1).and_then(|idx| sources.get(idx)) {
            Some(chunk) => {
                let url = chunk.metadata.url.as_str();
                if seen_urls.contains(&url) {
                    // Duplicate footnote for an already-cited source.
                    out.push_str(segment);
                    trim_dangling_separator(&mut out);
                } else {
                    seen_urls.push(url);
                    let rendered = CITATION_TEXT
                        .replace("{url}", url)
                        .replace("{index}", &seen_urls.len().to_string());
                    out.push_str(segment);
                    out.push_str(&rendered);
                }
            }
            None => {
                warn!(marker = n, sources = sources.len(), "dropping hallucinated reference");
                out.push_str(segment);
                trim_dangling_separator(&mut out);
            }
        }
    }

    out.push_str(&cleaned[last_end..]);
    MULTI_SPACE.replace_all(&out, " ").into_owned()
}

/// Removes separators left dangling by a deleted marker, so
/// `"text, [doc5]"` collapses to `"text"` instead of `"text,"`.
fn trim_dangling_separator(buf: &mut String) {
    while buf.ends_with(' ') || buf.ends_with(',') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_retriever::{ChunkMetadata, ContentType, SourceSystem};

    fn source(url: &str) -> SourceChunk {
        SourceChunk {
            text: "text".into(),
            metadata: ChunkMetadata {
                url: url.into(),
                title: "title".into(),
                source: SourceSystem::Drupal,
                content_type: ContentType::Page,
                date_created: None,
                course_id: None,
                module_id: None,
            },
            score: Some(0.5),
        }
    }

    fn four_sources() -> Vec<SourceChunk> {
        (1..=4)
            .map(|i| source(&format!("https://ki-campus.org/p{i}")))
            .collect()
    }

    #[test]
    fn rewrites_marker_into_footnote_link() {
        let out = parse("Der Kurs startet im Mai. [doc1]", &four_sources());
        assert_eq!(
            out,
            r#"Der Kurs startet im Mai. <a href="https://ki-campus.org/p1"><sup>[1]</sup></a>"#
        );
    }

    #[test]
    fn renumbers_sequentially_by_first_appearance() {
        let out = parse("A [doc2] B [doc4]", &four_sources());
        assert!(out.contains(r#"<a href="https://ki-campus.org/p2"><sup>[1]</sup></a>"#));
        assert!(out.contains(r#"<a href="https://ki-campus.org/p4"><sup>[2]</sup></a>"#));
        assert!(!out.contains("[doc"));
    }

    #[test]
    fn deduplicates_by_url() {
        let out = parse("[doc1] and also [doc1]", &four_sources());
        assert_eq!(out.matches("<sup>").count(), 1);
        assert!(!out.contains("[doc1]"));
    }

    #[test]
    fn same_url_under_different_markers_is_cited_once() {
        let sources = vec![
            source("https://ki-campus.org/same"),
            source("https://ki-campus.org/same"),
        ];
        let out = parse("A [doc1], B [doc2]", &sources);
        assert_eq!(out.matches("<sup>").count(), 1);
    }

    #[test]
    fn removes_hallucinated_reference_without_trace() {
        let out = parse("Answer [doc1][doc99]", &four_sources()[..1]);
        assert!(out.contains(r#"<sup>[1]</sup>"#));
        assert!(!out.contains("doc99"));
        assert!(!out.contains("[]"));
    }

    #[test]
    fn removes_dangling_comma_before_deleted_marker() {
        let out = parse("siehe Kursseite, [doc99]", &four_sources());
        assert_eq!(out, "siehe Kursseite");
    }

    #[test]
    fn strips_malformed_markers_and_collapses_spaces() {
        let out = parse("text [doc2.3] more [docX] end", &four_sources());
        assert_eq!(out, "text more end");
    }

    #[test]
    fn parse_is_idempotent() {
        let sources = four_sources();
        let inputs = [
            "Der Kurs startet im Mai. [doc1]",
            "A [doc2] B [doc4], C [doc2]",
            "Answer [doc1][doc99] trailing",
            "text [doc2.3] more [docX] end",
            "no markers at all",
        ];
        for input in inputs {
            let once = parse(input, &sources);
            let twice = parse(&once, &sources);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn empty_sources_drop_every_marker() {
        let out = parse("A [doc1] B", &[]);
        assert_eq!(out, "A B");
    }
}
