//! Answer-language detection for the user query.
//!
//! The platform audience writes German or English, so detection is
//! restricted to those two. Undetectable input (too short, emoji only)
//! defaults to German, the platform's main language.

use whatlang::{Detector, Lang};

pub struct LanguageDetector {
    detector: Detector,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self {
            detector: Detector::with_allowlist(vec![Lang::Eng, Lang::Deu]),
        }
    }

    /// Returns the language name injected into the answer prompts.
    pub fn detect(&self, text: &str) -> &'static str {
        match self.detector.detect_lang(text) {
            Some(Lang::Eng) => "English",
            _ => "German",
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_german() {
        let d = LanguageDetector::new();
        assert_eq!(
            d.detect("Welche Kurse gibt es zum Thema maschinelles Lernen?"),
            "German"
        );
    }

    #[test]
    fn detects_english() {
        let d = LanguageDetector::new();
        assert_eq!(
            d.detect("Which courses do you offer about machine learning?"),
            "English"
        );
    }

    #[test]
    fn defaults_to_german_when_undetectable() {
        let d = LanguageDetector::new();
        assert_eq!(d.detect("🤖"), "German");
    }
}
