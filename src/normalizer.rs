//! # Content Normalizer
//!
//! Turns extracted body text into clean paragraphs ready for chunking:
//!
//! 1. collapse whitespace inside each line
//! 2. trim lines and drop empty ones
//! 3. drop short lines that match the boilerplate denylist
//!
//! Strategies hand over DOM text, which the HTML parser has already decoded,
//! so `normalize` treats `<` and `&` as literal characters. Raw HTML
//! fragments go through `normalize_fragment`, which first strips tags
//! (script and style blocks whole) and only then decodes entities.
//!
//! It also counts words and detects the text's language with `whatlang`.

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use tracing::debug;
use whatlang::Lang;

use crate::config::ScrapeConfig;
use crate::extractor::collapse_whitespace;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("script/style regex is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[a-zA-Z][^<>]*>|<!--.*?-->").expect("tag regex is valid")
});

/// Language reported when detection is not possible or not confident
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Normalized text with its derived statistics
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    /// Paragraphs joined by `\n`
    pub text: String,

    /// Whitespace-separated tokens in `text`
    pub word_count: usize,

    /// ISO 639 code or `unknown`
    pub language: String,
}

/// Cleans text according to a [`ScrapeConfig`]
#[derive(Debug, Clone)]
pub struct Normalizer {
    boilerplate: Vec<String>,
    boilerplate_max_line_chars: usize,
    language_threshold: f64,
    language_sample_chars: usize,
    min_language_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&ScrapeConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            boilerplate: config
                .boilerplate_patterns
                .iter()
                .map(|pattern| pattern.trim().to_lowercase())
                .filter(|pattern| !pattern.is_empty())
                .collect(),
            boilerplate_max_line_chars: config.boilerplate_max_line_chars,
            language_threshold: config.language_detection_threshold,
            language_sample_chars: config.language_sample_chars,
            min_language_chars: config.min_language_chars,
        }
    }

    /// Normalize decoded body text, as produced by the extraction strategies
    pub fn normalize(&self, text: &str) -> NormalizedText {
        self.finish(clean_lines(text))
    }

    /// Normalize an HTML fragment: strip markup, decode entities, then clean
    pub fn normalize_fragment(&self, html: &str) -> NormalizedText {
        self.finish(clean_lines(&fragment_to_text(html)))
    }

    fn finish(&self, lines: Vec<String>) -> NormalizedText {
        let text = lines
            .into_iter()
            .filter(|line| !self.is_boilerplate(line))
            .collect::<Vec<_>>()
            .join("\n");
        let word_count = text.split_whitespace().count();
        let language = self.detect_language(&text);
        debug!(word_count, language = %language, "normalized text");
        NormalizedText {
            text,
            word_count,
            language,
        }
    }

    /// Single-line cleanup for titles, bylines and tags; no boilerplate filter
    pub fn clean_inline(&self, text: &str) -> String {
        clean_lines(text).join(" ")
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        if line.chars().count() > self.boilerplate_max_line_chars {
            return false;
        }
        let lower = line.to_lowercase();
        self.boilerplate
            .iter()
            .any(|pattern| lower.contains(pattern.as_str()))
    }

    /// Detected language of `text`, or [`UNKNOWN_LANGUAGE`]
    pub fn detect_language(&self, text: &str) -> String {
        if text.chars().count() < self.min_language_chars {
            return UNKNOWN_LANGUAGE.to_string();
        }
        let sample: String = text.chars().take(self.language_sample_chars).collect();
        match whatlang::detect(&sample) {
            Some(info) if info.confidence() >= self.language_threshold => {
                language_code(info.lang()).to_string()
            }
            _ => UNKNOWN_LANGUAGE.to_string(),
        }
    }
}

/// Steps 1 and 2: trimmed, whitespace-collapsed, non-empty lines
fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Tags go before entities are decoded, so escaped markup survives as text
fn fragment_to_text(html: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(html, "");
    let without_tags = TAG.replace_all(&without_blocks, " ");
    decode_html_entities(&without_tags).into_owned()
}

/// ISO 639-1 where one exists, ISO 639-3 otherwise
fn language_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Rus => "ru",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Nld => "nl",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Pol => "pl",
        Lang::Ces => "cs",
        Lang::Tur => "tr",
        Lang::Ukr => "uk",
        Lang::Ell => "el",
        Lang::Heb => "he",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        Lang::Tha => "th",
        other => other.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_cleans_markup_and_whitespace() {
        let normalizer = Normalizer::default();
        let raw = "  Fish &amp; chips   are   great.  \n\n<script>var x = 1;</script>\n<b>Bold</b> move &lt;3\n   \n";
        let normalized = normalizer.normalize_fragment(raw);
        assert_eq!(normalized.text, "Fish & chips are great.\nBold move <3");
        assert_eq!(normalized.word_count, 8);
    }

    #[test]
    fn test_boilerplate_lines_are_dropped_only_when_short() {
        let normalizer = Normalizer::default();
        let long_paragraph = format!(
            "{} Read our privacy policy for details.",
            "This paragraph carries real article content. ".repeat(6)
        );
        let raw = format!(
            "Real content line.\nWe use cookies to improve your experience.\n{}",
            long_paragraph
        );
        let normalized = normalizer.normalize(&raw);
        assert!(normalized.text.starts_with("Real content line.\n"));
        assert!(!normalized.text.contains("We use cookies"));
        assert!(normalized.text.contains("privacy policy"));
    }

    #[test]
    fn test_language_detection() {
        let normalizer = Normalizer::default();
        let english = "The quick brown fox jumps over the lazy dog while the farmer watches from the porch and drinks his coffee.";
        assert_eq!(normalizer.normalize(english).language, "en");
        assert_eq!(normalizer.normalize("Too short").language, UNKNOWN_LANGUAGE);
        assert_eq!(normalizer.normalize("").language, UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_fragment_keeps_escaped_markup_as_text() {
        let normalized = Normalizer::default()
            .normalize_fragment("<p>Use &lt;nav&gt; for menus and write &amp;amp; in source.</p>");
        assert_eq!(
            normalized.text,
            "Use <nav> for menus and write &amp; in source."
        );
    }

    #[test]
    fn test_decoded_text_is_taken_literally() {
        let normalizer = Normalizer::default();
        let text = "Wrap the navigation in a <nav> element and the body in <main>.\nWrite &amp; in source to get an ampersand.";
        let normalized = normalizer.normalize(text);
        assert_eq!(normalized.text, text);
        assert_eq!(
            normalizer.clean_inline("  Breaking:\n  <em> &amp; views "),
            "Breaking: <em> &amp; views"
        );
    }

    #[test]
    fn test_empty_input() {
        let normalized = Normalizer::default().normalize("   \n\t ");
        assert_eq!(normalized.text, "");
        assert_eq!(normalized.word_count, 0);
    }
}
