//! # Scrape Records
//!
//! The output unit of the pipeline and the JSON wire contract consumed by
//! embedding and indexing jobs. Field names and nesting are stable.
//!
//! ## Key Components
//!
//! - `ScrapeRecord`: one extracted page with its chunks
//! - `Source`, `Content`, `Metadata`, `Processing`: the four record sections
//! - `content_id`: stable SHA-256 identity over url and normalized text
//! - `parse_publish_date`: lenient date parsing into ISO dates

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chunker::Chunk;
use crate::classifier::SiteType;

/// A scraped page, ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRecord {
    /// SHA-256 hex digest over url and normalized text
    pub id: String,

    /// Where the content came from
    pub source: Source,

    /// The normalized content
    pub content: Content,

    /// Byline, dates and tags
    pub metadata: Metadata,

    /// How the record was produced
    pub processing: Processing,
}

/// Origin of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// The URL as given
    pub url: String,

    /// Lowercased host without a leading `www.`
    pub domain: String,

    /// Classification of the URL
    pub site_type: SiteType,

    /// When the record was assembled
    pub scraped_at: DateTime<Utc>,
}

/// Normalized page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,

    /// Paragraphs separated by a single newline
    pub text: String,

    pub word_count: usize,

    /// ISO 639 language code, or `unknown`
    pub language: String,

    pub images: Vec<ImageInfo>,
}

/// Image described by alt text and/or a figure caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub alt_text: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub author: Option<String>,

    /// Publication date, when one could be parsed
    pub publish_date: Option<NaiveDate>,

    /// Lowercase tags, serialized sorted
    pub tags: BTreeSet<String>,

    pub content_type: ContentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processing {
    pub extraction_method: ExtractionMethod,

    /// Advisory quality estimate in [0, 1]
    pub confidence_score: f64,

    /// Ordered chunks of `content.text`
    pub chunks: Vec<Chunk>,
}

/// Kind of content a page holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    #[default]
    Article,
    Post,
    CommentThread,
    Paper,
    Generic,
}

/// Whether a site-specific strategy or the generic fallback produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    SiteSpecific,
    Generic,
}

/// Stable record identity: equal url and text always give the same id
pub fn content_id(url: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    // Separator keeps ("ab", "c") and ("a", "bc") apart
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Parse a date as found on a page.
///
/// Accepts RFC 3339 and RFC 2822 timestamps, a handful of common written
/// formats, and any string starting with `YYYY-MM-DD`. Returns `None` for
/// anything else.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc2822(raw) {
        return Some(timestamp.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_publish_date_formats() {
        assert_eq!(parse_publish_date("2024-03-05T10:00:00Z"), date(2024, 3, 5));
        assert_eq!(
            parse_publish_date("Tue, 5 Mar 2024 10:00:00 +0000"),
            date(2024, 3, 5)
        );
        assert_eq!(parse_publish_date("2024-03-05"), date(2024, 3, 5));
        assert_eq!(parse_publish_date("2024-03-05T10:00:00"), date(2024, 3, 5));
        assert_eq!(parse_publish_date("2017/06/12"), date(2017, 6, 12));
        assert_eq!(parse_publish_date("March 5, 2024"), date(2024, 3, 5));
        assert_eq!(parse_publish_date("Mar 5, 2024"), date(2024, 3, 5));
        assert_eq!(parse_publish_date("5 March 2024"), date(2024, 3, 5));
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        assert_eq!(parse_publish_date(""), None);
        assert_eq!(parse_publish_date("yesterday"), None);
        assert_eq!(parse_publish_date("2024-13-45"), None);
    }

    #[test]
    fn test_content_id_is_stable_and_sensitive() {
        let id = content_id("https://example.com/a", "Hello world");
        assert_eq!(id, content_id("https://example.com/a", "Hello world"));
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, content_id("https://example.com/a", "Hello world!"));
        assert_ne!(id, content_id("https://example.com/b", "Hello world"));
        assert_ne!(content_id("ab", "c"), content_id("a", "bc"));
    }

    #[test]
    fn test_record_wire_format() {
        let record = ScrapeRecord {
            id: content_id("https://example.com/", "Body"),
            source: Source {
                url: "https://example.com/".to_string(),
                domain: "example.com".to_string(),
                site_type: SiteType::Reddit,
                scraped_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            },
            content: Content {
                title: "Title".to_string(),
                text: "Body".to_string(),
                word_count: 1,
                language: "unknown".to_string(),
                images: vec![],
            },
            metadata: Metadata {
                author: None,
                publish_date: date(2024, 1, 2),
                tags: ["zeta", "alpha"].iter().map(|t| t.to_string()).collect(),
                content_type: ContentType::CommentThread,
            },
            processing: Processing {
                extraction_method: ExtractionMethod::SiteSpecific,
                confidence_score: 0.5,
                chunks: vec![Chunk {
                    text: "Body".to_string(),
                    position: 1,
                    char_count: 4,
                }],
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["source"]["site_type"], json!("reddit"));
        assert_eq!(value["metadata"]["author"], json!(null));
        assert_eq!(value["metadata"]["publish_date"], json!("2024-01-02"));
        assert_eq!(value["metadata"]["tags"], json!(["alpha", "zeta"]));
        assert_eq!(value["metadata"]["content_type"], json!("comment-thread"));
        assert_eq!(
            value["processing"]["extraction_method"],
            json!("site_specific")
        );
        assert_eq!(value["processing"]["chunks"][0]["char_count"], json!(4));

        let back: ScrapeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
