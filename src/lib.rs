//! # pagesift - Content Extraction and Chunking for Scraped Pages
//!
//! This crate turns fetched HTML into clean, structured records ready for
//! embedding and indexing pipelines. Each page is classified by its host,
//! run through a site-specific extraction strategy with a readability-style
//! generic fallback, normalized, split into bounded chunks and scored for
//! extraction quality.
//!
//! ## Features
//!
//! - Host-based site classification with a configurable rule table
//! - Strategies for Wikipedia, LinkedIn, Reddit, Twitter/X and research papers
//! - Generic readability fallback for every other page
//! - Boilerplate filtering, entity decoding and language detection
//! - Sentence-aware chunking with optional overlap
//! - Quality scoring from length, field completeness and strategy
//! - Rate-limited async fetching with retries and JSON output helpers
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagesift::{ScrapeConfig, Scraper};
//!
//! fn main() -> pagesift::Result<()> {
//!     let scraper = Scraper::new(ScrapeConfig::builder().chunk_size(500).build())?;
//!
//!     let html = std::fs::read_to_string("page.html")?;
//!     let record = scraper.scrape("https://en.wikipedia.org/wiki/Rust", &html)?;
//!
//!     println!("{} ({} chunks)", record.content.title, record.processing.chunks.len());
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```

mod error;

pub mod chunker;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod keywords;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod scorer;

// Outer collaborators
pub mod fetch;
pub mod sink;

pub use chunker::{Chunk, ChunkOptions, chunk_text};
pub use classifier::{SiteClassifier, SiteRule, SiteType};
pub use config::ScrapeConfig;
pub use error::{Error, FailedAttempt, Result};
pub use extractor::{ExtractError, RawExtraction, Strategy};
pub use fetch::{Fetcher, FetcherConfig};
pub use pipeline::{FetchedPage, PageOutcome, Scraper};
pub use record::{ContentType, ExtractionMethod, ScrapeRecord};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::config::ScrapeConfig;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::pipeline::{FetchedPage, PageOutcome, Scraper};
    pub use crate::record::ScrapeRecord;
}
