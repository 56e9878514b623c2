//! # Scrape Configuration Module
//!
//! Immutable settings for the extraction pipeline: chunking, normalization,
//! language detection, boilerplate filtering, tagging, classification rules
//! and quality-score weights. A configuration is built once, validated, and
//! handed to [`crate::Scraper`].
//!
//! ## Key Components
//!
//! - `ScrapeConfig`: the main configuration struct
//! - `ScrapeConfigBuilder`: builder pattern implementation for easier configuration
//!
//! ## Features
//!
//! - Defaults suitable for embedding pipelines (1000-character chunks, no overlap)
//! - JSON configuration files where every field is optional
//! - Overridable site classification table and scoring weights

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunker::ChunkOptions;
use crate::classifier::{SiteRule, default_rules};
use crate::error::{Error, Result};
use crate::scorer::ScoreWeights;

/// Lines containing one of these (case-insensitive) are dropped when short
const DEFAULT_BOILERPLATE: &[&str] = &[
    "accept all cookies",
    "we use cookies",
    "this website uses cookies",
    "cookie policy",
    "subscribe to our newsletter",
    "sign up for our newsletter",
    "all rights reserved",
    "privacy policy",
    "terms of service",
    "terms of use",
    "skip to content",
    "skip to main content",
    "share this article",
    "share on facebook",
    "share on twitter",
    "advertisement",
    "click here to",
    "enable javascript",
    "log in to continue",
    "sign in to continue",
];

/// Configuration for the scrape pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters repeated from the previous chunk
    pub overlap: usize,

    /// Minimum detector confidence to report a language
    pub language_detection_threshold: f64,

    /// Leading characters of the text sampled for language detection
    pub language_sample_chars: usize,

    /// Texts shorter than this report `unknown`
    pub min_language_chars: usize,

    /// Case-insensitive substrings marking boilerplate lines
    pub boilerplate_patterns: Vec<String>,

    /// Lines longer than this are never treated as boilerplate
    pub boilerplate_max_line_chars: usize,

    /// Top-level comments kept from discussion threads
    pub max_comments: usize,

    /// Frequency keywords added to tags; 0 disables
    pub max_keywords: usize,

    /// Ordered hostname rules for site classification
    pub site_rules: Vec<SiteRule>,

    /// Quality score weights
    pub scoring: ScoreWeights,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 0,
            language_detection_threshold: 0.5,
            language_sample_chars: 2000,
            min_language_chars: 20,
            boilerplate_patterns: DEFAULT_BOILERPLATE.iter().map(|p| p.to_string()).collect(),
            boilerplate_max_line_chars: 200,
            max_comments: 5,
            max_keywords: 10,
            site_rules: default_rules(),
            scoring: ScoreWeights::default(),
        }
    }
}

/// Builder for ScrapeConfig
#[derive(Debug, Default)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ScrapeConfig::default(),
        }
    }

    /// Set the maximum chunk size in characters
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Set the overlap between consecutive chunks in characters
    pub fn overlap(mut self, overlap: usize) -> Self {
        self.config.overlap = overlap;
        self
    }

    /// Set the language detection confidence threshold
    pub fn language_detection_threshold(mut self, threshold: f64) -> Self {
        self.config.language_detection_threshold = threshold;
        self
    }

    /// Set how many leading characters are sampled for language detection
    pub fn language_sample_chars(mut self, chars: usize) -> Self {
        self.config.language_sample_chars = chars;
        self
    }

    /// Replace the boilerplate denylist
    pub fn boilerplate_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.boilerplate_patterns = patterns;
        self
    }

    /// Set the length above which lines are never boilerplate
    pub fn boilerplate_max_line_chars(mut self, chars: usize) -> Self {
        self.config.boilerplate_max_line_chars = chars;
        self
    }

    /// Set the number of top-level comments kept from threads
    pub fn max_comments(mut self, max_comments: usize) -> Self {
        self.config.max_comments = max_comments;
        self
    }

    /// Set the number of frequency keywords added to tags
    pub fn max_keywords(mut self, max_keywords: usize) -> Self {
        self.config.max_keywords = max_keywords;
        self
    }

    /// Replace the site classification rules
    pub fn site_rules(mut self, rules: Vec<SiteRule>) -> Self {
        self.config.site_rules = rules;
        self
    }

    /// Set the quality score weights
    pub fn scoring(mut self, scoring: ScoreWeights) -> Self {
        self.config.scoring = scoring;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScrapeConfig {
        self.config
    }
}

impl ScrapeConfig {
    /// Create a new builder
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::new()
    }

    /// Read a JSON configuration file; missing fields take their defaults
    pub async fn read_config(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: ScrapeConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable together
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.language_detection_threshold) {
            return Err(Error::Config(format!(
                "language_detection_threshold must be within [0, 1], got {}",
                self.language_detection_threshold
            )));
        }
        self.scoring.validate()?;
        if let Some(rule) = self.site_rules.iter().find(|rule| rule.pattern.trim().is_empty()) {
            return Err(Error::Config(format!(
                "site rule for {} has an empty pattern",
                rule.site_type
            )));
        }
        Ok(())
    }

    /// Chunking options derived from this configuration
    pub fn chunk_options(&self) -> ChunkOptions {
        ChunkOptions {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
        }
    }
}
