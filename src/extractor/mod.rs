//! # Extraction Strategy Set
//!
//! One strategy per [`SiteType`] plus a readability-style generic fallback.
//! Every strategy turns a page's raw HTML into a [`RawExtraction`]: title,
//! body text, optional byline fields, images, tags and a content type.
//!
//! ## Key Components
//!
//! - `Strategy`: closed set of strategies, dispatched by site type
//! - `RawExtraction`: unnormalized fields pulled from the page
//! - `ExtractOptions`: per-run knobs taken from the scrape configuration
//! - `ExpectedField`: fields a strategy promises, used for quality scoring
//!
//! Strategies fail with [`ExtractError`] only when the container they rely
//! on is missing or holds no text. Short content is a scoring concern.

mod dom;
mod error;
mod generic;
mod linkedin;
mod reddit;
mod research;
mod twitter;
mod wikipedia;

pub use error::ExtractError;

pub(crate) use dom::collapse_whitespace;

use std::fmt;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::classifier::SiteType;
use crate::record::{ContentType, ImageInfo};

/// Fields pulled from a page before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExtraction {
    /// Page or post title; may be empty
    pub title: String,

    /// Body text, one block per line
    pub body: String,

    /// Author or byline, if the page exposes one
    pub author: Option<String>,

    /// Publication date exactly as found on the page
    pub publish_date: Option<String>,

    /// Images with alt text or caption, in document order
    pub images: Vec<ImageInfo>,

    /// Site-provided tags (categories, hashtags, keywords)
    pub tags: Vec<String>,

    /// Kind of content the page holds
    pub content_type: ContentType,
}

/// Fields a strategy declares as expected on a well-formed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedField {
    /// Non-empty title
    Title,
    /// Non-empty body text
    Body,
    /// Author or byline
    Author,
    /// Publication date
    PublishDate,
}

/// Options handed to every strategy
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum number of top-level comments folded into a Reddit body
    pub max_comments: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { max_comments: 5 }
    }
}

/// Closed set of extraction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Wikipedia article layout
    Wikipedia,
    /// LinkedIn articles and posts
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// Reddit post plus top-level comments
    Reddit,
    /// Tweet and thread continuation
    Twitter,
    /// Academic paper templates
    ResearchPaper,
    /// Readability heuristic for any page
    Generic,
}

impl Strategy {
    /// Strategy registered for a site type
    pub fn for_site(site_type: SiteType) -> Self {
        match site_type {
            SiteType::Wikipedia => Strategy::Wikipedia,
            SiteType::LinkedIn => Strategy::LinkedIn,
            SiteType::Reddit => Strategy::Reddit,
            SiteType::Twitter => Strategy::Twitter,
            SiteType::ResearchPaper => Strategy::ResearchPaper,
            SiteType::Generic => Strategy::Generic,
        }
    }

    /// Whether this is the generic fallback
    pub fn is_generic(&self) -> bool {
        matches!(self, Strategy::Generic)
    }

    /// Fields this strategy expects to find on a well-formed page
    pub fn expected_fields(&self) -> &'static [ExpectedField] {
        use ExpectedField::*;
        match self {
            Strategy::Wikipedia => &[Title, Body],
            Strategy::LinkedIn => &[Title, Body, Author, PublishDate],
            Strategy::Reddit => &[Title, Body, Author],
            Strategy::Twitter => &[Body, Author],
            Strategy::ResearchPaper => &[Title, Body, Author, PublishDate],
            Strategy::Generic => &[Title, Body],
        }
    }

    /// Extract raw fields from a page
    #[instrument(skip(html, options), fields(strategy = %self, url = %url))]
    pub fn extract(
        &self,
        html: &str,
        url: &Url,
        options: &ExtractOptions,
    ) -> Result<RawExtraction, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyBody);
        }
        let document = Html::parse_document(html);
        let extraction = match self {
            Strategy::Wikipedia => wikipedia::extract(document),
            Strategy::LinkedIn => linkedin::extract(document, url),
            Strategy::Reddit => reddit::extract(document, url, options),
            Strategy::Twitter => twitter::extract(document),
            Strategy::ResearchPaper => research::extract(document),
            Strategy::Generic => generic::extract(document),
        }?;
        debug!(
            title = %extraction.title,
            body_chars = extraction.body.len(),
            images = extraction.images.len(),
            "extracted raw fields"
        );
        Ok(extraction)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Wikipedia => "wikipedia",
            Strategy::LinkedIn => "linkedin",
            Strategy::Reddit => "reddit",
            Strategy::Twitter => "twitter",
            Strategy::ResearchPaper => "research_paper",
            Strategy::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Fail with [`ExtractError::EmptyBody`] when no text survived extraction
fn require_body(body: String) -> Result<String, ExtractError> {
    if body.trim().is_empty() {
        Err(ExtractError::EmptyBody)
    } else {
        Ok(body)
    }
}
