//! # Site Classifier
//!
//! Maps a URL to the [`SiteType`] that selects its extraction strategy.
//! Classification walks an ordered table of hostname rules; the first rule
//! whose pattern matches the host wins and anything unmatched is `generic`.
//!
//! Patterns come in two shapes:
//!
//! - `*.example.org` matches `example.org` and every subdomain of it
//! - `example.org` matches that exact host only
//!
//! A leading `www.` is removed from the host before matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Closed classification of a URL's originating platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    /// Wikipedia articles in any language edition
    Wikipedia,
    /// LinkedIn articles, blog posts and feed posts
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// Reddit threads
    Reddit,
    /// Twitter/X posts and threads
    Twitter,
    /// Academic publishers and preprint servers
    ResearchPaper,
    /// Everything else
    Generic,
}

impl SiteType {
    /// Wire name of the site type
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::Wikipedia => "wikipedia",
            SiteType::LinkedIn => "linkedin",
            SiteType::Reddit => "reddit",
            SiteType::Twitter => "twitter",
            SiteType::ResearchPaper => "research_paper",
            SiteType::Generic => "generic",
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hostname rule in the classification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRule {
    /// Host pattern, either `*.domain` or an exact host
    pub pattern: String,

    /// Site type assigned when the pattern matches
    pub site_type: SiteType,
}

impl SiteRule {
    /// Create a rule
    pub fn new(pattern: impl Into<String>, site_type: SiteType) -> Self {
        Self {
            pattern: pattern.into(),
            site_type,
        }
    }

    /// Whether this rule's pattern matches a normalized host
    pub fn matches(&self, host: &str) -> bool {
        let pattern = self.pattern.trim().to_ascii_lowercase();
        match pattern.strip_prefix("*.") {
            Some(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            None => host == pattern,
        }
    }
}

/// Research hosts recognised out of the box
const RESEARCH_DOMAINS: &[&str] = &[
    "arxiv.org",
    "researchgate.net",
    "scholar.google.com",
    "pubmed.ncbi.nlm.nih.gov",
    "ncbi.nlm.nih.gov",
    "ieee.org",
    "acm.org",
    "springer.com",
    "sciencedirect.com",
    "nature.com",
    "science.org",
    "biorxiv.org",
    "medrxiv.org",
    "semanticscholar.org",
    "plos.org",
];

/// The default rule table, in match order
pub fn default_rules() -> Vec<SiteRule> {
    let mut rules = vec![
        SiteRule::new("*.wikipedia.org", SiteType::Wikipedia),
        SiteRule::new("*.linkedin.com", SiteType::LinkedIn),
        SiteRule::new("linkedin.co.uk", SiteType::LinkedIn),
        SiteRule::new("*.reddit.com", SiteType::Reddit),
        SiteRule::new("redd.it", SiteType::Reddit),
        SiteRule::new("*.twitter.com", SiteType::Twitter),
        SiteRule::new("*.x.com", SiteType::Twitter),
    ];
    rules.extend(
        RESEARCH_DOMAINS
            .iter()
            .map(|domain| SiteRule::new(format!("*.{domain}"), SiteType::ResearchPaper)),
    );
    rules
}

/// Hostname-pattern classifier
#[derive(Debug, Clone)]
pub struct SiteClassifier {
    rules: Vec<SiteRule>,
}

impl Default for SiteClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl SiteClassifier {
    /// Create a classifier from an ordered rule table
    pub fn new(rules: Vec<SiteRule>) -> Self {
        Self { rules }
    }

    /// The rule table in match order
    pub fn rules(&self) -> &[SiteRule] {
        &self.rules
    }

    /// Classify a URL string
    pub fn classify(&self, url: &str) -> Result<SiteType> {
        let parsed = parse_url(url)?;
        Ok(self.classify_url(&parsed))
    }

    /// Classify an already parsed URL
    pub fn classify_url(&self, url: &Url) -> SiteType {
        let Some(host) = normalized_host(url) else {
            return SiteType::Generic;
        };
        let site_type = self
            .rules
            .iter()
            .find(|rule| rule.matches(&host))
            .map(|rule| rule.site_type)
            .unwrap_or(SiteType::Generic);
        debug!(host = %host, site_type = %site_type, "classified url");
        site_type
    }
}

/// Parse an absolute URL with a host, rejecting everything else
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid URL '{}': {}", url, e)))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidInput(format!("URL '{}' has no host", url)));
    }
    Ok(parsed)
}

/// Domain recorded for a URL: lowercase host without a leading `www.`
pub fn domain_of(url: &str) -> Result<String> {
    let parsed = parse_url(url)?;
    normalized_host(&parsed)
        .ok_or_else(|| Error::InvalidInput(format!("URL '{}' has no host", url)))
}

pub(crate) fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    (!host.is_empty()).then_some(host)
}
