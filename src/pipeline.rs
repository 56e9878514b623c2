//! # Record Assembly Pipeline
//!
//! Runs one page through classification, extraction, normalization,
//! chunking, tagging and scoring, and assembles the [`ScrapeRecord`].
//!
//! ## Key Components
//!
//! - `Scraper`: holds the immutable configuration and runs the pipeline
//! - `FetchedPage`: a page as handed over by the fetcher
//! - `PageOutcome`: per-URL result of a batch run
//!
//! ## Fallback
//!
//! Extraction is an explicit sequence of at most two attempts: the strategy
//! registered for the URL's site type, then the generic strategy when the
//! first was site-specific and failed. An attempt fails when extraction
//! errors or when nothing survives normalization. If every attempt fails
//! the page fails with [`Error::ExtractionFailure`] listing each attempt.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::chunker::chunk_text;
use crate::classifier::{SiteClassifier, SiteType, domain_of, parse_url};
use crate::config::ScrapeConfig;
use crate::error::{Error, FailedAttempt, Result};
use crate::extractor::{ExtractOptions, RawExtraction, Strategy};
use crate::keywords::extract_keywords;
use crate::normalizer::{NormalizedText, Normalizer};
use crate::record::{
    Content, ExtractionMethod, ImageInfo, Metadata, Processing, ScrapeRecord, Source, content_id,
    parse_publish_date,
};
use crate::scorer::{QualityScorer, QualitySignals};

/// A fetched page awaiting extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Requested URL
    pub url: String,

    /// Response body
    pub html: String,

    /// HTTP status of the response
    pub status: u16,
}

/// Result of scraping one page in a batch
#[derive(Debug)]
pub struct PageOutcome {
    pub url: String,
    pub result: Result<ScrapeRecord>,
}

/// A successful attempt: the strategy that ran and what it produced
struct Extraction {
    strategy: Strategy,
    raw: RawExtraction,
    normalized: NormalizedText,
}

/// Extraction pipeline over an immutable configuration.
///
/// `Scraper` is `Send + Sync`; share it across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Scraper {
    config: ScrapeConfig,
    classifier: SiteClassifier,
    normalizer: Normalizer,
    scorer: QualityScorer,
    extract_options: ExtractOptions,
}

impl Scraper {
    /// Validate the configuration and build a scraper from it
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: SiteClassifier::new(config.site_rules.clone()),
            normalizer: Normalizer::new(&config),
            scorer: QualityScorer::new(config.scoring.clone()),
            extract_options: ExtractOptions {
                max_comments: config.max_comments,
            },
            config,
        })
    }

    /// The configuration this scraper runs with
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// The site classifier built from the configured rules
    pub fn classifier(&self) -> &SiteClassifier {
        &self.classifier
    }

    /// Extract a record from a page's HTML
    #[instrument(skip(self, html), fields(html_bytes = html.len()))]
    pub fn scrape(&self, url: &str, html: &str) -> Result<ScrapeRecord> {
        let parsed = parse_url(url)?;
        let site_type = self.classifier.classify_url(&parsed);
        let primary = Strategy::for_site(site_type);

        let mut attempts = Vec::new();
        let mut extraction = None;
        for strategy in attempt_order(primary) {
            match self.attempt(strategy, html, &parsed) {
                Ok(found) => {
                    extraction = Some(found);
                    break;
                }
                Err(failed) => {
                    warn!(url, strategy = %failed.strategy, reason = %failed.reason, "extraction attempt failed");
                    attempts.push(failed);
                }
            }
        }
        let Some(extraction) = extraction else {
            return Err(Error::ExtractionFailure {
                url: url.to_string(),
                attempts,
            });
        };

        let record = self.assemble(url, site_type, extraction)?;
        info!(
            url,
            id = %record.id,
            chunks = record.processing.chunks.len(),
            confidence = record.processing.confidence_score,
            "assembled record"
        );
        Ok(record)
    }

    /// Extract a record from a fetched page
    pub fn scrape_page(&self, page: &FetchedPage) -> Result<ScrapeRecord> {
        self.scrape(&page.url, &page.html)
    }

    /// Extract every page, isolating failures per URL
    pub fn scrape_batch(&self, pages: &[FetchedPage]) -> Vec<PageOutcome> {
        pages
            .iter()
            .map(|page| PageOutcome {
                url: page.url.clone(),
                result: self.scrape_page(page),
            })
            .collect()
    }

    fn attempt(
        &self,
        strategy: Strategy,
        html: &str,
        url: &Url,
    ) -> std::result::Result<Extraction, FailedAttempt> {
        let failed = |reason: String| FailedAttempt { strategy, reason };

        let raw = strategy
            .extract(html, url, &self.extract_options)
            .map_err(|e| failed(e.to_string()))?;
        let normalized = self.normalizer.normalize(&raw.body);
        if normalized.text.is_empty() {
            return Err(failed("no text left after normalization".to_string()));
        }
        debug!(strategy = %strategy, words = normalized.word_count, "attempt succeeded");
        Ok(Extraction {
            strategy,
            raw,
            normalized,
        })
    }

    fn assemble(
        &self,
        url: &str,
        site_type: SiteType,
        extraction: Extraction,
    ) -> Result<ScrapeRecord> {
        let Extraction {
            strategy,
            raw,
            normalized,
        } = extraction;

        let title = self.normalizer.clean_inline(&raw.title);
        let author = raw
            .author
            .as_deref()
            .map(|author| self.normalizer.clean_inline(author))
            .filter(|author| !author.is_empty());
        let publish_date = raw.publish_date.as_deref().and_then(parse_publish_date);
        let tags = self.tags(&raw.tags, &title, &normalized.text);
        let images = raw
            .images
            .iter()
            .map(|image| ImageInfo {
                alt_text: self.normalizer.clean_inline(&image.alt_text),
                caption: self.normalizer.clean_inline(&image.caption),
            })
            .collect();

        let chunks = chunk_text(&normalized.text, &self.config.chunk_options())?;
        let confidence_score = self
            .scorer
            .score(&QualitySignals::new(strategy, &raw, normalized.word_count));
        let extraction_method = if strategy.is_generic() {
            ExtractionMethod::Generic
        } else {
            ExtractionMethod::SiteSpecific
        };

        Ok(ScrapeRecord {
            id: content_id(url, &normalized.text),
            source: Source {
                url: url.to_string(),
                domain: domain_of(url)?,
                site_type,
                scraped_at: Utc::now(),
            },
            content: Content {
                title,
                text: normalized.text,
                word_count: normalized.word_count,
                language: normalized.language,
                images,
            },
            metadata: Metadata {
                author,
                publish_date,
                tags,
                content_type: raw.content_type,
            },
            processing: Processing {
                extraction_method,
                confidence_score,
                chunks,
            },
        })
    }

    /// Strategy tags plus frequency keywords, lowercased and deduplicated
    fn tags(&self, site_tags: &[String], title: &str, text: &str) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = site_tags
            .iter()
            .map(|tag| self.normalizer.clean_inline(tag).to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.extend(extract_keywords(
            &format!("{} {}", title, text),
            self.config.max_keywords,
        ));
        tags
    }
}

/// Strategies to try, in order
fn attempt_order(primary: Strategy) -> Vec<Strategy> {
    if primary.is_generic() {
        vec![primary]
    } else {
        vec![primary, Strategy::Generic]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContentType;
    use std::sync::Arc;

    fn scraper() -> Scraper {
        Scraper::new(ScrapeConfig::default()).unwrap()
    }

    const WIKI: &str = r#"
        <html><head><title>Ferris - Wikipedia</title></head><body>
          <h1 id="firstHeading">Ferris</h1>
          <div id="mw-content-text"><div class="mw-parser-output">
            <p>Ferris is the unofficial mascot of the Rust programming language community.</p>
            <p>The crab appears on stickers, shirts and conference slides around the world.</p>
          </div></div>
          <div id="catlinks"><div class="mw-normal-catlinks"><ul><li><a>Mascots</a></li></ul></div></div>
        </body></html>"#;

    #[test]
    fn test_site_specific_record() {
        let record = scraper()
            .scrape("https://en.wikipedia.org/wiki/Ferris", WIKI)
            .unwrap();

        assert_eq!(record.source.site_type, SiteType::Wikipedia);
        assert_eq!(record.source.domain, "en.wikipedia.org");
        assert_eq!(record.content.title, "Ferris");
        assert_eq!(
            record.processing.extraction_method,
            ExtractionMethod::SiteSpecific
        );
        assert_eq!(record.metadata.content_type, ContentType::Article);
        assert!(record.metadata.tags.contains("mascots"));
        assert!(record.metadata.tags.iter().all(|t| *t == t.to_lowercase()));
        assert_eq!(record.content.language, "en");
        assert_eq!(record.processing.chunks.len(), 1);
        assert_eq!(record.processing.chunks[0].text, record.content.text);
        assert!((0.0..=1.0).contains(&record.processing.confidence_score));
    }

    #[test]
    fn test_same_input_gives_same_id() {
        let scraper = scraper();
        let url = "https://en.wikipedia.org/wiki/Ferris";
        let first = scraper.scrape(url, WIKI).unwrap();
        let second = scraper.scrape(url, WIKI).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.content, second.content);
        assert_eq!(first.processing.chunks, second.processing.chunks);
    }

    #[test]
    fn test_falls_back_to_generic_when_layout_unknown() {
        let html = r#"<html><head><title>Mirror</title></head><body><article>
            <p>This mirrored copy of the article lost its Wikipedia layout entirely.</p>
            </article></body></html>"#;
        let record = scraper()
            .scrape("https://en.wikipedia.org/wiki/Mirror", html)
            .unwrap();
        assert_eq!(record.source.site_type, SiteType::Wikipedia);
        assert_eq!(record.processing.extraction_method, ExtractionMethod::Generic);
        assert!(record.content.text.starts_with("This mirrored copy"));
    }

    #[test]
    fn test_every_attempt_failing_is_reported() {
        let err = scraper()
            .scrape("https://www.reddit.com/r/rust/comments/1/x/", "")
            .unwrap_err();
        match err {
            Error::ExtractionFailure { url, attempts } => {
                assert_eq!(url, "https://www.reddit.com/r/rust/comments/1/x/");
                let strategies: Vec<_> = attempts.iter().map(|a| a.strategy).collect();
                assert_eq!(strategies, vec![Strategy::Reddit, Strategy::Generic]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generic_site_has_single_attempt() {
        let err = scraper().scrape("https://example.com/", "   ").unwrap_err();
        match err {
            Error::ExtractionFailure { attempts, .. } => {
                assert_eq!(attempts.len(), 1);
                assert_eq!(attempts[0].strategy, Strategy::Generic);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            scraper().scrape("not a url", WIKI),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_long_article_is_chunked() {
        let paragraph = "Every one of these sentences is fifty chars long. ".repeat(25);
        let html = format!(
            "<html><head><title>Long</title></head><body><article><p>{}</p></article></body></html>",
            paragraph
        );
        let config = ScrapeConfig::builder().chunk_size(500).build();
        let record = Scraper::new(config)
            .unwrap()
            .scrape("https://example.com/long", &html)
            .unwrap();

        let chunks = &record.processing.chunks;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.char_count <= 500 && !c.text.is_empty()));
        assert_eq!(
            chunks.iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, record.content.text);
    }

    #[test]
    fn test_missing_byline_lowers_linkedin_confidence() {
        let with_byline = r#"<html><body>
            <h1 class="blog-post-title">Scaling spam detection</h1>
            <span class="author-name">Jane Engineer</span>
            <time datetime="2024-03-05">March 5, 2024</time>
            <div class="blog-post-content"><p>We describe how the spam classifier is trained and served across regions.</p></div>
            </body></html>"#;
        let without_byline =
            with_byline.replace(r#"<span class="author-name">Jane Engineer</span>"#, "");
        let url = "https://www.linkedin.com/blog/engineering/spam";

        let scraper = scraper();
        let full = scraper.scrape(url, with_byline).unwrap();
        let partial = scraper.scrape(url, &without_byline).unwrap();

        assert_eq!(full.metadata.author.as_deref(), Some("Jane Engineer"));
        assert_eq!(
            full.metadata.publish_date.map(|d| d.to_string()).as_deref(),
            Some("2024-03-05")
        );
        assert_eq!(partial.metadata.author, None);
        assert_eq!(partial.metadata.publish_date, full.metadata.publish_date);
        assert!(partial.processing.confidence_score < full.processing.confidence_score);
    }

    #[test]
    fn test_escaped_markup_in_form_wrapped_page_survives() {
        let html = r#"<html><head><title>Semantic HTML</title></head><body>
            <form id="aspnetForm" method="post">
              <div class="content">
                <p>Wrap the navigation in a &lt;nav&gt; element and the body in &lt;main&gt; for accessibility.</p>
                <p>Write &amp;amp; in source to get an ampersand, since a bare one may start an entity.</p>
              </div>
            </form>
          </body></html>"#;
        let record = scraper().scrape("https://example.com/news", html).unwrap();

        assert_eq!(
            record.content.text,
            "Wrap the navigation in a <nav> element and the body in <main> for accessibility.\n\
             Write &amp; in source to get an ampersand, since a bare one may start an entity."
        );
        assert_eq!(record.processing.extraction_method, ExtractionMethod::Generic);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let pages = vec![
            FetchedPage {
                url: "https://en.wikipedia.org/wiki/Ferris".to_string(),
                html: WIKI.to_string(),
                status: 200,
            },
            FetchedPage {
                url: "https://example.com/empty".to_string(),
                html: String::new(),
                status: 200,
            },
        ];
        let outcomes = scraper().scrape_batch(&pages);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(Error::ExtractionFailure { .. })
        ));
    }

    #[test]
    fn test_scraper_is_shareable() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let shared = Arc::new(scraper());
        assert_send_sync(&shared);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ScrapeConfig::builder().chunk_size(0).build();
        assert!(matches!(Scraper::new(config), Err(Error::Config(_))));
    }
}
