//! Wikipedia article extraction

use scraper::{ElementRef, Html};

use crate::extractor::dom::{
    block_text, char_len, collect_images, first_match, first_text, inline_text, remove_all,
    selector,
};
use crate::extractor::{ExtractError, RawExtraction, require_body};
use crate::record::ContentType;

/// Page chrome that never belongs to the article text
const CHROME: &[&str] = &[
    "script",
    "style",
    "sup.reference",
    ".navbox",
    ".infobox",
    ".sidebar",
    ".navigation-not-searchable",
    ".printfooter",
    ".catlinks",
    "#catlinks",
    "#toc",
    ".toc",
    ".mw-editsection",
    ".hatnote",
    ".reflist",
    ".references",
    ".mw-references-wrap",
    "#mw-navigation",
    "#footer",
    "table",
];

const CONTAINERS: &[&str] = &[
    "#mw-content-text .mw-parser-output",
    "#mw-content-text",
    "#content",
];

/// Blocks shorter than this are usually captions or stray labels
const MIN_BLOCK_CHARS: usize = 10;

pub(super) fn extract(mut document: Html) -> Result<RawExtraction, ExtractError> {
    let tags = categories(&document)?;
    let title = match first_text(&document, &["h1#firstHeading", "h1.firstHeading"], 0)? {
        Some(title) => title,
        None => first_text(&document, &["title"], 0)?
            .map(|title| title.replace(" - Wikipedia", "").trim().to_string())
            .unwrap_or_default(),
    };

    remove_all(&mut document, CHROME)?;

    let container = first_match(&document, CONTAINERS)?
        .ok_or_else(|| ExtractError::MissingContainer("#mw-content-text".to_string()))?;

    let body = require_body(article_blocks(container)?)?;
    let images = collect_images(container)?;

    Ok(RawExtraction {
        title,
        body,
        author: None,
        publish_date: None,
        images,
        tags,
        content_type: ContentType::Article,
    })
}

fn article_blocks(container: ElementRef<'_>) -> Result<String, ExtractError> {
    let blocks = selector("p, h2, h3, h4")?;
    let parts: Vec<String> = container
        .select(&blocks)
        .map(block_text)
        .filter(|text| char_len(text) > MIN_BLOCK_CHARS)
        .collect();
    Ok(parts.join("\n\n"))
}

fn categories(document: &Html) -> Result<Vec<String>, ExtractError> {
    let links = selector("#catlinks .mw-normal-catlinks li a")?;
    Ok(document
        .select(&links)
        .map(inline_text)
        .filter(|text| !text.is_empty())
        .collect())
}
