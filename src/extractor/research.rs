//! Academic paper extraction (arXiv, PubMed, journal templates)
//!
//! Highwire `citation_*` meta tags are preferred over visible markup since
//! most publishers emit them for indexers.

use scraper::{ElementRef, Html};

use crate::extractor::dom::{
    block_text, block_text_excluding, char_len, collect_images, first_date, first_match,
    first_text, meta_content, remove_all, selector, split_keywords,
};
use crate::extractor::{ExtractError, RawExtraction, require_body};
use crate::record::ContentType;

const TITLES: &[&str] = &[
    "h1.title",
    ".ltx_title_document",
    ".article-title",
    "#title",
    "h1",
];

const ABSTRACTS: &[&str] = &[
    "blockquote.abstract",
    ".abstract",
    "#abstract",
    ".ltx_abstract",
];

const BODIES: &[&str] = &[
    ".paper-content",
    ".article-content",
    ".ltx_document",
    "main",
    ".content",
];

const AUTHORS: &[&str] = &[".authors", ".ltx_authors", ".author-list", ".author"];

const DATES: &[&str] = &[
    ".publication-date",
    ".date",
    "time",
    ".ltx_dates",
    ".dateline",
];

/// Parts of the body that are citation apparatus rather than prose
const BODY_NOISE: &str = "sup, .citation, .reference, .references, .ltx_bibliography";

const MIN_ABSTRACT_CHARS: usize = 50;
const MIN_BODY_CHARS: usize = 100;

pub(super) fn extract(mut document: Html) -> Result<RawExtraction, ExtractError> {
    remove_all(&mut document, &["script", "style", "nav", "header", "footer"])?;

    let title = match meta_content(&document, &["meta[name=\"citation_title\"]"])? {
        Some(title) => title,
        None => first_text(&document, TITLES, 0)?
            .map(|title| strip_label(&title, "Title:"))
            .unwrap_or_default(),
    };
    let author = match citation_authors(&document)? {
        Some(authors) => Some(authors),
        None => first_text(&document, AUTHORS, 0)?,
    };
    let publish_date = match meta_content(
        &document,
        &[
            "meta[name=\"citation_publication_date\"]",
            "meta[name=\"citation_date\"]",
            "meta[name=\"citation_online_date\"]",
        ],
    )? {
        Some(date) => Some(date),
        None => first_date(&document, DATES)?,
    };
    let tags = meta_content(
        &document,
        &["meta[name=\"citation_keywords\"]", "meta[name=\"keywords\"]"],
    )?
    .map(|keywords| split_keywords(&keywords))
    .unwrap_or_default();

    let abstract_el = first_match(&document, ABSTRACTS)?;
    let abstract_text = abstract_el
        .map(|element| strip_label(&block_text(element), "Abstract:"))
        .filter(|text| char_len(text) > MIN_ABSTRACT_CHARS);

    let noise = selector(BODY_NOISE)?;
    let abstract_sel = selector(&ABSTRACTS.join(", "))?;
    let mut body_match: Option<(String, ElementRef<'_>)> = None;
    for css in BODIES {
        let Some(container) = document.select(&selector(css)?).next() else {
            continue;
        };
        let text = block_text_excluding(container, |element| {
            noise.matches(element) || abstract_sel.matches(element)
        });
        if char_len(&text) > MIN_BODY_CHARS {
            body_match = Some((text, container));
            break;
        }
    }

    let (body, images) = match (abstract_text, body_match) {
        (Some(summary), Some((text, container))) => {
            (format!("{}\n\n{}", summary, text), collect_images(container)?)
        }
        (None, Some((text, container))) => (text, collect_images(container)?),
        (Some(summary), None) => (summary, Vec::new()),
        (None, None) => {
            return Err(ExtractError::MissingContainer(
                "paper abstract or body".to_string(),
            ));
        }
    };

    Ok(RawExtraction {
        title,
        body: require_body(body)?,
        author,
        publish_date,
        images,
        tags,
        content_type: ContentType::Paper,
    })
}

/// Every `citation_author` meta tag, in order, joined with ", "
fn citation_authors(document: &Html) -> Result<Option<String>, ExtractError> {
    let sel = selector("meta[name=\"citation_author\"]")?;
    let authors: Vec<&str> = document
        .select(&sel)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .collect();
    Ok((!authors.is_empty()).then(|| authors.join(", ")))
}

/// Remove a leading label such as "Abstract:" that arXiv renders inline
fn strip_label(text: &str, label: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..label.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(label) => {
            trimmed[label.len()..].trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}
