//! Readability-style extraction for pages without a dedicated strategy
//!
//! Paragraph-like elements award points to their parent and grandparent.
//! The best-scoring container, discounted by its link density, becomes the
//! article root, and qualifying siblings of that root are folded back in.
//! When nothing scores, the first `article`, `main` or `body` is used whole.

use std::collections::HashMap;
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extractor::dom::{
    block_text, char_len, collect_images, first_date, first_match, first_text, inline_text,
    meta_content, remove_all, remove_where, selector, split_keywords,
};
use crate::extractor::{ExtractError, RawExtraction, require_body};
use crate::record::{ContentType, ImageInfo};

/// Class or id values that mark ads, sharing widgets and other clutter
static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ads?|advert\w*|banner|sponsor\w*|promo\w*|share|sharing|social|cookie\w*|popup|modal|newsletter|subscribe|comments?|related|sidebar|footer|menu|nav\w*|breadcrumbs?|pagination|disqus)\b",
    )
    .expect("unlikely-candidate regex is valid")
});

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|main|page|post|text|blog|story")
        .expect("positive class regex is valid")
});

static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)combx|comment|contact|foot|footnote|masthead|media|meta|outbrain|promo|related|scroll|shoutbox|sidebar|sponsor|shopping|tags|tool|widget|hidden",
    )
    .expect("negative class regex is valid")
});

/// Removed before scoring; `form` stays since some sites wrap the whole page in one
const STRIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "button", "nav", "header",
    "footer", "aside",
];

/// Never removed by the class/id heuristic
const PROTECTED_TAGS: &[&str] = &["html", "body", "article", "main"];

const PARAGRAPHS: &str = "p, pre, td, blockquote";
const FALLBACK_ROOTS: &[&str] = &["article", "main", "body"];

const MIN_PARAGRAPH_CHARS: usize = 25;
const CLASS_WEIGHT: f64 = 25.0;
const MIN_SIBLING_THRESHOLD: f64 = 10.0;
const SIBLING_SCORE_RATIO: f64 = 0.2;
const STANDALONE_PARAGRAPH_CHARS: usize = 80;
const STANDALONE_LINK_DENSITY: f64 = 0.25;

pub(super) fn extract(mut document: Html) -> Result<RawExtraction, ExtractError> {
    let title = match first_text(&document, &["title"], 0)? {
        Some(title) => title,
        None => match meta_content(&document, &["meta[property=\"og:title\"]"])? {
            Some(title) => title,
            None => first_text(&document, &["h1"], 0)?.unwrap_or_default(),
        },
    };
    let author = meta_content(
        &document,
        &["meta[name=\"author\"]", "meta[property=\"article:author\"]"],
    )?;
    let publish_date = match meta_content(&document, &["meta[property=\"article:published_time\"]"])? {
        Some(date) => Some(date),
        None => first_date(&document, &["time[datetime]"])?,
    };
    let tags = page_tags(&document)?;
    let content_type = content_type(&document)?;

    remove_all(&mut document, STRIP_TAGS)?;
    remove_where(&mut document, is_unlikely);

    let link = selector("a")?;
    let scored = score_paragraphs(&document)?;
    let mut extracted = None;
    if let Some((top, top_score)) = top_candidate(&document, &scored, &link) {
        let (text, images) = merge_siblings(top, top_score, &scored, &link)?;
        if !text.trim().is_empty() {
            extracted = Some((text, images));
        }
    }
    let (body, images) = match extracted {
        Some(found) => found,
        None => match first_match(&document, FALLBACK_ROOTS)? {
            Some(root) => (block_text(root), collect_images(root)?),
            None => return Err(ExtractError::EmptyBody),
        },
    };

    Ok(RawExtraction {
        title,
        body: require_body(body)?,
        author,
        publish_date,
        images,
        tags,
        content_type,
    })
}

fn page_tags(document: &Html) -> Result<Vec<String>, ExtractError> {
    let mut tags = meta_content(document, &["meta[name=\"keywords\"]"])?
        .map(|keywords| split_keywords(&keywords))
        .unwrap_or_default();
    let article_tag = selector("meta[property=\"article:tag\"]")?;
    tags.extend(
        document
            .select(&article_tag)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string),
    );
    Ok(tags)
}

fn content_type(document: &Html) -> Result<ContentType, ExtractError> {
    let og_article = meta_content(document, &["meta[property=\"og:type\"]"])?
        .is_some_and(|kind| kind.eq_ignore_ascii_case("article"));
    let has_article = document.select(&selector("article")?).next().is_some();
    Ok(if og_article || has_article {
        ContentType::Article
    } else {
        ContentType::Generic
    })
}

fn class_and_id(element: &ElementRef<'_>) -> String {
    let value = element.value();
    format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.attr("id").unwrap_or_default()
    )
}

fn is_unlikely(element: &ElementRef<'_>) -> bool {
    if PROTECTED_TAGS.contains(&element.value().name()) {
        return false;
    }
    let markers = class_and_id(element);
    UNLIKELY.is_match(&markers) && !POSITIVE.is_match(&markers)
}

/// Starting score for a candidate container
fn initial_score(element: &ElementRef<'_>) -> f64 {
    let by_tag = match element.value().name() {
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    by_tag + class_weight(element)
}

fn class_weight(element: &ElementRef<'_>) -> f64 {
    let value = element.value();
    [value.attr("class"), value.attr("id")]
        .into_iter()
        .flatten()
        .map(|marker| {
            let mut weight = 0.0;
            if POSITIVE.is_match(marker) {
                weight += CLASS_WEIGHT;
            }
            if NEGATIVE.is_match(marker) {
                weight -= CLASS_WEIGHT;
            }
            weight
        })
        .sum()
}

/// Raw scores of every element that received points from a paragraph
fn score_paragraphs(document: &Html) -> Result<HashMap<NodeId, f64>, ExtractError> {
    let paragraphs = selector(PARAGRAPHS)?;
    let mut scores: HashMap<NodeId, f64> = HashMap::new();

    for paragraph in document.select(&paragraphs) {
        let text = inline_text(paragraph);
        let len = char_len(&text);
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let commas = text.matches(',').count() as f64;
        let points = 1.0 + commas + ((len / 100) as f64).min(3.0);

        let ancestors = paragraph
            .ancestors()
            .filter_map(ElementRef::wrap)
            .filter(|ancestor| ancestor.value().name() != "html")
            .take(2);
        for (level, ancestor) in ancestors.enumerate() {
            let share = if level == 0 { points } else { points / 2.0 };
            *scores
                .entry(ancestor.id())
                .or_insert_with(|| initial_score(&ancestor)) += share;
        }
    }
    Ok(scores)
}

fn link_density(element: ElementRef<'_>, link: &Selector) -> f64 {
    let total = char_len(&inline_text(element));
    if total == 0 {
        return 0.0;
    }
    let linked: usize = element
        .select(link)
        .map(|anchor| char_len(&inline_text(anchor)))
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

fn final_score(element: ElementRef<'_>, raw: f64, link: &Selector) -> f64 {
    raw * (1.0 - link_density(element, link))
}

/// Highest final score; ties go to the element first in document order
fn top_candidate<'a>(
    document: &'a Html,
    scores: &HashMap<NodeId, f64>,
    link: &Selector,
) -> Option<(ElementRef<'a>, f64)> {
    let mut best: Option<(ElementRef<'a>, f64)> = None;
    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        let Some(raw) = scores.get(&element.id()) else {
            continue;
        };
        let score = final_score(element, *raw, link);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((element, score)),
        }
    }
    best
}

/// Text of the top candidate plus siblings that look like part of the same article
fn merge_siblings(
    top: ElementRef<'_>,
    top_score: f64,
    scores: &HashMap<NodeId, f64>,
    link: &Selector,
) -> Result<(String, Vec<ImageInfo>), ExtractError> {
    let Some(parent) = top.parent().and_then(ElementRef::wrap) else {
        return Ok((block_text(top), collect_images(top)?));
    };
    let threshold = (top_score * SIBLING_SCORE_RATIO).max(MIN_SIBLING_THRESHOLD);

    let mut parts = Vec::new();
    let mut images = Vec::new();
    for sibling in parent.children().filter_map(ElementRef::wrap) {
        let keep = sibling.id() == top.id()
            || scores
                .get(&sibling.id())
                .is_some_and(|raw| final_score(sibling, *raw, link) >= threshold)
            || is_standalone_paragraph(sibling, link);
        if !keep {
            continue;
        }
        let text = block_text(sibling);
        if text.is_empty() {
            continue;
        }
        parts.push(text);
        images.extend(collect_images(sibling)?);
    }
    Ok((parts.join("\n\n"), images))
}

fn is_standalone_paragraph(element: ElementRef<'_>, link: &Selector) -> bool {
    element.value().name() == "p"
        && char_len(&inline_text(element)) > STANDALONE_PARAGRAPH_CHARS
        && link_density(element, link) < STANDALONE_LINK_DENSITY
}
