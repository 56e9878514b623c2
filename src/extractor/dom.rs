//! DOM helpers shared by the extraction strategies

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};

use crate::extractor::error::ExtractError;
use crate::record::ImageInfo;

/// Elements whose contents never contribute text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements that start a new line of text
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

/// Parse a CSS selector, mapping the error into [`ExtractError`]
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("'{}': {}", css, e)))
}

/// Text of an element with block elements turned into line breaks.
///
/// Whitespace inside a line is collapsed, empty lines are dropped.
pub(crate) fn block_text(element: ElementRef<'_>) -> String {
    block_text_excluding(element, |_| false)
}

/// Like [`block_text`] but skips every subtree for which `skip` returns true
pub(crate) fn block_text_excluding<F>(element: ElementRef<'_>, skip: F) -> String
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let mut raw = String::new();
    collect_text(element, &skip, &mut raw);
    tidy_lines(&raw)
}

fn collect_text<F>(element: ElementRef<'_>, skip: &F, out: &mut String)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) || skip(&child_el) {
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    out.push('\n');
                }
                collect_text(child_el, skip, out);
                if is_block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse every whitespace run to one space and trim the ends
pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Single-line text of an element
pub(crate) fn inline_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&block_text(element))
}

/// Character length, as opposed to byte length
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First element matching any of the selectors, tried in order
pub(crate) fn first_match<'a>(
    document: &'a Html,
    candidates: &[&str],
) -> Result<Option<ElementRef<'a>>, ExtractError> {
    for css in candidates {
        if let Some(element) = document.select(&selector(css)?).next() {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// Text of the first match of each selector, accepting the first one longer than `min_chars`
pub(crate) fn first_text(
    document: &Html,
    candidates: &[&str],
    min_chars: usize,
) -> Result<Option<String>, ExtractError> {
    for css in candidates {
        if let Some(element) = document.select(&selector(css)?).next() {
            let text = inline_text(element);
            if char_len(&text) > min_chars {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

/// Non-empty value of `attr` on the first matching element
pub(crate) fn first_attr(
    document: &Html,
    candidates: &[&str],
    attr: &str,
) -> Result<Option<String>, ExtractError> {
    for css in candidates {
        let found = document
            .select(&selector(css)?)
            .filter_map(|element| element.value().attr(attr))
            .map(collapse_whitespace)
            .find(|value| !value.is_empty());
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// `content` of the first matching `<meta>` tag
pub(crate) fn meta_content(
    document: &Html,
    candidates: &[&str],
) -> Result<Option<String>, ExtractError> {
    first_attr(document, candidates, "content")
}

/// Raw date string: the `datetime` attribute when present, else the element text
pub(crate) fn first_date(
    document: &Html,
    candidates: &[&str],
) -> Result<Option<String>, ExtractError> {
    for css in candidates {
        if let Some(element) = document.select(&selector(css)?).next() {
            let value = element
                .value()
                .attr("datetime")
                .map(collapse_whitespace)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| inline_text(element));
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

/// Split a `keywords` meta value on commas and semicolons
pub(crate) fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split([',', ';'])
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detach every element matching any of the selectors
pub(crate) fn remove_all(document: &mut Html, candidates: &[&str]) -> Result<(), ExtractError> {
    let mut ids = Vec::new();
    for css in candidates {
        let sel = selector(css)?;
        ids.extend(document.select(&sel).map(|element| element.id()));
    }
    detach(document, ids);
    Ok(())
}

/// Detach every element for which `predicate` returns true
pub(crate) fn remove_where<F>(document: &mut Html, predicate: F)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let ids: Vec<_> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| predicate(element))
        .map(|element| element.id())
        .collect();
    detach(document, ids);
}

fn detach(document: &mut Html, ids: Vec<NodeId>) {
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Images with an alt text or caption inside `root`, in document order
pub(crate) fn collect_images(root: ElementRef<'_>) -> Result<Vec<ImageInfo>, ExtractError> {
    let img = selector("img")?;
    let figcaption = selector("figcaption")?;

    let images = root
        .select(&img)
        .filter_map(|element| {
            let alt_text = element
                .value()
                .attr("alt")
                .map(collapse_whitespace)
                .unwrap_or_default();
            let caption = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|ancestor| ancestor.value().name() == "figure")
                .and_then(|figure| figure.select(&figcaption).next())
                .map(inline_text)
                .unwrap_or_default();
            (!alt_text.is_empty() || !caption.is_empty()).then_some(ImageInfo { alt_text, caption })
        })
        .collect();
    Ok(images)
}

/// Whether any ancestor of `element` matches `sel`
pub(crate) fn has_ancestor_matching(element: &ElementRef<'_>, sel: &Selector) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| sel.matches(&ancestor))
}
