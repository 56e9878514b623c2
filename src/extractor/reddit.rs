//! Reddit thread extraction: post title, self-text and top-level comments

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::extractor::dom::{
    block_text, block_text_excluding, char_len, collect_images, first_attr, first_date,
    first_text, has_ancestor_matching, remove_all, selector,
};
use crate::extractor::{ExtractError, ExtractOptions, RawExtraction, require_body};
use crate::record::ContentType;

const TITLES: &[&str] = &[
    "h1[data-test-id=\"post-content-title\"]",
    "a.title",
    "h1.title",
    "h1",
    "[data-click-id=\"title\"]",
];

const POST_BODIES: &[&str] = &[
    "[data-test-id=\"post-content\"]",
    "shreddit-post [slot=\"text-body\"]",
    "#siteTable .usertext-body",
    ".expando .usertext-body",
    ".usertext-body",
    ".md",
];

const COMMENTS: &str =
    ".Comment, shreddit-comment, .comment, [data-test-id=\"comment\"]";

/// Text of a comment lives here when the markup separates it from the tagline
const COMMENT_BODIES: &str = ".usertext-body, .md, [slot=\"comment\"]";

const AUTHORS: &[&str] = &[
    "[data-test-id=\"post-author\"]",
    "#siteTable .top-matter .author",
    ".top-matter .author",
    ".author",
    ".username",
];

const MIN_POST_CHARS: usize = 10;
const MIN_COMMENT_CHARS: usize = 20;

pub(super) fn extract(
    mut document: Html,
    url: &Url,
    options: &ExtractOptions,
) -> Result<RawExtraction, ExtractError> {
    remove_all(&mut document, &["script", "style", "noscript"])?;

    let title = match first_attr(&document, &["shreddit-post[post-title]"], "post-title")? {
        Some(title) => title,
        None => first_text(&document, TITLES, 5)?.unwrap_or_default(),
    };
    let author = match first_attr(&document, &["shreddit-post[author]"], "author")? {
        Some(author) => Some(author),
        None => first_text(&document, AUTHORS, 0)?,
    };
    let publish_date = match first_attr(
        &document,
        &["shreddit-post[created-timestamp]"],
        "created-timestamp",
    )? {
        Some(date) => Some(date),
        None => first_date(&document, &["time[datetime]"])?,
    };

    let comment_sel = selector(COMMENTS)?;
    let post = post_text(&document, &comment_sel)?;
    let comments = top_level_comments(&document, &comment_sel, options.max_comments)?;

    if post.is_none() && comments.is_empty() && title.is_empty() {
        return Err(ExtractError::MissingContainer("reddit post".to_string()));
    }

    let content_type = if comments.is_empty() {
        ContentType::Post
    } else {
        ContentType::CommentThread
    };
    let images = match post.as_ref() {
        Some((_, container)) => collect_images(*container)?,
        None => Vec::new(),
    };
    let parts: Vec<String> = post
        .map(|(text, _)| text)
        .into_iter()
        .chain(comments)
        .collect();

    Ok(RawExtraction {
        title,
        body: require_body(parts.join("\n\n"))?,
        author,
        publish_date,
        images,
        tags: subreddit(url).into_iter().collect(),
        content_type,
    })
}

/// Self-text of the post; containers nested inside comments are skipped
fn post_text<'a>(
    document: &'a Html,
    comment_sel: &Selector,
) -> Result<Option<(String, ElementRef<'a>)>, ExtractError> {
    for css in POST_BODIES {
        let sel = selector(css)?;
        let found = document
            .select(&sel)
            .filter(|element| {
                !comment_sel.matches(element) && !has_ancestor_matching(element, comment_sel)
            })
            .map(|element| (block_text(element), element))
            .find(|(text, _)| char_len(text) > MIN_POST_CHARS);
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn top_level_comments(
    document: &Html,
    comment_sel: &Selector,
    limit: usize,
) -> Result<Vec<String>, ExtractError> {
    let body_sel = selector(COMMENT_BODIES)?;
    Ok(document
        .select(comment_sel)
        .filter(|comment| !has_ancestor_matching(comment, comment_sel))
        .map(|comment| comment_text(comment, comment_sel, &body_sel))
        .filter(|text| char_len(text) > MIN_COMMENT_CHARS)
        .take(limit)
        .collect())
}

/// Comment text without its nested replies
fn comment_text(comment: ElementRef<'_>, comment_sel: &Selector, body_sel: &Selector) -> String {
    let own_body = comment
        .select(body_sel)
        .find(|body| !has_nested_comment_between(body, comment, comment_sel));
    let root = own_body.unwrap_or(comment);
    block_text_excluding(root, |element| comment_sel.matches(element))
}

/// Whether a comment element sits between `element` and its owning `comment`
fn has_nested_comment_between(
    element: &ElementRef<'_>,
    comment: ElementRef<'_>,
    comment_sel: &Selector,
) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.id() != comment.id())
        .any(|ancestor| comment_sel.matches(&ancestor))
}

fn subreddit(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("r") {
            return segments
                .next()
                .filter(|name| !name.is_empty())
                .map(|name| format!("r/{}", name));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREAD: &str = r#"
        <html><body>
          <div id="siteTable">
            <div class="thing link">
              <p class="title"><a class="title" href="/r/rust/comments/1">Why does the borrow checker reject this?</a></p>
              <p class="tagline top-matter">submitted by <a class="author">ferris_fan</a>
                 <time datetime="2024-01-02T03:04:05+00:00">1 day ago</time></p>
              <div class="expando"><div class="usertext-body"><div class="md">
                <p>I have a struct holding a reference and the compiler complains about lifetimes.</p>
              </div></div></div>
            </div>
          </div>
          <div class="commentarea">
            <div class="comment">
              <p class="tagline"><a class="author">helper1</a></p>
              <div class="usertext-body"><div class="md"><p>You need an explicit lifetime parameter on the struct here.</p></div></div>
              <div class="child">
                <div class="comment">
                  <div class="usertext-body"><div class="md"><p>This nested reply should not appear in the body.</p></div></div>
                </div>
              </div>
            </div>
            <div class="comment">
              <div class="usertext-body"><div class="md"><p>Short.</p></div></div>
            </div>
            <div class="comment">
              <div class="usertext-body"><div class="md"><p>Consider returning an owned String instead of a borrowed str.</p></div></div>
            </div>
          </div>
        </body></html>"#;

    fn url() -> Url {
        Url::parse("https://old.reddit.com/r/rust/comments/1/why_does/").unwrap()
    }

    #[test]
    fn test_extracts_post_and_top_level_comments() {
        let raw = extract(Html::parse_document(THREAD), &url(), &ExtractOptions::default()).unwrap();

        assert_eq!(raw.title, "Why does the borrow checker reject this?");
        assert_eq!(raw.author.as_deref(), Some("ferris_fan"));
        assert_eq!(
            raw.publish_date.as_deref(),
            Some("2024-01-02T03:04:05+00:00")
        );
        assert_eq!(
            raw.body,
            "I have a struct holding a reference and the compiler complains about lifetimes.\n\n\
             You need an explicit lifetime parameter on the struct here.\n\n\
             Consider returning an owned String instead of a borrowed str."
        );
        assert!(!raw.body.contains("nested reply"));
        assert_eq!(raw.content_type, ContentType::CommentThread);
        assert_eq!(raw.tags, vec!["r/rust".to_string()]);
    }

    #[test]
    fn test_comment_limit_is_respected() {
        let options = ExtractOptions { max_comments: 1 };
        let raw = extract(Html::parse_document(THREAD), &url(), &options).unwrap();
        assert!(raw.body.contains("explicit lifetime"));
        assert!(!raw.body.contains("owned String"));
    }

    #[test]
    fn test_post_without_comments_is_a_post() {
        let html = r#"<html><body>
            <h1>Announcing a new crate release</h1>
            <div data-test-id="post-content"><p>We just published version one of our parser crate.</p></div>
            </body></html>"#;
        let raw = extract(Html::parse_document(html), &url(), &ExtractOptions::default()).unwrap();
        assert_eq!(raw.content_type, ContentType::Post);
        assert_eq!(raw.title, "Announcing a new crate release");
    }

    #[test]
    fn test_subreddit_from_path() {
        assert_eq!(subreddit(&url()).as_deref(), Some("r/rust"));
        assert_eq!(
            subreddit(&Url::parse("https://reddit.com/user/x").unwrap()),
            None
        );
    }
}
