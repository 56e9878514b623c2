//! LinkedIn article and post extraction

use scraper::Html;
use url::Url;

use crate::extractor::dom::{
    block_text, char_len, collect_images, first_date, first_text, meta_content, remove_all,
    selector, split_keywords,
};
use crate::extractor::{ExtractError, RawExtraction, require_body};
use crate::record::ContentType;

const TITLES: &[&str] = &[
    "h1.blog-post-title",
    "h1[data-test-id=\"blog-post-title\"]",
    "h1.article-title",
    "h1",
    "title",
];

const BODIES: &[&str] = &[
    ".blog-post-content",
    ".article-content",
    ".post-content",
    "[data-test-id=\"post-content\"]",
    ".feed-shared-update-v2__description",
    "article",
    ".content",
    "main",
];

const AUTHORS: &[&str] = &[
    ".author-name",
    ".byline",
    "[data-test-id=\"author\"]",
    ".post-author",
    ".article-author",
];

const DATES: &[&str] = &[
    "time",
    ".publish-date",
    ".post-date",
    "[data-test-id=\"publish-date\"]",
    ".date",
];

const CHROME: &[&str] = &[
    "script",
    "style",
    "nav",
    "header",
    "footer",
    "aside",
    ".sidebar",
    ".navigation",
];

/// A container this long is taken over earlier, shorter matches
const PREFERRED_BODY_CHARS: usize = 100;

pub(super) fn extract(mut document: Html, url: &Url) -> Result<RawExtraction, ExtractError> {
    // Byline fields often live in the header, so read them before stripping chrome
    let title = match first_text(&document, TITLES, 5)? {
        Some(title) => title,
        None => meta_content(&document, &["meta[property=\"og:title\"]"])?.unwrap_or_default(),
    };
    let author = match first_text(&document, AUTHORS, 0)? {
        Some(author) => Some(author),
        None => meta_content(&document, &["meta[name=\"author\"]"])?,
    };
    let publish_date = match first_date(&document, DATES)? {
        Some(date) => Some(date),
        None => meta_content(&document, &["meta[property=\"article:published_time\"]"])?,
    };
    let tags = meta_content(&document, &["meta[name=\"keywords\"]"])?
        .map(|keywords| split_keywords(&keywords))
        .unwrap_or_default();

    remove_all(&mut document, CHROME)?;

    let mut fallback = None;
    let mut found_container = false;
    let mut chosen = None;
    for css in BODIES {
        let Some(container) = document.select(&selector(css)?).next() else {
            continue;
        };
        found_container = true;
        let text = block_text(container);
        if char_len(&text) > PREFERRED_BODY_CHARS {
            chosen = Some((text, collect_images(container)?));
            break;
        }
        if fallback.is_none() && !text.is_empty() {
            fallback = Some((text, collect_images(container)?));
        }
    }
    if !found_container {
        return Err(ExtractError::MissingContainer("article body".to_string()));
    }
    let (body, images) = chosen.or(fallback).ok_or(ExtractError::EmptyBody)?;

    Ok(RawExtraction {
        title,
        body: require_body(body)?,
        author,
        publish_date,
        images,
        tags,
        content_type: content_type_for(url),
    })
}

fn content_type_for(url: &Url) -> ContentType {
    let path = url.path();
    if path.contains("/posts/") || path.starts_with("/feed/") {
        ContentType::Post
    } else {
        ContentType::Article
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"
        <html><head><meta name="keywords" content="spam, trust and safety"></head>
        <body>
          <header><nav>Home Jobs Messaging</nav>
            <span class="author-name">Jane Engineer</span>
            <time datetime="2024-03-05T10:00:00Z">March 5, 2024</time>
          </header>
          <h1 class="blog-post-title">Viral spam content detection at scale</h1>
          <div class="blog-post-content">
            <p>Detecting viral spam early matters because engagement compounds quickly across the network.</p>
            <p>We describe the model, the features and the serving architecture behind it.</p>
          </div>
          <footer>About Accessibility Careers</footer>
        </body></html>"#;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://www.linkedin.com{path}")).unwrap()
    }

    #[test]
    fn test_extracts_blog_post() {
        let raw = extract(Html::parse_document(POST), &url("/blog/engineering/spam")).unwrap();

        assert_eq!(raw.title, "Viral spam content detection at scale");
        assert_eq!(raw.author.as_deref(), Some("Jane Engineer"));
        assert_eq!(raw.publish_date.as_deref(), Some("2024-03-05T10:00:00Z"));
        assert!(raw.body.starts_with("Detecting viral spam early"));
        assert!(!raw.body.contains("Accessibility"));
        assert_eq!(raw.tags, vec!["spam", "trust and safety"]);
        assert_eq!(raw.content_type, ContentType::Article);
    }

    #[test]
    fn test_missing_byline_leaves_author_unset() {
        let html = POST.replace(r#"<span class="author-name">Jane Engineer</span>"#, "");
        let raw = extract(Html::parse_document(&html), &url("/blog/engineering/spam")).unwrap();
        assert_eq!(raw.author, None);
    }

    #[test]
    fn test_posts_are_typed_as_posts() {
        let raw = extract(Html::parse_document(POST), &url("/posts/jane_spam-activity-1")).unwrap();
        assert_eq!(raw.content_type, ContentType::Post);
    }

    #[test]
    fn test_missing_container_is_an_error() {
        let html = "<html><body><div class=\"x\">Nothing we recognise</div></body></html>";
        assert!(matches!(
            extract(Html::parse_document(html), &url("/blog/x")),
            Err(ExtractError::MissingContainer(_))
        ));
    }
}
