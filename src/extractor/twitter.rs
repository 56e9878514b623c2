//! Tweet and thread extraction

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::extractor::dom::{
    block_text, char_len, collect_images, first_text, remove_all, selector,
};
use crate::extractor::{ExtractError, RawExtraction, require_body};
use crate::record::{ContentType, ImageInfo};

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#(\w+)").expect("hashtag regex is valid"));

const TWEETS: &str =
    "[data-testid=\"tweetText\"], .tweet-text, .js-tweet-text, .TweetTextSize";

const AUTHORS: &[&str] = &[
    "[data-testid=\"User-Name\"]",
    ".fullname",
    ".tweet-author",
    ".username",
];

const MIN_TWEET_CHARS: usize = 5;

struct Tweet {
    text: String,
    raw_time: Option<String>,
    time: Option<DateTime<FixedOffset>>,
    images: Vec<ImageInfo>,
}

pub(super) fn extract(mut document: Html) -> Result<RawExtraction, ExtractError> {
    remove_all(&mut document, &["script", "style", "noscript"])?;

    let mut tweets = collect_tweets(&document)?;
    if tweets.is_empty() {
        return Err(ExtractError::MissingContainer("tweet text".to_string()));
    }

    // Reorder only when every tweet carries a parseable timestamp
    if tweets.iter().all(|tweet| tweet.time.is_some()) {
        tweets.sort_by_key(|tweet| tweet.time);
    }

    let publish_date = tweets
        .iter()
        .filter_map(|tweet| tweet.time.zip(tweet.raw_time.as_ref()))
        .min_by_key(|(time, _)| *time)
        .map(|(_, raw)| raw.clone());

    let author = first_text(&document, AUTHORS, 0)?;
    let title = match &author {
        Some(author) => format!("Tweet by {}", author),
        None => "Tweet".to_string(),
    };

    let mut tags: Vec<String> = Vec::new();
    for tweet in &tweets {
        for tag in hashtags(&tweet.text) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    let body = tweets
        .iter()
        .map(|tweet| tweet.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let images = tweets.into_iter().flat_map(|tweet| tweet.images).collect();

    Ok(RawExtraction {
        title,
        body: require_body(body)?,
        author,
        publish_date,
        images,
        tags,
        content_type: ContentType::Post,
    })
}

fn collect_tweets(document: &Html) -> Result<Vec<Tweet>, ExtractError> {
    let tweet_sel = selector(TWEETS)?;
    let time_sel = selector("time[datetime]")?;

    let mut tweets = Vec::new();
    for element in document.select(&tweet_sel) {
        let text = block_text(element);
        if char_len(&text) <= MIN_TWEET_CHARS {
            continue;
        }
        let article = enclosing_article(element);
        let raw_time = article
            .and_then(|article| article.select(&time_sel).next())
            .and_then(|time| time.value().attr("datetime"))
            .map(|value| value.trim().to_string());
        let time = raw_time
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok());
        let images = collect_images(article.unwrap_or(element))?;
        tweets.push(Tweet {
            text,
            raw_time,
            time,
            images,
        });
    }
    Ok(tweets)
}

fn enclosing_article(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "article")
}

fn hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .map(|caps| caps[1].to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREAD: &str = r#"
        <html><body>
          <article>
            <div data-testid="User-Name">Ferris</div>
            <time datetime="2024-05-01T12:05:00.000Z">12:05</time>
            <div data-testid="tweetText">Second part: lifetimes are just scopes #Rust</div>
          </article>
          <article>
            <div data-testid="User-Name">Ferris</div>
            <time datetime="2024-05-01T12:00:00.000Z">12:00</time>
            <div data-testid="tweetText">A short thread on the borrow checker #rustlang #Rust</div>
            <img src="diagram.png" alt="Borrow diagram">
          </article>
          <article><div data-testid="tweetText">ok</div></article>
        </body></html>"#;

    #[test]
    fn test_thread_is_ordered_chronologically() {
        let raw = extract(Html::parse_document(THREAD)).unwrap();

        assert_eq!(raw.title, "Tweet by Ferris");
        assert_eq!(raw.author.as_deref(), Some("Ferris"));
        assert_eq!(
            raw.body,
            "A short thread on the borrow checker #rustlang #Rust\n\n\
             Second part: lifetimes are just scopes #Rust"
        );
        assert_eq!(raw.publish_date.as_deref(), Some("2024-05-01T12:00:00.000Z"));
        assert_eq!(raw.tags, vec!["rustlang".to_string(), "rust".to_string()]);
        assert_eq!(raw.images.len(), 1);
        assert_eq!(raw.content_type, ContentType::Post);
    }

    #[test]
    fn test_document_order_kept_without_timestamps() {
        let html = r#"<html><body>
            <p class="tweet-text">Later tweet text comes first here</p>
            <p class="tweet-text">Earlier tweet text comes second</p>
            </body></html>"#;
        let raw = extract(Html::parse_document(html)).unwrap();
        assert!(raw.body.starts_with("Later tweet"));
        assert_eq!(raw.title, "Tweet");
        assert_eq!(raw.publish_date, None);
    }

    #[test]
    fn test_no_tweets_is_missing_container() {
        let html = "<html><body><p>Log in to see this content.</p></body></html>";
        assert!(matches!(
            extract(Html::parse_document(html)),
            Err(ExtractError::MissingContainer(_))
        ));
    }

    #[test]
    fn test_hashtags_are_lowercased() {
        assert_eq!(hashtags("#Hello world #RustLang"), vec!["hello", "rustlang"]);
        assert!(hashtags("issue#12").is_empty());
    }
}
