//! Frequency-ranked keyword tags

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("keyword regex is valid"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "from", "about", "into", "through", "during", "before",
    "after", "above", "below", "between", "among", "are", "was", "were", "been", "being",
    "have", "has", "had", "does", "did", "will", "would", "could", "should", "may", "might",
    "must", "can", "this", "that", "these", "those", "not", "its", "our", "their", "they",
    "you", "your", "his", "her", "she", "him", "who", "what", "which", "when", "where",
    "how", "all", "any", "also", "than", "then", "there", "here", "out", "more", "most",
    "such", "only", "other", "some", "very", "just", "over", "each",
];

/// The `max` most frequent non-stop-words of three or more ASCII letters.
///
/// Words are lowercased. Ties keep the order of first occurrence.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (index, found) in WORD.find_iter(text).enumerate() {
        let word = found.as_str().to_ascii_lowercase();
        if STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        counts.entry(word).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(max)
        .map(|(word, _, _)| word)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_by_frequency_then_first_occurrence() {
        let text = "Rust crabs love rust. The crab said: Rust is fast, crabs are fast.";
        assert_eq!(
            extract_keywords(text, 3),
            vec!["rust", "crabs", "fast"]
        );
    }

    #[test]
    fn test_skips_stop_words_short_and_non_ascii_words() {
        let text = "The cat and the dog, über alles, is an ox";
        assert_eq!(extract_keywords(text, 10), vec!["cat", "dog", "alles"]);
    }

    #[test]
    fn test_zero_disables() {
        assert!(extract_keywords("plenty of words here", 0).is_empty());
    }
}
