//! Salient term and candidate sentence mining.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::is_usable_text;

/// Maximum number of terms returned by [`mine_terms`].
pub const MAX_TERMS: usize = 25;
/// Maximum number of sentences returned by [`mine_sentences`].
pub const MAX_SENTENCES: usize = 50;

const MIN_SENTENCE_CHARS: usize = 21;
const MAX_SENTENCE_CHARS: usize = 199;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence terminator pattern"));

/// Common words that never count as terms.
///
/// Words of three letters or fewer are dropped by length anyway; they are
/// kept here so the list reads as a plain stop-word list.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
        "will", "would", "could", "should", "may", "might", "can", "this", "that", "these",
        "those", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
        "my", "your", "his", "its", "our", "their", "from", "up", "about", "into", "over",
        "after", "most", "also", "other", "some", "what", "no", "way", "many", "than", "first",
        "call", "who", "oil", "sit", "now", "find", "long", "down", "day", "get", "come", "made",
        "part", "very", "well", "such", "here", "even", "back", "good", "much", "go", "new",
        "write", "used", "man", "too", "any", "same", "right",
    ]
    .into_iter()
    .collect()
});

/// Rank content words by frequency.
///
/// Text is lowercased, punctuation becomes whitespace, and words of three
/// characters or fewer or in [`STOP_WORDS`] are dropped. Ties keep the order
/// in which words first appeared. Unusable text yields no terms.
pub fn mine_terms(text: &str) -> Vec<String> {
    if !is_usable_text(text) {
        return Vec::new();
    }

    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in normalized.split_whitespace() {
        if word.chars().count() <= 3 || STOP_WORDS.contains(word) {
            continue;
        }
        match index.get(word) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(word, order.len());
                order.push((word, 1));
            }
        }
    }

    // Stable sort: equal counts stay in first-seen order.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(MAX_TERMS)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Split text into candidate sentences for question context.
///
/// Keeps trimmed sentences of 21 to 199 characters that contain a letter,
/// in document order, up to [`MAX_SENTENCES`]. Unusable text yields none.
pub fn mine_sentences(text: &str) -> Vec<String> {
    if !is_usable_text(text) {
        return Vec::new();
    }

    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            (MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&len)
        })
        .filter(|s| s.chars().any(|c| c.is_alphabetic()))
        .take(MAX_SENTENCES)
        .map(str::to_string)
        .collect()
}
