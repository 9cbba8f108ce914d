//! Keyword tables and search-term extraction for episode formation.
//!
//! Matching is case-insensitive and works on whole words: the message is
//! split into alphanumeric tokens and a phrase matches only as a run of
//! complete tokens, so "secret" never fires inside "secretary". Callers with a real classifier pass `is_crisis` and disclosed
//! facts explicitly instead.

/// Phrases that signal the user is opening up.
pub const DISCLOSURE_KEYWORDS: &[&str] = &[
    "honestly",
    "to be honest",
    "the truth is",
    "actually, i",
    "secret",
    "never told anyone",
    "first time telling",
    "confess",
];

/// Phrases that signal acute risk.
pub const CRISIS_KEYWORDS: &[&str] = &[
    "want to die",
    "kill myself",
    "suicide",
    "want to disappear",
    "no reason to live",
    "hurt myself",
    "can't go on",
    "at my limit",
];

/// Phrases that signal a realization.
pub const INSIGHT_KEYWORDS: &[&str] = &[
    "i realized",
    "i realised",
    "now i see",
    "makes sense now",
    "i get it now",
    "it clicked",
    "eye-opening",
    "i understand now",
];

/// Words never used as search keywords.
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "always", "been", "before", "being", "could", "does",
    "doing", "done", "even", "every", "from", "going", "have", "having", "here", "into", "just",
    "know", "like", "more", "most", "much", "never", "only", "other", "really", "same", "should",
    "some", "still", "such", "than", "that", "their", "them", "then", "there", "these", "they",
    "thing", "things", "this", "those", "very", "want", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your", "yours",
];

/// Minimum length (in characters) of a derived keyword.
const MIN_KEYWORD_CHARS: usize = 4;

/// Lowercase alphanumeric tokens of `text`; punctuation and spaces split.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether any phrase from `table` occurs in `tokens` as a run of whole
/// tokens. `tokens` must come from [`tokenize`].
#[must_use]
pub fn matches_any(tokens: &[String], table: &[&str]) -> bool {
    table.iter().any(|phrase| {
        let needle = tokenize(phrase);
        !needle.is_empty() && tokens.windows(needle.len()).any(|run| run == needle.as_slice())
    })
}

/// Whether any phrase from `table` occurs in `message` (case-insensitive,
/// whole words only).
#[must_use]
pub fn contains_any(message: &str, table: &[&str]) -> bool {
    matches_any(&tokenize(message), table)
}

/// Search terms for an episode: topics first, then derived words.
///
/// Derived words are lowercase alphabetic runs of at least four characters
/// that are not stop-words. The result is deduplicated and capped at `max`.
#[must_use]
pub fn extract_keywords(message: &str, topics: &[String], max: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::with_capacity(max);
    for topic in topics {
        if keywords.len() >= max {
            return keywords;
        }
        if !keywords.contains(topic) {
            keywords.push(topic.clone());
        }
    }

    let lower = message.to_lowercase();
    for word in lower.split(|c: char| !c.is_alphabetic()) {
        if keywords.len() >= max {
            break;
        }
        if word.chars().count() < MIN_KEYWORD_CHARS || STOPWORDS.contains(&word) {
            continue;
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}
