//! Mixed-script tokenizer
//!
//! Space-delimited scripts (Latin, Cyrillic, Hangul, ...) split on anything that
//! is not a letter, mark, digit or underscore. Han, Hiragana and Katakana have
//! no word separators, so every such character is its own term.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TOKENIZE_RE: OnceLock<Regex> = OnceLock::new();

fn tokenize_re() -> &'static Regex {
    TOKENIZE_RE.get_or_init(|| {
        Regex::new(
            r"[\p{Han}\p{Hiragana}\p{Katakana}]|[[\p{L}\p{M}\p{N}_]--[\p{Han}\p{Hiragana}\p{Katakana}]]+",
        )
        .unwrap()
    })
}

/// Split text into lower-cased terms, keeping duplicates and order
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_re()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Query terms: tokenized and deduplicated in first-seen order
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Case-insensitive excerpt of `text` around the first occurrence of `keyword`
pub fn excerpt_around(text: &str, keyword: &str, radius: usize) -> Option<String> {
    let fold = |c: char| c.to_lowercase().next().unwrap_or(c);
    let chars: Vec<char> = text.chars().collect();
    let haystack: Vec<char> = chars.iter().map(|&c| fold(c)).collect();
    let needle: Vec<char> = keyword.trim().chars().map(fold).collect();

    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let pos = haystack
        .windows(needle.len())
        .position(|window| window == needle.as_slice())?;
    let mut start = pos.saturating_sub(radius);
    let mut end = (pos + needle.len() + radius).min(chars.len());

    // Avoid cutting words in half, within one more radius
    let floor = start.saturating_sub(radius);
    while start > floor && chars[start - 1].is_alphanumeric() {
        start -= 1;
    }
    let ceiling = (end + radius).min(chars.len());
    while end < ceiling && chars[end].is_alphanumeric() {
        end += 1;
    }

    let excerpt: String = chars[start..end].iter().collect();
    Some(excerpt.split_whitespace().collect::<Vec<_>>().join(" "))
}
