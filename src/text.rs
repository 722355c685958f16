//! Headline cleaning, tokenization and length features.

use crate::stopwords::Stopwords;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("valid URL pattern"));
static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid character class"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Normalize a headline for token analysis.
///
/// Lowercases, drops anything that starts with `http` up to the next
/// whitespace, turns every character outside `[a-z0-9]` and whitespace into a
/// space, then collapses whitespace and trims. Applying it twice gives the same
/// result as applying it once.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_headline("I love Python! Visit http://example.com"), "i love python visit");
/// ```
pub fn clean_headline(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, "");
    let alnum = NON_ALNUM_RE.replace_all(&without_urls, " ");
    WHITESPACE_RE.replace_all(&alnum, " ").trim().to_string()
}

/// Clean `text` and return its words minus `stopwords`, in order.
///
/// Passing an already-cleaned headline is fine since cleaning is idempotent.
pub fn tokenize(text: &str, stopwords: &Stopwords) -> Vec<String> {
    clean_headline(text)
        .split_whitespace()
        .filter(|t| !stopwords.contains(t))
        .map(str::to_string)
        .collect()
}

/// Character count of the untouched headline (Unicode scalar values).
pub fn headline_len_chars(text: &str) -> usize {
    text.chars().count()
}

/// Whitespace-delimited word count of the untouched headline.
pub fn headline_len_words(text: &str) -> usize {
    text.split_whitespace().count()
}
