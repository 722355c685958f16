//! Stopword set resolution.
//!
//! The set is resolved once, when the pipeline is built, and passed around as
//! an immutable value. Resolution order:
//!
//! 1. An explicit word-list file (`--stopwords` / `stopwords_path`)
//! 2. `$NLTK_DATA/corpora/stopwords/english`
//! 3. `$HOME/nltk_data/corpora/stopwords/english`
//! 4. [`FALLBACK_STOPWORDS`]
//!
//! The built-in list is smaller than the NLTK English list. Callers must not
//! depend on which source ended up active.

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Common English function words used when no word list is available.
pub const FALLBACK_STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "if", "in", "on", "at", "to", "for", "of", "is", "are", "was",
    "were", "it", "this", "that", "these", "those", "i", "you", "he", "she", "we", "they", "them",
    "my", "your", "our", "their", "as", "by", "with", "from", "be", "have", "has", "had",
];

const NLTK_ENGLISH: &str = "corpora/stopwords/english";

/// Where the active stopword set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopwordOrigin {
    File(PathBuf),
    Builtin,
    Inline,
}

impl fmt::Display for StopwordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopwordOrigin::File(path) => write!(f, "{}", path.display()),
            StopwordOrigin::Builtin => f.write_str("builtin"),
            StopwordOrigin::Inline => f.write_str("inline"),
        }
    }
}

/// An immutable, lowercase stopword set.
#[derive(Debug, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
    origin: StopwordOrigin,
}

impl Stopwords {
    /// The built-in [`FALLBACK_STOPWORDS`] list.
    pub fn fallback() -> Self {
        Self {
            words: FALLBACK_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            origin: StopwordOrigin::Builtin,
        }
    }

    /// Build a set from arbitrary words. Words are trimmed and lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            origin: StopwordOrigin::Inline,
        }
    }

    /// Read a one-word-per-line list. Blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut set =
            Self::from_words(text.lines().filter(|l| !l.trim_start().starts_with('#')));
        set.origin = StopwordOrigin::File(path.to_path_buf());
        Ok(set)
    }

    /// Resolve the active set, falling back to the built-in list.
    ///
    /// An explicit path that cannot be read is logged and skipped rather than
    /// treated as fatal; so is an empty list.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }
        if let Ok(dir) = env::var("NLTK_DATA") {
            candidates.extend(env::split_paths(&dir).map(|d| d.join(NLTK_ENGLISH)));
        }
        if let Ok(home) = env::var("HOME") {
            candidates.push(Path::new(&home).join("nltk_data").join(NLTK_ENGLISH));
        }

        for candidate in candidates {
            match Self::load(&candidate) {
                Ok(set) if !set.is_empty() => {
                    info!(path = %candidate.display(), words = set.len(), "Loaded stopwords");
                    return set;
                }
                Ok(_) => warn!(path = %candidate.display(), "Stopword list is empty; skipping"),
                Err(e) if Some(candidate.as_path()) == explicit => {
                    warn!(path = %candidate.display(), error = %e, "Cannot read stopword list")
                }
                Err(e) => debug!(path = %candidate.display(), error = %e, "No stopword list here"),
            }
        }

        info!(words = FALLBACK_STOPWORDS.len(), "Using builtin stopwords");
        Self::fallback()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn origin(&self) -> &StopwordOrigin {
        &self.origin
    }
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::fallback()
    }
}
