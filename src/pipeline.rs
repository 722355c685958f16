//! Row pipeline: turn [`RawRecord`]s into [`NewsRecord`]s.
//!
//! Each row goes through the date normalizer, the publisher resolver and the
//! text feature extractor independently. Rows whose date cannot be normalized
//! are dropped; nothing else can remove a row.

use crate::dates::{DateNormalizer, UnparseableDate};
use crate::models::{
    DATE_COLUMN, HEADLINE_COLUMN, NewsRecord, PUBLISHER_COLUMN, RawRecord, STOCK_COLUMN,
};
use crate::publisher::resolve_publisher;
use crate::stopwords::Stopwords;
use crate::text::{clean_headline, headline_len_chars, headline_len_words, tokenize};
use crate::utils::truncate_for_log;
use std::sync::Arc;
use tracing::debug;

/// Normalized rows from one batch plus how many were dropped.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<NewsRecord>,
    pub dropped: usize,
}

/// Immutable per-run configuration shared by every row.
#[derive(Debug)]
pub struct Pipeline {
    dates: DateNormalizer,
    stopwords: Arc<Stopwords>,
}

impl Pipeline {
    pub fn new(dates: DateNormalizer, stopwords: Arc<Stopwords>) -> Self {
        Self { dates, stopwords }
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    pub fn dates(&self) -> &DateNormalizer {
        &self.dates
    }

    /// Normalize one row.
    ///
    /// # Returns
    ///
    /// The normalized row, or the reason its date was rejected. No other field
    /// can cause a rejection.
    pub fn normalize(&self, source: RawRecord) -> Result<NewsRecord, UnparseableDate> {
        let date_utc = self.dates.normalize(source.get(DATE_COLUMN))?;
        let identity = resolve_publisher(source.get(PUBLISHER_COLUMN));

        let headline = source.get(HEADLINE_COLUMN).unwrap_or_default().to_string();
        let headline_clean = clean_headline(&headline);
        let tokens = tokenize(&headline_clean, &self.stopwords);
        let stock = source.get(STOCK_COLUMN).map(normalize_ticker);

        Ok(NewsRecord {
            headline_len_chars: headline_len_chars(&headline),
            headline_len_words: headline_len_words(&headline),
            headline,
            stock,
            date_utc,
            publisher_domain: identity.domain,
            publisher_clean: identity.clean,
            headline_clean,
            tokens,
            source,
        })
    }

    /// Normalize a batch, dropping rows with unparseable dates.
    pub fn normalize_batch<I>(&self, rows: I) -> BatchOutcome
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut outcome = BatchOutcome::default();
        for row in rows {
            let raw_date = row.get(DATE_COLUMN).map(|d| truncate_for_log(d, 64));
            match self.normalize(row) {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    debug!(date = ?raw_date, error = %e, "Dropping row with unparseable date");
                    outcome.dropped += 1;
                }
            }
        }
        outcome
    }
}

/// Trim and uppercase a ticker symbol.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
