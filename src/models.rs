//! Data models for raw and normalized headline rows.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawRecord`]: One CSV row as read, column name to cell text
//! - [`NewsRecord`]: A row after date, publisher and text normalization
//! - [`NewsFrame`]: The ordered source columns plus every normalized row
//!
//! Column names used by the pipeline are exported as constants so the loader,
//! the cache and the CSV writer agree on spelling.

use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;

pub const DATE_COLUMN: &str = "date";
pub const HEADLINE_COLUMN: &str = "headline";
pub const PUBLISHER_COLUMN: &str = "publisher";
pub const STOCK_COLUMN: &str = "stock";

/// Columns every input must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[DATE_COLUMN, HEADLINE_COLUMN, PUBLISHER_COLUMN];

/// Columns appended by normalization, in output order.
pub const DERIVED_COLUMNS: &[&str] = &[
    "date_utc",
    "publisher_domain",
    "publisher_clean",
    "headline_clean",
    "tokens",
    "headline_len_chars",
    "headline_len_words",
];

/// A CSV row as read from disk.
///
/// Empty cells are stored as absent, so [`RawRecord::get`] returns `None` for
/// both a missing column and an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cell. Empty strings are dropped.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.values.insert(column.into(), value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A fully normalized headline row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    /// The row exactly as read.
    pub source: RawRecord,
    /// The headline, empty when the cell was absent.
    pub headline: String,
    /// Trimmed, uppercased ticker when a `stock` cell was present.
    pub stock: Option<String>,
    /// The publication instant in UTC.
    pub date_utc: DateTime<Utc>,
    /// Lowercased domain for email-style publishers.
    pub publisher_domain: Option<String>,
    /// `publisher_domain` when present, else the raw publisher.
    pub publisher_clean: Option<String>,
    /// Lowercase, URL-free, alphanumeric-only headline.
    pub headline_clean: String,
    /// Words of `headline_clean` minus stopwords.
    pub tokens: Vec<String>,
    /// Character count of `headline`.
    pub headline_len_chars: usize,
    /// Whitespace word count of `headline`.
    pub headline_len_words: usize,
}

impl NewsRecord {
    /// Cell text for any output column, or `None` when the cell is absent.
    pub fn value(&self, column: &str) -> Option<String> {
        match column {
            HEADLINE_COLUMN => Some(self.headline.clone()),
            STOCK_COLUMN => self.stock.clone(),
            "date_utc" => Some(self.date_utc.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            "publisher_domain" => self.publisher_domain.clone(),
            "publisher_clean" => self.publisher_clean.clone(),
            "headline_clean" => Some(self.headline_clean.clone()),
            "tokens" => Some(self.tokens.iter().join(" ")),
            "headline_len_chars" => Some(self.headline_len_chars.to_string()),
            "headline_len_words" => Some(self.headline_len_words.to_string()),
            other => self.source.get(other).map(str::to_string),
        }
    }
}

/// The normalized table: source column order plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsFrame {
    /// Source columns in file order.
    pub columns: Vec<String>,
    pub records: Vec<NewsRecord>,
}

impl NewsFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every output column: source columns, then [`DERIVED_COLUMNS`].
    ///
    /// A source column that shares a name with a derived one is shadowed.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !DERIVED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// The `n` most frequent `publisher_clean` values, most frequent first.
    ///
    /// Ties are broken alphabetically so the result is stable.
    pub fn top_publishers(&self, n: usize) -> Vec<(String, usize)> {
        self.records
            .iter()
            .filter_map(|r| r.publisher_clean.clone())
            .counts()
            .into_iter()
            .sorted_by(|(a_name, a_count), (b_name, b_count)| {
                b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
            })
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(publisher: Option<&str>) -> NewsRecord {
        let mut source = RawRecord::new();
        source.insert("date", "2020-06-05 10:30:54-04:00");
        source.insert("headline", "Stocks rally");
        if let Some(p) = publisher {
            source.insert("publisher", p);
        }
        source.insert("url", "https://example.com/a");
        NewsRecord {
            source,
            headline: "Stocks rally".to_string(),
            stock: Some("AAPL".to_string()),
            date_utc: DateTime::parse_from_rfc3339("2020-06-05T14:30:54Z")
                .unwrap()
                .with_timezone(&Utc),
            publisher_domain: None,
            publisher_clean: publisher.map(str::to_string),
            headline_clean: "stocks rally".to_string(),
            tokens: vec!["stocks".to_string(), "rally".to_string()],
            headline_len_chars: 12,
            headline_len_words: 2,
        }
    }

    #[test]
    fn test_raw_record_drops_empty_cells() {
        let record: RawRecord = [("date", ""), ("headline", "Hello")].into_iter().collect();
        assert_eq!(record.get("date"), None);
        assert_eq!(record.get("headline"), Some("Hello"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_record_values() {
        let record = sample_record(Some("Benzinga"));
        assert_eq!(
            record.value("date_utc").as_deref(),
            Some("2020-06-05T14:30:54Z")
        );
        assert_eq!(record.value("tokens").as_deref(), Some("stocks rally"));
        assert_eq!(
            record.value("url").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(record.value("stock").as_deref(), Some("AAPL"));
        assert_eq!(record.value("publisher_domain"), None);
        assert_eq!(record.value("headline_len_words").as_deref(), Some("2"));
    }

    #[test]
    fn test_date_utc_keeps_fractional_seconds() {
        let mut record = sample_record(None);
        record.date_utc = DateTime::parse_from_rfc3339("2020-06-05T14:30:54.250Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            record.value("date_utc").as_deref(),
            Some("2020-06-05T14:30:54.250Z")
        );
    }

    #[test]
    fn test_column_names_append_derived() {
        let frame = NewsFrame::new(vec![
            "headline".to_string(),
            "date".to_string(),
            "date_utc".to_string(),
        ]);
        let names = frame.column_names();
        assert_eq!(&names[..2], &["headline".to_string(), "date".to_string()]);
        assert_eq!(names.iter().filter(|n| *n == "date_utc").count(), 1);
        for col in [
            "headline",
            "date",
            "date_utc",
            "publisher_clean",
            "headline_len_chars",
            "headline_len_words",
            "publisher_domain",
            "headline_clean",
            "tokens",
        ] {
            assert!(names.iter().any(|n| n == col), "missing {col}");
        }
    }

    #[test]
    fn test_top_publishers() {
        let mut frame = NewsFrame::new(vec!["publisher".to_string()]);
        for p in ["b", "a", "b", "c", "a", "b"] {
            frame.records.push(sample_record(Some(p)));
        }
        frame.records.push(sample_record(None));

        assert_eq!(
            frame.top_publishers(2),
            vec![("b".to_string(), 3), ("a".to_string(), 2)]
        );
    }
}
