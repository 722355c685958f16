//! Columnar snapshot of a normalized [`NewsFrame`].
//!
//! Re-deriving a large feed is dominated by date parsing, so the loader keeps a
//! snapshot of its last result. The snapshot is JSON laid out column-wise: one
//! array per source column and per derived column, all of equal length.
//!
//! ```text
//! {
//!   "version": 1,
//!   "columns": ["headline", "url", "publisher", "date", "stock"],
//!   "source": { "headline": [...], "url": [...], ... },
//!   "date_utc": ["2020-06-05T14:30:54Z", ...],
//!   "tokens": [["stocks", "rally"], ...],
//!   ...
//! }
//! ```
//!
//! The snapshot is keyed by its path only. It does not record which input
//! file or loader options produced it.

use crate::error::NewsError;
use crate::models::{NewsFrame, NewsRecord, RawRecord};
use crate::utils::ensure_parent_dir;
use chrono::{DateTime, Utc};
use itertools::izip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnarSnapshot {
    pub version: u32,
    /// Source columns in file order.
    pub columns: Vec<String>,
    /// Raw cell values per source column; `null` for absent cells.
    pub source: BTreeMap<String, Vec<Option<String>>>,
    pub headline: Vec<String>,
    pub stock: Vec<Option<String>>,
    pub date_utc: Vec<DateTime<Utc>>,
    pub publisher_domain: Vec<Option<String>>,
    pub publisher_clean: Vec<Option<String>>,
    pub headline_clean: Vec<String>,
    pub tokens: Vec<Vec<String>>,
    pub headline_len_chars: Vec<usize>,
    pub headline_len_words: Vec<usize>,
}

impl From<&NewsFrame> for ColumnarSnapshot {
    fn from(frame: &NewsFrame) -> Self {
        let records = &frame.records;
        let source = frame
            .columns
            .iter()
            .map(|col| {
                let values = records
                    .iter()
                    .map(|r| r.source.get(col).map(str::to_string))
                    .collect();
                (col.clone(), values)
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            columns: frame.columns.clone(),
            source,
            headline: records.iter().map(|r| r.headline.clone()).collect(),
            stock: records.iter().map(|r| r.stock.clone()).collect(),
            date_utc: records.iter().map(|r| r.date_utc).collect(),
            publisher_domain: records.iter().map(|r| r.publisher_domain.clone()).collect(),
            publisher_clean: records.iter().map(|r| r.publisher_clean.clone()).collect(),
            headline_clean: records.iter().map(|r| r.headline_clean.clone()).collect(),
            tokens: records.iter().map(|r| r.tokens.clone()).collect(),
            headline_len_chars: records.iter().map(|r| r.headline_len_chars).collect(),
            headline_len_words: records.iter().map(|r| r.headline_len_words).collect(),
        }
    }
}

impl ColumnarSnapshot {
    pub fn rows(&self) -> usize {
        self.date_utc.len()
    }

    fn check_lengths(&self) -> Result<(), NewsError> {
        let n = self.rows();
        let derived = [
            ("headline", self.headline.len()),
            ("stock", self.stock.len()),
            ("publisher_domain", self.publisher_domain.len()),
            ("publisher_clean", self.publisher_clean.len()),
            ("headline_clean", self.headline_clean.len()),
            ("tokens", self.tokens.len()),
            ("headline_len_chars", self.headline_len_chars.len()),
            ("headline_len_words", self.headline_len_words.len()),
        ];
        for (name, len) in derived {
            if len != n {
                return Err(NewsError::Snapshot(format!(
                    "column `{name}` has {len} rows, expected {n}"
                )));
            }
        }
        for col in &self.columns {
            match self.source.get(col) {
                None => {
                    return Err(NewsError::Snapshot(format!(
                        "source column `{col}` is missing"
                    )));
                }
                Some(values) if values.len() != n => {
                    return Err(NewsError::Snapshot(format!(
                        "source column `{col}` has {} rows, expected {n}",
                        values.len()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Rebuild the frame, validating version and column lengths.
    pub fn into_frame(self) -> Result<NewsFrame, NewsError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(NewsError::Snapshot(format!(
                "unsupported version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }
        self.check_lengths()?;

        let sources: Vec<RawRecord> = (0..self.rows())
            .map(|i| {
                self.columns
                    .iter()
                    .filter_map(|col| {
                        self.source[col][i]
                            .as_ref()
                            .map(|v| (col.clone(), v.clone()))
                    })
                    .collect()
            })
            .collect();

        let records = izip!(
            sources,
            self.headline,
            self.stock,
            self.date_utc,
            self.publisher_domain,
            self.publisher_clean,
            self.headline_clean,
            self.tokens,
            self.headline_len_chars,
            self.headline_len_words
        )
        .map(
            |(
                source,
                headline,
                stock,
                date_utc,
                publisher_domain,
                publisher_clean,
                headline_clean,
                tokens,
                headline_len_chars,
                headline_len_words,
            )| NewsRecord {
                source,
                headline,
                stock,
                date_utc,
                publisher_domain,
                publisher_clean,
                headline_clean,
                tokens,
                headline_len_chars,
                headline_len_words,
            },
        )
        .collect();

        Ok(NewsFrame {
            columns: self.columns,
            records,
        })
    }
}

/// Read a snapshot written by [`write_snapshot`].
///
/// # Errors
///
/// I/O, JSON and consistency failures are all returned; the loader decides
/// whether they matter.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_snapshot(path: &Path) -> Result<NewsFrame, NewsError> {
    let bytes = fs::read(path).await.map_err(|e| NewsError::io(path, e))?;
    let snapshot: ColumnarSnapshot = serde_json::from_slice(&bytes)?;
    let frame = snapshot.into_frame()?;
    info!(rows = frame.len(), "Read snapshot");
    Ok(frame)
}

/// Write `frame` as a columnar snapshot, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(frame: &NewsFrame, path: &Path) -> Result<(), NewsError> {
    let json = serde_json::to_vec(&ColumnarSnapshot::from(frame))?;
    ensure_parent_dir(path).await?;
    fs::write(path, json)
        .await
        .map_err(|e| NewsError::io(path, e))?;
    info!(rows = frame.len(), "Wrote snapshot");
    Ok(())
}
