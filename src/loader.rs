//! CSV loading: snapshot lookup, streaming read and normalization.
//!
//! [`Loader::load`] follows a two-phase pattern:
//!
//! 1. **Snapshot**: when caching is enabled and a snapshot exists, return it
//!    as-is without touching the CSV
//! 2. **Derive**: stream the CSV in chunks through the [`Pipeline`], then
//!    refresh the snapshot on a best-effort basis
//!
//! Row-level problems never abort a load. Malformed CSV lines are skipped and
//! rows with unparseable dates are dropped; both are counted in [`LoadReport`].

use crate::cache;
use crate::error::NewsError;
use crate::models::{NewsFrame, REQUIRED_COLUMNS, RawRecord};
use crate::pipeline::Pipeline;
use csv::{ReaderBuilder, StringRecord};
use itertools::Itertools;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{fs, task};
use tracing::{debug, info, instrument, warn};

/// What to read and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// CSV file to read.
    pub path: PathBuf,
    /// Restrict to these columns. Must include every required column.
    pub usecols: Option<Vec<String>>,
    /// Stop after this many data rows (malformed ones included).
    pub nrows: Option<usize>,
    /// Normalize this many rows at a time; one chunk when unset.
    pub chunksize: Option<usize>,
    /// Snapshot location; `None` disables caching entirely.
    pub cache_path: Option<PathBuf>,
}

/// Row accounting for one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows dropped because no date strategy accepted them.
    pub rows_dropped: usize,
    /// CSV lines that could not be decoded.
    pub rows_malformed: usize,
    pub chunks: usize,
    pub from_cache: bool,
}

/// A loaded frame and how it was obtained.
#[derive(Debug)]
pub struct Loaded {
    pub frame: NewsFrame,
    pub report: LoadReport,
}

pub struct Loader {
    options: LoadOptions,
    pipeline: Arc<Pipeline>,
}

impl Loader {
    pub fn new(options: LoadOptions, pipeline: Arc<Pipeline>) -> Self {
        Self { options, pipeline }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load the normalized frame, from the snapshot when possible.
    ///
    /// # Errors
    ///
    /// Fails only when the CSV cannot be opened, its header row cannot be read,
    /// or a required/requested column is missing. Snapshot problems are logged
    /// and never returned.
    #[instrument(level = "info", skip_all, fields(path = %self.options.path.display()))]
    pub async fn load(&self) -> Result<Loaded, NewsError> {
        if let Some(frame) = self.read_cached().await {
            let report = LoadReport {
                rows_read: frame.len(),
                rows_kept: frame.len(),
                from_cache: true,
                ..LoadReport::default()
            };
            return Ok(Loaded { frame, report });
        }

        let options = self.options.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let loaded = task::spawn_blocking(move || {
            let file =
                std::fs::File::open(&options.path).map_err(|e| NewsError::io(&options.path, e))?;
            read_csv(file, &options, &pipeline)
        })
        .await??;

        info!(
            rows_read = loaded.report.rows_read,
            rows_kept = loaded.report.rows_kept,
            rows_dropped = loaded.report.rows_dropped,
            rows_malformed = loaded.report.rows_malformed,
            chunks = loaded.report.chunks,
            "Normalized CSV"
        );

        if let Some(cache_path) = &self.options.cache_path {
            // Best effort: a failed write never fails the load.
            if let Err(e) = cache::write_snapshot(&loaded.frame, cache_path).await {
                debug!(path = %cache_path.display(), error = %e, "Snapshot not written");
            }
        }

        Ok(loaded)
    }

    async fn read_cached(&self) -> Option<NewsFrame> {
        let cache_path = self.options.cache_path.as_ref()?;
        if !fs::try_exists(cache_path).await.unwrap_or(false) {
            debug!(path = %cache_path.display(), "No snapshot yet");
            return None;
        }
        match cache::read_snapshot(cache_path).await {
            Ok(frame) => {
                info!(
                    path = %cache_path.display(),
                    rows = frame.len(),
                    "Using snapshot; skipping CSV"
                );
                Some(frame)
            }
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "Ignoring unreadable snapshot");
                None
            }
        }
    }
}

/// Read and normalize CSV data from any reader.
///
/// This is the synchronous core of [`Loader::load`]; it never consults the
/// snapshot.
pub fn read_csv<R: Read>(
    reader: R,
    options: &LoadOptions,
    pipeline: &Pipeline,
) -> Result<Loaded, NewsError> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
    let selected = select_columns(&headers, options.usecols.as_deref())?;

    let mut frame = NewsFrame::new(selected.iter().map(|(_, name)| name.clone()).collect());
    let mut report = LoadReport::default();

    let chunk_size = options.chunksize.unwrap_or(usize::MAX).max(1);
    let limit = options.nrows.unwrap_or(usize::MAX);
    let chunks = csv_reader.records().take(limit).chunks(chunk_size);

    for chunk in &chunks {
        let mut rows = Vec::new();
        for result in chunk {
            report.rows_read += 1;
            match result {
                Ok(record) => rows.push(to_raw(&record, &selected)),
                Err(e) => {
                    let line = e.position().map(|p| p.line());
                    warn!(?line, error = %e, "Skipping malformed CSV row");
                    report.rows_malformed += 1;
                }
            }
        }

        let outcome = pipeline.normalize_batch(rows);
        report.chunks += 1;
        report.rows_dropped += outcome.dropped;
        debug!(
            chunk = report.chunks,
            kept = outcome.records.len(),
            dropped = outcome.dropped,
            "Normalized chunk"
        );
        frame.records.extend(outcome.records);
    }

    report.rows_kept = frame.len();
    Ok(Loaded { frame, report })
}

/// Trim header whitespace and a leading UTF-8 byte-order mark.
fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Pick `(index, name)` pairs to keep, in file order.
fn select_columns(
    headers: &[String],
    usecols: Option<&[String]>,
) -> Result<Vec<(usize, String)>, NewsError> {
    if let Some(wanted) = usecols {
        if let Some(missing) = wanted.iter().find(|w| !headers.contains(w)) {
            return Err(NewsError::MissingColumn(missing.clone()));
        }
    }

    let selected: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| usecols.is_none_or(|wanted| wanted.contains(name)))
        .map(|(idx, name)| (idx, name.clone()))
        .collect();

    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|req| !selected.iter().any(|(_, name)| name == *req))
    {
        return Err(NewsError::MissingColumn(missing.to_string()));
    }
    Ok(selected)
}

fn to_raw(record: &StringRecord, selected: &[(usize, String)]) -> RawRecord {
    selected
        .iter()
        .filter_map(|(idx, name)| record.get(*idx).map(|value| (name.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateNormalizer;
    use crate::stopwords::Stopwords;

    const SAMPLE: &str = "\
,headline,url,publisher,date,stock
0,Stocks That Hit 52-Week Highs On Friday,https://x.io/a,Benzinga Insights,2020-06-05 10:30:54-04:00,a
1,Stocks That Hit 52-Week Lows On Friday,https://x.io/b,jdoe@Reuters.com,2020-06-05 10:45:20-04:00, aapl
2,Broken date row,https://x.io/c,Lisa Levin,2020-13-45,A
3,Naive Eastern row,https://x.io/d,Lisa Levin,June 5 2020 09:30,AA
4,Empty date row,https://x.io/e,Lisa Levin,,AA
";

    fn pipeline() -> Pipeline {
        Pipeline::new(DateNormalizer::default(), Arc::new(Stopwords::fallback()))
    }

    fn load(options: &LoadOptions) -> Result<Loaded, NewsError> {
        read_csv(SAMPLE.as_bytes(), options, &pipeline())
    }

    #[test]
    fn test_read_csv_normalizes_and_drops() {
        let loaded = load(&LoadOptions::default()).unwrap();
        let report = &loaded.report;
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_kept, 3);
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(report.rows_malformed, 0);
        assert_eq!(report.chunks, 1);
        assert!(!report.from_cache);

        let frame = &loaded.frame;
        assert_eq!(frame.columns[0], "");
        assert_eq!(
            frame.records[1].publisher_clean.as_deref(),
            Some("reuters.com")
        );
        assert_eq!(frame.records[1].stock.as_deref(), Some("AAPL"));
        assert_eq!(
            frame.records[2].value("date_utc").as_deref(),
            Some("2020-06-05T13:30:00Z")
        );
        let names = frame.column_names();
        for col in [
            "headline",
            "date_utc",
            "publisher_clean",
            "headline_len_chars",
        ] {
            assert!(names.iter().any(|n| n == col), "missing {col}");
        }
    }

    #[test]
    fn test_usecols_subset() {
        let options = LoadOptions {
            usecols: Some(vec![
                "publisher".to_string(),
                "date".to_string(),
                "headline".to_string(),
            ]),
            ..LoadOptions::default()
        };
        let loaded = load(&options).unwrap();
        assert_eq!(loaded.frame.columns, vec!["headline", "publisher", "date"]);
        assert_eq!(loaded.frame.records[0].source.get("url"), None);
        assert_eq!(loaded.frame.records[0].stock, None);
    }

    #[test]
    fn test_usecols_unknown_column() {
        let options = LoadOptions {
            usecols: Some(vec!["date".to_string(), "ticker".to_string()]),
            ..LoadOptions::default()
        };
        assert!(matches!(load(&options), Err(NewsError::MissingColumn(c)) if c == "ticker"));
    }

    #[test]
    fn test_usecols_must_keep_required() {
        let options = LoadOptions {
            usecols: Some(vec!["date".to_string(), "headline".to_string()]),
            ..LoadOptions::default()
        };
        assert!(matches!(load(&options), Err(NewsError::MissingColumn(c)) if c == "publisher"));
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "headline,date\nhello,2020-06-05\n";
        let result = read_csv(csv.as_bytes(), &LoadOptions::default(), &pipeline());
        assert!(matches!(result, Err(NewsError::MissingColumn(c)) if c == "publisher"));
    }

    #[test]
    fn test_nrows_and_chunks() {
        let options = LoadOptions {
            nrows: Some(4),
            chunksize: Some(3),
            ..LoadOptions::default()
        };
        let loaded = load(&options).unwrap();
        assert_eq!(loaded.report.rows_read, 4);
        assert_eq!(loaded.report.chunks, 2);
        assert_eq!(loaded.report.rows_kept, 3);
        assert_eq!(loaded.report.rows_dropped, 1);
    }

    #[test]
    fn test_chunked_matches_single_pass() {
        let whole = load(&LoadOptions::default()).unwrap();
        let chunked = load(&LoadOptions {
            chunksize: Some(1),
            ..LoadOptions::default()
        })
        .unwrap();
        assert_eq!(chunked.report.chunks, 5);
        assert_eq!(chunked.frame, whole.frame);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let csv = "\u{feff} headline ,publisher , date\nHi,Desk,2020-06-05\n";
        let loaded =
            read_csv(csv.as_bytes(), &LoadOptions::default(), &pipeline()).unwrap();
        assert_eq!(loaded.frame.columns, vec!["headline", "publisher", "date"]);
        assert_eq!(loaded.report.rows_kept, 1);
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let mut bytes = b"headline,publisher,date\nok,Desk,2020-06-05\n".to_vec();
        bytes.extend_from_slice(b"bad \xff\xfe,Desk,2020-06-05\n");
        bytes.extend_from_slice(b"fine,Desk,2020-06-06\n");

        let loaded =
            read_csv(bytes.as_slice(), &LoadOptions::default(), &pipeline()).unwrap();
        assert_eq!(loaded.report.rows_read, 3);
        assert_eq!(loaded.report.rows_malformed, 1);
        assert_eq!(loaded.report.rows_kept, 2);
    }

    #[test]
    fn test_empty_input_reports_missing_columns() {
        let result = read_csv("".as_bytes(), &LoadOptions::default(), &pipeline());
        assert!(matches!(result, Err(NewsError::MissingColumn(_))));
    }

    fn write_sample(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("raw.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_writes_then_uses_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_sample(dir.path());
        let cache_path = dir.path().join("cache/snapshot.json");
        let options = LoadOptions {
            path: csv_path.clone(),
            cache_path: Some(cache_path.clone()),
            ..LoadOptions::default()
        };
        let loader = Loader::new(options, Arc::new(pipeline()));

        let first = loader.load().await.unwrap();
        assert!(!first.report.from_cache);
        assert!(cache_path.exists());

        // The snapshot wins even once the CSV is gone.
        std::fs::remove_file(&csv_path).unwrap();
        let second = loader.load().await.unwrap();
        assert!(second.report.from_cache);
        assert_eq!(second.report.rows_kept, 3);
        assert_eq!(second.frame, first.frame);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("snapshot.json");
        std::fs::write(&cache_path, "[]").unwrap();
        let options = LoadOptions {
            path: write_sample(dir.path()),
            cache_path: Some(cache_path),
            ..LoadOptions::default()
        };

        let loaded = Loader::new(options, Arc::new(pipeline()))
            .load()
            .await
            .unwrap();
        assert!(!loaded.report.from_cache);
        assert_eq!(loaded.report.rows_kept, 3);
    }

    #[tokio::test]
    async fn test_snapshot_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let options = LoadOptions {
            path: write_sample(dir.path()),
            cache_path: Some(blocker.join("snapshot.json")),
            ..LoadOptions::default()
        };

        let loaded = Loader::new(options, Arc::new(pipeline()))
            .load()
            .await
            .unwrap();
        assert_eq!(loaded.report.rows_kept, 3);
    }

    #[tokio::test]
    async fn test_missing_csv_is_io_error() {
        let options = LoadOptions {
            path: PathBuf::from("/nonexistent/raw.csv"),
            ..LoadOptions::default()
        };
        let result = Loader::new(options, Arc::new(pipeline())).load().await;
        assert!(matches!(result, Err(NewsError::Io { .. })));
    }
}
