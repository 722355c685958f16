//! # Analyst Headlines
//!
//! A batch normalizer for financial news headline CSVs. Every row gets a
//! UTC-aware timestamp, a canonical publisher identity and lightweight lexical
//! features, ready for downstream analysis.
//!
//! ## Features
//!
//! - Parses mixed date formats; naive timestamps are read as America/New_York
//!   civil time (DST aware) before conversion to UTC
//! - Drops rows whose date cannot be parsed by any strategy
//! - Maps email-style publishers (`jdoe@reuters.com`) onto their domain
//! - Cleans and tokenizes headlines against a stopword list (NLTK's English
//!   list when installed, a builtin list otherwise)
//! - Streams large files in chunks and keeps a columnar snapshot for fast reloads
//!
//! ## Usage
//!
//! ```sh
//! analyst_headlines -i data/raw_analyst_ratings.csv -o out/normalized.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Configuration**: YAML settings merged with CLI flags
//! 2. **Loading**: snapshot lookup, or a chunked CSV read
//! 3. **Normalization**: date, publisher and text features per row
//! 4. **Output**: normalized CSV plus a run summary in the logs

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod dates;
mod error;
mod loader;
mod models;
mod outputs;
mod pipeline;
mod publisher;
mod stopwords;
mod text;
mod utils;

use cli::Cli;
use config::{Settings, load_settings};
use dates::DateNormalizer;
use loader::Loader;
use pipeline::Pipeline;
use stopwords::Stopwords;

const TOP_PUBLISHERS: usize = 5;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("analyst_headlines starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Settings ----
    let settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    }
    .merge_cli(&args);
    let timezone = settings.timezone()?;
    let options = settings.load_options();
    info!(
        input = %options.path.display(),
        cache = ?options.cache_path,
        nrows = ?options.nrows,
        chunksize = ?options.chunksize,
        "Resolved settings"
    );

    // ---- Pipeline ----
    let stopwords = Arc::new(Stopwords::resolve(settings.stopwords_path.as_deref()));
    let pipeline = Arc::new(Pipeline::new(DateNormalizer::new(timezone), stopwords));
    info!(
        stopwords = %pipeline.stopwords().origin(),
        stopword_count = pipeline.stopwords().len(),
        timezone = %pipeline.dates().timezone(),
        dates = ?pipeline.dates(),
        "Pipeline ready"
    );

    // ---- Load ----
    let loader = Loader::new(options, pipeline);
    let loaded = match loader.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(path = %loader.options().path.display(), error = %e, "Load failed");
            return Err(e.into());
        }
    };
    let report = &loaded.report;
    info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        rows_dropped = report.rows_dropped,
        rows_malformed = report.rows_malformed,
        from_cache = report.from_cache,
        "Headlines normalized"
    );

    if loaded.frame.is_empty() {
        warn!("No rows survived normalization");
    }

    for (rank, (publisher, count)) in loaded
        .frame
        .top_publishers(TOP_PUBLISHERS)
        .iter()
        .enumerate()
    {
        info!(rank = rank + 1, %publisher, count, "Top publisher");
    }

    // ---- Output ----
    if let Some(path) = settings.output_path() {
        if let Err(e) = outputs::csv::write_frame(&loaded.frame, &path).await {
            error!(path = %path.display(), error = %e, "Failed to write normalized CSV");
            return Err(e.into());
        }
    } else {
        debug!("No output path; skipping CSV export");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
