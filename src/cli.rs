//! Command-line interface definitions for the headline normalizer.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option overrides the matching field of the optional YAML config file.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the headline normalizer.
///
/// # Examples
///
/// ```sh
/// # Normalize the default CSV and write the result
/// analyst_headlines -o out/normalized.csv
///
/// # First 10k rows, streamed in chunks, without touching the cache
/// analyst_headlines -i data/raw_analyst_ratings.csv --nrows 10000 --chunksize 2000 --no-cache
///
/// # Settings from a file, with a custom stopword list
/// analyst_headlines -c headlines.yaml --stopwords ./english.txt
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input CSV (relative paths resolve against the data root)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the normalized table to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base directory for relative input and cache paths
    #[arg(long, env = "HEADLINES_DATA_ROOT")]
    pub data_root: Option<PathBuf>,

    /// Only read these columns (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub usecols: Option<Vec<String>>,

    /// Stop after reading this many rows
    #[arg(long)]
    pub nrows: Option<usize>,

    /// Normalize in chunks of this many rows
    #[arg(long)]
    pub chunksize: Option<usize>,

    /// Neither read nor write the columnar snapshot
    #[arg(long)]
    pub no_cache: bool,

    /// Location of the columnar snapshot
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    /// One-word-per-line stopword list
    #[arg(long = "stopwords", env = "STOPWORDS_PATH")]
    pub stopwords_path: Option<PathBuf>,

    /// Civil timezone assumed for timestamps without an offset
    #[arg(long, env = "HEADLINES_TIMEZONE")]
    pub timezone: Option<String>,
}
