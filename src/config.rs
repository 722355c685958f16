//! Run settings: YAML file plus CLI overrides.
//!
//! Every field is optional in the file. A minimal `headlines.yaml`:
//!
//! ```yaml
//! input: data/raw_analyst_ratings.csv
//! nrows: 50000
//! chunksize: 10000
//! timezone: America/New_York
//! ```

use crate::cli::Cli;
use crate::error::NewsError;
use crate::loader::LoadOptions;
use crate::utils::resolve_path;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_INPUT: &str = "data/raw_analyst_ratings.csv";
pub const DEFAULT_CACHE: &str = "data/raw_analyst_ratings.snapshot.json";
pub const DEFAULT_TIMEZONE_NAME: &str = "America/New_York";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for relative paths; the working directory when unset.
    pub data_root: Option<PathBuf>,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub cache_path: PathBuf,
    pub use_cache: bool,
    pub usecols: Option<Vec<String>>,
    pub nrows: Option<usize>,
    pub chunksize: Option<usize>,
    pub stopwords_path: Option<PathBuf>,
    pub timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: None,
            input: PathBuf::from(DEFAULT_INPUT),
            output: None,
            cache_path: PathBuf::from(DEFAULT_CACHE),
            use_cache: true,
            usecols: None,
            nrows: None,
            chunksize: None,
            stopwords_path: None,
            timezone: DEFAULT_TIMEZONE_NAME.to_string(),
        }
    }
}

/// Read settings from a YAML file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_settings(path: &Path) -> Result<Settings, NewsError> {
    let text = fs::read_to_string(path).map_err(|e| NewsError::io(path, e))?;
    let settings = serde_yaml::from_str(&text).map_err(|source| NewsError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded settings file");
    Ok(settings)
}

impl Settings {
    /// Apply command-line overrides on top of these settings.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(root) = &cli.data_root {
            self.data_root = Some(root.clone());
        }
        if let Some(input) = &cli.input {
            self.input = input.clone();
        }
        if let Some(output) = &cli.output {
            self.output = Some(output.clone());
        }
        if let Some(cache) = &cli.cache_path {
            self.cache_path = cache.clone();
        }
        if cli.no_cache {
            self.use_cache = false;
        }
        if let Some(cols) = &cli.usecols {
            self.usecols = Some(cols.clone());
        }
        if cli.nrows.is_some() {
            self.nrows = cli.nrows;
        }
        if cli.chunksize.is_some() {
            self.chunksize = cli.chunksize;
        }
        if let Some(words) = &cli.stopwords_path {
            self.stopwords_path = Some(words.clone());
        }
        if let Some(tz) = &cli.timezone {
            self.timezone = tz.clone();
        }
        self
    }

    /// Parse the configured IANA timezone name.
    pub fn timezone(&self) -> Result<Tz, NewsError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| NewsError::InvalidTimezone {
                name: self.timezone.clone(),
                reason: e.to_string(),
            })
    }

    fn root(&self) -> PathBuf {
        self.data_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loader options with every path resolved against the data root.
    pub fn load_options(&self) -> LoadOptions {
        let root = self.root();
        LoadOptions {
            path: resolve_path(&root, &self.input),
            usecols: self.usecols.clone(),
            nrows: self.nrows,
            chunksize: self.chunksize.filter(|n| *n > 0),
            cache_path: self
                .use_cache
                .then(|| resolve_path(&root, &self.cache_path)),
        }
    }

    /// The output path, resolved like the input when relative.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_ref().map(|p| resolve_path(&self.root(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.use_cache);
        assert_eq!(settings.timezone().unwrap(), chrono_tz::America::New_York);
        let opts = settings.load_options();
        assert_eq!(opts.path, PathBuf::from("./data/raw_analyst_ratings.csv"));
        assert_eq!(
            opts.cache_path,
            Some(PathBuf::from("./data/raw_analyst_ratings.snapshot.json"))
        );
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_root: /srv/news").unwrap();
        writeln!(file, "nrows: 500").unwrap();
        writeln!(file, "usecols: [date, headline, publisher]").unwrap();
        writeln!(file, "use_cache: false").unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.nrows, Some(500));
        assert_eq!(settings.input, PathBuf::from(DEFAULT_INPUT));

        let opts = settings.load_options();
        assert_eq!(
            opts.path,
            PathBuf::from("/srv/news/data/raw_analyst_ratings.csv")
        );
        assert_eq!(opts.cache_path, None);
        assert_eq!(opts.usecols.map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nrows: [not, a, number]").unwrap();
        assert!(matches!(
            load_settings(file.path()),
            Err(NewsError::Config { .. })
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "analyst_headlines",
            "-i",
            "/data/other.csv",
            "--no-cache",
            "--chunksize",
            "0",
            "--timezone",
            "UTC",
            "--data-root",
            "/srv/news",
            "--stopwords",
            "words.txt",
            "-o",
            "out/normalized.csv",
        ]);
        let settings = Settings {
            nrows: Some(10),
            ..Settings::default()
        }
        .merge_cli(&cli);

        assert_eq!(settings.nrows, Some(10));
        assert!(!settings.use_cache);
        assert_eq!(settings.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(settings.stopwords_path, Some(PathBuf::from("words.txt")));

        let opts = settings.load_options();
        assert_eq!(opts.path, PathBuf::from("/data/other.csv"));
        assert_eq!(opts.chunksize, None);
        assert_eq!(opts.cache_path, None);
        assert_eq!(
            settings.output_path(),
            Some(PathBuf::from("/srv/news/out/normalized.csv"))
        );
    }

    #[test]
    fn test_unknown_timezone() {
        let settings = Settings {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.timezone(),
            Err(NewsError::InvalidTimezone { .. })
        ));
    }
}
