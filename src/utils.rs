//! Utility functions for path handling, log formatting and output directories.
//!
//! This module provides helper functions used throughout the application:
//! - Path resolution against a configurable data root
//! - String truncation for log fields
//! - Creating parent directories before writing output files

use crate::error::NewsError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

/// Resolve a possibly relative path against `root`.
///
/// Absolute paths are returned unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(resolve_path(Path::new("/srv"), Path::new("data/a.csv")), PathBuf::from("/srv/data/a.csv"));
/// assert_eq!(resolve_path(Path::new("/srv"), Path::new("/tmp/a.csv")), PathBuf::from("/tmp/a.csv"));
/// ```
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a byte count
/// indicator appended. Cuts always land on a character boundary.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// The original string if it has at most `max` characters, otherwise a
/// truncated version with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns [`NewsError::Io`] if the directory cannot be created.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), NewsError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent)
        .await
        .map_err(|e| NewsError::io(parent, e))?;
    debug!(dir = %parent.display(), "Output directory ready");
    Ok(())
}
