//! CSV output of the normalized table.
//!
//! Columns are the source columns in file order followed by the derived
//! columns. Absent cells are written empty, `date_utc` as RFC 3339 with a `Z`
//! suffix (fractional seconds kept when present) and `tokens` space-joined.

use crate::error::NewsError;
use crate::models::NewsFrame;
use crate::utils::ensure_parent_dir;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Render `frame` as CSV bytes.
pub fn frame_to_csv(frame: &NewsFrame) -> Result<Vec<u8>, NewsError> {
    let columns = frame.column_names();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in &frame.records {
        writer.write_record(
            columns
                .iter()
                .map(|col| record.value(col).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| NewsError::Csv(csv::Error::from(e.into_error())))
}

/// Write the normalized table to `path`, creating parent directories.
///
/// # Output Path
///
/// The file is written exactly at `path`; an existing file is replaced.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_frame(frame: &NewsFrame, path: &Path) -> Result<(), NewsError> {
    let bytes = frame_to_csv(frame)?;
    ensure_parent_dir(path).await?;
    fs::write(path, &bytes)
        .await
        .map_err(|e| NewsError::io(path, e))?;
    info!(rows = frame.len(), bytes = bytes.len(), "Wrote normalized CSV");
    Ok(())
}
