//! Output generation for the normalized table.
//!
//! # Submodules
//!
//! - [`csv`]: Writes a [`NewsFrame`](crate::models::NewsFrame) as a flat CSV file
//!
//! The columnar snapshot used for fast reloads lives in [`crate::cache`]; it
//! is an internal format, not an output.
//!
//! # Output Structure
//!
//! ```text
//! out/
//! └── normalized.csv   # source columns + date_utc, publisher_*, headline_*, tokens
//! ```

pub mod csv;
