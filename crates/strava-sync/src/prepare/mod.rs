//! Offline preparation of a Strava bulk-export `activities.csv`
//!
//! [`OfflineCache`] trims the export to the columns used for analysis and
//! caches that subset; [`clean`] turns it into a runs-only table in imperial
//! units.

pub mod cache;
pub mod clean;

pub use cache::{read_csv, OfflineCache, DEFAULT_CACHE_PATH, DEFAULT_RAW_PATH, RAW_COLUMNS};
pub use clean::{
    clean, convert_distance, convert_duration, convert_temperature, format_duration,
    normalize_column_names, runs_only,
};

use std::io::Write;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;

use crate::error::Result;

/// Write a table as CSV with a header row
pub fn write_csv<W: Write>(batch: &RecordBatch, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().with_header(true).build(writer);
    writer.write(batch)?;
    Ok(())
}
