//! Offline export cleaning command

use std::fs::File;
use std::path::Path;

use crate::error::Result;
use crate::prepare::{clean, write_csv, OfflineCache};

/// Load (or build) the export cache, clean it and write the result as CSV
pub fn run(cache: &Path, raw: &Path, output: Option<&Path>) -> Result<()> {
    let raw_table = OfflineCache::new(cache, raw).load_cached_or_raw()?;
    let cleaned = clean(raw_table)?;

    match output {
        Some(path) => {
            write_csv(&cleaned, File::create(path)?)?;
            println!("Wrote {} runs to {}", cleaned.num_rows(), path.display());
        }
        None => write_csv(&cleaned, std::io::stdout().lock())?,
    }

    Ok(())
}
