//! Local cache of the raw export's analysis columns

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::info;

use crate::error::{Result, StravaError};

/// Columns kept from the raw export
pub const RAW_COLUMNS: [&str; 9] = [
    "Activity ID",
    "Activity Date",
    "Activity Name",
    "Activity Type",
    "Distance",
    "Moving Time",
    "Average Heart Rate",
    "Calories",
    "Average Temperature",
];

pub const DEFAULT_CACHE_PATH: &str = "strava.csv";
pub const DEFAULT_RAW_PATH: &str = "data/activities.csv";

/// Cache file in front of the raw export
pub struct OfflineCache {
    cache_path: PathBuf,
    raw_path: PathBuf,
}

impl OfflineCache {
    pub fn new(cache_path: impl Into<PathBuf>, raw_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            raw_path: raw_path.into(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Return the cached table, or build the cache from the raw export.
    ///
    /// The cache is returned as-is without validation.
    pub fn load_cached_or_raw(&self) -> Result<RecordBatch> {
        if self.cache_path.is_file() {
            info!(path = %self.cache_path.display(), "Reading cached export");
            return read_csv(&self.cache_path, None);
        }

        info!(path = %self.raw_path.display(), "Cache missing, reading raw export");
        let batch = read_csv(&self.raw_path, Some(&RAW_COLUMNS[..]))?;

        if let Some(parent) = self.cache_path.parent() {
            crate::config::ensure_dir(parent)?;
        }
        super::write_csv(&batch, File::create(&self.cache_path)?)?;
        info!(path = %self.cache_path.display(), rows = batch.num_rows(), "Wrote cache");

        Ok(batch)
    }
}

/// Read a CSV file with a header row into a single table.
///
/// With `columns`, only those columns are read (kept in file order); a
/// column missing from the header is a data error.
pub fn read_csv(path: &Path, columns: Option<&[&str]>) -> Result<RecordBatch> {
    let mut file = File::open(path)?;

    // Types come from every row; a late `5.5` in an integer-looking column
    // would otherwise fail the parse
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(&mut file, None)?;
    file.rewind()?;

    // All-empty columns infer as Null, which the CSV writer cannot emit
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Null => Field::new(f.name(), DataType::Utf8, true),
            _ => f.as_ref().clone(),
        })
        .collect();
    let schema = Schema::new(fields);

    let mut builder = ReaderBuilder::new(Arc::new(schema.clone())).with_header(true);
    let output_schema = match columns {
        Some(names) => {
            let mut indices = names
                .iter()
                .map(|name| {
                    schema.index_of(name).map_err(|_| {
                        StravaError::data(format!(
                            "Column '{}' not found in {}",
                            name,
                            path.display()
                        ))
                    })
                })
                .collect::<Result<Vec<usize>>>()?;
            indices.sort_unstable();

            let projected = schema.project(&indices)?;
            builder = builder.with_projection(indices);
            projected
        }
        None => schema,
    };

    let batches = builder
        .build(file)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(concat_batches(&Arc::new(output_schema), &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{Float64Type, Int64Type};
    use std::fs;
    use tempfile::TempDir;

    const RAW_EXPORT: &str = "\
Activity ID,Activity Date,Activity Name,Activity Type,Elapsed Time,Distance,Moving Time,Average Heart Rate,Calories,Average Temperature,Filename
101,\"Jan 5, 2023, 7:01:02 AM\",Morning Run,Run,1900,5.2,1800,151.0,400,12.0,activities/101.fit
102,\"Jan 6, 2023, 6:00:00 PM\",Evening Ride,Ride,3700,20.5,3600,,700,,activities/102.fit
";

    fn write_raw(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("activities.csv");
        fs::write(&path, RAW_EXPORT).unwrap();
        path
    }

    #[test]
    fn test_read_csv_projects_columns_in_file_order() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(&dir);

        let batch = read_csv(&raw, Some(&["Distance", "Activity ID"][..])).unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();

        assert_eq!(names, vec!["Activity ID", "Distance"]);
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(0).as_primitive::<Int64Type>().value(1), 102);
    }

    #[test]
    fn test_read_csv_missing_column_is_data_error() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(&dir);

        let err = read_csv(&raw, Some(&["Activity ID", "Max Grade"][..])).unwrap_err();
        assert!(matches!(err, StravaError::Data(_)));
        assert!(err.to_string().contains("Max Grade"));
    }

    #[test]
    fn test_cache_miss_builds_cache() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(&dir);
        let cache = OfflineCache::new(dir.path().join("strava.csv"), &raw);

        let batch = cache.load_cached_or_raw().unwrap();
        assert_eq!(batch.num_columns(), RAW_COLUMNS.len());
        assert_eq!(batch.num_rows(), 2);
        assert!(cache.cache_path().exists());

        let header = fs::read_to_string(cache.cache_path()).unwrap();
        assert!(header.starts_with("Activity ID,Activity Date,Activity Name,Activity Type,Distance"));
        assert!(!header.contains("Filename"));
    }

    #[test]
    fn test_cache_hit_skips_raw_export() {
        let dir = TempDir::new().unwrap();
        let raw = write_raw(&dir);
        let cache = OfflineCache::new(dir.path().join("strava.csv"), &raw);

        cache.load_cached_or_raw().unwrap();
        fs::remove_file(&raw).unwrap();

        let batch = cache.load_cached_or_raw().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), RAW_COLUMNS.len());
    }

    #[test]
    fn test_cache_is_returned_verbatim() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join("strava.csv");
        fs::write(&cache_path, "a,b\n1,x\n").unwrap();

        let cache = OfflineCache::new(&cache_path, dir.path().join("missing.csv"));
        let batch = cache.load_cached_or_raw().unwrap();
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.num_rows(), 1);
    }

    #[test]
    fn test_long_export_with_late_float_values() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("activities.csv");

        let mut export = String::from(
            "Activity ID,Activity Date,Activity Name,Activity Type,Distance,Moving Time,Average Heart Rate,Calories,Average Temperature\n",
        );
        for id in 1..=1001 {
            export.push_str(&format!("{},2023-01-01,Run {},Run,5,1800,150,400,12\n", id, id));
        }
        export.push_str("1002,2023-01-02,Long Run,Run,5.5,1800.5,151.5,420.5,12.5\n");
        fs::write(&raw, export).unwrap();

        let cache = OfflineCache::new(dir.path().join("strava.csv"), &raw);
        let batch = cache.load_cached_or_raw().unwrap();

        assert_eq!(batch.num_rows(), 1002);
        let distance = batch.column_by_name("Distance").unwrap();
        assert_eq!(distance.data_type(), &DataType::Float64);
        assert_eq!(distance.as_primitive::<Float64Type>().value(1001), 5.5);

        // The cache written from it reads back the same way
        let cached = cache.load_cached_or_raw().unwrap();
        assert_eq!(cached.num_rows(), 1002);
    }

    #[test]
    fn test_nothing_readable_is_io_error() {
        let dir = TempDir::new().unwrap();
        let cache = OfflineCache::new(dir.path().join("strava.csv"), dir.path().join("missing.csv"));

        assert!(matches!(cache.load_cached_or_raw(), Err(StravaError::Io(_))));
    }
}
