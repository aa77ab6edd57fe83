//! Column transforms that turn the cached export into an analysis table
//!
//! Each step takes and returns a whole table. [`clean`] applies them in a
//! fixed order: names first (later steps look columns up by normalized
//! name), then distance, duration, the runs-only filter and temperature.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, StringArray};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::error::{Result, StravaError};

pub const KM_TO_MILES: f64 = 0.621371;

/// Shorter activities are dropped after conversion
pub const MIN_DISTANCE_MILES: f64 = 0.25;

/// Run the full cleaning pipeline
pub fn clean(batch: RecordBatch) -> Result<RecordBatch> {
    let batch = normalize_column_names(batch)?;
    let batch = convert_distance(batch)?;
    let batch = convert_duration(batch)?;
    let batch = runs_only(batch)?;
    convert_temperature(batch)
}

/// Lowercase column names and replace spaces with underscores
pub fn normalize_column_names(batch: RecordBatch) -> Result<RecordBatch> {
    let fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(f.name().to_lowercase().replace(' ', "_")))
        .collect();

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        batch.columns().to_vec(),
    )?)
}

/// Convert `distance` from km to miles (2 decimals) and drop rows under 0.25 mi
pub fn convert_distance(batch: RecordBatch) -> Result<RecordBatch> {
    let km = float_column(&batch, "distance")?;
    let miles: Float64Array = km
        .iter()
        .map(|v| v.map(|d| round2(d * KM_TO_MILES)))
        .collect();

    let keep: BooleanArray = miles
        .iter()
        .map(|v| Some(matches!(v, Some(m) if m >= MIN_DISTANCE_MILES)))
        .collect();

    let batch = with_column(&batch, "distance", Arc::new(miles))?;
    let filtered = filter_record_batch(&batch, &keep)?;
    debug!(
        dropped = batch.num_rows() - filtered.num_rows(),
        "Dropped short activities"
    );

    Ok(filtered)
}

/// Render `moving_time` seconds as `H:MM:SS` (fractions kept as `.ffffff`)
pub fn convert_duration(batch: RecordBatch) -> Result<RecordBatch> {
    let seconds = float_column(&batch, "moving_time")?;
    let formatted: StringArray = seconds
        .iter()
        .map(|v| v.map(format_duration))
        .collect();

    with_column(&batch, "moving_time", Arc::new(formatted))
}

/// Keep rows whose `activity_type` is exactly "Run", then drop that column
pub fn runs_only(batch: RecordBatch) -> Result<RecordBatch> {
    let index = column_index(&batch, "activity_type")?;
    let types = cast(batch.column(index), &DataType::Utf8)?;

    let keep: BooleanArray = types
        .as_string::<i32>()
        .iter()
        .map(|v| Some(v == Some("Run")))
        .collect();

    let filtered = filter_record_batch(&batch, &keep)?;
    debug!(
        dropped = batch.num_rows() - filtered.num_rows(),
        "Dropped non-run activities"
    );

    let remaining: Vec<usize> = (0..filtered.num_columns()).filter(|i| *i != index).collect();
    Ok(filtered.project(&remaining)?)
}

/// Convert `average_temperature` from Celsius to Fahrenheit
pub fn convert_temperature(batch: RecordBatch) -> Result<RecordBatch> {
    let celsius = float_column(&batch, "average_temperature")?;
    let fahrenheit: Float64Array = celsius
        .iter()
        .map(|v| v.map(|c| c * 9.0 / 5.0 + 32.0))
        .collect();

    with_column(&batch, "average_temperature", Arc::new(fahrenheit))
}

/// Format seconds like a timedelta: `1:01:01`, `1 day, 0:00:00`, `0:30:00.500000`
pub fn format_duration(seconds: f64) -> String {
    let micros = (seconds * 1_000_000.0).round() as i64;
    let total_seconds = micros.div_euclid(1_000_000);
    let fraction = micros.rem_euclid(1_000_000);

    let days = total_seconds.div_euclid(86_400);
    let rest = total_seconds.rem_euclid(86_400);
    let mut clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    if fraction != 0 {
        clock.push_str(&format!(".{:06}", fraction));
    }

    match days {
        0 => clock,
        1 | -1 => format!("{} day, {}", days, clock),
        _ => format!("{} days, {}", days, clock),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    batch
        .schema()
        .index_of(name)
        .map_err(|_| StravaError::data(format!("Column '{}' not found", name)))
}

/// Column cast to Float64; unparsable values become null
fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let index = column_index(batch, name)?;
    let values = cast(batch.column(index), &DataType::Float64)?;
    Ok(values.as_primitive::<Float64Type>().clone())
}

/// Swap one column for a new array, updating its type
fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let index = column_index(batch, name)?;
    let schema = batch.schema();

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields[index] = Field::new(name, array.data_type().clone(), true);

    let mut columns = batch.columns().to_vec();
    columns[index] = array;

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
