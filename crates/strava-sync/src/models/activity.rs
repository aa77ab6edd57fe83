//! Activity data models for the Strava API
//!
//! [`StravaActivity`] is one element of the `/activities` listing, restricted
//! to the fields the sync keeps. [`ActivityRow`] is its persisted form, with
//! the two lat/long pairs split into scalar columns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StravaError};

/// Storage class of a persisted column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Boolean,
}

/// Fields copied from each API record, in API order
pub const ACTIVITY_FIELDS: [&str; 47] = [
    "id",
    "name",
    "distance",
    "moving_time",
    "elapsed_time",
    "total_elevation_gain",
    "type",
    "sport_type",
    "workout_type",
    "start_date",
    "start_date_local",
    "timezone",
    "utc_offset",
    "location_city",
    "location_state",
    "location_country",
    "achievement_count",
    "kudos_count",
    "comment_count",
    "athlete_count",
    "photo_count",
    "trainer",
    "commute",
    "manual",
    "private",
    "visibility",
    "flagged",
    "gear_id",
    "start_latlng",
    "end_latlng",
    "average_speed",
    "max_speed",
    "average_cadence",
    "has_heartrate",
    "average_heartrate",
    "max_heartrate",
    "heartrate_opt_out",
    "display_hide_heartrate_option",
    "elev_high",
    "elev_low",
    "upload_id",
    "upload_id_str",
    "external_id",
    "pr_count",
    "total_photo_count",
    "has_kudoed",
    "suffer_score",
];

/// Columns of the persisted `activities` table; `id` is the primary key
pub const TABLE_COLUMNS: [(&str, ColumnKind); 49] = [
    ("id", ColumnKind::Integer),
    ("name", ColumnKind::Text),
    ("distance", ColumnKind::Real),
    ("moving_time", ColumnKind::Integer),
    ("elapsed_time", ColumnKind::Integer),
    ("total_elevation_gain", ColumnKind::Real),
    ("type", ColumnKind::Text),
    ("sport_type", ColumnKind::Text),
    ("workout_type", ColumnKind::Integer),
    ("start_date", ColumnKind::Text),
    ("start_date_local", ColumnKind::Text),
    ("timezone", ColumnKind::Text),
    ("utc_offset", ColumnKind::Real),
    ("location_city", ColumnKind::Text),
    ("location_state", ColumnKind::Text),
    ("location_country", ColumnKind::Text),
    ("achievement_count", ColumnKind::Integer),
    ("kudos_count", ColumnKind::Integer),
    ("comment_count", ColumnKind::Integer),
    ("athlete_count", ColumnKind::Integer),
    ("photo_count", ColumnKind::Integer),
    ("trainer", ColumnKind::Boolean),
    ("commute", ColumnKind::Boolean),
    ("manual", ColumnKind::Boolean),
    ("private", ColumnKind::Boolean),
    ("visibility", ColumnKind::Text),
    ("flagged", ColumnKind::Boolean),
    ("gear_id", ColumnKind::Text),
    ("average_speed", ColumnKind::Real),
    ("max_speed", ColumnKind::Real),
    ("average_cadence", ColumnKind::Real),
    ("has_heartrate", ColumnKind::Boolean),
    ("average_heartrate", ColumnKind::Real),
    ("max_heartrate", ColumnKind::Real),
    ("heartrate_opt_out", ColumnKind::Boolean),
    ("display_hide_heartrate_option", ColumnKind::Boolean),
    ("elev_high", ColumnKind::Real),
    ("elev_low", ColumnKind::Real),
    ("upload_id", ColumnKind::Integer),
    ("upload_id_str", ColumnKind::Text),
    ("external_id", ColumnKind::Text),
    ("pr_count", ColumnKind::Integer),
    ("total_photo_count", ColumnKind::Integer),
    ("has_kudoed", ColumnKind::Boolean),
    ("suffer_score", ColumnKind::Real),
    ("start_lat", ColumnKind::Real),
    ("start_long", ColumnKind::Real),
    ("end_lat", ColumnKind::Real),
    ("end_long", ColumnKind::Real),
];

/// Scalar fields shared by the API record and the persisted row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Unique activity identifier
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    /// Distance in meters
    #[serde(default)]
    pub distance: Option<f64>,

    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: Option<i64>,

    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: Option<i64>,

    #[serde(default)]
    pub total_elevation_gain: Option<f64>,

    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,

    #[serde(default)]
    pub sport_type: Option<String>,

    #[serde(default)]
    pub workout_type: Option<i64>,

    /// Start time in UTC (ISO 8601)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Start time in the athlete's local timezone (ISO 8601)
    #[serde(default)]
    pub start_date_local: Option<String>,

    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub utc_offset: Option<f64>,

    #[serde(default)]
    pub location_city: Option<String>,

    #[serde(default)]
    pub location_state: Option<String>,

    #[serde(default)]
    pub location_country: Option<String>,

    #[serde(default)]
    pub achievement_count: Option<i64>,

    #[serde(default)]
    pub kudos_count: Option<i64>,

    #[serde(default)]
    pub comment_count: Option<i64>,

    #[serde(default)]
    pub athlete_count: Option<i64>,

    #[serde(default)]
    pub photo_count: Option<i64>,

    #[serde(default)]
    pub trainer: Option<bool>,

    #[serde(default)]
    pub commute: Option<bool>,

    #[serde(default)]
    pub manual: Option<bool>,

    #[serde(default)]
    pub private: Option<bool>,

    #[serde(default)]
    pub visibility: Option<String>,

    #[serde(default)]
    pub flagged: Option<bool>,

    #[serde(default)]
    pub gear_id: Option<String>,

    /// Average speed in m/s
    #[serde(default)]
    pub average_speed: Option<f64>,

    /// Maximum speed in m/s
    #[serde(default)]
    pub max_speed: Option<f64>,

    #[serde(default)]
    pub average_cadence: Option<f64>,

    #[serde(default)]
    pub has_heartrate: Option<bool>,

    #[serde(default)]
    pub average_heartrate: Option<f64>,

    #[serde(default)]
    pub max_heartrate: Option<f64>,

    #[serde(default)]
    pub heartrate_opt_out: Option<bool>,

    #[serde(default)]
    pub display_hide_heartrate_option: Option<bool>,

    #[serde(default)]
    pub elev_high: Option<f64>,

    #[serde(default)]
    pub elev_low: Option<f64>,

    #[serde(default)]
    pub upload_id: Option<i64>,

    #[serde(default)]
    pub upload_id_str: Option<String>,

    #[serde(default)]
    pub external_id: Option<String>,

    #[serde(default)]
    pub pr_count: Option<i64>,

    #[serde(default)]
    pub total_photo_count: Option<i64>,

    #[serde(default)]
    pub has_kudoed: Option<bool>,

    #[serde(default)]
    pub suffer_score: Option<f64>,
}

/// Activity as returned by the `/activities` listing.
///
/// Fields outside [`ACTIVITY_FIELDS`] are dropped, missing ones become `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StravaActivity {
    #[serde(flatten)]
    pub summary: ActivitySummary,

    /// `[lat, long]` of the start point
    #[serde(default)]
    pub start_latlng: Option<Vec<f64>>,

    /// `[lat, long]` of the end point
    #[serde(default)]
    pub end_latlng: Option<Vec<f64>>,
}

impl StravaActivity {
    /// Decode one element of an activity page
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let id = value.get("id").cloned();
        serde_json::from_value(value).map_err(|e| {
            StravaError::data(format!(
                "Malformed activity record (id {}): {}",
                id.map(|v| v.to_string()).unwrap_or_else(|| "missing".to_string()),
                e
            ))
        })
    }

    pub fn id(&self) -> i64 {
        self.summary.id
    }
}

/// Persisted activity with the lat/long pairs split into scalars
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    #[serde(flatten)]
    pub summary: ActivitySummary,
    pub start_lat: Option<f64>,
    pub start_long: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_long: Option<f64>,
}

impl ActivityRow {
    /// Split both composite lat/long fields of an activity
    pub fn from_activity(activity: StravaActivity) -> Result<Self> {
        let (start_lat, start_long) = unpack_latlng("start_latlng", activity.start_latlng)?;
        let (end_lat, end_long) = unpack_latlng("end_latlng", activity.end_latlng)?;

        Ok(Self {
            summary: activity.summary,
            start_lat,
            start_long,
            end_lat,
            end_long,
        })
    }

    pub fn id(&self) -> i64 {
        self.summary.id
    }
}

/// Unpack a `[lat, long]` pair.
///
/// A missing value and an empty list (Strava's encoding for activities
/// without GPS) both give two nulls; any other arity is a shape error.
fn unpack_latlng(column: &str, value: Option<Vec<f64>>) -> Result<(Option<f64>, Option<f64>)> {
    match value.as_deref() {
        None | Some([]) => Ok((None, None)),
        Some([lat, long]) => Ok((Some(*lat), Some(*long))),
        Some(other) => Err(StravaError::shape(column, other.len())),
    }
}

/// Replace the composite geo columns of every activity with scalar columns
pub fn split_geo(activities: Vec<StravaActivity>) -> Result<Vec<ActivityRow>> {
    activities.into_iter().map(ActivityRow::from_activity).collect()
}

/// Ordered set of activity rows indexed by activity id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTable {
    rows: Vec<ActivityRow>,
}

impl ActivityTable {
    /// Empty table with the full column set
    pub fn new() -> Self {
        Self::default()
    }

    /// Split geo columns and index by id
    pub fn from_activities(activities: Vec<StravaActivity>) -> Result<Self> {
        Self::from_rows(split_geo(activities)?)
    }

    /// Build a table, rejecting duplicate ids
    pub fn from_rows(rows: Vec<ActivityRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.id()) {
                return Err(StravaError::data(format!(
                    "Duplicate activity id {} in table",
                    row.id()
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    /// Activity ids in row order
    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(ActivityRow::id).collect()
    }

    /// Look up a row by activity id
    pub fn get(&self, id: i64) -> Option<&ActivityRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn into_rows(self) -> Vec<ActivityRow> {
        self.rows
    }
}
