//! Data models for Strava activities

pub mod activity;

pub use activity::{
    split_geo, ActivityRow, ActivitySummary, ActivityTable, ColumnKind, StravaActivity,
    ACTIVITY_FIELDS, TABLE_COLUMNS,
};
