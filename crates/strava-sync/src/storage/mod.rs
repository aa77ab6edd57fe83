//! Persistence sink for synced activities
//!
//! Activities land in a single relational table, `activities`, keyed by
//! activity id. The fetchers only depend on [`ActivitySink`]; [`SqliteSink`]
//! is the production implementation.
//!
//! ## Write modes
//!
//! - `replace`: drop and recreate the table, then insert
//! - `append`: create the table if missing, then insert
//! - `fail`: refuse to write when the table already exists

mod sqlite;

pub use sqlite::SqliteSink;

use std::fmt;

use crate::error::Result;
use crate::models::ActivityTable;

/// Name of the persisted activity table
pub const ACTIVITIES_TABLE: &str = "activities";

/// Disposition of an incoming table when the target table already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WriteMode {
    #[default]
    Replace,
    Append,
    Fail,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
            WriteMode::Fail => write!(f, "fail"),
        }
    }
}

/// Relational destination of activity tables
pub trait ActivitySink {
    /// Write all rows of `table`; returns the number of rows written
    fn write(&mut self, table: &ActivityTable, mode: WriteMode) -> Result<usize>;

    /// Highest activity id already stored (the high-water mark).
    ///
    /// Fails with a data error when nothing has been stored yet.
    fn latest_id(&self) -> Result<i64>;
}
