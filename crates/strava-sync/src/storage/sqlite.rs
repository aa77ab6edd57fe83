//! SQLite-backed activity table

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Result, StravaError};
use crate::models::{ActivityRow, ActivityTable, ColumnKind, TABLE_COLUMNS};

use super::{ActivitySink, WriteMode, ACTIVITIES_TABLE};

/// SQLite database holding the `activities` table
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open or create the database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            crate::config::ensure_dir(parent)?;
        }

        let conn = Connection::open(path.as_ref())
            .map_err(|e| StravaError::Database(format!("Failed to open database: {}", e)))?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StravaError::Database(format!("Failed to open in-memory database: {}", e))
        })?;

        Ok(Self { conn })
    }

    /// Check whether the activities table has been created
    pub fn table_exists(&self) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [ACTIVITIES_TABLE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StravaError::Database(format!("Failed to inspect schema: {}", e)))?;

        Ok(found.is_some())
    }

    /// Number of stored activities (0 when the table is missing)
    pub fn count(&self) -> Result<u64> {
        if !self.table_exists()? {
            return Ok(0);
        }

        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", ACTIVITIES_TABLE), [], |row| {
                row.get(0)
            })
            .map_err(|e| StravaError::Database(format!("Failed to count activities: {}", e)))?;

        Ok(count as u64)
    }

    /// Stored activity ids in ascending order
    pub fn ids(&self) -> Result<Vec<i64>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {} ORDER BY id", ACTIVITIES_TABLE))
            .map_err(StravaError::database)?;

        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(StravaError::database)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(StravaError::database)?;

        Ok(ids)
    }

    /// Raw access for ad-hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ActivitySink for SqliteSink {
    fn write(&mut self, table: &ActivityTable, mode: WriteMode) -> Result<usize> {
        if mode == WriteMode::Fail && self.table_exists()? {
            return Err(StravaError::Database(format!(
                "Table '{}' already exists",
                ACTIVITIES_TABLE
            )));
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| StravaError::Database(format!("Failed to start transaction: {}", e)))?;

        if mode == WriteMode::Replace {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", ACTIVITIES_TABLE))
                .map_err(|e| StravaError::Database(format!("Failed to drop table: {}", e)))?;
        }

        tx.execute_batch(&create_table_sql())
            .map_err(|e| StravaError::Database(format!("Failed to create table: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(&insert_sql())
                .map_err(|e| StravaError::Database(format!("Failed to prepare insert: {}", e)))?;

            for row in table.rows() {
                stmt.execute(params_from_iter(row_values(row)?))
                    .map_err(|e| {
                        StravaError::Database(format!(
                            "Failed to insert activity {}: {}",
                            row.id(),
                            e
                        ))
                    })?;
            }
        }

        tx.commit()
            .map_err(|e| StravaError::Database(format!("Failed to commit: {}", e)))?;

        info!(rows = table.len(), %mode, "Wrote activities");
        Ok(table.len())
    }

    fn latest_id(&self) -> Result<i64> {
        if !self.table_exists()? {
            return Err(StravaError::data(
                "No activities table yet; run a full sync first",
            ));
        }

        let latest: Option<i64> = self
            .conn
            .query_row(&format!("SELECT MAX(id) FROM {}", ACTIVITIES_TABLE), [], |row| {
                row.get(0)
            })
            .map_err(|e| StravaError::Database(format!("Failed to read latest id: {}", e)))?;

        debug!(?latest, "Read high-water mark");
        latest.ok_or_else(|| {
            StravaError::data("Activities table is empty; run a full sync first")
        })
    }
}

fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer => "INTEGER",
        ColumnKind::Real => "REAL",
        ColumnKind::Text => "TEXT",
        ColumnKind::Boolean => "BOOLEAN",
    }
}

fn create_table_sql() -> String {
    let columns = TABLE_COLUMNS
        .iter()
        .map(|(name, kind)| {
            if *name == "id" {
                "\"id\" INTEGER PRIMARY KEY".to_string()
            } else {
                format!("\"{}\" {}", name, sql_type(*kind))
            }
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        ACTIVITIES_TABLE, columns
    )
}

fn insert_sql() -> String {
    let names = TABLE_COLUMNS
        .iter()
        .map(|(name, _)| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=TABLE_COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        ACTIVITIES_TABLE, names, placeholders
    )
}

/// Column values of a row, in [`TABLE_COLUMNS`] order
fn row_values(row: &ActivityRow) -> Result<Vec<Value>> {
    let json = serde_json::to_value(row)?;
    Ok(TABLE_COLUMNS
        .iter()
        .map(|(name, kind)| sql_value(json.get(*name), *kind))
        .collect())
}

fn sql_value(value: Option<&serde_json::Value>, kind: ColumnKind) -> Value {
    use serde_json::Value as Json;

    match (value, kind) {
        (None | Some(Json::Null), _) => Value::Null,
        (Some(Json::Bool(b)), _) => Value::Integer(i64::from(*b)),
        (Some(Json::Number(n)), ColumnKind::Real) => {
            n.as_f64().map(Value::Real).unwrap_or(Value::Null)
        }
        (Some(Json::Number(n)), _) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Real))
            .unwrap_or(Value::Null),
        (Some(Json::String(s)), _) => Value::Text(s.clone()),
        (Some(other), _) => Value::Text(other.to_string()),
    }
}
