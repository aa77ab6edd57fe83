//! Activity sync from the Strava API into the persistence sink
//!
//! Two entry points:
//! - [`ActivitySync::fetch_all_activities`] pages through the whole history
//!   (200 per page) until an empty page and writes the table in one go.
//! - [`ActivitySync::fetch_new_activities`] looks at the head of the newest
//!   page only and appends records above the stored high-water mark.
//!
//! Every request is awaited in turn; nothing runs concurrently. The access
//! token is checked once by the caller: a token that expires part way through
//! a long pagination run is not refreshed (a warning is logged and the API
//! will reject the following pages).

use tracing::{debug, info, warn};

use crate::client::{Credentials, StravaClient, PAGE_SIZE};
use crate::models::{ActivityTable, StravaActivity};
use crate::storage::{ActivitySink, WriteMode};
use crate::{Result, StravaError};

/// Number of newest activities examined by an incremental sync
pub const DEFAULT_DEPTH: usize = 10;

/// Sync engine tying the API client to a sink
pub struct ActivitySync<S: ActivitySink> {
    client: StravaClient,
    sink: S,
}

impl<S: ActivitySink> ActivitySync<S> {
    pub fn new(client: StravaClient, sink: S) -> Self {
        Self { client, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Fetch every activity and write the resulting table with `mode`.
    ///
    /// Pages are requested from 1 upwards and the loop stops at the first
    /// empty page. Nothing is written unless every page succeeded.
    pub async fn fetch_all_activities(
        &mut self,
        token: &Credentials,
        mode: WriteMode,
    ) -> Result<ActivityTable> {
        let mut activities = Vec::new();
        let mut page: u32 = 1;
        let mut warned_expiry = false;

        loop {
            if token.is_expired() && !warned_expiry {
                warn!(page, "Access token expired during pagination");
                warned_expiry = true;
            }

            let records = self.client.list_activities(token, page, PAGE_SIZE).await?;
            if records.is_empty() {
                debug!(page, "Empty page, pagination complete");
                break;
            }

            info!(page, count = records.len(), "Fetched activity page");
            for record in records {
                activities.push(StravaActivity::from_json(record)?);
            }

            page += 1;
        }

        let table = ActivityTable::from_activities(activities)?;
        self.sink.write(&table, mode)?;

        Ok(table)
    }

    /// Fetch activities newer than the stored high-water mark.
    ///
    /// Only the first `depth` records of the newest page are examined, in the
    /// order received; matches are appended to the sink. Edits or deletions of
    /// already stored activities are not detected.
    pub async fn fetch_new_activities(
        &mut self,
        token: &Credentials,
        depth: usize,
    ) -> Result<ActivityTable> {
        let latest = self.sink.latest_id()?;

        let records = self.client.latest_activities(token).await?;
        if records.len() < depth {
            debug!(received = records.len(), depth, "Page shorter than depth");
        }

        // Only records above the high-water mark are decoded
        let mut fresh = Vec::new();
        for record in records.into_iter().take(depth) {
            let id = record
                .get("id")
                .and_then(serde_json::Value::as_i64)
                .ok_or_else(|| StravaError::data("Activity record has no integer id"))?;
            if id > latest {
                fresh.push(StravaActivity::from_json(record)?);
            }
        }

        info!(latest, new = fresh.len(), "Checked for new activities");

        let table = ActivityTable::from_activities(fresh)?;
        self.sink.write(&table, WriteMode::Append)?;

        Ok(table)
    }
}
