//! Record repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::records_model::Record;
use crate::errors::Result;

/// Trait defining the contract for Record repository operations.
#[async_trait]
pub trait RecordRepositoryTrait: Send + Sync {
    /// Inserts the given records, silently skipping ids that are already
    /// stored. Re-fetching an overlapping batch therefore never produces
    /// duplicates.
    ///
    /// Returns the number of records actually inserted.
    async fn upsert_records(&self, records: &[Record]) -> Result<usize>;

    /// Deletes every record created strictly before `cutoff`, across all
    /// sources. Returns the number of records deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Lists up to `limit` records for a source, most recent first.
    fn records_since(&self, source_id: &str, limit: i64) -> Result<Vec<Record>>;
}

/// Trait defining the contract for Record service operations.
#[async_trait]
pub trait RecordServiceTrait: Send + Sync {
    /// Lists up to `limit` records for a source, most recent first.
    fn get_recent_records(&self, source_id: &str, limit: i64) -> Result<Vec<Record>>;

    /// Deletes every record created strictly before `cutoff`. Returns the
    /// number of records deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
