use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::records_model::Record;
use super::records_traits::{RecordRepositoryTrait, RecordServiceTrait};
use crate::errors::Result;

/// Service for reading stored records.
pub struct RecordService {
    repository: Arc<dyn RecordRepositoryTrait>,
}

impl RecordService {
    /// Creates a new RecordService instance
    pub fn new(repository: Arc<dyn RecordRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl RecordServiceTrait for RecordService {
    /// Lists up to `limit` records for a source, most recent first
    fn get_recent_records(&self, source_id: &str, limit: i64) -> Result<Vec<Record>> {
        (*self.repository).records_since(source_id, limit)
    }

    /// Deletes every record created before `cutoff`
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        (*self.repository).delete_older_than(cutoff).await
    }
}
