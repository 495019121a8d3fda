use log::debug;
use std::sync::Arc;

use super::sources_model::{NewSource, Source};
use super::sources_traits::{SourceRepositoryTrait, SourceServiceTrait};
use crate::errors::Result;

/// Service for managing followed sources.
pub struct SourceService {
    repository: Arc<dyn SourceRepositoryTrait>,
}

impl SourceService {
    /// Creates a new SourceService instance
    pub fn new(repository: Arc<dyn SourceRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl SourceServiceTrait for SourceService {
    /// Registers a new source after validating the input
    async fn add_source(&self, new_source: NewSource) -> Result<Source> {
        new_source.validate()?;
        debug!(
            "Registering source @{} in slot {}",
            new_source.handle, new_source.slot
        );
        (*self.repository).add_source(new_source).await
    }

    /// Removes a source and every record fetched for it
    async fn remove_source(&self, source_id: &str) -> Result<usize> {
        (*self.repository).remove_source(source_id).await
    }

    /// Retrieves a source by its id
    fn get_source(&self, source_id: &str) -> Result<Source> {
        (*self.repository).get_by_id(source_id)
    }

    /// Lists all sources ordered by display slot
    fn list_sources(&self) -> Result<Vec<Source>> {
        (*self.repository).list_sources()
    }
}
