//! Source repository and service traits.
//!
//! These traits define the contract for source operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::sources_model::{NewSource, Source};
use crate::errors::Result;

/// Trait defining the contract for Source repository operations.
///
/// Implementations of this trait handle the persistence of source data.
/// The trait is database-agnostic - storage-specific details are handled
/// by concrete implementations.
#[async_trait]
pub trait SourceRepositoryTrait: Send + Sync {
    /// Registers a new source.
    ///
    /// The implementation derives the source id from the upstream account id
    /// when one is supplied, and generates one otherwise. Collisions on id or
    /// display slot are reported as [`crate::errors::ConflictError`] variants,
    /// and the store is left unchanged.
    async fn add_source(&self, new_source: NewSource) -> Result<Source>;

    /// Removes a source together with every record fetched for it.
    ///
    /// Both deletions happen in one transaction; a failure leaves the store
    /// untouched. Returns the number of records deleted alongside the source.
    async fn remove_source(&self, source_id: &str) -> Result<usize>;

    /// Moves a source's incremental-fetch cursor to the given record id.
    async fn advance_cursor(&self, source_id: &str, newest_record_id: &str) -> Result<()>;

    /// Retrieves a source by its id.
    fn get_by_id(&self, source_id: &str) -> Result<Source>;

    /// Lists all sources ordered by display slot.
    fn list_sources(&self) -> Result<Vec<Source>>;
}

/// Trait defining the contract for Source service operations.
#[async_trait]
pub trait SourceServiceTrait: Send + Sync {
    /// Registers a new source after validating the input.
    async fn add_source(&self, new_source: NewSource) -> Result<Source>;

    /// Removes a source and its records.
    async fn remove_source(&self, source_id: &str) -> Result<usize>;

    /// Retrieves a source by id.
    fn get_source(&self, source_id: &str) -> Result<Source>;

    /// Lists all sources ordered by display slot.
    fn list_sources(&self) -> Result<Vec<Source>>;
}
