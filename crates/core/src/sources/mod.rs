//! Sources module - domain models, services, and traits.

mod sources_model;
mod sources_service;
mod sources_traits;

// Re-export the public interface
pub use sources_model::{NewSource, Source, SourceKind};
pub use sources_service::SourceService;
pub use sources_traits::{SourceRepositoryTrait, SourceServiceTrait};
