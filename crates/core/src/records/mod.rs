//! Records module - domain models, services, and traits.

mod records_model;
mod records_service;
mod records_traits;

// Re-export the public interface
pub use records_model::{Author, Engagement, MediaAttachment, MediaKind, Record};
pub use records_service::RecordService;
pub use records_traits::{RecordRepositoryTrait, RecordServiceTrait};
