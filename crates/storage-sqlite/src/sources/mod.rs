//! SQLite storage implementation for sources.

mod model;
mod repository;

pub use model::SourceDb;
pub use repository::SourceRepository;
