//! SQLite storage implementation for records.

mod model;
mod repository;

pub use model::RecordDb;
pub use repository::RecordRepository;
