//! Pulseboard Core - Domain entities, services, and traits.
//!
//! This crate contains the core sync logic for Pulseboard.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate, plus upstream provider contracts
//! implemented by the `clients` crate.

pub mod errors;
pub mod events;
pub mod prices;
pub mod providers;
pub mod records;
pub mod scheduler;
pub mod sources;
pub mod tickers;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
