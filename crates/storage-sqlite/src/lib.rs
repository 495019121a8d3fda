//! SQLite storage implementation for Pulseboard.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `pulseboard-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations and first-run seeding
//! - Repository implementations for sources, records, and tickers
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//! The other crates (`core`, `clients`) are database-agnostic and work with traits.
//!
//! ```text
//! core (domain)        clients (upstream APIs)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! All mutations funnel through a single writer actor
//! ([`db::write_actor`]); reads go straight to the connection pool.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod records;
pub mod sources;
pub mod tickers;

// Re-export database utilities
pub use db::seed::seed_defaults;
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export repositories
pub use records::RecordRepository;
pub use sources::SourceRepository;
pub use tickers::TickerRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from pulseboard-core for convenience
pub use pulseboard_core::errors::{DatabaseError, Error, Result};
