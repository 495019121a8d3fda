//! SQLite-backed ticker configuration.
//!
//! Tickers are read-only at runtime; rows come from seeding or from
//! operators editing the database directly, so this repository only
//! needs the pool.

use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use pulseboard_core::errors::Result;
use pulseboard_core::tickers::{TickerConfig, TickerRepositoryTrait};

use super::model::TickerDb;

pub struct TickerRepository {
    pool: Arc<DbPool>,
}

impl TickerRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl TickerRepositoryTrait for TickerRepository {
    fn list_tickers(&self) -> Result<Vec<TickerConfig>> {
        use crate::schema::tickers::dsl;

        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::tickers
            .select(TickerDb::as_select())
            .order(dsl::display_order.asc())
            .load::<TickerDb>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(TickerConfig::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seed_defaults;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_tickers_after_seeding() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        seed_defaults(&writer).await.expect("Failed to seed");

        let repo = TickerRepository::new(Arc::clone(&pool));
        let tickers = repo.list_tickers().expect("Failed to list tickers");

        let symbols: Vec<&str> = tickers.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "SOL"]);
        assert_eq!(tickers[0].id, "bitcoin");
        assert_eq!(tickers[0].name, "Bitcoin");
        assert_eq!(tickers[0].display_order, 0);
    }

    #[tokio::test]
    async fn test_list_tickers_on_empty_database() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let repo = TickerRepository::new(Arc::clone(&pool));
        assert!(repo.list_tickers().expect("Failed to list").is_empty());
    }
}
