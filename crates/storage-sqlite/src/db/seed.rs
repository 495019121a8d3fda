//! First-run seeding of default sources and tickers.

use diesel::prelude::*;
use log::info;

use crate::db::WriteHandle;
use crate::errors::StorageError;
use crate::sources::SourceDb;
use crate::tickers::TickerDb;
use pulseboard_core::errors::Result;
use pulseboard_core::sources::SourceKind;

/// Seed the default crypto-news sources and ticker strip.
///
/// Only runs against empty tables, so user edits (removed defaults,
/// added sources) survive restarts. Both checks happen inside one write
/// transaction.
pub async fn seed_defaults(writer: &WriteHandle) -> Result<()> {
    writer
        .exec(|conn| {
            use crate::schema::{sources, tickers};

            let source_count: i64 = sources::table
                .count()
                .get_result(conn)
                .map_err(StorageError::from)?;
            if source_count == 0 {
                let defaults = default_sources();
                diesel::insert_into(sources::table)
                    .values(&defaults)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                info!("Seeded {} default sources", defaults.len());
            }

            let ticker_count: i64 = tickers::table
                .count()
                .get_result(conn)
                .map_err(StorageError::from)?;
            if ticker_count == 0 {
                let defaults = default_tickers();
                diesel::insert_into(tickers::table)
                    .values(&defaults)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                info!("Seeded {} default tickers", defaults.len());
            }

            Ok(())
        })
        .await
}

fn default_sources() -> Vec<SourceDb> {
    let defaults: [(&str, &str, &str, i32, &str); 6] = [
        (
            "Coinbase",
            "coinbase",
            "3437070832",
            0,
            "https://pbs.twimg.com/profile_images/1758831397866909696/E8pZ3l8o_400x400.jpg",
        ),
        (
            "CZ Binance",
            "cz_binance",
            "902926941413453824",
            1,
            "https://pbs.twimg.com/profile_images/1707011536194895872/2Evx550a_400x400.jpg",
        ),
        (
            "Glassnode",
            "glassnode",
            "955471816132923392",
            2,
            "https://pbs.twimg.com/profile_images/1452999896173195270/h_9j5uN5_400x400.png",
        ),
        (
            "DeFi Pulse",
            "defipulse",
            "1104038581163393024",
            3,
            "https://pbs.twimg.com/profile_images/1104038884531228672/p2_1n75p_400x400.png",
        ),
        (
            "Wu Blockchain",
            "WuBlockchain",
            "1291227168380317696",
            4,
            "https://pbs.twimg.com/profile_images/1396635074457014272/9HHe9G4L_400x400.jpg",
        ),
        (
            "Hsaka",
            "HsakaTrades",
            "971400609640239104",
            5,
            "https://pbs.twimg.com/profile_images/1710031006133968896/x25Ab0F9_400x400.jpg",
        ),
    ];

    defaults
        .into_iter()
        .map(|(name, handle, account_id, slot, logo_url)| SourceDb {
            id: account_id.to_string(),
            name: name.to_string(),
            handle: handle.to_string(),
            kind: SourceKind::Feed.as_str().to_string(),
            slot,
            logo_url: Some(logo_url.to_string()),
            upstream_account_id: Some(account_id.to_string()),
            cursor: None,
        })
        .collect()
}

fn default_tickers() -> Vec<TickerDb> {
    [
        ("bitcoin", "BTC", "Bitcoin", 0),
        ("ethereum", "ETH", "Ethereum", 1),
        ("solana", "SOL", "Solana", 2),
    ]
    .into_iter()
    .map(|(id, symbol, name, display_order)| TickerDb {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        display_order,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer, DbPool, WriteHandle};
    use crate::sources::SourceRepository;
    use pulseboard_core::sources::{NewSource, SourceRepositoryTrait};
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn setup() -> (Arc<DbPool>, WriteHandle, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (pool, writer, temp_dir)
    }

    #[tokio::test]
    async fn test_seed_populates_empty_database() {
        let (pool, writer, _temp_dir) = setup().await;

        seed_defaults(&writer).await.expect("Failed to seed");

        let repo = SourceRepository::new(Arc::clone(&pool), writer);
        let sources = repo.list_sources().expect("Failed to list");
        assert_eq!(sources.len(), 6);
        assert_eq!(sources[0].name, "Coinbase");
        assert_eq!(sources[0].id, "3437070832");
        assert_eq!(sources[5].handle, "HsakaTrades");
        assert!(sources.iter().all(|s| s.cursor.is_none()));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (pool, writer, _temp_dir) = setup().await;

        seed_defaults(&writer).await.expect("Failed to seed");
        seed_defaults(&writer).await.expect("Second seed failed");

        let repo = SourceRepository::new(Arc::clone(&pool), writer);
        assert_eq!(repo.list_sources().expect("list").len(), 6);
    }

    #[tokio::test]
    async fn test_seed_respects_existing_sources() {
        let (pool, writer, _temp_dir) = setup().await;

        let repo = SourceRepository::new(Arc::clone(&pool), writer.clone());
        repo.add_source(NewSource {
            name: "Custom".to_string(),
            handle: "custom".to_string(),
            kind: Default::default(),
            slot: 9,
            logo_url: None,
            upstream_account_id: Some("42".to_string()),
        })
        .await
        .expect("Failed to add custom source");

        seed_defaults(&writer).await.expect("Failed to seed");

        // The user already curated their source list; defaults stay out.
        let sources = repo.list_sources().expect("list");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Custom");
    }
}
