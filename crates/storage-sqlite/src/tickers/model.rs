//! Database model for ticker configuration.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use pulseboard_core::tickers::TickerConfig;

/// Database model for tickers
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::tickers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TickerDb {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub display_order: i32,
}

// Conversion implementations
impl From<TickerDb> for TickerConfig {
    fn from(db: TickerDb) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            display_order: db.display_order,
        }
    }
}

impl From<TickerConfig> for TickerDb {
    fn from(domain: TickerConfig) -> Self {
        Self {
            id: domain.id,
            symbol: domain.symbol,
            name: domain.name,
            display_order: domain.display_order,
        }
    }
}
