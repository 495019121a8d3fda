//! Ticker configuration models.

use serde::{Deserialize, Serialize};

/// One instrument the price poller keeps current.
///
/// `id` is the price provider's native identifier (e.g. "bitcoin"), which is
/// what [`crate::providers::PriceProvider::fetch_prices`] expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerConfig {
    pub id: String,
    /// Short display symbol (e.g. "BTC")
    pub symbol: String,
    pub name: String,
    /// Position in the UI ticker strip; unique across all tickers
    pub display_order: i32,
}
