//! Ticker repository and service traits.

use super::tickers_model::TickerConfig;
use crate::errors::Result;

/// Trait defining the contract for Ticker repository operations.
pub trait TickerRepositoryTrait: Send + Sync {
    /// Lists all configured tickers ordered by display order.
    fn list_tickers(&self) -> Result<Vec<TickerConfig>>;
}

/// Trait defining the contract for Ticker service operations.
pub trait TickerServiceTrait: Send + Sync {
    /// Lists all configured tickers ordered by display order.
    fn list_tickers(&self) -> Result<Vec<TickerConfig>>;
}
