use std::sync::Arc;

use super::tickers_model::TickerConfig;
use super::tickers_traits::{TickerRepositoryTrait, TickerServiceTrait};
use crate::errors::Result;

/// Service for reading ticker configuration.
pub struct TickerService {
    repository: Arc<dyn TickerRepositoryTrait>,
}

impl TickerService {
    /// Creates a new TickerService instance
    pub fn new(repository: Arc<dyn TickerRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl TickerServiceTrait for TickerService {
    /// Lists all configured tickers ordered by display order
    fn list_tickers(&self) -> Result<Vec<TickerConfig>> {
        (*self.repository).list_tickers()
    }
}
