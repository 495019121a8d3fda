//! Tickers module - configuration for the price poller.

mod tickers_model;
mod tickers_service;
mod tickers_traits;

// Re-export the public interface
pub use tickers_model::TickerConfig;
pub use tickers_service::TickerService;
pub use tickers_traits::{TickerRepositoryTrait, TickerServiceTrait};
