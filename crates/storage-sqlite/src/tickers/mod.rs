//! SQLite storage implementation for tickers.

mod model;
mod repository;

pub use model::TickerDb;
pub use repository::TickerRepository;
