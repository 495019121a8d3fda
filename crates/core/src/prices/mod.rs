//! Prices module - snapshot state shared between price polls.

mod prices_model;

pub use prices_model::{PricePoint, PriceSnapshot};
