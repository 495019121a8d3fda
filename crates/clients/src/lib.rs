//! Pulseboard Clients Crate
//!
//! Upstream API clients for the Pulseboard sync engine. This crate
//! implements the provider contracts declared in `pulseboard-core`:
//!
//! - [`PostsClient`] implements `FeedProvider` against the hosted feed
//!   gateway, joining the response envelope (posts + included authors
//!   and media) into self-contained records.
//! - [`PricesClient`] implements `PriceProvider` against the price
//!   gateway and is fail-soft: any failure is logged and reported as
//!   "no snapshot" rather than an error.
//!
//! # Rate limiting
//!
//! Feed requests share a single [`RollingWindow`]: a fixed fifteen-minute
//! window with a budget of 1450 requests, counted only on success.
//! Server-side 429 responses that carry a reset time pause the window
//! outright; everything else retries with exponential backoff.

pub mod posts;
pub mod prices;
pub mod rate_limit;

// Re-export the client types
pub use posts::{PostsClient, FEED_TOKEN_ENV};
pub use prices::PricesClient;
pub use rate_limit::{RollingWindow, RollingWindowConfig};
