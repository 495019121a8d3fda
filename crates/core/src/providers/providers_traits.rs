//! Upstream provider trait definitions.
//!
//! These traits are the seam between the scheduler and the HTTP clients.
//! Implementations live in the `clients` crate; tests substitute scripted
//! fakes.

use async_trait::async_trait;

use crate::prices::PriceSnapshot;
use crate::providers::ProviderError;
use crate::records::Record;

/// A provider that serves batches of short-form posts for an upstream account.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FEED_API". Used for logging and
    /// error attribution.
    fn id(&self) -> &'static str;

    /// Fetch the newest batch of records published by `account_id`.
    ///
    /// # Arguments
    ///
    /// * `account_id` - The upstream account identifier to poll
    /// * `since_cursor` - When set, only records newer than this record id
    ///   are returned
    ///
    /// # Returns
    ///
    /// Records ordered most-recent-first, or a [`ProviderError`] on failure.
    /// An account with nothing new yields an empty vector, not an error.
    async fn fetch_batch(
        &self,
        account_id: &str,
        since_cursor: Option<&str>,
    ) -> Result<Vec<Record>, ProviderError>;
}

/// A provider that serves current prices for a set of instruments.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    fn id(&self) -> &'static str;

    /// Fetch current prices for the given provider-native ids.
    ///
    /// This call is fail-soft: any upstream or transport problem is logged
    /// by the implementation and surfaces here as `None`. An empty `ids`
    /// slice short-circuits to `None` without any network traffic.
    async fn fetch_prices(&self, ids: &[String]) -> Option<PriceSnapshot>;
}
