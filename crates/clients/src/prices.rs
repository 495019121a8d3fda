//! Price API client for crypto ticker quotes.
//!
//! The price gateway is deliberately boring: one unauthenticated GET per
//! poll returning current USD prices plus 24h change for the requested
//! ticker ids. The client is fail-soft end to end; any transport, HTTP,
//! or parse failure is logged and reported as `None` so a flaky price
//! feed can never take the poll loop down with it.

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use pulseboard_core::prices::{PricePoint, PriceSnapshot};
use pulseboard_core::providers::PriceProvider;

const BASE_URL: &str = "https://prices.pulseboard.dev";
const PROVIDER_ID: &str = "PRICE_API";

/// Client for the price gateway.
pub struct PricesClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WirePricePoint {
    usd: f64,
    usd_24h_change: Option<f64>,
}

/// Convert the wire map into a snapshot, dropping entries whose price
/// cannot be represented or is negative.
fn snapshot_from_wire(wire: HashMap<String, WirePricePoint>) -> PriceSnapshot {
    let mut snapshot = PriceSnapshot::new();
    for (id, point) in wire {
        let price = match Decimal::try_from(point.usd) {
            Ok(p) if p >= Decimal::ZERO => p,
            Ok(p) => {
                warn!("Discarding negative price {} for '{}'", p, id);
                continue;
            }
            Err(e) => {
                warn!(
                    "Discarding unrepresentable price {} for '{}': {}",
                    point.usd, id, e
                );
                continue;
            }
        };
        snapshot.insert(
            id,
            PricePoint {
                price,
                change_24h: point.usd_24h_change,
            },
        );
    }
    snapshot
}

impl PricesClient {
    pub fn new() -> Self {
        // Keep the timeout well under the poll cadence so a hung request
        // cannot stack cycles behind it.
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different gateway, e.g. a self-hosted proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for PricesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for PricesClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_prices(&self, ids: &[String]) -> Option<PriceSnapshot> {
        if ids.is_empty() {
            debug!("No ticker ids requested; skipping price request");
            return None;
        }

        let joined = ids.join(",");
        let url = format!("{}/prices", self.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[
                ("ids", joined.as_str()),
                ("vs", "usd"),
                ("with_24h_change", "true"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Price request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Price request returned HTTP {}", status);
            return None;
        }

        let wire: HashMap<String, WirePricePoint> = match response.json().await {
            Ok(wire) => wire,
            Err(e) => {
                error!("Failed to parse price response: {}", e);
                return None;
            }
        };

        Some(snapshot_from_wire(wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse_wire(json: &str) -> HashMap<String, WirePricePoint> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_snapshot_from_wire_maps_prices_and_change() {
        let wire = parse_wire(
            r#"{
                "bitcoin": { "usd": 64123.55, "usd_24h_change": -2.31 },
                "ethereum": { "usd": 3012.0 }
            }"#,
        );

        let snapshot = snapshot_from_wire(wire);
        assert_eq!(snapshot.len(), 2);

        let btc = snapshot.get("bitcoin").unwrap();
        assert_eq!(btc.price, dec!(64123.55));
        assert_eq!(btc.change_24h, Some(-2.31));

        let eth = snapshot.get("ethereum").unwrap();
        assert_eq!(eth.price, dec!(3012.0));
        assert_eq!(eth.change_24h, None);
    }

    #[test]
    fn test_snapshot_from_wire_drops_negative_prices() {
        let wire = parse_wire(
            r#"{
                "bitcoin": { "usd": 64123.55 },
                "broken": { "usd": -1.0 }
            }"#,
        );

        let snapshot = snapshot_from_wire(wire);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("broken").is_none());
    }

    #[test]
    fn test_snapshot_from_wire_drops_unrepresentable_prices() {
        // Beyond Decimal's range; must be skipped, not panic.
        let wire = parse_wire(r#"{ "huge": { "usd": 1e32 } }"#);
        assert!(snapshot_from_wire(wire).is_empty());
    }

    #[test]
    fn test_snapshot_from_wire_empty_map() {
        let snapshot = snapshot_from_wire(HashMap::new());
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_empty_ids_short_circuit_without_request() {
        // Unroutable base URL: the test only passes because no request
        // is ever issued for an empty id list.
        let client = PricesClient::new().with_base_url("http://127.0.0.1:1");
        assert!(client.fetch_prices(&[]).await.is_none());
    }
}
