//! Price models held by the scheduler between polls.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest price for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Spot price in USD
    pub price: Decimal,
    /// Percent change over the trailing 24 hours, when the provider reports it
    pub change_24h: Option<f64>,
}

/// Current prices keyed by provider-native instrument id.
///
/// Serializes as a plain JSON object, which is exactly the shape the
/// price-update event carries over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSnapshot(BTreeMap<String, PricePoint>);

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, point: PricePoint) {
        self.0.insert(id.into(), point);
    }

    pub fn get(&self, id: &str) -> Option<&PricePoint> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PricePoint)> {
        self.0.iter()
    }

    /// Folds a fresh poll result into this snapshot.
    ///
    /// Ids present in `newer` take its values; ids only present in `self`
    /// keep their previous price. A partial upstream answer therefore never
    /// blanks out instruments it happened to omit.
    pub fn merge(&mut self, newer: PriceSnapshot) {
        self.0.extend(newer.0);
    }
}

impl FromIterator<(String, PricePoint)> for PriceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, PricePoint)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
