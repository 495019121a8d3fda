//! Source domain models.

use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// What a source feeds the engine with.
///
/// Unknown kinds deserialize to `Other`; the scheduler only polls `Feed`
/// sources, so a row written by a newer version degrades to being ignored
/// rather than breaking the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Short-form post feed polled by the scheduler
    #[default]
    Feed,
    /// Anything else - registered but never polled
    #[serde(other)]
    Other,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Other => "other",
        }
    }
}

impl From<&str> for SourceKind {
    fn from(value: &str) -> Self {
        match value {
            "feed" => SourceKind::Feed,
            _ => SourceKind::Other,
        }
    }
}

/// Domain model representing a followed upstream account.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    /// Display name shown in the UI
    pub name: String,
    /// Upstream handle without the leading '@'
    pub handle: String,
    pub kind: SourceKind,
    /// Display slot; unique across all sources
    pub slot: i32,
    pub logo_url: Option<String>,
    /// Account id in the upstream provider's system; sources without one
    /// are never polled
    pub upstream_account_id: Option<String>,
    /// Id of the newest record already fetched for this source
    pub cursor: Option<String>,
}

/// Input model for registering a new source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSource {
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub kind: SourceKind,
    pub slot: i32,
    pub logo_url: Option<String>,
    pub upstream_account_id: Option<String>,
}

impl NewSource {
    /// Validates the new source data.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Source name cannot be empty".to_string(),
            )));
        }
        if self.handle.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Source handle cannot be empty".to_string(),
            )));
        }
        if self.slot < 0 {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Display slot must be non-negative, got {}",
                self.slot
            ))));
        }
        Ok(())
    }
}
