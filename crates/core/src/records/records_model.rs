//! Record domain models.
//!
//! A record is one short-form post fetched from an upstream feed, denormalized
//! with its author and media so the UI never needs a second lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedImage,
}

/// A media attachment carried by a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub url: String,
    /// Thumbnail to show before the full asset loads; falls back to `url`
    /// upstream when the provider has no dedicated preview
    pub preview_url: Option<String>,
}

/// Author details denormalized onto each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub handle: String,
    pub avatar_url: Option<String>,
}

/// Engagement counters captured at fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub likes: i64,
    pub shares: i64,
}

/// Domain model representing one fetched short-form post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Upstream post id; stable across refetches
    pub id: String,
    /// Id of the source this record was fetched for
    pub source_id: String,
    pub author: Author,
    pub content: String,
    /// Publication time as reported by the upstream platform
    pub created_at: DateTime<Utc>,
    pub metrics: Engagement,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_media_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&MediaKind::AnimatedImage).unwrap(),
            "\"animated-image\""
        );
        assert_eq!(serde_json::to_string(&MediaKind::Photo).unwrap(), "\"photo\"");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = Record {
            id: "1001".to_string(),
            source_id: "src-1".to_string(),
            author: Author {
                name: "Coinbase".to_string(),
                handle: "coinbase".to_string(),
                avatar_url: None,
            },
            content: "gm".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            metrics: Engagement {
                likes: 12,
                shares: 3,
            },
            media: vec![],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sourceId"], "src-1");
        assert_eq!(json["createdAt"], "2024-01-15T10:30:00Z");
        assert_eq!(json["metrics"]["likes"], 12);
        assert_eq!(json["author"]["avatarUrl"], serde_json::Value::Null);
    }

    #[test]
    fn test_record_deserializes_without_media_field() {
        let json = r#"{
            "id": "1001",
            "sourceId": "src-1",
            "author": {"name": "Coinbase", "handle": "coinbase", "avatarUrl": null},
            "content": "gm",
            "createdAt": "2024-01-15T10:30:00Z",
            "metrics": {"likes": 0, "shares": 0}
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert!(record.media.is_empty());
    }
}
