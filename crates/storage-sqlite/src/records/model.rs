//! Database model for fetched records.

use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use pulseboard_core::records::{Author, Engagement, Record};

/// Database model for records.
///
/// The nested domain author and engagement structs are flattened into
/// columns; media attachments are stored as a JSON column, NULL when the
/// record has none.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecordDb {
    pub id: String,
    pub source_id: String,
    pub author_name: String,
    pub author_handle: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub like_count: i64,
    pub share_count: i64,
    pub media: Option<String>,
    pub created_at: NaiveDateTime,
    pub fetched_at: NaiveDateTime,
}

// Conversion implementations
impl From<Record> for RecordDb {
    fn from(domain: Record) -> Self {
        let media = if domain.media.is_empty() {
            None
        } else {
            serde_json::to_string(&domain.media).ok()
        };

        Self {
            id: domain.id,
            source_id: domain.source_id,
            author_name: domain.author.name,
            author_handle: domain.author.handle,
            author_avatar_url: domain.author.avatar_url,
            content: domain.content,
            like_count: domain.metrics.likes,
            share_count: domain.metrics.shares,
            media,
            created_at: domain.created_at.naive_utc(),
            fetched_at: Utc::now().naive_utc(),
        }
    }
}

impl From<RecordDb> for Record {
    fn from(db: RecordDb) -> Self {
        // A media column that no longer parses degrades to no attachments
        // rather than poisoning the whole read.
        let media = db
            .media
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            id: db.id,
            source_id: db.source_id,
            author: Author {
                name: db.author_name,
                handle: db.author_handle,
                avatar_url: db.author_avatar_url,
            },
            content: db.content,
            created_at: Utc.from_utc_datetime(&db.created_at),
            metrics: Engagement {
                likes: db.like_count,
                shares: db.share_count,
            },
            media,
        }
    }
}
