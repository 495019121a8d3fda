//! Database model for sources.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use pulseboard_core::sources::{Source, SourceKind};

/// Database model for sources
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
#[diesel(table_name = crate::schema::sources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SourceDb {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub kind: String,
    pub slot: i32,
    pub logo_url: Option<String>,
    pub upstream_account_id: Option<String>,
    pub cursor: Option<String>,
}

// Conversion implementations
impl From<SourceDb> for Source {
    fn from(db: SourceDb) -> Self {
        Self {
            id: db.id,
            name: db.name,
            handle: db.handle,
            kind: SourceKind::from(db.kind.as_str()),
            slot: db.slot,
            logo_url: db.logo_url,
            upstream_account_id: db.upstream_account_id,
            cursor: db.cursor,
        }
    }
}

impl From<Source> for SourceDb {
    fn from(domain: Source) -> Self {
        Self {
            id: domain.id,
            name: domain.name,
            handle: domain.handle,
            kind: domain.kind.as_str().to_string(),
            slot: domain.slot,
            logo_url: domain.logo_url,
            upstream_account_id: domain.upstream_account_id,
            cursor: domain.cursor,
        }
    }
}
