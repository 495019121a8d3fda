//! SQLite-backed source registry.

use async_trait::async_trait;
use diesel::prelude::*;
use log::{debug, warn};
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use pulseboard_core::errors::{ConflictError, DatabaseError, Error, Result};
use pulseboard_core::sources::{NewSource, Source, SourceRepositoryTrait};

use super::model::SourceDb;

/// Repository for managing followed sources and their fetch cursors.
pub struct SourceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SourceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SourceRepositoryTrait for SourceRepository {
    /// Registers a new source.
    ///
    /// The row id is the upstream account id when one is given, so that a
    /// source can be re-registered after removal under the same identity;
    /// otherwise a fresh UUID is generated. Slot and id collisions are
    /// checked inside the write transaction and reported as typed
    /// conflicts, leaving the store unchanged.
    async fn add_source(&self, new_source: NewSource) -> Result<Source> {
        new_source.validate()?;

        let id = new_source
            .upstream_account_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let source_db = SourceDb::from(Source {
            id,
            name: new_source.name,
            handle: new_source.handle,
            kind: new_source.kind,
            slot: new_source.slot,
            logo_url: new_source.logo_url,
            upstream_account_id: new_source.upstream_account_id,
            cursor: None,
        });

        self.writer
            .exec(move |conn| {
                use crate::schema::sources::dsl;

                let slot_holder: Option<String> = dsl::sources
                    .filter(dsl::slot.eq(source_db.slot))
                    .select(dsl::id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if slot_holder.is_some() {
                    return Err(Error::Conflict(ConflictError::SlotConflict(source_db.slot)));
                }

                let id_taken: Option<String> = dsl::sources
                    .find(&source_db.id)
                    .select(dsl::id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if id_taken.is_some() {
                    return Err(Error::Conflict(ConflictError::IdConflict(
                        source_db.id.clone(),
                    )));
                }

                diesel::insert_into(dsl::sources)
                    .values(&source_db)
                    .execute(conn)
                    .map_err(|e| match e {
                        // Residual race against the constraints themselves
                        diesel::result::Error::DatabaseError(
                            diesel::result::DatabaseErrorKind::UniqueViolation,
                            info,
                        ) => Error::Conflict(ConflictError::Other(info.message().to_string())),
                        other => StorageError::from(other).into(),
                    })?;

                debug!("Registered source '{}' in slot {}", source_db.id, source_db.slot);
                Ok(source_db.into())
            })
            .await
    }

    /// Removes a source and every record fetched from it, atomically.
    ///
    /// Returns the number of records that were deleted alongside the
    /// source. A missing source rolls the whole operation back with a
    /// not-found error.
    async fn remove_source(&self, source_id: &str) -> Result<usize> {
        let source_id = source_id.to_string();

        self.writer
            .exec(move |conn| {
                use crate::schema::records::dsl as records_dsl;
                use crate::schema::sources::dsl as sources_dsl;

                let removed_records =
                    diesel::delete(records_dsl::records.filter(records_dsl::source_id.eq(&source_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?;

                let removed_sources = diesel::delete(sources_dsl::sources.find(&source_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if removed_sources == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Source '{}' not found",
                        source_id
                    ))));
                }

                debug!(
                    "Removed source '{}' and {} of its records",
                    source_id, removed_records
                );
                Ok(removed_records)
            })
            .await
    }

    /// Stores the id of the newest record fetched for a source.
    ///
    /// A source that was removed while its poll was in flight is logged
    /// and otherwise ignored; the next cycle will simply not list it.
    async fn advance_cursor(&self, source_id: &str, newest_record_id: &str) -> Result<()> {
        let source_id = source_id.to_string();
        let newest_record_id = newest_record_id.to_string();

        self.writer
            .exec(move |conn| {
                use crate::schema::sources::dsl;

                let updated = diesel::update(dsl::sources.find(&source_id))
                    .set(dsl::cursor.eq(Some(newest_record_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    warn!("No source with id '{}' to advance cursor for", source_id);
                }
                Ok(())
            })
            .await
    }

    fn get_by_id(&self, source_id: &str) -> Result<Source> {
        use crate::schema::sources::dsl;

        let mut conn = get_connection(&self.pool)?;
        let source_db = dsl::sources
            .select(SourceDb::as_select())
            .find(source_id)
            .first::<SourceDb>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "Source '{}' not found",
                    source_id
                )))
            })?;

        Ok(source_db.into())
    }

    /// Lists all sources ordered by display slot.
    fn list_sources(&self) -> Result<Vec<Source>> {
        use crate::schema::sources::dsl;

        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::sources
            .select(SourceDb::as_select())
            .order(dsl::slot.asc())
            .load::<SourceDb>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(Source::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use pulseboard_core::sources::SourceKind;
    use tempfile::tempdir;

    async fn create_test_repository() -> (SourceRepository, Arc<DbPool>, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let writer = spawn_writer((*pool).clone());
        let repo = SourceRepository::new(Arc::clone(&pool), writer);
        (repo, pool, temp_dir)
    }

    fn new_source(name: &str, slot: i32, account_id: Option<&str>) -> NewSource {
        NewSource {
            name: name.to_string(),
            handle: name.to_lowercase(),
            kind: SourceKind::Feed,
            slot,
            logo_url: None,
            upstream_account_id: account_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_add_source_uses_upstream_account_id_as_id() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        let source = repo
            .add_source(new_source("Coinbase", 0, Some("3437070832")))
            .await
            .expect("Failed to add source");

        assert_eq!(source.id, "3437070832");
        assert_eq!(source.cursor, None);

        let fetched = repo.get_by_id("3437070832").expect("Failed to fetch");
        assert_eq!(fetched.name, "Coinbase");
        assert_eq!(fetched.slot, 0);
    }

    #[tokio::test]
    async fn test_add_source_generates_id_without_upstream_account() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        let source = repo
            .add_source(new_source("Manual", 1, None))
            .await
            .expect("Failed to add source");

        assert!(!source.id.is_empty());
        assert_ne!(source.id, "Manual");
        assert!(repo.get_by_id(&source.id).is_ok());
    }

    #[tokio::test]
    async fn test_add_source_rejects_occupied_slot() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        repo.add_source(new_source("First", 2, Some("100")))
            .await
            .expect("Failed to add first source");

        let err = repo
            .add_source(new_source("Second", 2, Some("200")))
            .await
            .expect_err("Slot conflict should be rejected");
        assert!(matches!(
            err,
            Error::Conflict(ConflictError::SlotConflict(2))
        ));

        // The losing source must not have been stored in any form.
        let all = repo.list_sources().expect("Failed to list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "First");
    }

    #[tokio::test]
    async fn test_add_source_rejects_duplicate_id() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        repo.add_source(new_source("First", 0, Some("100")))
            .await
            .expect("Failed to add first source");

        let err = repo
            .add_source(new_source("Clone", 5, Some("100")))
            .await
            .expect_err("Id conflict should be rejected");
        assert!(matches!(err, Error::Conflict(ConflictError::IdConflict(id)) if id == "100"));

        assert_eq!(repo.list_sources().expect("Failed to list").len(), 1);
    }

    #[tokio::test]
    async fn test_add_source_rejects_invalid_input() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        let err = repo
            .add_source(new_source("", 0, Some("100")))
            .await
            .expect_err("Blank name should be rejected");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_sources_ordered_by_slot() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        repo.add_source(new_source("Third", 7, Some("3")))
            .await
            .expect("add");
        repo.add_source(new_source("First", 1, Some("1")))
            .await
            .expect("add");
        repo.add_source(new_source("Second", 4, Some("2")))
            .await
            .expect("add");

        let names: Vec<String> = repo
            .list_sources()
            .expect("Failed to list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_advance_cursor_roundtrip() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        repo.add_source(new_source("Coinbase", 0, Some("3437070832")))
            .await
            .expect("add");

        repo.advance_cursor("3437070832", "1786000000000000003")
            .await
            .expect("Failed to advance cursor");

        let source = repo.get_by_id("3437070832").expect("get");
        assert_eq!(source.cursor.as_deref(), Some("1786000000000000003"));
    }

    #[tokio::test]
    async fn test_advance_cursor_for_missing_source_is_a_no_op() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        repo.advance_cursor("ghost", "1")
            .await
            .expect("Missing source should not error");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_source() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        let err = repo.get_by_id("ghost").expect_err("Should be not found");
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_missing_source_errors() {
        let (repo, _pool, _temp_dir) = create_test_repository().await;

        let err = repo
            .remove_source("ghost")
            .await
            .expect_err("Should be not found");
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }
}
