//! SQLite-backed record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use pulseboard_core::errors::Result;
use pulseboard_core::records::{Record, RecordRepositoryTrait};

use super::model::RecordDb;

/// Rows per insert statement; keeps bind counts well under SQLite's limit.
const INSERT_CHUNK_SIZE: usize = 1_000;

/// Repository for the fetched-record cache.
pub struct RecordRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RecordRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl RecordRepositoryTrait for RecordRepository {
    /// Stores a batch, skipping records already present.
    ///
    /// Existing rows win: a record polled twice keeps its originally
    /// stored form. Returns the number of records actually inserted.
    async fn upsert_records(&self, batch: &[Record]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let db_models: Vec<RecordDb> = batch.iter().cloned().map(RecordDb::from).collect();
        self.writer
            .exec(move |conn| {
                use crate::schema::records::dsl;

                let mut inserted = 0;
                for chunk in db_models.chunks(INSERT_CHUNK_SIZE) {
                    inserted += diesel::insert_or_ignore_into(dsl::records)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(inserted)
            })
            .await
    }

    /// Deletes records created before the cutoff, returning how many.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = cutoff.naive_utc();
        self.writer
            .exec(move |conn| {
                use crate::schema::records::dsl;

                let removed = diesel::delete(dsl::records.filter(dsl::created_at.lt(cutoff)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if removed > 0 {
                    debug!("Deleted {} records older than {}", removed, cutoff);
                }
                Ok(removed)
            })
            .await
    }

    /// Most recent records for one source, newest first.
    fn records_since(&self, source_id: &str, limit: i64) -> Result<Vec<Record>> {
        use crate::schema::records::dsl;

        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::records
            .filter(dsl::source_id.eq(source_id))
            .order(dsl::created_at.desc())
            .limit(limit)
            .select(RecordDb::as_select())
            .load::<RecordDb>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(Record::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use crate::sources::SourceRepository;
    use chrono::TimeZone;
    use pulseboard_core::records::{Author, Engagement, MediaAttachment, MediaKind};
    use pulseboard_core::sources::{NewSource, SourceKind, SourceRepositoryTrait};
    use tempfile::tempdir;

    async fn create_test_repositories() -> (
        RecordRepository,
        SourceRepository,
        Arc<DbPool>,
        tempfile::TempDir,
    ) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let writer = spawn_writer((*pool).clone());
        let records = RecordRepository::new(Arc::clone(&pool), writer.clone());
        let sources = SourceRepository::new(Arc::clone(&pool), writer);
        (records, sources, pool, temp_dir)
    }

    /// Registers a source so record rows satisfy the foreign key.
    async fn seed_source(sources: &SourceRepository, id: &str, slot: i32) {
        sources
            .add_source(NewSource {
                name: format!("Source {}", id),
                handle: format!("source_{}", id),
                kind: SourceKind::Feed,
                slot,
                logo_url: None,
                upstream_account_id: Some(id.to_string()),
            })
            .await
            .expect("Failed to seed source");
    }

    fn make_record(id: &str, source_id: &str, day: u32, hour: u32) -> Record {
        Record {
            id: id.to_string(),
            source_id: source_id.to_string(),
            author: Author {
                name: "Hsaka".to_string(),
                handle: "HsakaTrades".to_string(),
                avatar_url: None,
            },
            content: format!("post {}", id),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
            metrics: Engagement {
                likes: 10,
                shares: 2,
            },
            media: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_skips_existing_records() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;

        let first_batch = vec![
            make_record("1", "s1", 1, 10),
            make_record("2", "s1", 1, 11),
            make_record("3", "s1", 1, 12),
        ];
        let inserted = records
            .upsert_records(&first_batch)
            .await
            .expect("Failed to upsert");
        assert_eq!(inserted, 3);

        // Overlapping batch: two known ids, two new ones.
        let second_batch = vec![
            make_record("2", "s1", 1, 11),
            make_record("3", "s1", 1, 12),
            make_record("4", "s1", 1, 13),
            make_record("5", "s1", 1, 14),
        ];
        let inserted = records
            .upsert_records(&second_batch)
            .await
            .expect("Failed to upsert");
        assert_eq!(inserted, 2);

        let all = records.records_since("s1", 50).expect("Failed to load");
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_upsert_keeps_original_row_on_conflict() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;

        let original = make_record("1", "s1", 1, 10);
        records
            .upsert_records(&[original.clone()])
            .await
            .expect("upsert");

        let mut edited = original.clone();
        edited.content = "edited after the fact".to_string();
        let inserted = records.upsert_records(&[edited]).await.expect("upsert");
        assert_eq!(inserted, 0);

        let stored = records.records_since("s1", 10).expect("load");
        assert_eq!(stored[0].content, "post 1");
    }

    #[tokio::test]
    async fn test_upsert_empty_batch_is_a_no_op() {
        let (records, _sources, _pool, _temp_dir) = create_test_repositories().await;
        assert_eq!(records.upsert_records(&[]).await.expect("upsert"), 0);
    }

    #[tokio::test]
    async fn test_records_since_newest_first_with_limit() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;
        seed_source(&sources, "s2", 1).await;

        records
            .upsert_records(&[
                make_record("a", "s1", 1, 8),
                make_record("b", "s1", 2, 9),
                make_record("c", "s1", 3, 10),
                make_record("d", "s1", 4, 11),
                make_record("other", "s2", 5, 12),
            ])
            .await
            .expect("upsert");

        let recent = records.records_since("s1", 3).expect("load");
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b"]);
    }

    #[tokio::test]
    async fn test_delete_older_than_removes_only_expired() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;

        records
            .upsert_records(&[
                make_record("old-1", "s1", 1, 0),
                make_record("old-2", "s1", 1, 6),
                make_record("fresh", "s1", 2, 12),
            ])
            .await
            .expect("upsert");

        let cutoff = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let removed = records
            .delete_older_than(cutoff)
            .await
            .expect("Failed to delete");
        assert_eq!(removed, 2);

        let remaining = records.records_since("s1", 10).expect("load");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "fresh");
    }

    #[tokio::test]
    async fn test_media_attachments_roundtrip() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;

        let mut record = make_record("1", "s1", 1, 10);
        record.media = vec![
            MediaAttachment {
                kind: MediaKind::Photo,
                url: "https://pbs.twimg.com/media/chart1.jpg".to_string(),
                preview_url: None,
            },
            MediaAttachment {
                kind: MediaKind::Video,
                url: "https://video.twimg.com/clip.mp4".to_string(),
                preview_url: Some("https://pbs.twimg.com/thumb.jpg".to_string()),
            },
        ];

        records
            .upsert_records(&[record.clone()])
            .await
            .expect("upsert");

        let stored = records.records_since("s1", 1).expect("load");
        assert_eq!(stored[0], record);
    }

    #[tokio::test]
    async fn test_record_without_media_roundtrips_as_empty() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;

        let record = make_record("1", "s1", 1, 10);
        records
            .upsert_records(&[record.clone()])
            .await
            .expect("upsert");

        let stored = records.records_since("s1", 1).expect("load");
        assert!(stored[0].media.is_empty());
        assert_eq!(stored[0], record);
    }

    #[tokio::test]
    async fn test_remove_source_deletes_its_records() {
        let (records, sources, _pool, _temp_dir) = create_test_repositories().await;
        seed_source(&sources, "s1", 0).await;
        seed_source(&sources, "s2", 1).await;

        let batch: Vec<Record> = (0..50)
            .map(|i| make_record(&format!("r{}", i), "s1", 1, (i % 24) as u32))
            .collect();
        records.upsert_records(&batch).await.expect("upsert");
        records
            .upsert_records(&[make_record("keep", "s2", 1, 10)])
            .await
            .expect("upsert");

        // make_record collides on (day, hour) for some ids but ids differ,
        // so all 50 rows exist.
        assert_eq!(records.records_since("s1", 100).expect("load").len(), 50);

        let removed = sources
            .remove_source("s1")
            .await
            .expect("Failed to remove source");
        assert_eq!(removed, 50);

        assert!(records.records_since("s1", 100).expect("load").is_empty());
        assert_eq!(records.records_since("s2", 100).expect("load").len(), 1);
    }
}
