//! Output database writer
//!
//! One SQLite file, one connection, one transaction per run: the previous
//! contents stay intact until [`DatabaseWriter::commit`] succeeds.

pub mod metadata;
pub mod schema;
pub mod works;

pub use metadata::BuildMetadata;

use crate::models::{AuthorRole, WorkEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Storage failure; aborts the run
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes included works into the output database
pub struct DatabaseWriter {
    pool: SqlitePool,
    tx: Transaction<'static, Sqlite>,
}

impl DatabaseWriter {
    /// Open (or create) the database file and begin the run transaction
    pub async fn open(path: &Path) -> Result<Self, WriteError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let newly_created = !path.exists();

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Creating database: {}", path.display());
        } else {
            info!("Rebuilding database: {}", path.display());
        }

        let tx = pool.begin().await?;
        Ok(Self { pool, tx })
    }

    /// Drop every table this tool owns
    pub async fn reset(&mut self) -> Result<(), WriteError> {
        for table in schema::OWNED_TABLES {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(&mut *self.tx)
                .await?;
        }
        debug!("Dropped {} tables", schema::OWNED_TABLES.len());
        Ok(())
    }

    /// Create tables and indexes that do not exist yet
    pub async fn ensure_schema(&mut self) -> Result<(), WriteError> {
        for statement in schema::TABLES.iter().chain(schema::INDEXES) {
            sqlx::query(statement).execute(&mut *self.tx).await?;
        }
        debug!("Schema ready (style {})", schema::SCHEMA_STYLE);
        Ok(())
    }

    /// Persist one included work
    ///
    /// Returns `false` without writing when the identifier is already present.
    pub async fn write(&mut self, entry: &WorkEntry) -> Result<bool, WriteError> {
        let conn = &mut *self.tx;
        let identifier = entry.id.key();

        if works::work_exists(conn, &identifier).await? {
            return Ok(false);
        }

        let meta = &entry.metadata;

        let style_id = match meta.style.as_deref() {
            Some(name) => Some(works::style_id(conn, name).await?),
            None => None,
        };

        let anthology_id = match meta.title.anthology.as_deref() {
            Some(name) => Some(works::anthology_id(conn, name, meta.title.anthology_reading.as_deref()).await?),
            None => None,
        };

        for person in &meta.people {
            works::save_author(conn, person).await?;
        }
        works::ensure_author(conn, meta.title.author_id, entry.author()).await?;

        if !works::save_work(conn, entry, style_id, anthology_id).await? {
            return Ok(false);
        }

        for person in &meta.people {
            works::link_author(conn, &identifier, person.id, person.role).await?;
        }
        if !meta.people.iter().any(|p| p.id == meta.title.author_id) {
            works::link_author(conn, &identifier, meta.title.author_id, AuthorRole::Author).await?;
        }

        for &category in &meta.categories {
            works::link_category(conn, &identifier, category).await?;
        }

        Ok(true)
    }

    pub async fn write_build_metadata(&mut self, meta: &BuildMetadata) -> Result<(), WriteError> {
        metadata::save_metadata(&mut self.tx, meta).await
    }

    /// Commit the run, then compact the file
    pub async fn commit(self) -> Result<(), WriteError> {
        self.tx.commit().await?;
        sqlx::query("VACUUM").execute(&self.pool).await?;
        self.pool.close().await;
        info!("Database committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CopyrightStatus, IndexedPerson, LicenseDescriptor, LicenseFlag, NormalizedText, Person, Rights, TitleInfo,
        WorkId, WorkMetadata,
    };
    use tempfile::TempDir;

    fn entry(work_id: u32, revision: u32) -> WorkEntry {
        let title = TitleInfo {
            title: "羅生門".to_string(),
            title_reading: "らしょうもん".to_string(),
            sort_reading: None,
            subtitle: None,
            subtitle_reading: None,
            original_title: None,
            anthology: Some("傑作集".to_string()),
            anthology_reading: Some("けっさくしゅう".to_string()),
            author_id: 879,
            author_name: "芥川 竜之介".to_string(),
        };
        let metadata = WorkMetadata {
            title,
            categories: vec![913],
            style: Some("新字新仮名".to_string()),
            note: None,
            first_published: None,
            people: vec![
                Person {
                    id: 879,
                    role: AuthorRole::Author,
                    name: "芥川 竜之介".to_string(),
                    name_reading: "あくたがわ りゅうのすけ".to_string(),
                    name_roman: "Akutagawa, Ryunosuke".to_string(),
                    birth: Some("1892-03-01".to_string()),
                    death: Some("1927-07-24".to_string()),
                    indexed: Some(IndexedPerson {
                        surname: "芥川".to_string(),
                        given_name: Some("竜之介".to_string()),
                        sort_reading: Some("あくたかわりゆうのすけ".to_string()),
                        copyright_expired: Some(true),
                    }),
                },
                Person {
                    id: 1000,
                    role: AuthorRole::Editor,
                    name: "編者".to_string(),
                    name_reading: "へんじゃ".to_string(),
                    name_roman: "Henja".to_string(),
                    birth: None,
                    death: None,
                    indexed: None,
                },
            ],
            rights: Rights {
                status: CopyrightStatus::Copyrighted,
                license: LicenseDescriptor::from_flags([LicenseFlag::Cc]),
                license_source: Some("http://creativecommons.org/licenses/by/2.1/jp/".to_string()),
            },
        };
        let text = NormalizedText {
            body_raw: "<div class=\"main_text\">本文</div>".to_string(),
            rb_major: "本文".to_string(),
            rt_major: "ほんぶん".to_string(),
            colophon_raw: String::new(),
            colophon_text: String::new(),
        };
        WorkEntry::new(
            WorkId {
                author_dir: 879,
                work_id,
                revision,
            },
            metadata,
            text,
        )
    }

    async fn count(writer: &mut DatabaseWriter, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&mut *writer.tx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_inserts_work_and_links() {
        let dir = TempDir::new().unwrap();
        let mut writer = DatabaseWriter::open(&dir.path().join("out/aozora.db")).await.unwrap();
        writer.reset().await.unwrap();
        writer.ensure_schema().await.unwrap();

        assert!(writer.write(&entry(127, 1)).await.unwrap());
        assert!(writer.write(&entry(127, 2)).await.unwrap());

        assert_eq!(count(&mut writer, "works").await, 2);
        assert_eq!(count(&mut writer, "authors").await, 2);
        assert_eq!(count(&mut writer, "styles").await, 1);
        assert_eq!(count(&mut writer, "anthologies").await, 1);
        assert_eq!(count(&mut writer, "work_authors").await, 4);
        assert_eq!(count(&mut writer, "work_categories").await, 2);

        let (title_key, copyrighted): (String, bool) =
            sqlx::query_as("SELECT title_key, copyrighted FROM works WHERE identifier = '127_1'")
                .fetch_one(&mut *writer.tx)
                .await
                .unwrap();
        assert_eq!(title_key, "ラシヨウモン");
        assert!(copyrighted);

        let (name_key, surname, given_name, expired): (String, Option<String>, Option<String>, Option<bool>) =
            sqlx::query_as("SELECT name_key, surname, given_name, copyright_expired FROM authors WHERE id = 879")
                .fetch_one(&mut *writer.tx)
                .await
                .unwrap();
        assert_eq!(name_key, "アクタカワリユウノスケ");
        assert_eq!(surname.as_deref(), Some("芥川"));
        assert_eq!(given_name.as_deref(), Some("竜之介"));
        assert_eq!(expired, Some(true));
    }

    #[tokio::test]
    async fn test_duplicate_identifier_is_not_written() {
        let dir = TempDir::new().unwrap();
        let mut writer = DatabaseWriter::open(&dir.path().join("aozora.db")).await.unwrap();
        writer.ensure_schema().await.unwrap();

        assert!(writer.write(&entry(127, 1)).await.unwrap());
        assert!(!writer.write(&entry(127, 1)).await.unwrap());
        assert_eq!(count(&mut writer, "works").await, 1);
    }

    #[tokio::test]
    async fn test_uncommitted_run_leaves_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aozora.db");

        let mut writer = DatabaseWriter::open(&path).await.unwrap();
        writer.ensure_schema().await.unwrap();
        writer.commit().await.unwrap();

        let mut writer = DatabaseWriter::open(&path).await.unwrap();
        writer.write(&entry(127, 1)).await.unwrap();
        drop(writer);

        let mut writer = DatabaseWriter::open(&path).await.unwrap();
        assert_eq!(count(&mut writer, "works").await, 0);
    }
}
