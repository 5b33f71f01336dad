//! Build metadata row

use sqlx::SqliteConnection;

use super::schema::SCHEMA_STYLE;
use super::WriteError;
use crate::services::source_revision::SourceRevision;

/// Contents of the single `metadata` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    pub style: String,
    pub commit_hash: String,
    pub date: String,
    /// Run summary as JSON
    pub summary: String,
}

impl BuildMetadata {
    pub fn new(revision: SourceRevision, summary: String) -> Self {
        Self {
            style: SCHEMA_STYLE.to_string(),
            commit_hash: revision.commit_hash,
            date: revision.date,
            summary,
        }
    }
}

/// Replace the metadata row
pub async fn save_metadata(conn: &mut SqliteConnection, meta: &BuildMetadata) -> Result<(), WriteError> {
    sqlx::query("DELETE FROM metadata").execute(&mut *conn).await?;

    sqlx::query("INSERT INTO metadata (style, commit_hash, date, summary) VALUES (?, ?, ?, ?)")
        .bind(&meta.style)
        .bind(&meta.commit_hash)
        .bind(&meta.date)
        .bind(&meta.summary)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
