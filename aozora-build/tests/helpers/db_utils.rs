//! Output database inspection

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Column information from PRAGMA table_info
#[derive(Debug, sqlx::FromRow)]
pub struct ColumnInfo {
    pub cid: i32,
    pub name: String,
    pub r#type: String,
    pub notnull: i32,
    pub dflt_value: Option<String>,
    pub pk: i32,
}

/// Open a finished output database
pub async fn open_output(path: &Path) -> Result<SqlitePool> {
    let db_url = format!("sqlite:{}?mode=ro", path.display());
    Ok(SqlitePool::connect(&db_url).await?)
}

/// Run one statement against an existing output database
pub async fn execute_on_output(path: &Path, sql: &str) -> Result<()> {
    let db_url = format!("sqlite:{}?mode=rw", path.display());
    let pool = SqlitePool::connect(&db_url).await?;
    sqlx::query(sql).execute(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn get_table_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<ColumnInfo>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let columns = sqlx::query_as::<_, ColumnInfo>(&query).fetch_all(pool).await?;
    Ok(columns)
}

pub async fn get_table_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}
