//! Row persistence for one included work
//!
//! All functions run on the writer's open transaction.

use crate::models::{AuthorRole, Person, WorkEntry};
use aozora_common::normalize_reading;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sqlx::SqliteConnection;
use std::io::{self, Write};

use super::WriteError;

/// zlib-compress markup for a BLOB column
pub fn compress(text: &str) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    encoder.finish()
}

/// Id of a style row, inserting it on first use
pub async fn style_id(conn: &mut SqliteConnection, name: &str) -> Result<i64, WriteError> {
    sqlx::query("INSERT OR IGNORE INTO styles (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM styles WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Id of an anthology row, inserting it on first use
pub async fn anthology_id(
    conn: &mut SqliteConnection,
    name: &str,
    reading: Option<&str>,
) -> Result<i64, WriteError> {
    sqlx::query("INSERT OR IGNORE INTO anthologies (name, reading) VALUES (?, ?)")
        .bind(name)
        .bind(reading)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM anthologies WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert or refresh a person credited on a card
pub async fn save_author(conn: &mut SqliteConnection, person: &Person) -> Result<(), WriteError> {
    let indexed = person.indexed.as_ref();

    sqlx::query(
        r#"
        INSERT INTO authors (
            id, name, name_reading, name_key, name_roman,
            surname, given_name, birth, death, copyright_expired
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            name_reading = excluded.name_reading,
            name_key = excluded.name_key,
            name_roman = excluded.name_roman,
            surname = excluded.surname,
            given_name = excluded.given_name,
            birth = excluded.birth,
            death = excluded.death,
            copyright_expired = excluded.copyright_expired
        "#,
    )
    .bind(person.id)
    .bind(&person.name)
    .bind(&person.name_reading)
    .bind(normalize_reading(person.key_reading()))
    .bind(&person.name_roman)
    .bind(indexed.map(|p| p.surname.as_str()))
    .bind(indexed.and_then(|p| p.given_name.as_deref()))
    .bind(&person.birth)
    .bind(&person.death)
    .bind(indexed.and_then(|p| p.copyright_expired))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Name-only row for an author known just from the title table
pub async fn ensure_author(conn: &mut SqliteConnection, id: u32, name: &str) -> Result<(), WriteError> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO authors (id, name, name_reading, name_key, name_roman)
        VALUES (?, ?, '', '', '')
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn work_exists(conn: &mut SqliteConnection, identifier: &str) -> Result<bool, WriteError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM works WHERE identifier = ?")
        .bind(identifier)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// Insert the `works` row; `false` when the identifier already exists
pub async fn save_work(
    conn: &mut SqliteConnection,
    entry: &WorkEntry,
    style_id: Option<i64>,
    anthology_id: Option<i64>,
) -> Result<bool, WriteError> {
    let meta = &entry.metadata;
    let title = &meta.title;

    let body_raw = compress(&entry.text.body_raw)?;
    let colophon_raw = compress(&entry.text.colophon_raw)?;

    let result = sqlx::query(
        r#"
        INSERT INTO works (
            identifier, work_id, revision, author_id, author,
            title, title_reading, title_key,
            subtitle, subtitle_reading, subtitle_key,
            original_title, anthology_id, style_id, note, first_published,
            copyrighted, license,
            body_raw, body_text_rb_major, body_text_rt_major,
            colophon_raw, colophon_text
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(identifier) DO NOTHING
        "#,
    )
    .bind(entry.id.key())
    .bind(entry.id.work_id)
    .bind(entry.id.revision)
    .bind(title.author_id)
    .bind(entry.author())
    .bind(&title.title)
    .bind(&title.title_reading)
    .bind(normalize_reading(title.key_reading()))
    .bind(&title.subtitle)
    .bind(&title.subtitle_reading)
    .bind(title.subtitle_reading.as_deref().map(normalize_reading))
    .bind(&title.original_title)
    .bind(anthology_id)
    .bind(style_id)
    .bind(&meta.note)
    .bind(&meta.first_published)
    .bind(entry.copyright_status().is_copyrighted())
    .bind(&meta.rights.license_source)
    .bind(body_raw)
    .bind(&entry.text.rb_major)
    .bind(&entry.text.rt_major)
    .bind(colophon_raw)
    .bind(&entry.text.colophon_text)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn link_author(
    conn: &mut SqliteConnection,
    identifier: &str,
    author_id: u32,
    role: AuthorRole,
) -> Result<(), WriteError> {
    sqlx::query("INSERT OR IGNORE INTO work_authors (identifier, author_id, role) VALUES (?, ?, ?)")
        .bind(identifier)
        .bind(author_id)
        .bind(role.as_str())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn link_category(conn: &mut SqliteConnection, identifier: &str, category: u32) -> Result<(), WriteError> {
    sqlx::query("INSERT OR IGNORE INTO work_categories (identifier, category) VALUES (?, ?)")
        .bind(identifier)
        .bind(category)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
