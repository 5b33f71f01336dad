//! Archive-wide person/work index
//!
//! `index_pages/list_person_all_extended_utf8.zip` holds one CSV row per
//! (work, credited person) pair. It is the authoritative source of each work's
//! copyright flag and of the sort readings used for keys; card pages carry
//! neither.

use crate::models::{CopyrightStatus, IndexedPerson, IndexedWork};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Location of the index relative to the archive root
pub const INDEX_ZIP: &str = "index_pages/list_person_all_extended_utf8.zip";

/// CSV member inside the zip
pub const INDEX_CSV: &str = "list_person_all_extended_utf8.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    #[serde(rename = "作品ID")]
    work_id: u32,
    #[serde(rename = "ソート用読み", default)]
    sort_reading: String,
    #[serde(rename = "作品著作権フラグ", default)]
    work_copyright: String,
    #[serde(rename = "人物ID")]
    person_id: u32,
    #[serde(rename = "姓", default)]
    surname: String,
    #[serde(rename = "名", default)]
    given_name: String,
    #[serde(rename = "姓読みソート用", default)]
    surname_sort: String,
    #[serde(rename = "名読みソート用", default)]
    given_name_sort: String,
    #[serde(rename = "人物著作権フラグ", default)]
    person_copyright: String,
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// あり → copyrighted, なし → not
fn copyright_flag(value: &str) -> Option<CopyrightStatus> {
    match value.trim() {
        "あり" => Some(CopyrightStatus::Copyrighted),
        "なし" => Some(CopyrightStatus::NoCopyright),
        _ => None,
    }
}

/// Index rows grouped by work id and person id
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    works: HashMap<u32, IndexedWork>,
    people: HashMap<u32, IndexedPerson>,
}

impl ArchiveIndex {
    /// Load the index under an archive root
    pub fn load(root: &Path) -> Result<Self, IndexError> {
        let path = root.join(INDEX_ZIP);
        if !path.is_file() {
            return Err(IndexError::NotFound(path));
        }

        let mut archive = zip::ZipArchive::new(File::open(&path)?)?;
        let mut csv_bytes = Vec::new();
        archive.by_name(INDEX_CSV)?.read_to_end(&mut csv_bytes)?;

        let index = Self::from_csv(&csv_bytes)?;
        info!(
            "Loaded index {}: {} works, {} people",
            path.display(),
            index.works.len(),
            index.people.len()
        );
        Ok(index)
    }

    /// Load the index, or an empty one when it is missing or unreadable
    pub fn load_or_empty(root: &Path) -> Self {
        Self::load(root).unwrap_or_else(|e| {
            warn!("{}; copyright status falls back to card pages", e);
            Self::default()
        })
    }

    /// Parse CSV bytes (UTF-8, optional BOM, header row)
    ///
    /// The first row seen for a work or person wins. Rows that do not
    /// deserialize are skipped.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, IndexError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

        // Header problems are fatal; row problems are not
        reader.headers()?;

        let mut index = Self::default();
        let mut skipped = 0usize;

        for row in reader.deserialize::<IndexRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!("Skipping index row: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            index.works.entry(row.work_id).or_insert_with(|| IndexedWork {
                copyright: copyright_flag(&row.work_copyright),
                sort_reading: non_empty(row.sort_reading),
            });

            index.people.entry(row.person_id).or_insert_with(|| IndexedPerson {
                surname: row.surname.trim().to_string(),
                given_name: non_empty(row.given_name),
                sort_reading: non_empty(format!("{}{}", row.surname_sort.trim(), row.given_name_sort.trim())),
                copyright_expired: copyright_flag(&row.person_copyright).map(|s| !s.is_copyrighted()),
            });
        }

        if skipped > 0 {
            warn!("Skipped {} malformed index rows", skipped);
        }

        Ok(index)
    }

    pub fn work(&self, work_id: u32) -> Option<&IndexedWork> {
        self.works.get(&work_id)
    }

    pub fn person(&self, person_id: u32) -> Option<&IndexedPerson> {
        self.people.get(&person_id)
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty() && self.people.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    const HEADER: &str = "作品ID,作品名,ソート用読み,作品著作権フラグ,人物ID,姓,名,姓読みソート用,名読みソート用,役割フラグ,人物著作権フラグ";

    fn csv(rows: &[&str]) -> Vec<u8> {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(HEADER.as_bytes());
        for row in rows {
            bytes.push(b'\n');
            bytes.extend_from_slice(row.as_bytes());
        }
        bytes
    }

    #[test]
    fn test_first_row_per_work_and_person_wins() {
        let index = ArchiveIndex::from_csv(&csv(&[
            "127,羅生門,らしようもん,なし,879,芥川,竜之介,あくたかわ,りゆうのすけ,著者,なし",
            "127,羅生門,ちがう,あり,1000,編者,,へんしや,,編者,あり",
            "128,鼻,はな,なし,879,別名,,,,著者,あり",
        ]))
        .unwrap();

        let work = index.work(127).unwrap();
        assert_eq!(work.copyright, Some(CopyrightStatus::NoCopyright));
        assert_eq!(work.sort_reading.as_deref(), Some("らしようもん"));

        let author = index.person(879).unwrap();
        assert_eq!(author.surname, "芥川");
        assert_eq!(author.given_name.as_deref(), Some("竜之介"));
        assert_eq!(author.sort_reading.as_deref(), Some("あくたかわりゆうのすけ"));
        assert_eq!(author.copyright_expired, Some(true));

        let editor = index.person(1000).unwrap();
        assert_eq!(editor.given_name, None);
        assert_eq!(editor.copyright_expired, Some(false));
        assert!(index.work(999).is_none());
    }

    #[test]
    fn test_unknown_flag_and_bad_rows() {
        let index = ArchiveIndex::from_csv(&csv(&[
            "200,作品,さくひん,不明,5,姓,名,せい,めい,著者,",
            "abc,壊れた行,,,,,,,,,",
        ]))
        .unwrap();

        assert_eq!(index.work(200).unwrap().copyright, None);
        assert_eq!(index.person(5).unwrap().copyright_expired, None);
        assert_eq!(index.works.len(), 1);
    }

    #[test]
    fn test_load_from_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDEX_ZIP);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file(INDEX_CSV, SimpleFileOptions::default()).unwrap();
        zip.write_all(&csv(&["300,作品,さくひん,あり,7,姓,,せい,,著者,あり"]))
            .unwrap();
        zip.finish().unwrap();

        let index = ArchiveIndex::load(dir.path()).unwrap();
        assert_eq!(index.work(300).unwrap().copyright, Some(CopyrightStatus::Copyrighted));
    }

    #[test]
    fn test_missing_index_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(ArchiveIndex::load(dir.path()), Err(IndexError::NotFound(_))));
        assert!(ArchiveIndex::load_or_empty(dir.path()).is_empty());
    }
}
