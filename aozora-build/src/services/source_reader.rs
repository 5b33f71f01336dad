//! Archive source tree reader
//!
//! Walks `<root>/cards/<author>/files/<work_id>_<rev>.html` in file-name order
//! and pairs every body file with its card page
//! (`<root>/cards/<author>/card<work_id>.html`). Pages are decoded to UTF-8
//! here; later stages only see `String`s.

use crate::models::{WorkId, WorkRecord};
use encoding_rs::{Encoding, SHIFT_JIS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Root path unusable; fatal for the run
#[derive(Debug, Error)]
pub enum MissingInputError {
    #[error("Source path not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No cards directory under {0}")]
    NoCardsDirectory(PathBuf),

    #[error("No work files found under {0}")]
    NoEntries(PathBuf),
}

/// One entry could not be read; the entry is skipped
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Card page missing for {id}: {path}")]
    MissingCard { id: WorkId, path: PathBuf },

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

static BODY_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_(\d+)$").expect("valid body file pattern"));

static CHARSET: Lazy<regex::bytes::Regex> = Lazy::new(|| {
    regex::bytes::Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_:.\-]+)"#).expect("valid charset pattern")
});

/// Bytes of the page head searched for a charset declaration
const CHARSET_SNIFF_LEN: usize = 2048;

/// An opened archive checkout
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    cards: PathBuf,
}

impl SourceTree {
    /// Validate the layout and probe for at least one work file
    pub fn open(root: &Path) -> Result<Self, MissingInputError> {
        if !root.exists() {
            return Err(MissingInputError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(MissingInputError::NotADirectory(root.to_path_buf()));
        }

        let cards = root.join("cards");
        if !cards.is_dir() {
            return Err(MissingInputError::NoCardsDirectory(root.to_path_buf()));
        }

        let tree = Self {
            root: root.to_path_buf(),
            cards,
        };

        if tree.body_files().next().is_none() {
            return Err(MissingInputError::NoEntries(root.to_path_buf()));
        }

        debug!(root = %tree.root.display(), "Opened source tree");
        Ok(tree)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Card page path for a work
    pub fn card_path(&self, id: &WorkId) -> PathBuf {
        self.cards
            .join(format!("{:06}", id.author_dir))
            .join(format!("card{}.html", id.work_id))
    }

    /// Fresh walk over every recognized work file
    ///
    /// Each call restarts from the top of the tree. Entries that cannot be
    /// loaded come through as `Err` (already logged) so callers can count them.
    pub fn records(&self) -> impl Iterator<Item = Result<WorkRecord, SourceError>> + '_ {
        self.body_files().map(move |(id, body_path)| {
            let record = self.load(id, body_path);
            if let Err(e) = &record {
                warn!("Skipping {}: {}", id, e);
            }
            record
        })
    }

    fn body_files(&self) -> impl Iterator<Item = (WorkId, PathBuf)> {
        WalkDir::new(&self.cards)
            .min_depth(3)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Error accessing entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.into_path();
                work_id_of(&path).map(|id| (id, path))
            })
    }

    fn load(&self, id: WorkId, body_path: PathBuf) -> Result<WorkRecord, SourceError> {
        // Card sits next to the body's `files` directory
        let card_path = body_path
            .parent()
            .and_then(Path::parent)
            .map(|dir| dir.join(format!("card{}.html", id.work_id)))
            .unwrap_or_else(|| self.card_path(&id));

        if !card_path.is_file() {
            return Err(SourceError::MissingCard { id, path: card_path });
        }

        let card = read_page(&card_path)?;
        let body = read_page(&body_path)?;

        Ok(WorkRecord {
            id,
            card_path,
            body_path,
            card,
            body,
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// `cards/<digits>/files/<digits>_<digits>.html` → id
fn work_id_of(path: &Path) -> Option<WorkId> {
    if path.extension()? != "html" {
        return None;
    }

    let files_dir = path.parent()?;
    if files_dir.file_name()? != "files" {
        return None;
    }

    let author = files_dir.parent()?.file_name()?.to_str()?;
    if author.is_empty() || !author.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    let caps = BODY_STEM.captures(stem)?;

    Some(WorkId {
        author_dir: author.parse().ok()?,
        work_id: caps[1].parse().ok()?,
        revision: caps[2].parse().ok()?,
    })
}

fn read_page(path: &Path) -> Result<String, SourceError> {
    fs::read(path)
        .map(|bytes| decode_page(&bytes))
        .map_err(|source| SourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode an archive page to UTF-8
///
/// A `charset=` declaration in the head wins. Otherwise valid UTF-8 is taken
/// as-is and anything else is read as Shift_JIS (CP932). Invalid sequences
/// become U+FFFD.
pub fn decode_page(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(CHARSET_SNIFF_LEN)];

    let declared = CHARSET
        .captures(head)
        .and_then(|caps| Encoding::for_label(&caps[1]));

    if let Some(encoding) = declared {
        let (text, _) = encoding.decode_with_bom_removal(bytes);
        return text.into_owned();
    }

    let without_bom = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(without_bom) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
            if had_errors {
                debug!("Replaced invalid Shift_JIS sequences");
            }
            text.into_owned()
        }
    }
}
