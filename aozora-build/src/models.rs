//! Data model for one build run
//!
//! `WorkRecord` is what the source reader yields (raw, decoded pages);
//! `WorkEntry` is the normalized form handed to the license filter and the
//! database writer. Neither outlives the run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Identity of one body file in the archive
///
/// Derived from `cards/<author>/files/<work_id>_<revision>.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkId {
    /// Author directory number (`cards/000879` → 879)
    pub author_dir: u32,
    /// Archive-wide work id (作品ID)
    pub work_id: u32,
    /// Body file revision
    pub revision: u32,
}

impl WorkId {
    /// Primary key of the `works` row
    pub fn key(&self) -> String {
        format!("{}_{}", self.work_id, self.revision)
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}/{}_{}", self.author_dir, self.work_id, self.revision)
    }
}

/// Raw per-work record produced by the source reader
#[derive(Debug, Clone)]
pub struct WorkRecord {
    pub id: WorkId,
    pub card_path: PathBuf,
    pub body_path: PathBuf,
    /// Decoded card page (図書カード)
    pub card: String,
    /// Decoded body page
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyrightStatus {
    NoCopyright,
    Copyrighted,
}

impl CopyrightStatus {
    pub fn is_copyrighted(self) -> bool {
        matches!(self, CopyrightStatus::Copyrighted)
    }
}

/// Creative Commons flags relevant to the inclusion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LicenseFlag {
    /// Creative Commons license present
    Cc,
    /// No-Derivatives restriction
    Nd,
    /// Share-Alike restriction
    Sa,
}

/// Set of license flags; empty when no Creative Commons marker was found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseDescriptor {
    flags: BTreeSet<LicenseFlag>,
}

impl LicenseDescriptor {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_flags<I: IntoIterator<Item = LicenseFlag>>(flags: I) -> Self {
        Self {
            flags: flags.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, flag: LicenseFlag) {
        self.flags.insert(flag);
    }

    pub fn contains(&self, flag: LicenseFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Copyright status plus the license it was published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rights {
    pub status: CopyrightStatus,
    pub license: LicenseDescriptor,
    /// License URL or text as found in the pages
    pub license_source: Option<String>,
}

impl Rights {
    pub fn public_domain() -> Self {
        Self {
            status: CopyrightStatus::NoCopyright,
            license: LicenseDescriptor::empty(),
            license_source: None,
        }
    }
}

/// Credited role of a person on a card (作家データ 分類)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorRole {
    Author,
    Editor,
    Translator,
    Proofreader,
    Other,
}

impl AuthorRole {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "著者" => AuthorRole::Author,
            "編者" => AuthorRole::Editor,
            "翻訳者" => AuthorRole::Translator,
            "校訂者" => AuthorRole::Proofreader,
            _ => AuthorRole::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthorRole::Author => "author",
            AuthorRole::Editor => "editor",
            AuthorRole::Translator => "translator",
            AuthorRole::Proofreader => "proofreader",
            AuthorRole::Other => "other",
        }
    }
}

/// Per-work columns of the archive index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedWork {
    /// 作品著作権フラグ; `None` when the column holds neither あり nor なし
    pub copyright: Option<CopyrightStatus>,
    /// ソート用読み
    pub sort_reading: Option<String>,
}

/// Per-person columns of the archive index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPerson {
    pub surname: String,
    pub given_name: Option<String>,
    /// 姓読みソート用 + 名読みソート用
    pub sort_reading: Option<String>,
    /// 人物著作権フラグ is なし
    pub copyright_expired: Option<bool>,
}

/// Person credited on a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Archive person id (人物ID)
    pub id: u32,
    pub role: AuthorRole,
    pub name: String,
    pub name_reading: String,
    pub name_roman: String,
    pub birth: Option<String>,
    pub death: Option<String>,
    /// Name split and sort reading, when the index lists this person
    pub indexed: Option<IndexedPerson>,
}

impl Person {
    /// Reading used for `name_key`
    pub fn key_reading(&self) -> &str {
        self.indexed
            .as_ref()
            .and_then(|p| p.sort_reading.as_deref())
            .unwrap_or(&self.name_reading)
    }
}

/// タイトルデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleInfo {
    pub title: String,
    pub title_reading: String,
    /// Index sort reading (ソート用読み), preferred for `title_key`
    pub sort_reading: Option<String>,
    pub subtitle: Option<String>,
    pub subtitle_reading: Option<String>,
    pub original_title: Option<String>,
    pub anthology: Option<String>,
    pub anthology_reading: Option<String>,
    /// Primary author's person id (著者名 link)
    pub author_id: u32,
    /// Primary author's name as shown in the title table
    pub author_name: String,
}

/// Structured card metadata for one work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkMetadata {
    pub title: TitleInfo,
    /// NDC category numbers
    pub categories: Vec<u32>,
    /// Orthography (文字遣い種別)
    pub style: Option<String>,
    pub note: Option<String>,
    /// First publication (初出)
    pub first_published: Option<String>,
    pub people: Vec<Person>,
    pub rights: Rights,
}

impl TitleInfo {
    /// Reading used for `title_key`
    pub fn key_reading(&self) -> &str {
        self.sort_reading.as_deref().unwrap_or(&self.title_reading)
    }
}

impl WorkMetadata {
    /// Display name of the primary author
    ///
    /// Prefers the person table entry, falling back to the title table text.
    pub fn author_name(&self) -> &str {
        self.people
            .iter()
            .find(|p| p.id == self.title.author_id)
            .map(|p| p.name.as_str())
            .unwrap_or(&self.title.author_name)
    }
}

/// Body text after markup removal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Body region markup as serialized by the HTML parser (stored compressed)
    pub body_raw: String,
    /// Plain text keeping ruby base text
    pub rb_major: String,
    /// Plain text keeping ruby readings
    pub rt_major: String,
    /// Colophon markup, serialized the same way (stored compressed)
    pub colophon_raw: String,
    pub colophon_text: String,
}

/// Normalized work ready for filtering and persistence
#[derive(Debug, Clone)]
pub struct WorkEntry {
    pub id: WorkId,
    pub metadata: WorkMetadata,
    pub text: NormalizedText,
}

impl WorkEntry {
    pub fn new(id: WorkId, metadata: WorkMetadata, text: NormalizedText) -> Self {
        Self { id, metadata, text }
    }

    pub fn title(&self) -> &str {
        &self.metadata.title.title
    }

    pub fn author(&self) -> &str {
        self.metadata.author_name()
    }

    pub fn copyright_status(&self) -> CopyrightStatus {
        self.metadata.rights.status
    }

    pub fn license(&self) -> &LicenseDescriptor {
        &self.metadata.rights.license
    }
}
