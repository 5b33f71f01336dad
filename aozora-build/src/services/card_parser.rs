//! Card page (図書カード) parser
//!
//! Reads the title, work and person tables of a card page into
//! [`WorkMetadata`], joins in the archive index columns for the work and its
//! people, and resolves copyright status and license.

use crate::models::{
    AuthorRole, CopyrightStatus, LicenseDescriptor, Person, Rights, TitleInfo, WorkMetadata, WorkRecord,
};
use crate::services::archive_index::ArchiveIndex;
use crate::services::html;
use crate::services::license::{self, DefaultLicenseParser, LicenseParser};
use aozora_common::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::trace;

/// Card page errors. The driver skips the work; the run continues.
#[derive(Debug, Error)]
pub enum MalformedMetadataError {
    #[error("Card has no {0} table")]
    MissingTable(&'static str),

    #[error("Card has no {0} field")]
    MissingField(&'static str),

    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

const TITLE_TABLE: &str = "タイトルデータ";

/// Archive marker for works still under copyright
const COPYRIGHT_MARKER: &str = "著作権存続";

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| html::selector(r#"table[summary="タイトルデータ"]"#));
static WORK_SELECTOR: Lazy<Selector> = Lazy::new(|| html::selector(r#"table[summary="作品データ"]"#));
static PERSON_SELECTOR: Lazy<Selector> = Lazy::new(|| html::selector(r#"table[summary="作家データ"]"#));
static ROW: Lazy<Selector> = Lazy::new(|| html::selector("tr"));
static LINK: Lazy<Selector> = Lazy::new(|| html::selector("a[href]"));

static PERSON_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"person(\d+)\.html").expect("valid person pattern"));

static CATEGORY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^K?(\d+)$").expect("valid category pattern"));

static TITLE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[【\[]?著作権存続[】\]]?").expect("valid copyright marker pattern"));

/// One `<td>label：</td><td>value</td>` row
struct Field<'a> {
    label: String,
    value: ElementRef<'a>,
}

impl Field<'_> {
    fn text(&self) -> String {
        normalize_text(&html::visible_text(self.value))
    }

    fn optional_text(&self) -> Option<String> {
        Some(self.text()).filter(|t| !t.is_empty())
    }
}

fn fields(table: ElementRef<'_>) -> Vec<Field<'_>> {
    table
        .select(&ROW)
        .filter_map(|row| {
            let mut cells = html::child_elements(row, "td");
            let (label, value) = (cells.next()?, cells.next()?);
            let label = normalize_text(&html::visible_text(label));
            let label = label.trim_end_matches(&['：', ':'][..]).trim().to_string();
            Some(Field { label, value })
        })
        .collect()
}

/// First `person<id>.html` link under an element
fn person_id(element: ElementRef<'_>) -> Option<u32> {
    element
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| PERSON_LINK.captures(href).and_then(|caps| caps[1].parse::<u32>().ok()))
}

/// `NDC 913 K914` → `[913, 914]`
fn parse_categories(value: &str) -> Result<Vec<u32>, MalformedMetadataError> {
    let value = value.trim();
    let value = value.strip_prefix("NDC").unwrap_or(value);

    value
        .split_whitespace()
        .map(|token| {
            CATEGORY
                .captures(token)
                .and_then(|caps| caps[1].parse::<u32>().ok())
                .ok_or_else(|| MalformedMetadataError::InvalidField {
                    field: "分類",
                    value: token.to_string(),
                })
        })
        .collect()
}

/// Parses card pages into work metadata
pub struct CardParser {
    license_parser: Box<dyn LicenseParser>,
}

impl CardParser {
    pub fn new() -> Self {
        Self::with_license_parser(Box::new(DefaultLicenseParser))
    }

    pub fn with_license_parser(license_parser: Box<dyn LicenseParser>) -> Self {
        Self { license_parser }
    }

    pub fn parse(&self, record: &WorkRecord, index: &ArchiveIndex) -> Result<WorkMetadata, MalformedMetadataError> {
        let card = Html::parse_document(&record.card);
        let indexed = index.work(record.id.work_id);

        let title_table = card
            .select(&TITLE_SELECTOR)
            .next()
            .ok_or(MalformedMetadataError::MissingTable(TITLE_TABLE))?;
        let mut title = parse_title(title_table)?;
        title.sort_reading = indexed.and_then(|w| w.sort_reading.clone());

        let work = card
            .select(&WORK_SELECTOR)
            .next()
            .map(parse_work)
            .transpose()?
            .unwrap_or_default();

        let people = card
            .select(&PERSON_SELECTOR)
            .filter_map(parse_person)
            .map(|mut person| {
                person.indexed = index.person(person.id).cloned();
                person
            })
            .collect();

        let rights = self.rights(record, &card, indexed.and_then(|w| w.copyright));

        Ok(WorkMetadata {
            title,
            categories: work.categories,
            style: work.style,
            note: work.note,
            first_published: work.first_published,
            people,
            rights,
        })
    }

    /// Index flag first, card marker when the index has none
    fn rights(&self, record: &WorkRecord, card: &Html, indexed: Option<CopyrightStatus>) -> Rights {
        let status = indexed.unwrap_or_else(|| {
            if record.card.contains(COPYRIGHT_MARKER) {
                CopyrightStatus::Copyrighted
            } else {
                CopyrightStatus::NoCopyright
            }
        });

        if status == CopyrightStatus::NoCopyright {
            return Rights::public_domain();
        }

        let license_source = license::license_link(card).or_else(|| {
            let body = Html::parse_document(&record.body);
            license::license_link(&body).or_else(|| license::license_notice(&body))
        });

        let license = license_source
            .as_deref()
            .map(|raw| self.license_parser.parse(raw))
            .unwrap_or_else(LicenseDescriptor::empty);

        Rights {
            status,
            license,
            license_source,
        }
    }
}

impl Default for CardParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_title(table: ElementRef<'_>) -> Result<TitleInfo, MalformedMetadataError> {
    let mut title = None;
    let mut title_reading = String::new();
    let mut subtitle = None;
    let mut subtitle_reading = None;
    let mut original_title = None;
    let mut anthology = None;
    let mut anthology_reading = None;
    let mut author = None;

    for field in fields(table) {
        match field.label.as_str() {
            "作品名" => {
                let text = normalize_text(&TITLE_MARKER.replace_all(&field.text(), ""));
                title = Some(text).filter(|t| !t.is_empty());
            }
            "作品名読み" => title_reading = field.text(),
            "副題" => subtitle = field.optional_text(),
            "副題読み" => subtitle_reading = field.optional_text(),
            "原題" => original_title = field.optional_text(),
            "作品集名" => anthology = field.optional_text(),
            "作品集名読み" => anthology_reading = field.optional_text(),
            "著者名" => {
                author = person_id(field.value).map(|id| (id, field.text()));
            }
            other => trace!(label = other, "Ignoring title field"),
        }
    }

    let title = title.ok_or(MalformedMetadataError::MissingField("作品名"))?;
    let (author_id, author_name) = author.ok_or(MalformedMetadataError::MissingField("著者名"))?;

    Ok(TitleInfo {
        title,
        title_reading,
        sort_reading: None,
        subtitle,
        subtitle_reading,
        original_title,
        anthology,
        anthology_reading,
        author_id,
        author_name,
    })
}

#[derive(Default)]
struct WorkData {
    categories: Vec<u32>,
    style: Option<String>,
    note: Option<String>,
    first_published: Option<String>,
}

fn parse_work(table: ElementRef<'_>) -> Result<WorkData, MalformedMetadataError> {
    let mut data = WorkData::default();

    for field in fields(table) {
        match field.label.as_str() {
            "分類" => data.categories = parse_categories(&field.text())?,
            "文字遣い種別" => data.style = field.optional_text(),
            "備考" => data.note = field.optional_text(),
            "初出" => data.first_published = field.optional_text(),
            other => trace!(label = other, "Ignoring work field"),
        }
    }

    Ok(data)
}

fn parse_person(table: ElementRef<'_>) -> Option<Person> {
    let Some(id) = person_id(table) else {
        trace!("Person table without a person link");
        return None;
    };

    let mut person = Person {
        id,
        role: AuthorRole::Other,
        name: String::new(),
        name_reading: String::new(),
        name_roman: String::new(),
        birth: None,
        death: None,
        indexed: None,
    };

    for field in fields(table) {
        match field.label.as_str() {
            "分類" => person.role = AuthorRole::from_label(&field.text()),
            "作家名" => person.name = field.text(),
            "作家名読み" => person.name_reading = field.text(),
            "ローマ字表記" => person.name_roman = field.text(),
            "生年" => person.birth = field.optional_text(),
            "没年" => person.death = field.optional_text(),
            other => trace!(label = other, "Ignoring person field"),
        }
    }

    Some(person)
}
