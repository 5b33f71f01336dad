//! Source archive fixtures
//!
//! Writes a minimal `cards/<author>/...` tree: one card page (UTF-8) and one
//! Shift_JIS body page per work, plus an optional zipped person/work index.

use aozora_build::services::archive_index::{INDEX_CSV, INDEX_ZIP};
use aozora_common::config::BuildConfig;
use encoding_rs::SHIFT_JIS;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Header of the index CSV, trimmed to the columns the build reads
pub const INDEX_HEADER: &str =
    "作品ID,作品名,ソート用読み,作品著作権フラグ,人物ID,姓,名,姓読みソート用,名読みソート用,役割フラグ,人物著作権フラグ";

/// One work to place in the archive
#[derive(Debug, Clone)]
pub struct WorkFixture {
    pub author_dir: u32,
    pub work_id: u32,
    pub revision: u32,
    /// `None` leaves the 作品名 row out of the card
    pub title: Option<String>,
    pub copyrighted: bool,
    pub license_url: Option<String>,
    pub body: String,
}

impl WorkFixture {
    pub fn public_domain(work_id: u32, title: &str) -> Self {
        Self {
            author_dir: 879,
            work_id,
            revision: 1,
            title: Some(title.to_string()),
            copyrighted: false,
            license_url: None,
            body: "<ruby><rb>羅生門</rb><rp>（</rp><rt>らしょうもん</rt><rp>）</rp></ruby>の下で雨やみを待っていた。".to_string(),
        }
    }

    pub fn licensed(work_id: u32, title: &str, license_url: &str) -> Self {
        Self {
            copyrighted: true,
            license_url: Some(license_url.to_string()),
            ..Self::public_domain(work_id, title)
        }
    }

    pub fn without_title(work_id: u32) -> Self {
        Self {
            title: None,
            ..Self::public_domain(work_id, "")
        }
    }

    pub fn card_html(&self) -> String {
        let title_row = match &self.title {
            Some(title) if self.copyrighted => format!(
                "<tr><td class=\"header\">作品名：</td><td><font size=\"+2\"><strong>{}</strong></font><font color=\"red\">【著作権存続】</font></td></tr>",
                title
            ),
            Some(title) => format!(
                "<tr><td class=\"header\">作品名：</td><td><font size=\"+2\"><strong>{}</strong></font></td></tr>",
                title
            ),
            None => String::new(),
        };
        let license = self
            .license_url
            .as_deref()
            .map(|url| format!("<a rel=\"license\" href=\"{}\"><img alt=\"クリエイティブ・コモンズ・ライセンス\" /></a>", url))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html><head><meta http-equiv="Content-Type" content="text/html;charset=UTF-8" /><title>図書カード</title></head>
<body>
<table summary="タイトルデータ">
{title_row}
<tr><td class="header">作品名読み：</td><td>てすと</td></tr>
<tr><td class="header">著者名：</td><td><a href="../../index_pages/person{author}.html">芥川 竜之介</a></td></tr>
</table>
<table summary="作品データ">
<tr><td class="header">分類：</td><td>NDC 913</td></tr>
<tr><td class="header">文字遣い種別：</td><td>新字新仮名</td></tr>
</table>
<table summary="作家データ">
<tr><td class="header">分類：</td><td>著者</td></tr>
<tr><td class="header">作家名：</td><td><a href="../../index_pages/person{author}.html">芥川 竜之介</a></td></tr>
<tr><td class="header">作家名読み：</td><td>あくたがわ りゅうのすけ</td></tr>
<tr><td class="header">ローマ字表記：</td><td>Akutagawa, Ryunosuke</td></tr>
</table>
{license}
</body></html>
"#,
            title_row = title_row,
            author = self.author_dir,
            license = license
        )
    }

    pub fn body_html(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="Shift_JIS"?>
<html><head><meta http-equiv="Content-Type" content="text/html;charset=Shift_JIS" /></head>
<body>
<div class="main_text"><br />
{}<br />
</div>
<div class="bibliographical_information">
<hr />
底本：「テスト全集」<br />
</div>
</body></html>
"#,
            self.body
        )
    }
}

/// Temporary source archive plus output location
pub struct ArchiveBuilder {
    dir: TempDir,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn repo_path(&self) -> PathBuf {
        self.dir.path().join("aozorabunko")
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join("out").join("aozora.db")
    }

    pub fn config(&self) -> BuildConfig {
        BuildConfig {
            repo_path: self.repo_path(),
            output_path: self.output_path(),
        }
    }

    pub fn add(&self, work: &WorkFixture) -> &Self {
        let author = self.repo_path().join("cards").join(format!("{:06}", work.author_dir));
        write(&author.join(format!("card{}.html", work.work_id)), work.card_html().as_bytes());

        let body_html = work.body_html();
        let (body, _, _) = SHIFT_JIS.encode(&body_html);
        write(
            &author.join("files").join(format!("{}_{}.html", work.work_id, work.revision)),
            &body,
        );
        self
    }

    /// `index_pages/list_person_all_extended_utf8.zip` with the given CSV rows
    pub fn write_index(&self, rows: &[&str]) -> &Self {
        let path = self.repo_path().join(INDEX_ZIP);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");

        let mut csv = format!("\u{FEFF}{}\r\n", INDEX_HEADER);
        for row in rows {
            csv.push_str(row);
            csv.push_str("\r\n");
        }

        let mut zip = zip::ZipWriter::new(File::create(&path).expect("create index"));
        zip.start_file(INDEX_CSV, SimpleFileOptions::default()).expect("start entry");
        zip.write_all(csv.as_bytes()).expect("write index");
        zip.finish().expect("finish index");
        self
    }

    /// Body file without a card page
    pub fn add_orphan_body(&self, author_dir: u32, work_id: u32, revision: u32) -> &Self {
        let path = self
            .repo_path()
            .join("cards")
            .join(format!("{:06}", author_dir))
            .join("files")
            .join(format!("{}_{}.html", work_id, revision));
        write(&path, b"<html></html>");
        self
    }
}

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, bytes).expect("write fixture");
}
