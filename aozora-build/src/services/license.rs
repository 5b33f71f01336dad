//! License descriptor parsing and the inclusion policy
//!
//! A work is persisted when it has no copyright, or when it is published under
//! a Creative Commons license that carries neither the No-Derivatives nor the
//! Share-Alike restriction. Parsing the license field is pluggable: the archive
//! mostly links a creativecommons.org deed, but free-text notices exist too.

use crate::models::{CopyrightStatus, LicenseDescriptor, LicenseFlag, Rights, WorkEntry};
use crate::services::html;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Turns a raw license field into a flag set
pub trait LicenseParser: Send + Sync {
    /// Empty descriptor when no Creative Commons marker is recognized
    fn parse(&self, raw: &str) -> LicenseDescriptor;
}

static CC_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)creativecommons\.org/(?:licenses/([a-z-]+)|publicdomain/)").expect("valid CC url pattern")
});

static CC_TEXT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bCC\b|creative\s*commons|クリエイティブ・?コモンズ").expect("valid CC text pattern")
});

static ND_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bND\b|no\s*-?\s*deriv|改変禁止").expect("valid ND pattern"));

static SA_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSA\b|share\s*-?\s*alike|継承").expect("valid SA pattern"));

/// creativecommons.org deed URLs (`.../licenses/by-nc-sa/2.1/jp/`)
#[derive(Debug, Default, Clone, Copy)]
pub struct CreativeCommonsUrl;

impl LicenseParser for CreativeCommonsUrl {
    fn parse(&self, raw: &str) -> LicenseDescriptor {
        let Some(caps) = CC_URL.captures(raw) else {
            return LicenseDescriptor::empty();
        };

        let mut descriptor = LicenseDescriptor::from_flags([LicenseFlag::Cc]);
        if let Some(terms) = caps.get(1) {
            for term in terms.as_str().split('-') {
                match term.to_ascii_lowercase().as_str() {
                    "nd" => descriptor.insert(LicenseFlag::Nd),
                    "sa" => descriptor.insert(LicenseFlag::Sa),
                    _ => {}
                }
            }
        }
        descriptor
    }
}

/// Free-text notices (`CC BY-NC-ND 4.0`, `クリエイティブ・コモンズ 表示-継承`)
#[derive(Debug, Default, Clone, Copy)]
pub struct CreativeCommonsText;

impl LicenseParser for CreativeCommonsText {
    fn parse(&self, raw: &str) -> LicenseDescriptor {
        if !CC_TEXT_MARKER.is_match(raw) {
            return LicenseDescriptor::empty();
        }

        let mut descriptor = LicenseDescriptor::from_flags([LicenseFlag::Cc]);
        if ND_TEXT.is_match(raw) {
            descriptor.insert(LicenseFlag::Nd);
        }
        if SA_TEXT.is_match(raw) {
            descriptor.insert(LicenseFlag::Sa);
        }
        descriptor
    }
}

/// URL form first, free text as fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLicenseParser;

impl LicenseParser for DefaultLicenseParser {
    fn parse(&self, raw: &str) -> LicenseDescriptor {
        let from_url = CreativeCommonsUrl.parse(raw);
        if !from_url.is_empty() {
            return from_url;
        }
        CreativeCommonsText.parse(raw)
    }
}

static REL_LINK: Lazy<Selector> = Lazy::new(|| html::selector("a[rel][href]"));
static NOTICE: Lazy<Selector> = Lazy::new(|| html::selector("div.license"));

/// `href` of the first `<a rel="license">` in a page
pub fn license_link(page: &Html) -> Option<String> {
    page.select(&REL_LINK).find_map(|a| {
        let el = a.value();
        let is_license = el.attr("rel").is_some_and(|rel| html::has_token(rel, "license"));
        if is_license {
            el.attr("href").map(|href| href.trim().to_string())
        } else {
            None
        }
    })
}

/// Free-text license notice (`<div class="license">`), when a page has one
pub fn license_notice(page: &Html) -> Option<String> {
    page.select(&NOTICE)
        .next()
        .map(|el| html::visible_text(el).trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether the policy admits these rights
pub fn permits(rights: &Rights) -> bool {
    match rights.status {
        CopyrightStatus::NoCopyright => true,
        CopyrightStatus::Copyrighted => {
            let license = &rights.license;
            license.contains(LicenseFlag::Cc)
                && !license.contains(LicenseFlag::Nd)
                && !license.contains(LicenseFlag::Sa)
        }
    }
}

/// Inclusion policy for a normalized entry
pub fn include(entry: &WorkEntry) -> bool {
    permits(&entry.metadata.rights)
}
