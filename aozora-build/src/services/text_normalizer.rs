//! Body text normalization
//!
//! Markup removal is an ordered list of pattern → replacement rules applied to
//! the body region of an archive page. Two rule sets exist: one keeps ruby base
//! text ("rb major"), the other keeps ruby readings ("rt major"). Normalization
//! never fails; markup no rule recognizes is removed by the generic tag rule.
//!
//! Bracket notation (`《》`, `｜`, `［＃］`) is only rewritten when the page has
//! no `div.main_text`. Inside an XHTML body those characters are literal text.

use crate::models::NormalizedText;
use crate::services::html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::borrow::Cow;

/// What a rule puts in place of a match
#[derive(Clone, Copy)]
pub enum Replacement {
    /// Regex replacement template (`$1` etc.)
    Template(&'static str),
    /// Computed from the captures
    With(fn(&Captures) -> String),
}

/// One pattern → replacement step
#[derive(Clone)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl Rule {
    pub fn new(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self {
            name,
            // Rule patterns are compile-time literals
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern for rule {}: {}", name, e)),
            replacement,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.replacement {
            Replacement::Template(template) => self.pattern.replace_all(text, template),
            Replacement::With(f) => self.pattern.replace_all(text, |caps: &Captures| f(caps)),
        }
    }
}

/// Ordered rules, applied first to last
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Keeps the ruby base text
    pub fn rb_major(markup: BodyMarkup) -> Self {
        Self::build(ruby_base, markup.select(&[], PLAIN_NOTATION_BASE))
    }

    /// Keeps the ruby reading
    pub fn rt_major(markup: BodyMarkup) -> Self {
        Self::build(ruby_reading, markup.select(&[], PLAIN_NOTATION_READING))
    }

    fn build(ruby: fn(&Captures) -> String, plain_notation: NotationRules) -> Self {
        let mut rules = vec![
            Rule::new("ruby", r"(?is)<ruby\b[^>]*>(.*?)</ruby>", Replacement::With(ruby)),
            Rule::new("gaiji", r"(?is)<img\b[^>]*\bgaiji\b[^>]*>", Replacement::With(gaiji)),
            Rule::new("images", r"(?is)<img\b[^>]*>", Replacement::Template("")),
            Rule::new(
                "notes",
                r#"(?is)<span\b[^>]*\bclass\s*=\s*["']notes["'][^>]*>.*?</span>"#,
                Replacement::Template(""),
            ),
            Rule::new("source line breaks", r"\r?\n|\r", Replacement::Template("")),
            Rule::new("br", r"(?i)<br\b[^>]*>", Replacement::Template("\n")),
            Rule::new("tags", r"(?s)<!--.*?-->|<[^>]*>", Replacement::Template("")),
            Rule::new(
                "entities",
                r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);",
                Replacement::With(entities),
            ),
        ];

        for &(name, pattern, template) in plain_notation {
            rules.push(Rule::new(name, pattern, Replacement::Template(template)));
        }

        rules.push(Rule::new("trailing spaces", r"(?m)[ \t\x{3000}]+$", Replacement::Template("")));
        rules.push(Rule::new("outer blank lines", r"\A\n+|\n+\z", Replacement::Template("")));

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc).into_owned())
    }
}

/// How the located body encodes ruby and annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMarkup {
    /// `div.main_text`: ruby is `<ruby>` markup, so `《》` and `｜` are literal text
    Xhtml,
    /// No `div.main_text`: bracket notation may still be present
    PlainText,
}

type NotationRules = &'static [(&'static str, &'static str, &'static str)];

impl BodyMarkup {
    fn select(self, xhtml: NotationRules, plain: NotationRules) -> NotationRules {
        match self {
            BodyMarkup::Xhtml => xhtml,
            BodyMarkup::PlainText => plain,
        }
    }
}

/// Bracket notation (`｜base《reading》`, `漢字《reading》`, `［＃…］`), base kept
const PLAIN_NOTATION_BASE: &[(&str, &str, &str)] = &[
    ("plain ruby with marker", r"｜([^｜《》\n]+)《[^《》\n]*》", "$1"),
    ("plain ruby", r"《[^《》\n]*》", ""),
    ("annotations", r"［＃[^］\n]*］", ""),
    ("ruby start marker", r"｜", ""),
];

/// Bracket notation, reading kept
const PLAIN_NOTATION_READING: &[(&str, &str, &str)] = &[
    ("plain ruby with marker", r"｜[^｜《》\n]+《([^《》\n]*)》", "$1"),
    ("plain ruby", r"[\p{Han}々〆ヵヶ]+《([^《》\n]*)》", "$1"),
    ("plain ruby leftover", r"《[^《》\n]*》", ""),
    ("annotations", r"［＃[^］\n]*］", ""),
    ("ruby start marker", r"｜", ""),
];

static RB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<rb\b[^>]*>(.*?)</rb>").expect("valid rb pattern"));
static RT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<rt\b[^>]*>(.*?)</rt>").expect("valid rt pattern"));
static RT_RP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<rt\b[^>]*>.*?</rt>|<rp\b[^>]*>.*?</rp>").expect("valid rt/rp pattern"));
static CODE_POINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"U\+([0-9A-Fa-f]{4,6})").expect("valid code point pattern"));

fn ruby_base(caps: &Captures) -> String {
    let inner = &caps[1];
    let base = match RB.captures(inner) {
        Some(rb) => rb[1].to_string(),
        None => RT_RP.replace_all(inner, "").into_owned(),
    };
    html::strip_tags(&base)
}

fn ruby_reading(caps: &Captures) -> String {
    let inner = &caps[1];
    match RT.captures(inner) {
        Some(rt) => html::strip_tags(&rt[1]),
        None => ruby_base(caps),
    }
}

fn gaiji(caps: &Captures) -> String {
    html::attribute(&caps[0], "alt")
        .and_then(|alt| CODE_POINT.captures(alt))
        .and_then(|cp| u32::from_str_radix(&cp[1], 16).ok())
        .and_then(char::from_u32)
        .unwrap_or('\u{FFFD}')
        .to_string()
}

fn entities(caps: &Captures) -> String {
    html::decode_entities(&caps[0])
}

/// Produces both plain-text renditions and the colophon of a body page
#[derive(Clone)]
pub struct TextNormalizer {
    rb_major: RuleSet,
    rt_major: RuleSet,
    rb_major_plain: RuleSet,
    rt_major_plain: RuleSet,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            rb_major: RuleSet::rb_major(BodyMarkup::Xhtml),
            rt_major: RuleSet::rt_major(BodyMarkup::Xhtml),
            rb_major_plain: RuleSet::rb_major(BodyMarkup::PlainText),
            rt_major_plain: RuleSet::rt_major(BodyMarkup::PlainText),
        }
    }

    pub fn normalize(&self, page: &str) -> NormalizedText {
        let doc = Html::parse_document(page);
        let body = body_region(&doc);
        let (colophon_raw, colophon_text) = colophon(&doc);

        let (rb_major, rt_major) = match body.markup {
            BodyMarkup::Xhtml => (&self.rb_major, &self.rt_major),
            BodyMarkup::PlainText => (&self.rb_major_plain, &self.rt_major_plain),
        };

        NormalizedText {
            rb_major: rb_major.apply(&body.inner),
            rt_major: rt_major.apply(&body.inner),
            body_raw: body.outer,
            colophon_raw,
            colophon_text,
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

static MAIN_TEXT: Lazy<Selector> = Lazy::new(|| html::selector("div.main_text"));
static BODY: Lazy<Selector> = Lazy::new(|| html::selector("body"));
static BIBLIOGRAPHY: Lazy<Selector> = Lazy::new(|| html::selector("div.bibliographical_information"));
static AFTER_TEXT: Lazy<Selector> = Lazy::new(|| html::selector("div.after_text"));

/// Serialized body region
struct BodyRegion {
    outer: String,
    inner: String,
    markup: BodyMarkup,
}

/// `div.main_text`, else `<body>`
fn body_region(doc: &Html) -> BodyRegion {
    if let Some(main) = doc.select(&MAIN_TEXT).next() {
        return BodyRegion {
            outer: main.html(),
            inner: main.inner_html(),
            markup: BodyMarkup::Xhtml,
        };
    }

    // The parser always synthesizes a body element
    let (outer, inner) = doc
        .select(&BODY)
        .next()
        .map(|body| (body.html(), body.inner_html()))
        .unwrap_or_default();
    BodyRegion {
        outer,
        inner,
        markup: BodyMarkup::PlainText,
    }
}

fn colophon(doc: &Html) -> (String, String) {
    match html::first(doc, &[&*BIBLIOGRAPHY, &*AFTER_TEXT]) {
        Some(el) => {
            let text = html::visible_text(el)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (el.html(), text)
        }
        None => (String::new(), String::new()),
    }
}
