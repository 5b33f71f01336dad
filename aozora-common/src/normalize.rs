//! Reading and text normalization
//!
//! `normalize_reading` turns a kana reading into a search/sort key: hiragana is
//! folded onto katakana, small kana onto their full-size forms, voiced and
//! semi-voiced marks are removed and anything that is not kana or a digit is
//! dropped. `normalize_text` canonicalizes whitespace in single-line fields
//! taken from card pages.

use unicode_normalization::UnicodeNormalization;

const HIRAGANA_FIRST: u32 = 0x3041;
const HIRAGANA_LAST: u32 = 0x3096;
const KATAKANA_OFFSET: u32 = 0x30A1 - 0x3041;
const KATAKANA_FIRST: char = '\u{30A1}';
const KATAKANA_LAST: char = '\u{30F6}';

/// Per-character folds. `ヴ` sequences are not special: `ヴァ` becomes `フア`.
const KATAKANA_FOLDS: &[(char, char)] = &[
    ('ァ', 'ア'),
    ('ィ', 'イ'),
    ('ゥ', 'ウ'),
    ('ェ', 'エ'),
    ('ォ', 'オ'),
    ('ッ', 'ツ'),
    ('ャ', 'ヤ'),
    ('ュ', 'ユ'),
    ('ョ', 'ヨ'),
    ('ヵ', 'カ'),
    ('ヶ', 'ケ'),
    ('ヰ', 'イ'),
    ('ヱ', 'エ'),
    ('ヲ', 'オ'),
    ('ヂ', 'ジ'),
    ('ヅ', 'ズ'),
    ('ヴ', 'ブ'),
];

fn hiragana_to_katakana(c: char) -> char {
    let code = c as u32;
    if (HIRAGANA_FIRST..=HIRAGANA_LAST).contains(&code) {
        char::from_u32(code + KATAKANA_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

fn fold_katakana(c: char) -> char {
    KATAKANA_FOLDS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

fn is_key_char(c: char) -> bool {
    (KATAKANA_FIRST..=KATAKANA_LAST).contains(&c) || c.is_ascii_digit()
}

/// Normalize a kana reading into a sort key
///
/// `"あくたがわ りゅうのすけ"` becomes `"アクタカワリユウノスケ"`. Small kana
/// are folded before `ヴ`, so `"ヴェ"` keys as `"フエ"` rather than `"ヘ"`.
pub fn normalize_reading(text: &str) -> String {
    let kept: String = text
        .nfkc()
        .map(hiragana_to_katakana)
        .map(fold_katakana)
        .filter(|c| is_key_char(*c))
        .collect();

    // Decompose, drop combining (semi-)voiced marks, recompose
    let unvoiced: String = kept
        .nfkd()
        .filter(|c| *c != '\u{3099}' && *c != '\u{309A}')
        .collect();

    unvoiced.nfkc().collect()
}

/// Canonicalize whitespace in a single-line field
///
/// Line breaks and tabs become spaces, runs of ASCII spaces collapse to one,
/// and the result is trimmed. Ideographic spaces are kept as written.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}
