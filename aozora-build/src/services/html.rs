//! Markup helpers for archive pages
//!
//! Element lookup goes through an HTML5 parser (`scraper`), so nesting and
//! implied end tags are resolved the way a browser would. The rule-based text
//! normalizer still works on serialized markup; the string helpers at the end
//! of this module serve its rule callbacks.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Node, Selector};

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute pattern")
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("valid strip pattern"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").expect("valid entity pattern"));

/// Compile a selector literal
pub fn selector(css: &str) -> Selector {
    // Selector literals are fixed in source
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {}: {:?}", css, e))
}

/// First element matching any of `selectors`, tried in order
pub fn first<'a>(doc: &'a Html, selectors: &[&Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| doc.select(s).next())
}

/// Direct element children with the given tag name (rows, cells)
pub fn child_elements<'a>(parent: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name().eq_ignore_ascii_case(tag))
}

/// Visible text of an element: text nodes in order, `<br>` as newline
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Whether a whitespace-separated attribute value contains `token`
pub fn has_token(value: &str, token: &str) -> bool {
    value.split_whitespace().any(|t| t.eq_ignore_ascii_case(token))
}

/// Read one attribute from the text of a single tag
pub fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    ATTRIBUTE.captures_iter(tag).find_map(|caps| {
        if caps[1].eq_ignore_ascii_case(name) {
            caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
        } else {
            None
        }
    })
}

/// Decode character references and the common named entities
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00A0}'),
                    _ => None,
                }
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Remove every tag and comment from serialized markup
pub fn strip_tags(markup: &str) -> String {
    ANY_TAG.replace_all(markup, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_divs_resolve_to_the_outer_element() {
        let doc = Html::parse_document(
            r#"<body><div class="main_text">a<div class="jisage">b</div>c</div><div>tail</div></body>"#,
        );
        let main = first(&doc, &[&selector("div.main_text")]).unwrap();
        assert_eq!(main.inner_html(), r#"a<div class="jisage">b</div>c"#);
        assert_eq!(visible_text(main), "abc");
    }

    #[test]
    fn test_first_tries_selectors_in_order() {
        let doc = Html::parse_document(r#"<div class="after_text">後</div><div class="bibliographical_information">底本</div>"#);
        let biblio = selector("div.bibliographical_information");
        let after = selector("div.after_text");
        assert_eq!(visible_text(first(&doc, &[&biblio, &after]).unwrap()), "底本");
        assert!(first(&doc, &[&selector("div.license")]).is_none());
    }

    #[test]
    fn test_child_cells_and_visible_text() {
        let doc = Html::parse_document(
            "<table><tr><td>作品名：</td><td>羅生門<br />らしょうもん</td></tr><tr><td>a</td></tr></table>",
        );
        let rows: Vec<_> = doc.select(&selector("tr")).collect();
        assert_eq!(rows.len(), 2);
        let cells: Vec<_> = child_elements(rows[0], "td").map(visible_text).collect();
        assert_eq!(cells, vec!["作品名：", "羅生門\nらしょうもん"]);
    }

    #[test]
    fn test_attribute_reads_either_quote_style() {
        assert_eq!(attribute(r#"<img class="gaiji" alt='※(U+5F45)'>"#, "alt"), Some("※(U+5F45)"));
        assert_eq!(attribute(r#"<a rel="license">"#, "href"), None);
        assert!(has_token("license nofollow", "LICENSE"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;a&gt; &amp; &#12354;&#x3044; &unknown;"), "<a> & あい &unknown;");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>一行目</p><!-- c --><rt>二</rt>"), "一行目二");
    }
}
