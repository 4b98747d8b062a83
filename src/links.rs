//! Link normalization for user-authored rich text and link fields
//!
//! Anchors without a recognized scheme get `https://` prepended and external
//! anchors open in a new tab. Only anchor tags are parsed, so loose `&` or `<`
//! in the surrounding text is fine. Everything else in the markup, including
//! anchors that already satisfy both rules, is written back byte for byte.

use log::debug;
use once_cell::sync::Lazy;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use regex::Regex;
use std::borrow::Cow;

/// Href prefixes that are left alone
const RECOGNIZED_PREFIXES: [&str; 5] = ["http://", "https://", "mailto:", "tel:", "/"];

/// Prepends `https://` unless the URL already starts with `http://` or `https://`
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Validates and normalizes a link typed by the user; blank input is rejected
pub fn parse_link_input(input: &str) -> anyhow::Result<String> {
    if input.trim().is_empty() {
        anyhow::bail!("Link inválido");
    }
    Ok(normalize_url(input))
}

fn has_recognized_prefix(href: &str) -> bool {
    RECOGNIZED_PREFIXES.iter().any(|p| href.starts_with(p))
}

/// Anchor start tags; quoted attribute values may contain `>`
static ANCHOR_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(a(?:\s(?:[^<>"']|"[^"]*"|'[^']*')*)?)>"#).expect("anchor pattern is valid")
});

enum AnchorEdit {
    Keep,
    Rewrite(String),
}

/// Rewrites anchors in `html`; returns the input unchanged if an anchor cannot be parsed
pub fn normalize_html_links(html: &str) -> String {
    match rewrite_anchors(html) {
        Some(output) => output,
        None => {
            debug!("Leaving rich text untouched, anchor markup could not be parsed");
            html.to_string()
        }
    }
}

/// Only anchor tags are parsed; text and other markup are copied as they are
fn rewrite_anchors(html: &str) -> Option<String> {
    let mut output = String::with_capacity(html.len());
    let mut last = 0;

    for captures in ANCHOR_TAG.captures_iter(html) {
        let (Some(whole), Some(content)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        output.push_str(&html[last..whole.start()]);
        match normalize_anchor(content.as_str())? {
            AnchorEdit::Keep => output.push_str(whole.as_str()),
            AnchorEdit::Rewrite(tag) => output.push_str(&tag),
        }
        last = whole.end();
    }

    output.push_str(&html[last..]);
    Some(output)
}

/// `content` is the tag text between `<` and `>`, e.g. `a href="x.com"`
fn normalize_anchor(content: &str) -> Option<AnchorEdit> {
    let (content, self_closing) = match content.strip_suffix('/') {
        Some(inner) => (inner, true),
        None => (content, false),
    };
    let tag = BytesStart::from_content(content, 1);

    let mut href: Option<String> = None;
    let mut target: Option<String> = None;
    for attr in tag.html_attributes() {
        let attr = attr.ok()?;
        let key = attr.key.as_ref();
        if key.eq_ignore_ascii_case(b"href") {
            href = Some(String::from_utf8_lossy(&attr.value).trim().to_string());
        } else if key.eq_ignore_ascii_case(b"target") {
            target = Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }

    let Some(href) = href.filter(|h| !h.is_empty()) else {
        return Some(AnchorEdit::Keep);
    };

    let new_href = if has_recognized_prefix(&href) {
        None
    } else {
        Some(format!("https://{}", href))
    };
    let final_href = new_href.as_deref().unwrap_or(&href);
    let needs_target = final_href.starts_with("http") && target.as_deref() != Some("_blank");

    if new_href.is_none() && !needs_target {
        return Some(AnchorEdit::Keep);
    }

    let name = std::str::from_utf8(tag.name().as_ref()).ok()?.to_string();
    let mut rewritten = BytesStart::new(name);
    for attr in tag.html_attributes() {
        let attr = attr.ok()?;
        let key = attr.key.as_ref();
        if key.eq_ignore_ascii_case(b"href") && new_href.is_some() {
            rewritten.push_attribute(raw_attribute(key, final_href));
        } else if key.eq_ignore_ascii_case(b"target") && needs_target {
            continue;
        } else {
            rewritten.push_attribute(raw_attribute(key, &String::from_utf8_lossy(&attr.value)));
        }
    }
    if needs_target {
        rewritten.push_attribute(raw_attribute(b"target", "_blank"));
    }

    let event = if self_closing {
        Event::Empty(rewritten)
    } else {
        Event::Start(rewritten)
    };
    let mut writer = Writer::new(Vec::new());
    writer.write_event(event).ok()?;
    String::from_utf8(writer.into_inner()).ok().map(AnchorEdit::Rewrite)
}

/// Flattens rich text for the terminal; anchors become `text (href)`
pub fn rich_text_to_plain(html: &str) -> String {
    plain_text(html).unwrap_or_else(|| html.to_string())
}

fn plain_text(html: &str) -> Option<String> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut out = String::new();
    let mut hrefs: Vec<Option<String>> = Vec::new();

    loop {
        match reader.read_event().ok()? {
            Event::Eof => break,
            Event::Text(text) => out.push_str(&text.decode().ok()?),
            Event::GeneralRef(r) => {
                if let Ok(Some(ch)) = r.resolve_char_ref() {
                    out.push(ch);
                    continue;
                }
                let name = String::from_utf8_lossy(&r);
                match quick_xml::escape::resolve_predefined_entity(&name) {
                    Some(ch) => out.push_str(ch),
                    None if name == "nbsp" => out.push(' '),
                    None => out.push_str(&format!("&{};", name)),
                }
            }
            Event::Start(tag) => {
                let name = tag.name().as_ref().to_ascii_lowercase();
                if name == b"a" {
                    let href = tag
                        .html_attributes()
                        .flatten()
                        .find(|a| a.key.as_ref().eq_ignore_ascii_case(b"href"))
                        .map(|a| String::from_utf8_lossy(&a.value).to_string());
                    hrefs.push(href);
                } else if matches!(name.as_slice(), b"p" | b"div" | b"li") && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                if name == b"li" {
                    out.push_str("• ");
                }
            }
            Event::Empty(tag) if tag.name().as_ref().eq_ignore_ascii_case(b"br") => out.push('\n'),
            Event::End(tag) if tag.name().as_ref().eq_ignore_ascii_case(b"a") => {
                if let Some(Some(href)) = hrefs.pop() {
                    out.push_str(&format!(" ({})", href));
                }
            }
            _ => {}
        }
    }

    Some(out.trim().to_string())
}

/// Attribute whose value is already escaped markup and must not be escaped again
fn raw_attribute<'a>(key: &'a [u8], value: &str) -> Attribute<'a> {
    Attribute {
        key: QName(key),
        value: Cow::Owned(value.replace('"', "&quot;").into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url(" https://x.io "), "https://x.io");
    }

    #[test]
    fn test_parse_link_input_rejects_blank() {
        assert!(parse_link_input("   ").is_err());
        assert_eq!(parse_link_input("drive.google.com/x").unwrap(), "https://drive.google.com/x");
    }

    #[test]
    fn test_bare_domain_gets_scheme_and_target() {
        let out = normalize_html_links("<a href='example.com'>x</a>");
        assert!(out.contains(r#"href="https://example.com""#), "{}", out);
        assert!(out.contains(r#"target="_blank""#), "{}", out);
        assert!(out.ends_with(">x</a>"));
    }

    #[test]
    fn test_conforming_anchor_is_untouched() {
        let input = "<a href='https://already.com' target='_blank'>x</a>";
        assert_eq!(normalize_html_links(input), input);
    }

    #[test]
    fn test_malformed_markup_returns_input() {
        assert_eq!(normalize_html_links("<a href=\""), "<a href=\"");
    }

    #[test]
    fn test_other_schemes_are_left_alone() {
        let input = r#"<p><a href="mailto:a@b.c">mail</a> <a href="/projects">int</a> <a href="tel:+55">tel</a></p>"#;
        assert_eq!(normalize_html_links(input), input);
    }

    #[test]
    fn test_http_anchor_gets_target_only() {
        let out = normalize_html_links(r#"<a href="http://x.com" class="lnk">x</a>"#);
        assert_eq!(out, r#"<a href="http://x.com" class="lnk" target="_blank">x</a>"#);
    }

    #[test]
    fn test_wrong_target_is_replaced() {
        let out = normalize_html_links(r#"<a target="_self" href="https://x.com">x</a>"#);
        assert_eq!(out, r#"<a href="https://x.com" target="_blank">x</a>"#);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<p>Veja <a href='example.com'>isto</a> e <b>aquilo</b></p>",
            r#"<a href="www.site.com.br/path?a=1&amp;b=2">q</a>"#,
            "texto simples",
            "<ul><li>um<br></li></ul>",
        ];
        for input in inputs {
            let once = normalize_html_links(input);
            assert_eq!(normalize_html_links(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_surrounding_markup_preserved() {
        let out = normalize_html_links("<p>Antes <strong>negrito</strong> <a href=\"site.com\">link</a> depois</p>");
        assert!(out.starts_with("<p>Antes <strong>negrito</strong> <a "));
        assert!(out.ends_with(">link</a> depois</p>"));
    }

    #[test]
    fn test_escaped_query_is_not_double_escaped() {
        let out = normalize_html_links(r#"<a href="site.com/?a=1&amp;b=2">q</a>"#);
        assert!(out.contains(r#"href="https://site.com/?a=1&amp;b=2""#), "{}", out);
    }

    #[test]
    fn test_loose_text_characters_do_not_block_rewrite() {
        assert_eq!(
            normalize_html_links("<div>Q&A <a href='x.com'>x</a></div>"),
            r#"<div>Q&A <a href="https://x.com" target="_blank">x</a></div>"#
        );
        assert_eq!(
            normalize_html_links("<div>a < b <a href='x.com'>x</a></div>"),
            r#"<div>a < b <a href="https://x.com" target="_blank">x</a></div>"#
        );
    }

    #[test]
    fn test_tag_scan_edge_cases() {
        assert_eq!(
            normalize_html_links(r#"<A HREF="x.com" title="a > b">x</A>"#),
            r#"<A HREF="https://x.com" title="a > b" target="_blank">x</A>"#
        );
        assert_eq!(
            normalize_html_links(r#"<a href="x.com"/>"#),
            r#"<a href="https://x.com" target="_blank"/>"#
        );
        let abbr = r#"<abbr title="x.com">x</abbr>"#;
        assert_eq!(normalize_html_links(abbr), abbr);
    }

    #[test]
    fn test_anchor_without_href_untouched() {
        let input = r#"<a name="top">topo</a>"#;
        assert_eq!(normalize_html_links(input), input);
    }

    #[test]
    fn test_rich_text_to_plain() {
        let plain = rich_text_to_plain(
            r#"<p>Veja <a href="https://x.com">o site</a></p><ul><li>um</li><li>dois &amp; três</li></ul>"#,
        );
        assert_eq!(plain, "Veja o site (https://x.com)\n• um\n• dois & três");
        assert_eq!(rich_text_to_plain("sem markup"), "sem markup");
    }
}
