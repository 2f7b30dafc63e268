//! Allow-list HTML sanitation.
//!
//! # Responsibility
//! - Reduce rendered HTML to a fixed tag/attribute allow-list.
//!
//! # Invariants
//! - Input is HTML as produced by the markdown transform: text nodes and
//!   attribute values are already entity-encoded.
//! - Disallowed markup is stripped, not escaped-and-shown; inner text of a
//!   stripped element survives.
//! - `href` values are restricted to relative references, fragments,
//!   http(s) and mailto.

use once_cell::sync::Lazy;
use regex::Regex;

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][a-zA-Z0-9_:.-]*)\s*(?:=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("valid attribute regex")
});

/// Filters an HTML fragment down to the allowed tag/attribute set.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tail = &rest[lt..];
        match scan_tag_token(tail) {
            Some(token_len) => {
                if let Some(rendered) = render_tag(&tail[..token_len]) {
                    out.push_str(&rendered);
                }
                rest = &tail[token_len..];
            }
            None => {
                // A lone '<' that never closes is text, not markup.
                out.push_str("&lt;");
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Length of the markup token starting at `tail` (which begins with `<`),
/// or `None` when the bracket never closes into a token.
fn scan_tag_token(tail: &str) -> Option<usize> {
    if let Some(rest) = tail.strip_prefix("<!--") {
        return rest.find("-->").map(|pos| 4 + pos + 3);
    }
    if tail.starts_with("<!") || tail.starts_with("<?") {
        return tail.find('>').map(|pos| pos + 1);
    }

    let mut quote: Option<char> = None;
    for (idx, ch) in tail.char_indices().skip(1) {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '>' => return Some(idx + 1),
                '<' => return None,
                _ => {}
            },
        }
    }
    None
}

/// Re-emits one tag token if it survives the allow-list, with attributes
/// filtered and normalized to double-quoted form.
fn render_tag(token: &str) -> Option<String> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;

    if let Some(name_part) = inner.strip_prefix('/') {
        let name = name_part.trim().to_ascii_lowercase();
        if is_allowed_tag(&name) && name != "br" {
            return Some(format!("</{name}>"));
        }
        return None;
    }

    let inner = inner.strip_suffix('/').unwrap_or(inner);
    let name_end = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) || !is_allowed_tag(&name) {
        return None;
    }

    let mut out = String::with_capacity(token.len());
    out.push('<');
    out.push_str(&name);

    for caps in ATTR_RE.captures_iter(&inner[name_end..]) {
        let attr = caps[1].to_ascii_lowercase();
        if !is_allowed_attr(&name, &attr) {
            continue;
        }
        let value = caps.get(2).map(|m| unquote(m.as_str())).unwrap_or_default();
        match attr.as_str() {
            "href" if !is_safe_href(&value) => continue,
            "class" if !is_language_class(&value) => continue,
            _ => {}
        }
        out.push(' ');
        out.push_str(&attr);
        out.push_str("=\"");
        out.push_str(&escape_attr_value(&value));
        out.push('"');
    }

    if name == "br" {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    Some(out)
}

fn is_allowed_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "br"
            | "a"
            | "strong"
            | "em"
            | "code"
            | "pre"
            | "ul"
            | "ol"
            | "li"
            | "h1"
            | "h2"
            | "h3"
            | "blockquote"
    )
}

fn is_allowed_attr(tag: &str, attr: &str) -> bool {
    match tag {
        "a" => matches!(attr, "href" | "title" | "rel" | "data-wikilink"),
        "code" => attr == "class",
        _ => false,
    }
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

/// Whether an `href` value is an allowed target.
///
/// Whitespace and control characters are ignored the way browsers ignore
/// them, and an entity-encoded prefix is rejected outright so an encoded
/// colon cannot smuggle a scheme past the textual check.
fn is_safe_href(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_control())
        .collect();
    let head: String = cleaned.chars().take(16).collect::<String>().to_ascii_lowercase();
    if head.contains('&') {
        return false;
    }

    if cleaned.starts_with('/')
        || cleaned.starts_with('#')
        || cleaned.starts_with("./")
        || cleaned.starts_with("../")
    {
        return true;
    }

    let lower = cleaned.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        return true;
    }

    // Scheme-less relative reference: any colon must come after the path
    // starts, otherwise it is an unknown scheme.
    match cleaned.find(':') {
        None => true,
        Some(colon) => cleaned
            .find(['/', '?', '#'])
            .is_some_and(|cut| cut < colon),
    }
}

/// Only `language-*` classes survive on `code` elements.
fn is_language_class(value: &str) -> bool {
    value
        .strip_prefix("language-")
        .is_some_and(|lang| {
            !lang.is_empty()
                && lang
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
        })
}

/// Escapes a value for double-quoted attribute position without
/// double-encoding entities already present in the source.
fn escape_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes text for HTML text or attribute position.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
