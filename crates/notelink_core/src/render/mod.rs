//! Safe HTML rendering pipeline for note content.
//!
//! # Responsibility
//! - Substitute resolved wikilinks with stable anchor markup.
//! - Transform markdown to HTML and reduce it to the allowed tag set.
//!
//! # Invariants
//! - Rendering never fails: unresolved wikilinks degrade to plain text,
//!   resolver faults degrade every token, oversized input yields a fixed
//!   placeholder.
//! - Anchors expose `data-wikilink` with the trimmed title and `href`
//!   pointing at the per-note canonical path `/{id}/`; page templates rely
//!   on both names staying stable.

use crate::model::note::{Note, OwnerId};
use crate::repo::note_repo::NoteRepository;
use crate::wikilink::{extract_wikilinks, substitute_wikilinks};
use log::warn;
use pulldown_cmark::{html, Event, Options, Parser};
use std::collections::HashMap;

mod sanitize;

pub use sanitize::sanitize_html;

use sanitize::escape_html;

/// Renderer input ceiling in Unicode scalar values.
///
/// The renderer runs synchronously on user-facing preview requests, so its
/// latency must stay bounded.
pub const MAX_RENDER_CHARS: usize = 200_000;

/// Fixed placeholder returned for inputs beyond [`MAX_RENDER_CHARS`].
pub const OVERSIZED_CONTENT_HTML: &str = "<p>Content is too large to render.</p>";

/// Renders raw note content to sanitized HTML for the given owner's
/// namespace.
pub fn render_html<R: NoteRepository>(notes: &R, owner: OwnerId, content: &str) -> String {
    if content.chars().count() > MAX_RENDER_CHARS {
        return OVERSIZED_CONTENT_HTML.to_string();
    }

    let titles = extract_wikilinks(content);
    let resolved = match notes.resolve_titles(owner, &titles) {
        Ok(map) => map,
        Err(err) => {
            // Degrade every token to plain text instead of failing the view.
            warn!("event=render_resolve module=render status=error error={err}");
            HashMap::new()
        }
    };

    let substituted = substitute_wikilinks(content, |title| {
        resolved.get(title).map(wikilink_anchor)
    });
    let raw_html = markdown_to_html(&substituted);
    sanitize_html(&raw_html)
}

/// Anchor markup for one resolved wikilink occurrence.
fn wikilink_anchor(target: &Note) -> String {
    let title = escape_html(&target.title);
    format!(
        "<a href=\"/{id}/\" title=\"{title}\" rel=\"noopener\" data-wikilink=\"{title}\">{title}</a>",
        id = target.id
    )
}

/// CommonMark transform with soft breaks promoted to hard breaks, so
/// newlines in note bodies keep their visual meaning.
fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::markdown_to_html;

    #[test]
    fn newlines_become_line_breaks() {
        let html = markdown_to_html("first\nsecond");
        assert!(html.contains("<br />"), "soft break not promoted: {html}");
    }

    #[test]
    fn markdown_escapes_html_special_characters_in_text() {
        let html = markdown_to_html("a < b & c");
        assert!(html.contains("&lt;"));
        assert!(html.contains("&amp;"));
    }
}
