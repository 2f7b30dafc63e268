//! Core domain logic for the notelink note-taking application.
//! This crate is the single source of truth for business invariants:
//! wikilink extraction, link-graph reconciliation, safe rendering and
//! title deduplication all live here; HTTP/auth/template glue stays
//! outside.

pub mod db;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;
pub mod wikilink;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteDraft, NoteId, NoteValidationError, OwnerId, MAX_TITLE_CHARS};
pub use render::{render_html, sanitize_html, MAX_RENDER_CHARS, OVERSIZED_CONTENT_HTML};
pub use repo::link_repo::{LinkRepository, SqliteLinkRepository};
pub use repo::note_repo::{NoteListQuery, NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use service::link_service::{reconcile_note_links, LinkDelta};
pub use service::note_service::{unique_title, NoteService, NoteServiceError, NotesListResult};
pub use wikilink::extract_wikilinks;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
