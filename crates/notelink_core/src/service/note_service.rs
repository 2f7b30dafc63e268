//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/capture/update/get/list/delete APIs.
//! - Run link reconciliation as the post-commit hook of every save.
//! - Generate collision-free titles within an owner's namespace.
//!
//! # Invariants
//! - Content save and link reconciliation are not transactionally atomic;
//!   a reconciliation fault leaves the committed note intact and the edge
//!   set is repaired on the next save.
//! - `unique_title` mutates nothing and is deterministic for a given title
//!   namespace.

use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError, OwnerId, MAX_TITLE_CHARS};
use crate::render::render_html;
use crate::repo::link_repo::LinkRepository;
use crate::repo::note_repo::{normalize_note_limit, NoteListQuery, NoteRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::link_service::reconcile_note_links;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title used by quick capture when the client supplies none.
const CAPTURE_DEFAULT_TITLE: &str = "Untitled";

/// Upper bound on numeric suffix probing before giving up.
const TITLE_DEDUP_MAX_ATTEMPTS: usize = 1000;

/// Upper bound on capture create retries when racing another writer.
const CAPTURE_MAX_ATTEMPTS: usize = 10;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title failed model validation.
    Validation(NoteValidationError),
    /// Target note does not exist in the owner's namespace.
    NoteNotFound(NoteId),
    /// Another note with this title already exists; the API layer maps
    /// this to a conflict status.
    DuplicateTitle(String),
    /// No free numeric suffix within the attempt cap.
    TitleSuffixesExhausted { base: String },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateTitle(title) => {
                write!(f, "a note titled `{title}` already exists")
            }
            Self::TitleSuffixesExhausted { base } => {
                write!(f, "no free title suffix for `{base}` within {TITLE_DEDUP_MAX_ATTEMPTS} attempts")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::DuplicateTitle { title } => Self::DuplicateTitle(title),
            other => Self::Repo(other),
        }
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResult {
    /// Items sorted by `updated_at DESC, id ASC`.
    pub items: Vec<Note>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over the repository implementations.
pub struct NoteService<N: NoteRepository, L: LinkRepository> {
    notes: N,
    links: L,
}

impl<N: NoteRepository, L: LinkRepository> NoteService<N, L> {
    pub fn new(notes: N, links: L) -> Self {
        Self { notes, links }
    }

    /// Creates one note with the exact title given.
    ///
    /// A `(owner, title)` collision surfaces as
    /// [`NoteServiceError::DuplicateTitle`]; callers wanting automatic
    /// suffixing use [`NoteService::capture_note`].
    pub fn create_note(
        &self,
        owner: OwnerId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let title = title.into();
        let draft = NoteDraft::new(owner, title.trim(), content);
        let id = self.notes.create_note(&draft)?;
        self.finish_save(owner, id)
    }

    /// Quick-capture create: defaults the title, resolves collisions via
    /// numeric suffixing and retries when racing another writer.
    pub fn capture_note(
        &self,
        owner: OwnerId,
        title: Option<&str>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let content = content.into();
        let base = title
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(CAPTURE_DEFAULT_TITLE);

        for _ in 0..CAPTURE_MAX_ATTEMPTS {
            let candidate = unique_title(&self.notes, owner, base)?;
            match self
                .notes
                .create_note(&NoteDraft::new(owner, candidate, content.clone()))
            {
                Ok(id) => return self.finish_save(owner, id),
                // Lost the race for this candidate; probe again.
                Err(RepoError::DuplicateTitle { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(NoteServiceError::TitleSuffixesExhausted {
            base: base.to_string(),
        })
    }

    /// Partially updates title and/or content, then reconciles links.
    pub fn update_note(
        &self,
        owner: OwnerId,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Note, NoteServiceError> {
        self.notes
            .update_note(owner, id, title.map(str::trim), content)?;
        self.finish_save(owner, id)
    }

    /// Gets one note by id.
    pub fn get_note(&self, owner: OwnerId, id: NoteId) -> RepoResult<Option<Note>> {
        self.notes.get_note(owner, id)
    }

    /// Lists notes with optional title-substring filter and pagination.
    pub fn list_notes(
        &self,
        owner: OwnerId,
        title_query: Option<String>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        let applied_limit = normalize_note_limit(limit);
        let query = NoteListQuery {
            title_query: title_query.filter(|value| !value.trim().is_empty()),
            limit: Some(applied_limit),
            offset,
        };
        let items = self.notes.list_notes(owner, &query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
        })
    }

    /// Deletes one note; its edges cascade at the storage layer.
    pub fn delete_note(&self, owner: OwnerId, id: NoteId) -> Result<(), NoteServiceError> {
        self.notes.delete_note(owner, id)?;
        Ok(())
    }

    /// Notes the given note links to, newest edge first.
    pub fn outbound_links(&self, owner: OwnerId, id: NoteId) -> Result<Vec<Note>, NoteServiceError> {
        self.require_note(owner, id)?;
        Ok(self.links.outbound_notes(id)?)
    }

    /// Notes linking to the given note, newest edge first.
    pub fn backlinks(&self, owner: OwnerId, id: NoteId) -> Result<Vec<Note>, NoteServiceError> {
        self.require_note(owner, id)?;
        Ok(self.links.backlink_notes(id)?)
    }

    /// Renders arbitrary text against the owner's namespace without
    /// persisting anything (the live-preview contract).
    pub fn preview(&self, owner: OwnerId, text: &str) -> String {
        render_html(&self.notes, owner, text)
    }

    /// Renders a persisted note's content for display.
    pub fn render_note(&self, note: &Note) -> String {
        render_html(&self.notes, note.owner, &note.content)
    }

    /// Post-commit path shared by every save: read back the committed row,
    /// then reconcile its outbound edges against the fresh content.
    fn finish_save(&self, owner: OwnerId, id: NoteId) -> Result<Note, NoteServiceError> {
        let note = self
            .notes
            .get_note(owner, id)?
            .ok_or(NoteServiceError::InconsistentState(
                "saved note not found in read-back",
            ))?;
        reconcile_note_links(&self.notes, &self.links, &note)?;
        Ok(note)
    }

    fn require_note(&self, owner: OwnerId, id: NoteId) -> Result<(), NoteServiceError> {
        match self.notes.get_note(owner, id)? {
            Some(_) => Ok(()),
            None => Err(NoteServiceError::NoteNotFound(id)),
        }
    }
}

/// Returns the first title derived from `desired` that is free within the
/// owner's namespace: `desired` itself, then `"{base} (2)"`, `"{base} (3)"`,
/// … with the base truncated so the suffixed string fits the title limit.
///
/// Pure lookup: the caller performs the actual create/rename and retries on
/// a lost race. Fails once the attempt cap is reached instead of probing
/// forever.
pub fn unique_title<R: NoteRepository>(
    repo: &R,
    owner: OwnerId,
    desired: &str,
) -> Result<String, NoteServiceError> {
    let base: String = desired.chars().take(MAX_TITLE_CHARS).collect();
    if !repo.title_exists(owner, &base)? {
        return Ok(base);
    }

    for n in 2..=TITLE_DEDUP_MAX_ATTEMPTS {
        let candidate = suffixed_title(&base, n);
        if !repo.title_exists(owner, &candidate)? {
            return Ok(candidate);
        }
    }

    Err(NoteServiceError::TitleSuffixesExhausted { base })
}

fn suffixed_title(base: &str, n: usize) -> String {
    let suffix = format!(" ({n})");
    let keep = MAX_TITLE_CHARS.saturating_sub(suffix.chars().count());
    let mut title: String = base.chars().take(keep).collect();
    title.push_str(&suffix);
    title
}

#[cfg(test)]
mod tests {
    use super::{suffixed_title, unique_title, NoteServiceError};
    use crate::model::note::{Note, NoteDraft, NoteId, OwnerId, MAX_TITLE_CHARS};
    use crate::repo::note_repo::{NoteListQuery, NoteRepository};
    use crate::repo::RepoResult;
    use std::collections::HashMap;

    #[test]
    fn suffix_is_appended_after_a_space() {
        assert_eq!(suffixed_title("Note", 2), "Note (2)");
        assert_eq!(suffixed_title("Note", 17), "Note (17)");
    }

    #[test]
    fn suffixed_title_fits_the_title_limit_exactly() {
        let base = "x".repeat(MAX_TITLE_CHARS);
        let title = suffixed_title(&base, 12);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with(" (12)"));
    }

    /// Repository stub whose namespace is fully saturated.
    struct SaturatedTitles;

    impl NoteRepository for SaturatedTitles {
        fn create_note(&self, _draft: &NoteDraft) -> RepoResult<NoteId> {
            unimplemented!("not used by unique_title")
        }
        fn get_note(&self, _owner: OwnerId, _id: NoteId) -> RepoResult<Option<Note>> {
            unimplemented!("not used by unique_title")
        }
        fn resolve_titles(
            &self,
            _owner: OwnerId,
            _titles: &[String],
        ) -> RepoResult<HashMap<String, Note>> {
            unimplemented!("not used by unique_title")
        }
        fn title_exists(&self, _owner: OwnerId, _title: &str) -> RepoResult<bool> {
            Ok(true)
        }
        fn list_notes(&self, _owner: OwnerId, _query: &NoteListQuery) -> RepoResult<Vec<Note>> {
            unimplemented!("not used by unique_title")
        }
        fn update_note(
            &self,
            _owner: OwnerId,
            _id: NoteId,
            _title: Option<&str>,
            _content: Option<&str>,
        ) -> RepoResult<()> {
            unimplemented!("not used by unique_title")
        }
        fn delete_note(&self, _owner: OwnerId, _id: NoteId) -> RepoResult<()> {
            unimplemented!("not used by unique_title")
        }
    }

    #[test]
    fn unique_title_fails_once_the_attempt_cap_is_reached() {
        let err = unique_title(&SaturatedTitles, 1, "Note").unwrap_err();
        assert!(matches!(
            err,
            NoteServiceError::TitleSuffixesExhausted { ref base } if base == "Note"
        ));
    }
}
