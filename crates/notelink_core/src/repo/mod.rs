//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for notes and link
//!   edges.
//! - Isolate SQLite query details from service/business orchestration.
//! - Classify SQLite faults into semantic error kinds.
//!
//! # Invariants
//! - Repository writes validate the note title before SQL mutations.
//! - `(owner, title)` uniqueness violations surface as
//!   [`RepoError::DuplicateTitle`], never as an opaque transport error.
//! - Missing-schema faults surface as [`RepoError::NotReady`] so callers
//!   that run before provisioning can treat them as a no-op.

use crate::db::DbError;
use crate::model::note::{NoteId, NoteValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod link_repo;
pub mod note_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note and link persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    /// Another note with the same `(owner, title)` already exists.
    DuplicateTitle { title: String },
    /// The schema has not been provisioned yet (tables missing).
    NotReady,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateTitle { title } => {
                write!(f, "a note titled `{title}` already exists for this owner")
            }
            Self::NotReady => write!(f, "storage schema is not provisioned yet"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_missing_schema(&value) {
            return Self::NotReady;
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whether the error means a required table does not exist yet.
fn is_missing_schema(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.contains("no such table"),
        _ => false,
    }
}

/// Whether the error is a `(owner, title)` uniqueness violation on `notes`.
pub(crate) fn is_duplicate_title(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message)) => {
            code.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains("notes.owner_id")
                && message.contains("notes.title")
        }
        _ => false,
    }
}
