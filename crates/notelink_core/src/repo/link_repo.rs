//! Link-edge repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the derived wikilink edge set with `(source, target)`
//!   uniqueness and idempotent insertion.
//! - Serve the outbound/backlink queries for the note detail views.
//!
//! # Invariants
//! - Edges are only ever written by reconciliation; there is no user-facing
//!   write path.
//! - `insert_link` tolerates a pre-existing edge (no error, no timestamp
//!   churn).
//! - Self-loops are rejected at the storage layer.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{parse_note_row, NOTE_LINKED_SELECT_SQL};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

/// Repository interface for derived link edges.
pub trait LinkRepository {
    /// Target ids of all persisted edges originating at `source`.
    fn outbound_targets(&self, source: NoteId) -> RepoResult<BTreeSet<NoteId>>;
    /// Inserts one edge; a pre-existing edge is a no-op.
    ///
    /// Returns whether a new row was actually written.
    fn insert_link(&self, source: NoteId, target: NoteId) -> RepoResult<bool>;
    /// Removes one edge; a missing edge is a no-op.
    fn remove_link(&self, source: NoteId, target: NoteId) -> RepoResult<bool>;
    /// Notes this note links to, newest edge first.
    fn outbound_notes(&self, source: NoteId) -> RepoResult<Vec<Note>>;
    /// Notes linking to this note, newest edge first.
    fn backlink_notes(&self, target: NoteId) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed link-edge repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn outbound_targets(&self, source: NoteId) -> RepoResult<BTreeSet<NoteId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT target_id FROM note_links WHERE source_id = ?1;")?;
        let mut rows = stmt.query([source])?;
        let mut targets = BTreeSet::new();
        while let Some(row) = rows.next()? {
            targets.insert(row.get::<_, NoteId>(0)?);
        }
        Ok(targets)
    }

    fn insert_link(&self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO note_links (source_id, target_id) VALUES (?1, ?2);",
            params![source, target],
        )?;
        Ok(changed > 0)
    }

    fn remove_link(&self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM note_links WHERE source_id = ?1 AND target_id = ?2;",
            params![source, target],
        )?;
        Ok(changed > 0)
    }

    fn outbound_notes(&self, source: NoteId) -> RepoResult<Vec<Note>> {
        self.linked_notes(
            &format!(
                "{NOTE_LINKED_SELECT_SQL}
                 INNER JOIN note_links ON note_links.target_id = notes.id
                 WHERE note_links.source_id = ?1
                 ORDER BY note_links.created_at DESC, note_links.id DESC;"
            ),
            source,
        )
    }

    fn backlink_notes(&self, target: NoteId) -> RepoResult<Vec<Note>> {
        self.linked_notes(
            &format!(
                "{NOTE_LINKED_SELECT_SQL}
                 INNER JOIN note_links ON note_links.source_id = notes.id
                 WHERE note_links.target_id = ?1
                 ORDER BY note_links.created_at DESC, note_links.id DESC;"
            ),
            target,
        )
    }
}

impl SqliteLinkRepository<'_> {
    fn linked_notes(&self, sql: &str, note_id: NoteId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([note_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}
