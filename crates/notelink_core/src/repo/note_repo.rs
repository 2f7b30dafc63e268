//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped note persistence APIs.
//! - Own bulk title resolution for the wikilink pipeline.
//!
//! # Invariants
//! - Every query is constrained to the acting owner; no API can observe
//!   another owner's notes.
//! - Write paths validate the title before SQL mutations.
//! - List ordering is `updated_at DESC, id ASC` for stable pagination.

use crate::model::note::{validate_title, Note, NoteDraft, NoteId, OwnerId};
use crate::repo::{is_duplicate_title, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

const NOTES_DEFAULT_LIMIT: u32 = 20;
const NOTES_LIMIT_MAX: u32 = 100;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

/// Column-qualified variant for joins against `note_links`.
pub(crate) const NOTE_LINKED_SELECT_SQL: &str = "SELECT
    notes.id AS id,
    notes.owner_id AS owner_id,
    notes.title AS title,
    notes.content AS content,
    notes.created_at AS created_at,
    notes.updated_at AS updated_at
FROM notes";

/// Query options for note list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Optional title-substring filter (the API's `q` parameter).
    pub title_query: Option<String>,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts one note and returns its storage-assigned id.
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Gets one note by id within the owner's namespace.
    fn get_note(&self, owner: OwnerId, id: NoteId) -> RepoResult<Option<Note>>;
    /// Bulk-resolves candidate titles to existing notes in one query.
    ///
    /// Titles without a match are simply absent from the map.
    fn resolve_titles(&self, owner: OwnerId, titles: &[String]) -> RepoResult<HashMap<String, Note>>;
    /// Whether any note with this exact title exists for the owner.
    fn title_exists(&self, owner: OwnerId, title: &str) -> RepoResult<bool>;
    /// Lists notes with optional title filter and pagination.
    fn list_notes(&self, owner: OwnerId, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Partially updates title and/or content; bumps `updated_at`.
    fn update_note(
        &self,
        owner: OwnerId,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> RepoResult<()>;
    /// Deletes one note. Link edges cascade at the storage layer.
    fn delete_note(&self, owner: OwnerId, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        validate_title(&draft.title)?;

        match self.conn.execute(
            "INSERT INTO notes (owner_id, title, content) VALUES (?1, ?2, ?3);",
            params![draft.owner, draft.title.as_str(), draft.content.as_str()],
        ) {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_duplicate_title(&err) => Err(RepoError::DuplicateTitle {
                title: draft.title.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn get_note(&self, owner: OwnerId, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE owner_id = ?1 AND id = ?2;"))?;
        let mut rows = stmt.query(params![owner, id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn resolve_titles(&self, owner: OwnerId, titles: &[String]) -> RepoResult<HashMap<String, Note>> {
        if titles.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; titles.len()].join(", ");
        let sql = format!("{NOTE_SELECT_SQL} WHERE owner_id = ? AND title IN ({placeholders});");

        let mut bind_values: Vec<Value> = Vec::with_capacity(titles.len() + 1);
        bind_values.push(Value::Integer(owner));
        for title in titles {
            bind_values.push(Value::Text(title.clone()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut resolved = HashMap::new();
        while let Some(row) = rows.next()? {
            let note = parse_note_row(row)?;
            resolved.insert(note.title.clone(), note);
        }
        Ok(resolved)
    }

    fn title_exists(&self, owner: OwnerId, title: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM notes
                WHERE owner_id = ?1 AND title = ?2
            );",
            params![owner, title],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_notes(&self, owner: OwnerId, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(owner)];

        if let Some(fragment) = query.title_query.as_deref() {
            if !fragment.is_empty() {
                sql.push_str(" AND title LIKE ? ESCAPE '\\'");
                bind_values.push(Value::Text(like_pattern(fragment)));
            }
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");
        let limit = normalize_note_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn update_note(
        &self,
        owner: OwnerId,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> RepoResult<()> {
        if title.is_none() && content.is_none() {
            return match self.get_note(owner, id)? {
                Some(_) => Ok(()),
                None => Err(RepoError::NotFound(id)),
            };
        }

        if let Some(title) = title {
            validate_title(title)?;
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.to_string()));
        }
        if let Some(content) = content {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.to_string()));
        }
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)");

        let sql = format!(
            "UPDATE notes SET {} WHERE owner_id = ? AND id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(owner));
        bind_values.push(Value::Integer(id));

        let changed = match self.conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(changed) => changed,
            Err(err) if is_duplicate_title(&err) => {
                return Err(RepoError::DuplicateTitle {
                    title: title.unwrap_or_default().to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_note(&self, owner: OwnerId, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE owner_id = ?1 AND id = ?2;",
            params![owner, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to the notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
        None => NOTES_DEFAULT_LIMIT,
    }
}

/// Builds a `LIKE` pattern matching the fragment anywhere in the title,
/// with SQL wildcard characters escaped.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    Ok(Note {
        id: row.get("id")?,
        owner: row.get("owner_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
