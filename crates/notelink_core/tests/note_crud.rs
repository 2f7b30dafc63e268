use notelink_core::db::open_db_in_memory;
use notelink_core::{
    NoteService, NoteServiceError, SqliteLinkRepository, SqliteNoteRepository, MAX_TITLE_CHARS,
};
use rusqlite::{params, Connection};

fn service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>, SqliteLinkRepository<'_>> {
    NoteService::new(
        SqliteNoteRepository::new(conn),
        SqliteLinkRepository::new(conn),
    )
}

#[test]
fn create_and_get_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_note(1, "Alpha", "first body").unwrap();
    assert!(created.id > 0);
    assert_eq!(created.owner, 1);
    assert_eq!(created.title, "Alpha");
    assert_eq!(created.content, "first body");
    assert!(created.created_at > 0);
    assert!(created.updated_at >= created.created_at);

    let fetched = service.get_note(1, created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn titles_are_trimmed_on_create_and_rename() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create_note(1, "  Padded  ", "x").unwrap();
    assert_eq!(created.title, "Padded");

    let renamed = service
        .update_note(1, created.id, Some(" Tidy "), None)
        .unwrap();
    assert_eq!(renamed.title, "Tidy");
}

#[test]
fn duplicate_title_is_a_conflict_within_one_owner_only() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    service.create_note(1, "Shared", "mine").unwrap();
    let err = service.create_note(1, "Shared", "again").unwrap_err();
    assert!(matches!(err, NoteServiceError::DuplicateTitle(ref t) if t == "Shared"));

    // Another owner may reuse the title freely.
    service.create_note(2, "Shared", "theirs").unwrap();
}

#[test]
fn invalid_titles_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let blank = service.create_note(1, "   ", "x").unwrap_err();
    assert!(matches!(blank, NoteServiceError::Validation(_)));

    let long = service
        .create_note(1, "x".repeat(MAX_TITLE_CHARS + 1), "x")
        .unwrap_err();
    assert!(matches!(long, NoteServiceError::Validation(_)));
}

#[test]
fn update_supports_partial_title_and_content_changes() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create_note(1, "Draft", "v1").unwrap();

    let content_only = service
        .update_note(1, created.id, None, Some("v2"))
        .unwrap();
    assert_eq!(content_only.title, "Draft");
    assert_eq!(content_only.content, "v2");

    let renamed = service
        .update_note(1, created.id, Some("Final"), None)
        .unwrap();
    assert_eq!(renamed.title, "Final");
    assert_eq!(renamed.content, "v2");
}

#[test]
fn rename_onto_existing_title_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.create_note(1, "Taken", "x").unwrap();
    let other = service.create_note(1, "Free", "y").unwrap();

    let err = service
        .update_note(1, other.id, Some("Taken"), None)
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::DuplicateTitle(_)));
}

#[test]
fn updating_or_deleting_missing_or_foreign_notes_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create_note(1, "Mine", "x").unwrap();

    let missing = service
        .update_note(1, created.id + 99, None, Some("y"))
        .unwrap_err();
    assert!(matches!(missing, NoteServiceError::NoteNotFound(_)));

    // Owner scoping: another user cannot touch the note.
    let foreign = service
        .update_note(2, created.id, None, Some("y"))
        .unwrap_err();
    assert!(matches!(foreign, NoteServiceError::NoteNotFound(_)));
    let foreign_delete = service.delete_note(2, created.id).unwrap_err();
    assert!(matches!(foreign_delete, NoteServiceError::NoteNotFound(_)));
}

#[test]
fn list_orders_by_updated_at_desc_and_filters_by_title_fragment() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let alpha = service.create_note(1, "Alpha", "x").unwrap();
    let beta = service.create_note(1, "Beta", "y").unwrap();
    service.create_note(2, "Alpha Too", "other owner").unwrap();

    conn.execute(
        "UPDATE notes SET updated_at = 2000 WHERE id = ?1;",
        params![alpha.id],
    )
    .unwrap();
    conn.execute(
        "UPDATE notes SET updated_at = 1000 WHERE id = ?1;",
        params![beta.id],
    )
    .unwrap();

    let listed = service.list_notes(1, None, Some(10), 0).unwrap();
    assert_eq!(listed.items.len(), 2);
    assert_eq!(listed.items[0].id, alpha.id);
    assert_eq!(listed.items[1].id, beta.id);

    let filtered = service
        .list_notes(1, Some("alp".to_string()), Some(10), 0)
        .unwrap();
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].id, alpha.id);
}

#[test]
fn list_limit_defaults_to_20_and_caps_at_100() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    for idx in 0..25 {
        service.create_note(1, format!("note {idx}"), "x").unwrap();
    }

    let defaulted = service.list_notes(1, None, None, 0).unwrap();
    assert_eq!(defaulted.applied_limit, 20);
    assert_eq!(defaulted.items.len(), 20);

    let capped = service.list_notes(1, None, Some(5000), 0).unwrap();
    assert_eq!(capped.applied_limit, 100);
    assert_eq!(capped.items.len(), 25);

    let offset = service.list_notes(1, None, Some(100), 20).unwrap();
    assert_eq!(offset.items.len(), 5);
}

#[test]
fn delete_removes_the_note() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create_note(1, "Gone Soon", "x").unwrap();

    service.delete_note(1, created.id).unwrap();
    assert!(service.get_note(1, created.id).unwrap().is_none());

    let again = service.delete_note(1, created.id).unwrap_err();
    assert!(matches!(again, NoteServiceError::NoteNotFound(_)));
}

#[test]
fn note_serializes_with_stable_field_names() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service.create_note(1, "Api Shape", "body").unwrap();

    let value = serde_json::to_value(&created).unwrap();
    assert_eq!(value["id"], created.id);
    assert_eq!(value["owner"], 1);
    assert_eq!(value["title"], "Api Shape");
    assert_eq!(value["content"], "body");
    assert!(value["created_at"].is_i64());
    assert!(value["updated_at"].is_i64());
}
