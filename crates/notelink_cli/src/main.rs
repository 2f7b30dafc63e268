//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `notelink_core` wiring:
//!   save, link reconciliation and rendering in one round trip.
//! - Keep output deterministic for quick local sanity checks.

use notelink_core::db::open_db_in_memory;
use notelink_core::{NoteService, SqliteLinkRepository, SqliteNoteRepository};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("notelink_core version={}", notelink_core::core_version());

    let conn = open_db_in_memory()?;
    let service = NoteService::new(
        SqliteNoteRepository::new(&conn),
        SqliteLinkRepository::new(&conn),
    );

    let owner = 1;
    service.create_note(owner, "Inbox", "Things land here first.")?;
    let today = service.create_note(owner, "Today", "Review the [[Inbox]] backlog.")?;

    let outbound = service.outbound_links(owner, today.id)?;
    println!("note id={} outbound_links={}", today.id, outbound.len());
    println!("html={}", service.render_note(&today));

    Ok(())
}
