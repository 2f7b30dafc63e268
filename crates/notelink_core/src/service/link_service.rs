//! Link-edge reconciliation.
//!
//! # Responsibility
//! - Keep a note's persisted outbound edge set equal to what its current
//!   content references.
//!
//! # Invariants
//! - Runs synchronously right after a note save commits; it observes the
//!   title namespace as of that moment only. A note created later under a
//!   referenced title is picked up on the next save, not retroactively.
//! - Applies a minimal diff: untouched edges keep their creation
//!   timestamps, and reconciling unchanged content writes nothing.
//! - A note never links to itself, even when its content wikilinks its own
//!   title.
//! - Storage-not-ready is swallowed as a no-op; reads precede writes, so
//!   that path leaves no partial state. Every other error propagates.

use crate::model::note::{Note, NoteId};
use crate::repo::link_repo::LinkRepository;
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RepoError, RepoResult};
use crate::wikilink::extract_wikilinks;
use log::{debug, info};
use std::collections::BTreeSet;

/// Edge changes applied by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkDelta {
    pub added: usize,
    pub removed: usize,
}

/// Recomputes and applies the outbound edge set for `note`.
///
/// Invoked by the note service as the post-commit hook of every content
/// save. Reconciliation may also run opportunistically before the schema
/// exists (first-time setup); that case is a silent no-op.
pub fn reconcile_note_links<N, L>(notes: &N, links: &L, note: &Note) -> RepoResult<LinkDelta>
where
    N: NoteRepository,
    L: LinkRepository,
{
    match reconcile_inner(notes, links, note) {
        Err(RepoError::NotReady) => {
            debug!(
                "event=links_reconcile module=links status=skipped reason=storage_not_ready note_id={}",
                note.id
            );
            Ok(LinkDelta::default())
        }
        other => other,
    }
}

fn reconcile_inner<N, L>(notes: &N, links: &L, note: &Note) -> RepoResult<LinkDelta>
where
    N: NoteRepository,
    L: LinkRepository,
{
    let titles = extract_wikilinks(&note.content);
    let resolved = notes.resolve_titles(note.owner, &titles)?;
    let desired: BTreeSet<NoteId> = resolved
        .values()
        .map(|target| target.id)
        .filter(|target| *target != note.id)
        .collect();
    let existing = links.outbound_targets(note.id)?;

    let mut delta = LinkDelta::default();
    for target in existing.difference(&desired) {
        if links.remove_link(note.id, *target)? {
            delta.removed += 1;
        }
    }
    for target in desired.difference(&existing) {
        if links.insert_link(note.id, *target)? {
            delta.added += 1;
        }
    }

    if delta != LinkDelta::default() {
        info!(
            "event=links_reconcile module=links status=ok note_id={} added={} removed={}",
            note.id, delta.added, delta.removed
        );
    }
    Ok(delta)
}
