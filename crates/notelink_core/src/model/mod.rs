//! Domain model for owner-scoped notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by repositories and services.
//!
//! # Invariants
//! - Every note belongs to exactly one owner.
//! - `(owner, title)` is unique within storage; the model enforces the
//!   title shape, the storage layer enforces uniqueness.

pub mod note;
