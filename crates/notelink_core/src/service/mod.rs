//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep outer layers (HTTP/JSON glue) decoupled from storage details.

pub mod link_service;
pub mod note_service;
