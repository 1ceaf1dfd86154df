//! Audit logging for FinTrack
//!
//! Records every create, update and delete with before/after values in an
//! append-only audit log.
//!
//! # Architecture
//!
//! - `AuditEntry`: one logged operation with timestamp, owner, entity
//!   information and optional before/after values.
//! - `AuditLogger`: appends entries to the log file as line-delimited JSON
//!   (JSONL).
//! - `generate_diff`: builds a human-readable summary of top-level field
//!   changes between two entity states.
//!
//! Services do not use the logger directly; they go through the
//! `Storage::log_create` / `log_update` / `log_delete` helpers.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
