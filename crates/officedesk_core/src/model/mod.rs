//! Domain model for date-tracked office records.
//!
//! # Responsibility
//! - Define the canonical record shape shared by the task, DSC certificate,
//!   document and due-date list pages.
//! - Own reference-date parsing so malformed input never reaches date math.
//!
//! # Invariants
//! - Every record is identified by an opaque, caller-owned `id`.
//! - Explicit status and reference date are read-only for core logic.

pub mod kind;
pub mod record;
