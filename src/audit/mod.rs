//! Audit trail for data store writes
//!
//! Every committed insert, update and delete, and every procedure call, is
//! appended to `audit.log` as one JSON line (JSONL).
//!
//! - `AuditEntry`: timestamp, operation, table, row id and before/after values.
//! - `AuditLogger`: appends entries and reads them back.

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;
