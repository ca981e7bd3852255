//! Field-level audit trail for cases and patients.
//!
//! [`diff`] turns a stored state and a proposed one into [`FieldChange`]s;
//! [`AuditLog`] persists them as immutable [`AuditEntry`] rows and answers
//! filtered, paginated queries over them.

mod diff;
mod entry;
mod store;

pub use diff::{diff, field_label, FieldChange, FieldValues, CREATED_RECORD, DELETED_RECORD};
pub use entry::{Actor, AuditEntry, AuditFilter, AuditSubject, EntityKind};
pub use store::AuditLog;
