//! Append and query surface over the audit repository.

use super::diff::{FieldChange, CREATED_RECORD, DELETED_RECORD};
use super::entry::{Actor, AuditEntry, AuditFilter, AuditSubject};
use crate::error::{EngineError, Result};
use crate::pagination::{Page, PageRequest};
use crate::repository::AuditRepository;
use chrono::Utc;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Writes diff batches and synthetic lifecycle entries.
///
/// Entries are never updated or deleted through this type.
#[derive(Clone)]
pub struct AuditLog {
    repository: Arc<dyn AuditRepository>,
}

impl AuditLog {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        AuditLog { repository }
    }

    /// Writes one entry per change, all sharing one timestamp.
    ///
    /// An empty batch writes nothing and succeeds with 0. Failures come back
    /// as [`EngineError::AuditWrite`].
    pub async fn append(
        &self,
        subject: AuditSubject,
        actor: &Actor,
        changes: Vec<FieldChange>,
    ) -> Result<usize> {
        self.write(subject, actor, changes, None).await
    }

    /// Writes the single `created_record` entry for a new subject.
    pub async fn record_created(
        &self,
        subject: AuditSubject,
        actor: &Actor,
        description: &str,
    ) -> Result<usize> {
        let change = FieldChange::new(CREATED_RECORD, None, Some(description.to_string()));
        self.write(subject, actor, vec![change], None).await
    }

    /// Writes the single `deleted_record` entry, carrying `description` as
    /// the snapshot of the subject about to be removed.
    pub async fn record_deleted(
        &self,
        subject: AuditSubject,
        actor: &Actor,
        description: &str,
    ) -> Result<usize> {
        let change = FieldChange::new(DELETED_RECORD, Some(description.to_string()), None);
        let info = Some(description);
        self.write(subject, actor, vec![change], info).await
    }

    /// Entries matching `filter`, newest first.
    pub async fn query(&self, filter: &AuditFilter, page: PageRequest) -> Result<Page<AuditEntry>> {
        self.repository.query(filter, page).await
    }

    async fn write(
        &self,
        subject: AuditSubject,
        actor: &Actor,
        changes: Vec<FieldChange>,
        deleted_record_info: Option<&str>,
    ) -> Result<usize> {
        if changes.is_empty() {
            return Ok(0);
        }

        let changed_at = Utc::now();
        let (medical_record_id, patient_id) = match subject {
            AuditSubject::Case(id) => (Some(id), None),
            AuditSubject::Patient(id) => (None, Some(id)),
        };

        let entries: Vec<AuditEntry> = changes
            .into_iter()
            .map(|change| AuditEntry {
                id: Uuid::new_v4(),
                medical_record_id,
                patient_id,
                entity_type: subject.kind(),
                user_id: actor.id,
                user_email: actor.email.clone(),
                user_display_name: actor.display_name.clone(),
                field_name: change.field,
                field_label: change.label,
                old_value: change.old_value,
                new_value: change.new_value,
                changed_at,
                deleted_record_info: deleted_record_info.map(str::to_string),
            })
            .collect();

        self.repository
            .insert_batch(&entries)
            .await
            .map_err(|e| EngineError::AuditWrite(e.to_string()))?;

        debug!("Audited {} field(s) of {}", entries.len(), subject);
        Ok(entries.len())
    }
}
