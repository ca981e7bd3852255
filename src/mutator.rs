//! Create, update and delete of case records, with derived payment fields
//! and an audit trail.
//!
//! Every operation is a short fetch, derive, persist, audit sequence against
//! the injected repositories. There is no shared state between calls.
//!
//! # Isolation
//!
//! Updates are not compare-and-swap. Two concurrent updates of the same
//! record both read, merge and write; the later write wins and the loser's
//! audit batch may describe changes that no longer hold. Callers needing
//! stronger isolation must add optimistic concurrency tokens above this
//! layer.
//!
//! # Audit failures
//!
//! Audit entries are written after the primary write (before it, for
//! deletes). A failed audit write is logged at `warn` and otherwise ignored;
//! it never turns a committed mutation into an error.

use crate::aggregator::{aggregate_with, Settlement};
use crate::audit::{diff, AuditLog, AuditSubject, FieldChange, FieldValues};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::patient::{Patient, PatientPatch};
use crate::record::{NewRecord, Record, RecordPatch, DERIVED_FIELDS};
use crate::repository::{
    ActorProvider, AuditRepository, CodeGenerator, PatientRepository, RecordRepository,
};
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// What to write to the audit trail after a mutation.
enum AuditEvent {
    Created(String),
    Changed(Vec<FieldChange>),
    Deleted(String),
}

/// Orchestrates record mutations.
pub struct RecordMutator {
    records: Arc<dyn RecordRepository>,
    patients: Arc<dyn PatientRepository>,
    codes: Arc<dyn CodeGenerator>,
    actors: Arc<dyn ActorProvider>,
    audit: AuditLog,
    config: EngineConfig,
}

impl RecordMutator {
    /// Creates a mutator with the default [`EngineConfig`].
    pub fn new(
        records: Arc<dyn RecordRepository>,
        patients: Arc<dyn PatientRepository>,
        audit: Arc<dyn AuditRepository>,
        codes: Arc<dyn CodeGenerator>,
        actors: Arc<dyn ActorProvider>,
    ) -> Self {
        RecordMutator {
            records,
            patients,
            codes,
            actors,
            audit: AuditLog::new(audit),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The audit log this mutator writes to, for querying.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Creates a record for an existing patient.
    ///
    /// A total below `min_total`, including zero and negatives, is raised to
    /// `min_total` rather than rejected.
    /// The code is requested from the generator and regenerated when it
    /// collides, up to `code_attempts` times.
    pub async fn create(&self, new: NewRecord) -> Result<Record> {
        let patient = self
            .patients
            .find_by_id(new.patient_id)
            .await?
            .ok_or(EngineError::NotFound {
                kind: "patient",
                id: new.patient_id,
            })?;

        let total_amount = if new.total_amount < self.config.min_total {
            debug!(
                "Raising total {} to minimum {} on create",
                new.total_amount, self.config.min_total
            );
            self.config.min_total
        } else {
            new.total_amount
        };

        let now = Utc::now();
        let mut record = Record {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            code: String::new(),
            exam_type: new.exam_type,
            total_amount,
            exchange_rate: new.exchange_rate,
            payment_status: Default::default(),
            remaining: total_amount,
            payments: new.payments,
            sample_type: new.sample_type,
            diagnosis: new.diagnosis,
            observations: new.observations,
            treating_doctor: new.treating_doctor,
            created_at: now,
            updated_at: now,
        };
        record.normalize_amounts();
        self.settle(&mut record);

        let attempts = self.config.code_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.insert_with_code(&mut record, now.date_naive()).await {
                Ok(()) => break,
                Err(EngineError::DuplicateCode(code)) if attempt < attempts => {
                    warn!(
                        "Code {} already taken (attempt {}/{}), regenerating",
                        code, attempt, attempts
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Created record {} ({})", record.id, record.code);

        let description = format!("{} - {}", record.code, patient.full_name);
        let event = AuditEvent::Created(description);
        self.write_audit(AuditSubject::Case(record.id), event).await;

        Ok(record)
    }

    /// Merges `patch` onto the stored record, re-derives payment fields from
    /// all slots and persists the result.
    ///
    /// Fails with `Validation` if the merged total is not positive.
    pub async fn update(&self, id: Uuid, patch: RecordPatch) -> Result<Record> {
        let current = self
            .records
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound { kind: "record", id })?;

        let mut merged = current.clone();
        patch.apply(&mut merged);

        if !merged.total_amount.is_positive() {
            return Err(EngineError::validation(
                "total_amount",
                format!("must be greater than zero, got {}", merged.total_amount),
            ));
        }

        merged.normalize_amounts();
        self.settle(&mut merged);
        merged.updated_at = Utc::now();

        self.records.update(&merged).await?;
        info!(
            "Updated record {} ({}): status {}, remaining {}",
            merged.id, merged.code, merged.payment_status, merged.remaining
        );

        let changes = diff(
            &current.fields(),
            &proposed(&merged.fields(), patch.field_names().into_iter().chain(DERIVED_FIELDS)),
        );
        if changes.is_empty() {
            debug!("Update of record {} changed no field", id);
        } else {
            let event = AuditEvent::Changed(changes);
            self.write_audit(AuditSubject::Case(id), event).await;
        }

        Ok(merged)
    }

    /// Deletes a record. Deleting a missing record succeeds without effect.
    ///
    /// The `deleted_record` entry is written before the row is removed. If
    /// the removal then fails, the error is returned and the row stays; a
    /// retry writes a second `deleted_record` entry for the same record.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let record = match self.records.find_by_id(id).await? {
            Some(record) => record,
            None => {
                debug!("Record {} already absent, nothing to delete", id);
                return Ok(());
            }
        };

        let description = format!(
            "{} - {}",
            record.code,
            self.subject_name(record.patient_id).await
        );
        let event = AuditEvent::Deleted(description);
        self.write_audit(AuditSubject::Case(id), event).await;

        match self.records.delete(id).await? {
            0 => debug!("Record {} was removed concurrently", id),
            _ => info!("Deleted record {} ({})", id, record.code),
        }
        Ok(())
    }

    /// Merges `patch` onto a stored patient and audits the changed fields.
    pub async fn update_patient(&self, id: Uuid, patch: PatientPatch) -> Result<Patient> {
        let current = self
            .patients
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound { kind: "patient", id })?;

        let mut merged = current.clone();
        patch.apply(&mut merged);

        if merged.full_name.trim().is_empty() {
            return Err(EngineError::validation("full_name", "must not be blank"));
        }

        merged.updated_at = Utc::now();
        self.patients.update(&merged).await?;
        info!("Updated patient {}", id);

        let changes = diff(
            &current.fields(),
            &proposed(&merged.fields(), patch.field_names()),
        );
        if !changes.is_empty() {
            let event = AuditEvent::Changed(changes);
            self.write_audit(AuditSubject::Patient(id), event).await;
        }

        Ok(merged)
    }

    fn settle(&self, record: &mut Record) -> Settlement {
        let settlement = aggregate_with(
            &self.config.limits,
            self.config.settlement_epsilon,
            record.total_amount,
            record.exchange_rate,
            &record.payments,
            record.payment_status,
        );
        for c in settlement.contributions.iter().filter(|c| c.was_corrected) {
            debug!(
                "Record {}: slot {} amount read as {}",
                record.id,
                c.slot + 1,
                c.amount
            );
        }
        record.apply_settlement(&settlement);
        settlement
    }

    async fn insert_with_code(&self, record: &mut Record, date: NaiveDate) -> Result<()> {
        record.code = self.codes.generate_code(&record.exam_type, date).await?;
        self.records.insert(record).await
    }

    async fn subject_name(&self, patient_id: Uuid) -> String {
        match self.patients.find_by_id(patient_id).await {
            Ok(Some(patient)) => patient.full_name,
            Ok(None) => patient_id.to_string(),
            Err(e) => {
                warn!("Could not load patient {}: {}", patient_id, e);
                patient_id.to_string()
            }
        }
    }

    async fn write_audit(&self, subject: AuditSubject, event: AuditEvent) {
        let actor = match self.actors.current_actor() {
            Some(actor) => actor,
            None => {
                warn!("No authenticated actor, audit of {} skipped", subject);
                return;
            }
        };

        let result = match event {
            AuditEvent::Created(description) => {
                self.audit.record_created(subject, &actor, &description).await
            }
            AuditEvent::Changed(changes) => self.audit.append(subject, &actor, changes).await,
            AuditEvent::Deleted(description) => {
                self.audit.record_deleted(subject, &actor, &description).await
            }
        };

        if let Err(e) = result {
            warn!("{} (subject {})", e, subject);
        }
    }
}

/// The proposed values of `names`, taken from a merged state.
fn proposed<'a>(merged: &FieldValues, names: impl IntoIterator<Item = &'a str>) -> FieldValues {
    names
        .into_iter()
        .filter_map(|name| merged.get_key_value(name))
        .map(|(name, value)| (*name, value.clone()))
        .collect()
}
