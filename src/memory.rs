//! In-memory implementations of the collaborator traits.
//!
//! Suitable for tests and for embedding the engine without a database.

use crate::audit::{Actor, AuditEntry, AuditFilter};
use crate::error::{EngineError, Result};
use crate::pagination::{Page, PageRequest};
use crate::patient::Patient;
use crate::record::Record;
use crate::repository::{
    ActorProvider, AuditRepository, CodeGenerator, PatientRepository, RecordRepository,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Records keyed by id, with a unique-code constraint.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<Uuid, Record>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Record>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn insert(&self, record: &Record) -> Result<()> {
        let mut records = self.records.write();
        if records.values().any(|r| r.code == record.code) {
            return Err(EngineError::DuplicateCode(record.code.clone()));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &Record) -> Result<()> {
        let mut records = self.records.write();
        match records.get_mut(&record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(EngineError::NotFound {
                kind: "record",
                id: record.id,
            }),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<usize> {
        Ok(self.records.write().remove(&id).map_or(0, |_| 1))
    }
}

/// Patients keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a patient, replacing any with the same id.
    pub fn insert(&self, patient: Patient) {
        self.patients.write().insert(patient.id, patient);
    }

    pub fn remove(&self, id: Uuid) -> Option<Patient> {
        self.patients.write().remove(&id)
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().get(&id).cloned())
    }

    async fn update(&self, patient: &Patient) -> Result<()> {
        let mut patients = self.patients.write();
        match patients.get_mut(&patient.id) {
            Some(stored) => {
                *stored = patient.clone();
                Ok(())
            }
            None => Err(EngineError::NotFound {
                kind: "patient",
                id: patient.id,
            }),
        }
    }
}

/// Append-only list of audit entries.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
    batches: AtomicU64,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry in insertion order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of `insert_batch` calls received.
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditStore {
    async fn insert_batch(&self, entries: &[AuditEntry]) -> Result<()> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.entries.write().extend_from_slice(entries);
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter, page: PageRequest) -> Result<Page<AuditEntry>> {
        let mut matching: Vec<AuditEntry> = self
            .entries
            .read()
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(Page::paginate(matching, page))
    }
}

/// Generates `PREFIX-YYMMDD-NNNN` codes from a process-wide counter.
///
/// The prefix is the first three alphanumeric characters of the exam type,
/// upper-cased.
#[derive(Debug, Default)]
pub struct SequentialCodeGenerator {
    next: AtomicU64,
}

impl SequentialCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering after `last`.
    pub fn starting_after(last: u64) -> Self {
        SequentialCodeGenerator {
            next: AtomicU64::new(last),
        }
    }
}

#[async_trait]
impl CodeGenerator for SequentialCodeGenerator {
    async fn generate_code(&self, exam_type: &str, date: NaiveDate) -> Result<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let mut prefix: String = exam_type
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase();
        if prefix.is_empty() {
            prefix.push_str("GEN");
        }
        Ok(format!("{}-{}-{:04}", prefix, date.format("%y%m%d"), n))
    }
}

/// Always reports the same actor, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticActor(pub Option<Actor>);

impl StaticActor {
    pub fn new(actor: Actor) -> Self {
        StaticActor(Some(actor))
    }

    pub fn anonymous() -> Self {
        StaticActor(None)
    }
}

impl ActorProvider for StaticActor {
    fn current_actor(&self) -> Option<Actor> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_code_generator_format() {
        let generator = SequentialCodeGenerator::starting_after(41);
        let date = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        let code = generator.generate_code("biopsia", date).await.unwrap();
        assert_eq!(code, "BIO-260119-0042");
        let code = generator.generate_code("--", date).await.unwrap();
        assert_eq!(code, "GEN-260119-0043");
    }

    #[tokio::test]
    async fn test_audit_query_is_newest_first() {
        let store = InMemoryAuditStore::new();
        let base = Utc::now();
        let make = |offset: i64, field: &str| AuditEntry {
            id: Uuid::new_v4(),
            medical_record_id: Some(Uuid::nil()),
            patient_id: None,
            entity_type: crate::audit::EntityKind::Case,
            user_id: Uuid::nil(),
            user_email: "a@b.c".to_string(),
            user_display_name: None,
            field_name: field.to_string(),
            field_label: field.to_string(),
            old_value: None,
            new_value: None,
            changed_at: base + Duration::seconds(offset),
            deleted_record_info: None,
        };
        store
            .insert_batch(&[make(0, "first"), make(20, "third"), make(10, "second")])
            .await
            .unwrap();

        let page = store
            .query(&AuditFilter::default(), PageRequest::new(2, 0))
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, vec!["third", "second"]);
        assert_eq!(page.total, 3);
        assert_eq!(store.batch_count(), 1);
    }

    #[tokio::test]
    async fn test_record_delete_reports_rows_removed() {
        let store = InMemoryRecordStore::new();
        assert_eq!(store.delete(Uuid::new_v4()).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
