//! Collaborator interfaces the engine is constructed with.
//!
//! Implementations map their own driver failures into
//! [`EngineError`](crate::EngineError): unreachable backends into
//! `Connection`, unique-code violations into `DuplicateCode`, anything else
//! into `Storage`.

use crate::audit::{Actor, AuditEntry, AuditFilter};
use crate::error::Result;
use crate::pagination::{Page, PageRequest};
use crate::patient::Patient;
use crate::record::Record;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Point access to case records.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Returns `Ok(None)` if no record has this id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Record>>;

    /// Fails with `DuplicateCode` if another record already uses the code.
    async fn insert(&self, record: &Record) -> Result<()>;

    /// Overwrites the stored record with the same id.
    async fn update(&self, record: &Record) -> Result<()>;

    /// Returns the number of rows removed, zero if already gone.
    async fn delete(&self, id: Uuid) -> Result<usize>;
}

/// Point access to patients.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Patient>>;

    async fn update(&self, patient: &Patient) -> Result<()>;
}

/// Append-only audit storage.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert_batch(&self, entries: &[AuditEntry]) -> Result<()>;

    /// Entries matching `filter`, newest first.
    async fn query(&self, filter: &AuditFilter, page: PageRequest) -> Result<Page<AuditEntry>>;
}

/// Source of unique human-readable record codes.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// May fail with `DuplicateCode`; callers retry once.
    async fn generate_code(&self, exam_type: &str, date: NaiveDate) -> Result<String>;
}

/// Source of the authenticated user for the current request.
pub trait ActorProvider: Send + Sync {
    fn current_actor(&self) -> Option<Actor>;
}
