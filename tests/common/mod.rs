//! Shared setup for integration tests.

#![allow(dead_code)]

use reconciliation_engine::memory::{
    InMemoryAuditStore, InMemoryPatientStore, InMemoryRecordStore, SequentialCodeGenerator,
    StaticActor,
};
use reconciliation_engine::{
    Actor, AuditRepository, CodeGenerator, Money, Patient, RecordMutator, RecordRepository,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

pub fn dec(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn actor() -> Actor {
    Actor {
        id: Uuid::from_u128(7),
        email: "recepcion@lab.test".to_string(),
        display_name: Some("Recepción".to_string()),
    }
}

/// A mutator wired to in-memory stores, with one seeded patient.
pub struct Harness {
    pub mutator: RecordMutator,
    pub records: Arc<InMemoryRecordStore>,
    pub patients: Arc<InMemoryPatientStore>,
    pub audit: Arc<InMemoryAuditStore>,
    pub patient: Patient,
}

pub fn harness() -> Harness {
    let audit = Arc::new(InMemoryAuditStore::new());
    build(
        audit.clone(),
        audit,
        Arc::new(SequentialCodeGenerator::new()),
        StaticActor::new(actor()),
    )
}

/// Like [`harness`] but writing audit entries to `sink`.
pub fn harness_with_audit(sink: Arc<dyn AuditRepository>) -> Harness {
    build(
        Arc::new(InMemoryAuditStore::new()),
        sink,
        Arc::new(SequentialCodeGenerator::new()),
        StaticActor::new(actor()),
    )
}

pub fn harness_with_codes(codes: Arc<dyn CodeGenerator>) -> Harness {
    let audit = Arc::new(InMemoryAuditStore::new());
    build(audit.clone(), audit, codes, StaticActor::new(actor()))
}

/// Like [`harness`] but persisting records through `repository`, which is
/// expected to delegate to `records`.
pub fn harness_with_records(
    records: Arc<InMemoryRecordStore>,
    repository: Arc<dyn RecordRepository>,
) -> Harness {
    let audit = Arc::new(InMemoryAuditStore::new());
    build_with_records(
        records,
        repository,
        audit.clone(),
        audit,
        Arc::new(SequentialCodeGenerator::new()),
        StaticActor::new(actor()),
    )
}

pub fn harness_without_actor() -> Harness {
    let audit = Arc::new(InMemoryAuditStore::new());
    build(
        audit.clone(),
        audit,
        Arc::new(SequentialCodeGenerator::new()),
        StaticActor::anonymous(),
    )
}

fn build(
    audit: Arc<InMemoryAuditStore>,
    sink: Arc<dyn AuditRepository>,
    codes: Arc<dyn CodeGenerator>,
    actors: StaticActor,
) -> Harness {
    let records = Arc::new(InMemoryRecordStore::new());
    build_with_records(records.clone(), records, audit, sink, codes, actors)
}

fn build_with_records(
    records: Arc<InMemoryRecordStore>,
    repository: Arc<dyn RecordRepository>,
    audit: Arc<InMemoryAuditStore>,
    sink: Arc<dyn AuditRepository>,
    codes: Arc<dyn CodeGenerator>,
    actors: StaticActor,
) -> Harness {
    init_logging();

    let patients = Arc::new(InMemoryPatientStore::new());
    let patient = Patient::new("Ana Perez");
    patients.insert(patient.clone());

    let mutator = RecordMutator::new(
        repository,
        patients.clone(),
        sink,
        codes,
        Arc::new(actors),
    );

    Harness {
        mutator,
        records,
        patients,
        audit,
        patient,
    }
}
