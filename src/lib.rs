//! # Reconciliation Engine
//!
//! Payment reconciliation and audit trail for lab case records.
//!
//! A case is paid through up to four payment slots, each in base currency
//! or in a local currency converted through the case's exchange rate. The
//! engine normalizes how amounts were typed, recovers amounts that lost their
//! decimal point, settles the slots into a paid total, remaining balance and
//! status, and keeps an immutable field-level audit trail of every change.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 4 decimal places via `rust_decimal`
//! - **Lenient parsing**: malformed amounts read as zero, never as errors
//! - **Sticky cancellation**: a `Cancelado` case is never re-derived
//! - **Injected persistence**: every collaborator is a trait object, with
//!   in-memory implementations in [`memory`]
//! - **Best-effort audit**: a failed audit write never fails the mutation
//!
//! ## Example
//!
//! ```
//! use reconciliation_engine::{aggregate, Money, PaymentEntry, PaymentMethod, PaymentStatus};
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let slots = [PaymentEntry::new(PaymentMethod::PointOfSale, "1.120,00")];
//! let settlement = aggregate(
//!     Money::from_str("100").unwrap(),
//!     Some(Decimal::from_str("11.2").unwrap()),
//!     &slots,
//!     PaymentStatus::Pendiente,
//! );
//! assert_eq!(settlement.status, PaymentStatus::Completado);
//! ```

pub mod aggregator;
pub mod audit;
pub mod config;
pub mod corrector;
pub mod decimal;
pub mod error;
pub mod memory;
pub mod mutator;
pub mod normalizer;
pub mod pagination;
pub mod patient;
pub mod payment;
pub mod record;
pub mod repository;

pub use aggregator::{aggregate, aggregate_with, Settlement, SlotContribution};
pub use audit::{
    diff, field_label, Actor, AuditEntry, AuditFilter, AuditLog, AuditSubject, EntityKind,
    FieldChange, FieldValues,
};
pub use config::EngineConfig;
pub use corrector::{correct, correct_with, Correction, CorrectionLimits, CorrectionReason};
pub use decimal::Money;
pub use error::{EngineError, Result};
pub use mutator::RecordMutator;
pub use normalizer::{is_valid_number, parse_amount, RawAmount};
pub use pagination::{Page, PageRequest};
pub use patient::{Patient, PatientPatch};
pub use payment::{Currency, PaymentEntry, PaymentMethod, PaymentStatus, PAYMENT_SLOTS};
pub use record::{NewRecord, PaymentPatch, Record, RecordPatch};
pub use repository::{
    ActorProvider, AuditRepository, CodeGenerator, PatientRepository, RecordRepository,
};
