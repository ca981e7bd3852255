//! Case record model, creation input and partial updates.

use crate::aggregator::Settlement;
use crate::audit::FieldValues;
use crate::decimal::Money;
use crate::normalizer::RawAmount;
use crate::payment::{PaymentEntry, PaymentMethod, PaymentStatus, PAYMENT_SLOTS};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const METHOD_FIELDS: [&str; PAYMENT_SLOTS] = [
    "payment_method_1",
    "payment_method_2",
    "payment_method_3",
    "payment_method_4",
];
pub const AMOUNT_FIELDS: [&str; PAYMENT_SLOTS] = [
    "payment_amount_1",
    "payment_amount_2",
    "payment_amount_3",
    "payment_amount_4",
];
pub const REFERENCE_FIELDS: [&str; PAYMENT_SLOTS] = [
    "payment_reference_1",
    "payment_reference_2",
    "payment_reference_3",
    "payment_reference_4",
];
pub const CONVERSION_FIELDS: [&str; PAYMENT_SLOTS] = [
    "conversion_1",
    "conversion_2",
    "conversion_3",
    "conversion_4",
];

/// Fields derived by settlement rather than supplied by the caller.
pub const DERIVED_FIELDS: [&str; 2] = ["payment_status", "remaining"];

/// A billable lab case.
///
/// # Invariants
///
/// - `total_amount > 0`
/// - `remaining == max(total_amount - paid_in_base_currency, 0)`
/// - `payment_status` is derived from the payment slots unless it is
///   `Cancelado`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub patient_id: Uuid,

    /// Human-readable unique code, e.g. `"BIO-260119-0042"`.
    pub code: String,
    pub exam_type: String,

    /// Amount owed, in base currency.
    pub total_amount: Money,

    /// Local-currency units per one base-currency unit.
    pub exchange_rate: Option<Decimal>,

    pub payment_status: PaymentStatus,
    pub remaining: Money,
    pub payments: [PaymentEntry; PAYMENT_SLOTS],

    pub sample_type: Option<String>,
    pub diagnosis: Option<String>,
    pub observations: Option<String>,
    pub treating_doctor: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Copies derived payment fields from a settlement.
    pub fn apply_settlement(&mut self, settlement: &Settlement) {
        self.remaining = settlement.remaining;
        self.payment_status = settlement.status;
    }

    /// Rewrites captured slot amounts into their numeric form.
    ///
    /// Blank amounts become unset. Corrections are not written back; the
    /// stored amount is what was entered, only normalized.
    pub fn normalize_amounts(&mut self) {
        for entry in self.payments.iter_mut() {
            entry.amount = match entry.amount.take() {
                Some(raw) if raw.is_blank() => None,
                Some(raw) => Some(RawAmount::from(raw.to_money())),
                None => None,
            };
        }
    }

    /// Every auditable field, stringified, keyed by its persisted name.
    pub fn fields(&self) -> FieldValues {
        let mut fields = FieldValues::new();
        fields.insert("patient_id", Some(self.patient_id.to_string()));
        fields.insert("code", Some(self.code.clone()));
        fields.insert("exam_type", Some(self.exam_type.clone()));
        fields.insert("total_amount", Some(self.total_amount.to_plain_string()));
        fields.insert(
            "exchange_rate",
            self.exchange_rate.map(|rate| rate.normalize().to_string()),
        );
        fields.insert("payment_status", Some(self.payment_status.to_string()));
        fields.insert("remaining", Some(self.remaining.to_plain_string()));

        for (slot, entry) in self.payments.iter().enumerate() {
            fields.insert(METHOD_FIELDS[slot], entry.method.map(|m| m.to_string()));
            fields.insert(
                AMOUNT_FIELDS[slot],
                entry.amount.as_ref().map(RawAmount::to_audit_string),
            );
            fields.insert(REFERENCE_FIELDS[slot], entry.reference.clone());
            fields.insert(
                CONVERSION_FIELDS[slot],
                entry.conversion.map(|c| c.normalize().to_string()),
            );
        }

        fields.insert("sample_type", self.sample_type.clone());
        fields.insert("diagnosis", self.diagnosis.clone());
        fields.insert("observations", self.observations.clone());
        fields.insert("treating_doctor", self.treating_doctor.clone());
        fields
    }
}

/// Input for creating a record. The code and timestamps are assigned on
/// creation; `remaining` and the status are derived.
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub patient_id: Uuid,
    pub exam_type: String,
    pub total_amount: Money,
    pub exchange_rate: Option<Decimal>,
    pub payments: [PaymentEntry; PAYMENT_SLOTS],
    pub sample_type: Option<String>,
    pub diagnosis: Option<String>,
    pub observations: Option<String>,
    pub treating_doctor: Option<String>,
}

/// Changes to one payment slot. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentPatch {
    pub method: Option<Option<PaymentMethod>>,
    pub amount: Option<Option<RawAmount>>,
    pub reference: Option<Option<String>>,
    pub conversion: Option<Option<Decimal>>,
}

/// A partial update. Only fields set to `Some` are applied and audited;
/// for nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub exam_type: Option<String>,
    pub total_amount: Option<Money>,
    pub exchange_rate: Option<Option<Decimal>>,
    /// Sets or clears `Cancelado`. Any other value is re-derived.
    pub payment_status: Option<PaymentStatus>,
    pub payments: [PaymentPatch; PAYMENT_SLOTS],
    pub sample_type: Option<Option<String>>,
    pub diagnosis: Option<Option<String>>,
    pub observations: Option<Option<String>>,
    pub treating_doctor: Option<Option<String>>,
}

impl RecordPatch {
    /// Patch touching a single slot's amount.
    pub fn payment_amount(slot: usize, amount: impl Into<RawAmount>) -> Self {
        let mut patch = RecordPatch::default();
        if let Some(payment) = patch.payments.get_mut(slot) {
            payment.amount = Some(Some(amount.into()));
        }
        patch
    }

    /// Applies every set field onto `record`.
    pub fn apply(&self, record: &mut Record) {
        if let Some(exam_type) = &self.exam_type {
            record.exam_type = exam_type.clone();
        }
        if let Some(total) = self.total_amount {
            record.total_amount = total;
        }
        if let Some(rate) = self.exchange_rate {
            record.exchange_rate = rate;
        }
        if let Some(status) = self.payment_status {
            record.payment_status = status;
        }

        for (patch, entry) in self.payments.iter().zip(record.payments.iter_mut()) {
            if let Some(method) = patch.method {
                entry.method = method;
            }
            if let Some(amount) = &patch.amount {
                entry.amount = amount.clone();
            }
            if let Some(reference) = &patch.reference {
                entry.reference = reference.clone();
            }
            if let Some(conversion) = patch.conversion {
                entry.conversion = conversion;
            }
        }

        if let Some(value) = &self.sample_type {
            record.sample_type = value.clone();
        }
        if let Some(value) = &self.diagnosis {
            record.diagnosis = value.clone();
        }
        if let Some(value) = &self.observations {
            record.observations = value.clone();
        }
        if let Some(value) = &self.treating_doctor {
            record.treating_doctor = value.clone();
        }
    }

    /// Persisted names of the fields this patch sets.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.exam_type.is_some() {
            names.push("exam_type");
        }
        if self.total_amount.is_some() {
            names.push("total_amount");
        }
        if self.exchange_rate.is_some() {
            names.push("exchange_rate");
        }
        if self.payment_status.is_some() {
            names.push("payment_status");
        }
        for (slot, patch) in self.payments.iter().enumerate() {
            if patch.method.is_some() {
                names.push(METHOD_FIELDS[slot]);
            }
            if patch.amount.is_some() {
                names.push(AMOUNT_FIELDS[slot]);
            }
            if patch.reference.is_some() {
                names.push(REFERENCE_FIELDS[slot]);
            }
            if patch.conversion.is_some() {
                names.push(CONVERSION_FIELDS[slot]);
            }
        }
        if self.sample_type.is_some() {
            names.push("sample_type");
        }
        if self.diagnosis.is_some() {
            names.push("diagnosis");
        }
        if self.observations.is_some() {
            names.push("observations");
        }
        if self.treating_doctor.is_some() {
            names.push("treating_doctor");
        }
        names
    }

    /// Returns `true` if the patch sets no field.
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn sample_record() -> Record {
        let now = Utc::now();
        Record {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            code: "BIO-0001".to_string(),
            exam_type: "Biopsia".to_string(),
            total_amount: dec("100"),
            exchange_rate: None,
            payment_status: PaymentStatus::Pendiente,
            remaining: dec("100"),
            payments: Default::default(),
            sample_type: None,
            diagnosis: None,
            observations: None,
            treating_doctor: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut record = sample_record();
        record.diagnosis = Some("benigno".to_string());

        let mut patch = RecordPatch::payment_amount(1, "50");
        patch.payments[1].method = Some(Some(PaymentMethod::Zelle));
        patch.observations = Some(Some("urgente".to_string()));
        patch.apply(&mut record);

        assert_eq!(record.payments[1].method, Some(PaymentMethod::Zelle));
        assert_eq!(record.payments[1].amount, Some(RawAmount::from("50")));
        assert_eq!(record.observations.as_deref(), Some("urgente"));
        assert_eq!(record.diagnosis.as_deref(), Some("benigno"));
        assert!(record.payments[0].is_empty());
    }

    #[test]
    fn test_patch_can_clear_nullable_fields() {
        let mut record = sample_record();
        record.exchange_rate = Some(Decimal::new(36, 0));
        let patch = RecordPatch {
            exchange_rate: Some(None),
            ..RecordPatch::default()
        };
        patch.apply(&mut record);
        assert_eq!(record.exchange_rate, None);
    }

    #[test]
    fn test_field_names_follow_persisted_layout() {
        let mut patch = RecordPatch::payment_amount(1, "50");
        patch.total_amount = Some(dec("120"));
        patch.payments[3].conversion = Some(None);
        assert_eq!(
            patch.field_names(),
            vec!["total_amount", "payment_amount_2", "conversion_4"]
        );
        assert!(RecordPatch::default().is_empty());
    }

    #[test]
    fn test_normalize_amounts() {
        let mut record = sample_record();
        record.payments[0] = PaymentEntry::new(PaymentMethod::PointOfSale, "5.606,39");
        record.payments[1].amount = Some(RawAmount::from(" "));
        record.normalize_amounts();

        assert_eq!(
            record.payments[0].amount,
            Some(RawAmount::Number(Decimal::new(560639, 2)))
        );
        assert_eq!(record.payments[1].amount, None);
    }

    #[test]
    fn test_fields_are_stringified() {
        let mut record = sample_record();
        record.payments[0] = PaymentEntry::new(PaymentMethod::PointOfSale, dec("1120"));
        let fields = record.fields();

        assert_eq!(fields["total_amount"].as_deref(), Some("100"));
        assert_eq!(fields["payment_method_1"].as_deref(), Some("Punto de venta"));
        assert_eq!(fields["payment_amount_1"].as_deref(), Some("1120"));
        assert_eq!(fields["payment_method_2"], None);
        assert_eq!(fields["payment_status"].as_deref(), Some("Pendiente"));
    }
}
