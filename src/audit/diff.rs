//! Field-level differences between a stored state and a proposed one.

use std::collections::BTreeMap;

/// Stringified field values keyed by persisted field name.
///
/// `None` stands for an absent value; empty strings are treated the same.
pub type FieldValues = BTreeMap<&'static str, Option<String>>;

/// Field name of the synthetic entry written when a record is created.
pub const CREATED_RECORD: &str = "created_record";

/// Field name of the synthetic entry written before a record is deleted.
pub const DELETED_RECORD: &str = "deleted_record";

const FIELD_LABELS: &[(&str, &str)] = &[
    (CREATED_RECORD, "Registro creado"),
    (DELETED_RECORD, "Registro eliminado"),
    ("patient_id", "Paciente"),
    ("code", "Código"),
    ("exam_type", "Tipo de examen"),
    ("total_amount", "Monto total"),
    ("exchange_rate", "Tasa de cambio"),
    ("payment_status", "Estado de pago"),
    ("remaining", "Monto restante"),
    ("payment_method_1", "Método de pago 1"),
    ("payment_method_2", "Método de pago 2"),
    ("payment_method_3", "Método de pago 3"),
    ("payment_method_4", "Método de pago 4"),
    ("payment_amount_1", "Monto de pago 1"),
    ("payment_amount_2", "Monto de pago 2"),
    ("payment_amount_3", "Monto de pago 3"),
    ("payment_amount_4", "Monto de pago 4"),
    ("payment_reference_1", "Referencia de pago 1"),
    ("payment_reference_2", "Referencia de pago 2"),
    ("payment_reference_3", "Referencia de pago 3"),
    ("payment_reference_4", "Referencia de pago 4"),
    ("conversion_1", "Conversión 1"),
    ("conversion_2", "Conversión 2"),
    ("conversion_3", "Conversión 3"),
    ("conversion_4", "Conversión 4"),
    ("sample_type", "Tipo de muestra"),
    ("diagnosis", "Diagnóstico"),
    ("observations", "Observaciones"),
    ("treating_doctor", "Médico tratante"),
    ("full_name", "Nombre completo"),
    ("id_number", "Cédula"),
    ("phone", "Teléfono"),
    ("email", "Correo electrónico"),
    ("address", "Dirección"),
];

/// Human-readable label for `field`, or the field name itself when unknown.
pub fn field_label(field: &str) -> String {
    FIELD_LABELS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| field.to_string())
}

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub label: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(field: &str, old_value: Option<String>, new_value: Option<String>) -> Self {
        FieldChange {
            field: field.to_string(),
            label: field_label(field),
            old_value,
            new_value,
        }
    }
}

/// Compares every field in `proposed` against `old`.
///
/// Fields missing from `old` compare as empty. An empty result means there
/// is nothing to audit and no entry may be written.
pub fn diff(old: &FieldValues, proposed: &FieldValues) -> Vec<FieldChange> {
    proposed
        .iter()
        .filter_map(|(field, new_value)| {
            let old_value = canonical(old.get(field).cloned().flatten());
            let new_value = canonical(new_value.clone());
            (old_value != new_value).then(|| FieldChange::new(field, old_value, new_value))
        })
        .collect()
}

fn canonical(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
