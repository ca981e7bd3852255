//! Patient model, the second audited entity kind.

use crate::audit::FieldValues;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    /// National identity document number.
    pub id_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(full_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            id_number: None,
            phone: None,
            email: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fields(&self) -> FieldValues {
        let mut fields = FieldValues::new();
        fields.insert("full_name", Some(self.full_name.clone()));
        fields.insert("id_number", self.id_number.clone());
        fields.insert("phone", self.phone.clone());
        fields.insert("email", self.email.clone());
        fields.insert("address", self.address.clone());
        fields
    }
}

/// A partial patient update; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientPatch {
    pub full_name: Option<String>,
    pub id_number: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl PatientPatch {
    pub fn apply(&self, patient: &mut Patient) {
        if let Some(name) = &self.full_name {
            patient.full_name = name.clone();
        }
        if let Some(value) = &self.id_number {
            patient.id_number = value.clone();
        }
        if let Some(value) = &self.phone {
            patient.phone = value.clone();
        }
        if let Some(value) = &self.email {
            patient.email = value.clone();
        }
        if let Some(value) = &self.address {
            patient.address = value.clone();
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("full_name", self.full_name.is_some()),
            ("id_number", self.id_number.is_some()),
            ("phone", self.phone.is_some()),
            ("email", self.email.is_some()),
            ("address", self.address.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_apply_and_names() {
        let mut patient = Patient::new("Ana Perez");
        patient.phone = Some("0414-1234567".to_string());

        let patch = PatientPatch {
            email: Some(Some("ana@example.com".to_string())),
            phone: Some(None),
            ..PatientPatch::default()
        };
        patch.apply(&mut patient);

        assert_eq!(patient.email.as_deref(), Some("ana@example.com"));
        assert_eq!(patient.phone, None);
        assert_eq!(patient.full_name, "Ana Perez");
        assert_eq!(patch.field_names(), vec!["phone", "email"]);
    }
}
