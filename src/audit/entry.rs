//! Persisted audit entries and the filters used to query them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which kind of subject an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "medical_case")]
    Case,
    #[serde(rename = "patient")]
    Patient,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Case => "medical_case",
            EntityKind::Patient => "patient",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subject a batch of audit entries is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditSubject {
    Case(Uuid),
    Patient(Uuid),
}

impl AuditSubject {
    pub fn kind(self) -> EntityKind {
        match self {
            AuditSubject::Case(_) => EntityKind::Case,
            AuditSubject::Patient(_) => EntityKind::Patient,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            AuditSubject::Case(id) | AuditSubject::Patient(id) => id,
        }
    }
}

impl fmt::Display for AuditSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// The authenticated user a mutation is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl Actor {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Actor {
            id,
            email: email.into(),
            display_name: None,
        }
    }
}

/// One immutable row of the audit trail.
///
/// Values are stored as strings regardless of the field's type. Entries
/// written by the same mutation share `changed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub medical_record_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub entity_type: EntityKind,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_display_name: Option<String>,
    pub field_name: String,
    pub field_label: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_at: DateTime<Utc>,
    /// Self-describing snapshot kept on deletion entries, since the subject
    /// row is gone afterwards.
    pub deleted_record_info: Option<String>,
}

impl AuditEntry {
    /// Id of the case or patient this entry is about.
    pub fn subject_id(&self) -> Option<Uuid> {
        match self.entity_type {
            EntityKind::Case => self.medical_record_id,
            EntityKind::Patient => self.patient_id,
        }
    }
}

/// Query predicate over audit entries. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub subject_id: Option<Uuid>,
    pub entity_kind: Option<EntityKind>,
    pub actor_id: Option<Uuid>,
    pub actor_email: Option<String>,
    /// Inclusive lower bound.
    pub changed_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub changed_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring matched against label, old and new value.
    pub search: Option<String>,
}

impl AuditFilter {
    /// Filter for every entry about `subject`.
    pub fn for_subject(subject: AuditSubject) -> Self {
        AuditFilter {
            subject_id: Some(subject.id()),
            entity_kind: Some(subject.kind()),
            ..AuditFilter::default()
        }
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(id) = self.subject_id {
            if entry.subject_id() != Some(id) {
                return false;
            }
        }
        if let Some(kind) = self.entity_kind {
            if entry.entity_type != kind {
                return false;
            }
        }
        if let Some(actor_id) = self.actor_id {
            if entry.user_id != actor_id {
                return false;
            }
        }
        if let Some(email) = &self.actor_email {
            if !entry.user_email.eq_ignore_ascii_case(email) {
                return false;
            }
        }
        if let Some(from) = self.changed_from {
            if entry.changed_at < from {
                return false;
            }
        }
        if let Some(to) = self.changed_to {
            if entry.changed_at > to {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                [
                    Some(entry.field_label.as_str()),
                    entry.old_value.as_deref(),
                    entry.new_value.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(
        subject: AuditSubject,
        label: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> AuditEntry {
        let (medical_record_id, patient_id) = match subject {
            AuditSubject::Case(id) => (Some(id), None),
            AuditSubject::Patient(id) => (None, Some(id)),
        };
        AuditEntry {
            id: Uuid::new_v4(),
            medical_record_id,
            patient_id,
            entity_type: subject.kind(),
            user_id: Uuid::nil(),
            user_email: "Recepcion@Lab.test".to_string(),
            user_display_name: None,
            field_name: "field".to_string(),
            field_label: label.to_string(),
            old_value: old.map(str::to_string),
            new_value: new.map(str::to_string),
            changed_at: Utc::now(),
            deleted_record_info: None,
        }
    }

    #[test]
    fn test_subject_filter_respects_kind() {
        let id = Uuid::new_v4();
        let case_entry = entry(AuditSubject::Case(id), "Monto total", None, None);
        let patient_entry = entry(AuditSubject::Patient(id), "Teléfono", None, None);

        let filter = AuditFilter::for_subject(AuditSubject::Case(id));
        assert!(filter.matches(&case_entry));
        assert!(!filter.matches(&patient_entry));
    }

    #[test]
    fn test_search_is_case_insensitive_over_label_and_values() {
        let e = entry(
            AuditSubject::Case(Uuid::new_v4()),
            "Estado de pago",
            Some("Pendiente"),
            Some("Completado"),
        );
        let search = |s: &str| AuditFilter {
            search: Some(s.to_string()),
            ..AuditFilter::default()
        };
        assert!(search("estado").matches(&e));
        assert!(search("COMPLETADO").matches(&e));
        assert!(search("pendiente").matches(&e));
        assert!(!search("cancelado").matches(&e));
        assert!(search("   ").matches(&e));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let e = entry(AuditSubject::Case(Uuid::new_v4()), "x", None, None);
        let exact = AuditFilter {
            changed_from: Some(e.changed_at),
            changed_to: Some(e.changed_at),
            ..AuditFilter::default()
        };
        assert!(exact.matches(&e));

        let later = AuditFilter {
            changed_from: Some(e.changed_at + Duration::seconds(1)),
            ..AuditFilter::default()
        };
        assert!(!later.matches(&e));
    }

    #[test]
    fn test_actor_email_match_ignores_case() {
        let e = entry(AuditSubject::Case(Uuid::new_v4()), "x", None, None);
        let filter = AuditFilter {
            actor_email: Some("recepcion@lab.test".to_string()),
            ..AuditFilter::default()
        };
        assert!(filter.matches(&e));
    }
}
