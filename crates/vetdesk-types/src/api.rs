use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, LeadSource, MailMessage, Opportunity, Owner, Patient,
    PipelineStage, Prescription, PrescriptionItem,
};
use crate::validate::ValidationError;

// -- Mail gateway --

/// One page of a mailbox listing. The gateway pages until `next_page`
/// is `None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessagePage {
    pub messages: Vec<MailMessage>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

/// Attachment converted to its transport encoding. Built at send time, not
/// before (blobs stay opaque bytes until then).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncodedAttachment {
    pub name: String,
    pub mime_type: String,
    pub content_base64: String,
}

/// Body of a send/reply call. A reply carries the conversation id of the
/// exchange it continues; a fresh send leaves it empty.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub conversation_id: Option<String>,
    pub attachments: Vec<EncodedAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendReceipt {
    pub message_id: String,
}

// -- Opportunity forms --

/// Submission form for a new lead. `build` fixes the initial stage; the
/// contact fields are free-form and only checked for presence.
#[derive(Debug, Clone, Default)]
pub struct OpportunityDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub product: String,
    pub source: Option<LeadSource>,
}

impl OpportunityDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::MissingField("first_name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("last_name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        if self.source.is_none() {
            return Err(ValidationError::MissingField("source"));
        }
        Ok(())
    }

    /// Validate and promote to a full record. New opportunities always
    /// start in `Unassigned`.
    pub fn build(self) -> Result<Opportunity, ValidationError> {
        self.validate()?;
        Ok(Opportunity {
            id: Uuid::new_v4(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            product: self.product,
            source: self.source.unwrap_or(LeadSource::Web),
            status: PipelineStage::Unassigned,
            created_at: Utc::now(),
        })
    }
}

/// Contact-field edit for an existing opportunity. Absent fields are left
/// untouched; the status is never editable through this path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl ContactUpdate {
    pub fn apply_to(&self, opportunity: &mut Opportunity) {
        if let Some(v) = &self.first_name {
            opportunity.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            opportunity.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            opportunity.email = v.clone();
        }
        if let Some(v) = &self.phone {
            opportunity.phone = v.clone();
        }
        if let Some(v) = &self.product {
            opportunity.product = v.clone();
        }
    }
}

/// Body of the backend stage-change call. Durable storage of a board move
/// is the backend's job; the board itself only mutates in memory.
#[derive(Debug, Clone, Serialize)]
pub struct StagePatch {
    pub status: PipelineStage,
}

// -- Record forms --

#[derive(Debug, Clone, Default)]
pub struct AppointmentDraft {
    pub patient_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub reason: String,
}

impl AppointmentDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.is_none() {
            return Err(ValidationError::MissingField("patient"));
        }
        if self.employee_id.is_none() {
            return Err(ValidationError::MissingField("employee"));
        }
        if self.start_at.is_none() {
            return Err(ValidationError::MissingField("start_at"));
        }
        if self.reason.trim().is_empty() {
            return Err(ValidationError::MissingField("reason"));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Appointment, ValidationError> {
        self.validate()?;
        Ok(Appointment {
            id: Uuid::new_v4(),
            patient_id: self.patient_id.unwrap_or_default(),
            employee_id: self.employee_id.unwrap_or_default(),
            start_at: self.start_at.unwrap_or_default(),
            duration_minutes: if self.duration_minutes == 0 {
                30
            } else {
                self.duration_minutes
            },
            reason: self.reason,
            status: AppointmentStatus::Scheduled,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionDraft {
    pub patient_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub items: Vec<PrescriptionItem>,
    pub notes: Option<String>,
}

impl PrescriptionDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.is_none() {
            return Err(ValidationError::MissingField("patient"));
        }
        if self.employee_id.is_none() {
            return Err(ValidationError::MissingField("employee"));
        }
        if self.items.is_empty() {
            return Err(ValidationError::EmptyList("medication"));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Prescription, ValidationError> {
        self.validate()?;
        Ok(Prescription {
            id: Uuid::new_v4(),
            patient_id: self.patient_id.unwrap_or_default(),
            employee_id: self.employee_id.unwrap_or_default(),
            items: self.items,
            issued_on: Utc::now().date_naive(),
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientDraft {
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
}

impl PatientDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.is_none() {
            return Err(ValidationError::MissingField("owner"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.species.trim().is_empty() {
            return Err(ValidationError::MissingField("species"));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Patient, ValidationError> {
        self.validate()?;
        Ok(Patient {
            id: Uuid::new_v4(),
            owner_id: self.owner_id.unwrap_or_default(),
            name: self.name,
            species: self.species,
            breed: self.breed,
            birth_date: self.birth_date,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct OwnerDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
}

impl OwnerDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::MissingField("first_name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("last_name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Owner, ValidationError> {
        self.validate()?;
        Ok(Owner {
            id: Uuid::new_v4(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opportunity_draft_starts_unassigned() {
        let draft = OpportunityDraft {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            email: "ana@example.com".into(),
            phone: "600111222".into(),
            product: "Dental cleaning".into(),
            source: Some(LeadSource::Instagram),
        };
        let opp = draft.build().unwrap();
        assert_eq!(opp.status, PipelineStage::Unassigned);
        assert_eq!(opp.source, LeadSource::Instagram);
    }

    #[test]
    fn opportunity_draft_rejects_blank_contact() {
        let draft = OpportunityDraft {
            first_name: "  ".into(),
            ..OpportunityDraft::default()
        };
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::MissingField("first_name"))
        ));
    }

    #[test]
    fn appointment_needs_patient() {
        let draft = AppointmentDraft {
            employee_id: Some(Uuid::new_v4()),
            start_at: Some(Utc::now()),
            reason: "Vaccination".into(),
            ..AppointmentDraft::default()
        };
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::MissingField("patient"))
        ));
    }

    #[test]
    fn prescription_needs_at_least_one_item() {
        let draft = PrescriptionDraft {
            patient_id: Some(Uuid::new_v4()),
            employee_id: Some(Uuid::new_v4()),
            items: vec![],
            notes: None,
        };
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::EmptyList("medication"))
        ));
    }

    #[test]
    fn contact_update_leaves_absent_fields() {
        let mut opp = OpportunityDraft {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            email: "ana@example.com".into(),
            phone: "600111222".into(),
            product: "Checkup".into(),
            source: Some(LeadSource::Web),
        }
        .build()
        .unwrap();

        ContactUpdate {
            phone: Some("699000000".into()),
            ..ContactUpdate::default()
        }
        .apply_to(&mut opp);

        assert_eq!(opp.phone, "699000000");
        assert_eq!(opp.first_name, "Ana");
        assert_eq!(opp.status, PipelineStage::Unassigned);
    }
}
