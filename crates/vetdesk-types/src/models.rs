use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Sales pipeline --

/// Where an opportunity sits in the sales/admission pipeline.
///
/// Closed set: a record carrying any other value is rejected at the
/// deserialization boundary and can never reach a board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Unassigned,
    FollowUp,
    ClinicAppointment,
    OnlineConsultation,
    Discarded,
}

impl PipelineStage {
    /// Board columns in display order. Every stage is always a column,
    /// including empty ones.
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Unassigned,
        PipelineStage::FollowUp,
        PipelineStage::ClinicAppointment,
        PipelineStage::OnlineConsultation,
        PipelineStage::Discarded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Unassigned => "Unassigned",
            PipelineStage::FollowUp => "Follow-up",
            PipelineStage::ClinicAppointment => "Clinic appointment",
            PipelineStage::OnlineConsultation => "Online consultation",
            PipelineStage::Discarded => "Discarded",
        }
    }
}

/// Channel an opportunity came in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Web,
    Email,
    Telemarketing,
    Instagram,
    Facebook,
    Linkedin,
    Tiktok,
}

/// A sales lead: someone who showed interest in a clinic service.
///
/// Created with `status = Unassigned`; afterwards only the status (board
/// moves) and the contact fields change. There is no delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Opportunity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Free-text label of the service the lead asked about.
    pub product: String,
    pub source: LeadSource,
    pub status: PipelineStage,
    pub created_at: DateTime<Utc>,
}

// -- Mail --

/// Directional classification of a mailbox view. Every raw message belongs
/// to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailFolder {
    Received,
    Sent,
}

impl MailFolder {
    /// Wire/path segment, matching the serde casing.
    pub fn as_str(self) -> &'static str {
        match self {
            MailFolder::Received => "received",
            MailFolder::Sent => "sent",
        }
    }
}

/// Metadata for an attachment as reported by the provider. The blob itself
/// is only fetched on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// One inbound or outbound message as returned by a mail provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailMessage {
    /// Provider-scoped opaque id.
    pub id: String,
    /// The connected account this message was fetched through.
    pub account_id: Uuid,
    /// Opaque id shared by every message of one exchange.
    pub conversation_id: String,
    pub subject: String,
    pub snippet: String,
    #[serde(default)]
    pub body: Option<String>,
    pub sender: String,
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    pub is_read: bool,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
}

impl MailMessage {
    /// Timestamp used for thread ordering: received time if present, else
    /// sent time. `None` is the sentinel that sorts after every real
    /// timestamp.
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.received_at.or(self.sent_at)
    }
}

/// A conversation: derived view over the raw messages sharing one
/// conversation id. Recomputed from scratch on every aggregation, never
/// persisted or mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub conversation_id: String,
    /// Account the representative (most recent) message came through.
    pub account_id: Uuid,
    /// Subject and snippet always come from the representative message.
    pub subject: String,
    pub snippet: String,
    /// Sender followed by recipients of the representative message, in
    /// order, de-duplicated.
    pub participants: Vec<String>,
    /// Unread messages in the group. Always 0 for Sent threads.
    pub unread_count: usize,
    pub last_activity: Option<DateTime<Utc>>,
    pub message_count: usize,
    pub has_attachments: bool,
}

/// Kind of external mailbox/social credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProviderKind {
    Imap,
    Gmail,
    Outlook,
    Instagram,
    Facebook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Disconnected,
}

/// An external mailbox/social credential whose messages feed the
/// aggregator. An account that fails authorization is flipped to
/// `Disconnected` and skipped until reconnected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectedAccount {
    pub id: Uuid,
    pub display_name: String,
    /// Address messages are sent from (mailbox address or social handle).
    pub address: String,
    pub provider: MailProviderKind,
    pub status: AccountStatus,
    /// Opaque bearer credential for the provider gateway.
    pub access_token: String,
}

impl ConnectedAccount {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

// -- Clinic records --
//
// Flat shapes the forms submit and the lists render. The managed backend
// owns every business rule; nothing here computes beyond display helpers.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Owner {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// The staff member the slot is booked with.
    pub employee_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: String,
    pub status: AppointmentStatus,
}

/// One billable line on an invoice or budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Fraction, e.g. 0.21 for 21% VAT.
    pub tax_rate: f64,
}

impl BillingLine {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub fn total(&self) -> f64 {
        self.subtotal() * (1.0 + self.tax_rate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub lines: Vec<BillingLine>,
    pub issued_on: NaiveDate,
}

impl Invoice {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(BillingLine::total).sum()
    }
}

/// A quote: same line shape as an invoice, but with an expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Budget {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub lines: Vec<BillingLine>,
    pub issued_on: NaiveDate,
    pub valid_until: NaiveDate,
}

impl Budget {
    pub fn total(&self) -> f64 {
        self.lines.iter().map(BillingLine::total).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// Settlement of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sale {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrescriptionItem {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Prescribing vet.
    pub employee_id: Uuid,
    pub items: Vec<PrescriptionItem>,
    pub issued_on: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Vet,
    Assistant,
    Receptionist,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: StaffRole,
    pub started_on: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_use_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&PipelineStage::ClinicAppointment).unwrap();
        assert_eq!(json, "\"clinic-appointment\"");
        let back: PipelineStage = serde_json::from_str("\"follow-up\"").unwrap();
        assert_eq!(back, PipelineStage::FollowUp);
    }

    #[test]
    fn unknown_stage_is_rejected_at_the_boundary() {
        let result: Result<PipelineStage, _> = serde_json::from_str("\"archived\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_rejected_at_the_boundary() {
        let json = r#"{
            "id": "6f2c0a42-8f4f-4b1a-9d6e-0a2b3c4d5e6f",
            "first_name": "Ana",
            "last_name": "Ruiz",
            "email": "ana@example.com",
            "phone": "600111222",
            "product": "Checkup",
            "source": "web",
            "status": "unassigned",
            "created_at": "2025-01-01T10:00:00Z",
            "assigned_vet": "someone"
        }"#;
        let result: Result<Opportunity, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn messages_tolerate_omitted_optional_fields() {
        let json = r#"{
            "id": "m-1",
            "account_id": "6f2c0a42-8f4f-4b1a-9d6e-0a2b3c4d5e6f",
            "conversation_id": "conv-1",
            "subject": "Results",
            "snippet": "All clear",
            "sender": "vet@example.com",
            "to": ["owner@example.com"],
            "is_read": false
        }"#;
        let message: MailMessage = serde_json::from_str(json).unwrap();
        assert!(message.body.is_none());
        assert!(message.cc.is_empty());
        assert_eq!(message.effective_timestamp(), None);
        assert!(message.attachments.is_empty());
    }
}
