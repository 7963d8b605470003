use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MailFolder, PipelineStage};

/// Record family, for generic "something was saved" notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Owner,
    Patient,
    Appointment,
    Invoice,
    Budget,
    Sale,
    Prescription,
    Employee,
}

/// Events the session emits after a state change. The UI shell subscribes
/// and re-renders the affected surface; it never recomputes state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A mailbox refresh finished and the thread list was rebuilt.
    InboxUpdated {
        folder: MailFolder,
        thread_count: usize,
        unread_total: usize,
    },

    /// A mailbox refresh failed outright, or partially (some accounts
    /// skipped). Prior threads stay on screen.
    InboxFailed { folder: MailFolder, message: String },

    /// An account's credential was rejected; it was dropped from future
    /// refreshes until reconnected.
    AccountDisconnected { account_id: Uuid, address: String },

    /// The opportunity list was reloaded from the backend.
    PipelineUpdated { total: usize },

    OpportunityCreated { id: Uuid },

    /// A board move was applied (locally and at the backend).
    OpportunityMoved { id: Uuid, stage: PipelineStage },

    /// A composer draft went out through a connected account.
    DraftSent { account_id: Uuid, message_id: String },

    RecordSaved { kind: RecordKind, id: Uuid },
}
