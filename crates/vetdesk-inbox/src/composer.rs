use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use tracing::warn;

use vetdesk_types::api::{EncodedAttachment, OutgoingMessage};
use vetdesk_types::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientField {
    To,
    Cc,
    Bcc,
}

/// An attachment staged on a draft: an opaque in-memory blob. Conversion
/// to the transport encoding happens at send time, never earlier.
#[derive(Debug, Clone)]
pub struct DraftAttachment {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// Accumulates one outgoing message before a send action.
///
/// Recipient lists are kept duplicate-free per field (case-sensitive exact
/// match, so they go through the add/remove methods rather than being
/// public). Subject and body bind directly to form inputs.
#[derive(Debug, Default)]
pub struct Composer {
    pub subject: String,
    pub body: String,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    attachments: Vec<DraftAttachment>,
    conversation_id: Option<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a reply: the outgoing message keeps the conversation id so the
    /// aggregator files it into the same thread.
    pub fn reply_to(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Self::default()
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    fn list(&self, field: RecipientField) -> &Vec<String> {
        match field {
            RecipientField::To => &self.to,
            RecipientField::Cc => &self.cc,
            RecipientField::Bcc => &self.bcc,
        }
    }

    fn list_mut(&mut self, field: RecipientField) -> &mut Vec<String> {
        match field {
            RecipientField::To => &mut self.to,
            RecipientField::Cc => &mut self.cc,
            RecipientField::Bcc => &mut self.bcc,
        }
    }

    /// Append `address` to the field's list unless an exact match is
    /// already there. Returns whether anything was added.
    pub fn add_recipient(&mut self, field: RecipientField, address: &str) -> bool {
        let list = self.list_mut(field);
        if list.iter().any(|existing| existing == address) {
            return false;
        }
        list.push(address.to_string());
        true
    }

    /// Drop every entry equal to `address` from the field's list.
    pub fn remove_recipient(&mut self, field: RecipientField, address: &str) {
        self.list_mut(field).retain(|existing| existing != address);
    }

    pub fn recipients(&self, field: RecipientField) -> &[String] {
        self.list(field)
    }

    pub fn attach(&mut self, name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) {
        self.attachments.push(DraftAttachment {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        });
    }

    pub fn remove_attachment(&mut self, name: &str) {
        self.attachments.retain(|a| a.name != name);
    }

    pub fn attachments(&self) -> &[DraftAttachment] {
        &self.attachments
    }

    /// The send guard: subject and body non-empty, at least one To
    /// recipient. The send button stays disabled until this holds.
    pub fn can_send(&self) -> bool {
        !self.subject.trim().is_empty() && !self.body.trim().is_empty() && !self.to.is_empty()
    }

    /// Convert staged blobs to the transport encoding. A blob over the
    /// provider's size limit fails conversion: it is logged and dropped,
    /// and the rest of the batch still goes out.
    pub fn encode_attachments(&self, limit_bytes: usize) -> Vec<EncodedAttachment> {
        let mut encoded = Vec::with_capacity(self.attachments.len());
        for attachment in &self.attachments {
            if attachment.data.len() > limit_bytes {
                warn!(
                    "dropping attachment '{}': {} bytes exceeds the {} byte limit",
                    attachment.name,
                    attachment.data.len(),
                    limit_bytes
                );
                continue;
            }
            encoded.push(EncodedAttachment {
                name: attachment.name.clone(),
                mime_type: attachment.mime_type.clone(),
                content_base64: B64.encode(&attachment.data),
            });
        }
        encoded
    }

    /// Run the guard and assemble the wire message. Oversize attachments
    /// are dropped (see `encode_attachments`); everything else is a copy.
    pub fn build_outgoing(&self, attachment_limit_bytes: usize) -> Result<OutgoingMessage, ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingField("subject"));
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::MissingField("body"));
        }
        if self.to.is_empty() {
            return Err(ValidationError::EmptyList("to"));
        }
        Ok(OutgoingMessage {
            subject: self.subject.clone(),
            body: self.body.clone(),
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            conversation_id: self.conversation_id.clone(),
            attachments: self.encode_attachments(attachment_limit_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_draft() -> Composer {
        let mut composer = Composer::new();
        composer.subject = "Vaccination reminder".to_string();
        composer.body = "Milo is due next week.".to_string();
        composer.add_recipient(RecipientField::To, "owner@example.com");
        composer
    }

    #[test]
    fn adding_the_same_address_twice_changes_nothing() {
        let mut composer = Composer::new();
        assert!(composer.add_recipient(RecipientField::To, "owner@example.com"));
        assert!(!composer.add_recipient(RecipientField::To, "owner@example.com"));
        assert_eq!(composer.recipients(RecipientField::To).len(), 1);
    }

    #[test]
    fn address_match_is_case_sensitive() {
        let mut composer = Composer::new();
        composer.add_recipient(RecipientField::To, "Owner@example.com");
        composer.add_recipient(RecipientField::To, "owner@example.com");
        assert_eq!(composer.recipients(RecipientField::To).len(), 2);
    }

    #[test]
    fn remove_only_touches_the_named_field() {
        let mut composer = Composer::new();
        composer.add_recipient(RecipientField::To, "owner@example.com");
        composer.add_recipient(RecipientField::Cc, "owner@example.com");

        composer.remove_recipient(RecipientField::To, "owner@example.com");

        assert!(composer.recipients(RecipientField::To).is_empty());
        assert_eq!(composer.recipients(RecipientField::Cc).len(), 1);
    }

    #[test]
    fn send_guard_requires_subject_body_and_to() {
        let mut composer = Composer::new();
        assert!(!composer.can_send());

        composer.subject = "Hi".to_string();
        composer.body = "Body".to_string();
        assert!(!composer.can_send()); // still no To recipient

        composer.add_recipient(RecipientField::Cc, "cc@example.com");
        assert!(!composer.can_send()); // Cc does not satisfy the guard

        composer.add_recipient(RecipientField::To, "owner@example.com");
        assert!(composer.can_send());
    }

    #[test]
    fn blank_subject_blocks_the_send() {
        let mut composer = ready_draft();
        composer.subject = "   ".to_string();
        assert!(matches!(
            composer.build_outgoing(1024),
            Err(ValidationError::MissingField("subject"))
        ));
    }

    #[test]
    fn oversize_attachment_is_dropped_but_the_send_proceeds() {
        let mut composer = ready_draft();
        composer.attach("small.txt", "text/plain", Bytes::from_static(b"ok"));
        composer.attach("huge.bin", "application/octet-stream", Bytes::from(vec![0u8; 64]));
        composer.attach("also-small.txt", "text/plain", Bytes::from_static(b"fine"));

        let outgoing = composer.build_outgoing(16).unwrap();

        let names: Vec<&str> = outgoing.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["small.txt", "also-small.txt"]);
    }

    #[test]
    fn reply_keeps_the_conversation_id() {
        let mut composer = Composer::reply_to("conv-42");
        composer.subject = "Re: results".to_string();
        composer.body = "All clear.".to_string();
        composer.add_recipient(RecipientField::To, "owner@example.com");

        let outgoing = composer.build_outgoing(1024).unwrap();
        assert_eq!(outgoing.conversation_id.as_deref(), Some("conv-42"));
    }
}
