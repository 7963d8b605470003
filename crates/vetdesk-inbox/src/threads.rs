use std::collections::HashMap;

use vetdesk_types::models::{MailFolder, MailMessage, Thread};

/// Fold a flat message list into conversation threads for one mailbox view.
///
/// Runs from scratch over the full snapshot every time, with no caching or
/// deltas. Grouping is by conversation id; the representative of a group is
/// its most recent message (received time, else sent time; messages with
/// neither sort after everything). `unread_count` only has meaning for the
/// Received view, since outbound mail carries no read flag for the sender.
/// The output is ordered newest thread first.
pub fn aggregate_threads(messages: &[MailMessage], folder: MailFolder) -> Vec<Thread> {
    // Group in first-occurrence order so ties stay deterministic.
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&MailMessage>> = Vec::new();
    for message in messages {
        match index.get(message.conversation_id.as_str()) {
            Some(&slot) => groups[slot].push(message),
            None => {
                index.insert(message.conversation_id.as_str(), groups.len());
                groups.push(vec![message]);
            }
        }
    }

    let mut threads: Vec<Thread> = groups
        .into_iter()
        .map(|mut group| {
            // Newest first; stable, so equal timestamps keep input order.
            group.sort_by(|a, b| b.effective_timestamp().cmp(&a.effective_timestamp()));
            let representative = group[0];

            let unread_count = match folder {
                MailFolder::Received => group.iter().filter(|m| !m.is_read).count(),
                MailFolder::Sent => 0,
            };

            Thread {
                conversation_id: representative.conversation_id.clone(),
                account_id: representative.account_id,
                subject: representative.subject.clone(),
                snippet: representative.snippet.clone(),
                participants: participants_of(representative),
                unread_count,
                last_activity: representative.effective_timestamp(),
                message_count: group.len(),
                has_attachments: group.iter().any(|m| !m.attachments.is_empty()),
            }
        })
        .collect();

    threads.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    threads
}

/// Sum of unread counts across a thread list.
pub fn unread_total(threads: &[Thread]) -> usize {
    threads.iter().map(|t| t.unread_count).sum()
}

/// Sender first, then the recipients in order, de-duplicated. Only the
/// representative message's parties are surfaced, not the union across
/// the whole group.
fn participants_of(message: &MailMessage) -> Vec<String> {
    let mut participants = Vec::with_capacity(1 + message.to.len() + message.cc.len());
    participants.push(message.sender.clone());
    for address in message.to.iter().chain(message.cc.iter()) {
        if !participants.contains(address) {
            participants.push(address.clone());
        }
    }
    participants
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn message(conv: &str, received: Option<&str>, read: bool) -> MailMessage {
        MailMessage {
            id: Uuid::new_v4().to_string(),
            account_id: Uuid::nil(),
            conversation_id: conv.to_string(),
            subject: format!("subject {}", conv),
            snippet: format!("snippet {}", conv),
            body: None,
            sender: "clinic@example.com".to_string(),
            to: vec!["owner@example.com".to_string()],
            cc: vec![],
            received_at: received.map(ts),
            sent_at: None,
            is_read: read,
            attachments: vec![],
        }
    }

    #[test]
    fn one_thread_per_conversation_id() {
        let messages = vec![
            message("A", Some("2025-01-01T10:00:00Z"), true),
            message("B", Some("2025-01-01T11:00:00Z"), true),
            message("A", Some("2025-01-01T12:00:00Z"), true),
            message("C", Some("2025-01-01T13:00:00Z"), true),
        ];

        let threads = aggregate_threads(&messages, MailFolder::Received);

        assert_eq!(threads.len(), 3);
        let grouped: usize = threads.iter().map(|t| t.message_count).sum();
        assert_eq!(grouped, messages.len());
    }

    #[test]
    fn threads_come_out_newest_first() {
        let messages = vec![
            message("old", Some("2025-01-01T08:00:00Z"), true),
            message("new", Some("2025-03-01T08:00:00Z"), true),
            message("mid", Some("2025-02-01T08:00:00Z"), true),
        ];

        let threads = aggregate_threads(&messages, MailFolder::Received);

        for pair in threads.windows(2) {
            assert!(pair[0].last_activity >= pair[1].last_activity);
        }
        assert_eq!(threads[0].conversation_id, "new");
        assert_eq!(threads[2].conversation_id, "old");
    }

    #[test]
    fn representative_is_the_latest_message() {
        let mut older = message("A", Some("2025-01-01T10:00:00Z"), true);
        older.subject = "older subject".to_string();
        let mut newer = message("A", Some("2025-01-02T09:00:00Z"), true);
        newer.subject = "newer subject".to_string();

        // Insertion order is oldest-last on purpose: the representative
        // must come from the timestamp, not the position.
        let threads = aggregate_threads(&[newer, older], MailFolder::Received);

        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].subject, "newer subject");
        assert_eq!(threads[0].last_activity, Some(ts("2025-01-02T09:00:00Z")));
    }

    #[test]
    fn received_and_sent_unread_semantics() {
        let messages = vec![
            message("A", Some("2025-01-01T10:00:00Z"), false),
            message("A", Some("2025-01-02T10:00:00Z"), true),
            message("A", Some("2025-01-03T10:00:00Z"), false),
        ];

        let received = aggregate_threads(&messages, MailFolder::Received);
        assert_eq!(received[0].unread_count, 2);

        // Outbound mail has no read/unread meaning for the sender.
        let sent = aggregate_threads(&messages, MailFolder::Sent);
        assert_eq!(sent[0].unread_count, 0);
    }

    #[test]
    fn two_conversation_scenario() {
        let messages = vec![
            message("A", Some("2025-01-01T10:00:00Z"), false),
            message("A", Some("2025-01-02T09:00:00Z"), true),
            message("B", Some("2025-01-01T12:00:00Z"), false),
        ];

        let threads = aggregate_threads(&messages, MailFolder::Received);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].conversation_id, "A");
        assert_eq!(threads[0].unread_count, 1);
        assert_eq!(threads[0].last_activity, Some(ts("2025-01-02T09:00:00Z")));
        assert_eq!(threads[1].conversation_id, "B");
        assert_eq!(threads[1].unread_count, 1);
    }

    #[test]
    fn missing_timestamps_sort_last() {
        let dated = message("A", Some("2025-01-01T10:00:00Z"), true);
        let mut undated = message("A", None, true);
        undated.subject = "undated".to_string();
        let mut sent_only = message("B", None, true);
        sent_only.sent_at = Some(ts("2025-02-01T10:00:00Z"));

        let threads = aggregate_threads(&[undated, dated, sent_only], MailFolder::Received);

        // Sent time stands in when received time is absent.
        assert_eq!(threads[0].conversation_id, "B");
        assert_eq!(threads[0].last_activity, Some(ts("2025-02-01T10:00:00Z")));
        // Within A the undated message lost to the dated one.
        assert_eq!(threads[1].subject, "subject A");

        let only_undated = aggregate_threads(
            &[message("C", None, true)],
            MailFolder::Received,
        );
        assert_eq!(only_undated[0].last_activity, None);
    }

    #[test]
    fn participants_come_from_the_representative_only() {
        let mut older = message("A", Some("2025-01-01T10:00:00Z"), true);
        older.sender = "stranger@example.com".to_string();
        older.to = vec!["someone-else@example.com".to_string()];

        let mut newer = message("A", Some("2025-01-05T10:00:00Z"), true);
        newer.sender = "vet@example.com".to_string();
        newer.to = vec!["owner@example.com".to_string(), "vet@example.com".to_string()];
        newer.cc = vec!["owner@example.com".to_string(), "admin@example.com".to_string()];

        let threads = aggregate_threads(&[older, newer], MailFolder::Received);

        assert_eq!(
            threads[0].participants,
            vec![
                "vet@example.com".to_string(),
                "owner@example.com".to_string(),
                "admin@example.com".to_string(),
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate_threads(&[], MailFolder::Received).is_empty());
    }
}
