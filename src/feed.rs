//! Message feed synchronization for one conversation.
//!
//! `MessageFeed` owns the ordered message sequence for the open conversation:
//! it merges the initial bounded fetch with live insert events, keeps the
//! sequence deduplicated and ordered by `created_at`, caches author snapshots,
//! and decides when the viewport should follow new messages versus showing a
//! "new messages" affordance. All mutation happens on the UI thread, driven by
//! drained backend events.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::types::{Conversation, Message, MessageRow, Profile};

/// Page size of the initial historical fetch.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// Viewport distance from the bottom (in points) under which an arriving
/// message scrolls the view instead of raising the pending indicator.
pub const SCROLL_FOLLOW_THRESHOLD: f32 = 100.0;

/// Gap after which a message shows its author header again even when the
/// previous message has the same author.
fn author_header_gap() -> Duration {
    Duration::minutes(5)
}

/// What happened to a realtime insert event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Merged into the sequence; the caller applies the scroll policy.
    Merged,
    /// Already present (duplicate delivery); dropped silently.
    Duplicate,
    /// Not for this conversation, or malformed; dropped.
    Rejected,
    /// Author snapshot unknown; the row is parked and the caller should
    /// issue a single profile lookup for this author id.
    NeedsAuthor(String),
    /// Author lookup already in flight; the row is parked behind it.
    Parked,
}

/// Per-conversation feed state: ordered messages, author cache, UI flags.
pub struct MessageFeed {
    conversation: Conversation,
    messages: Vec<Message>,
    /// Author snapshots keyed by author id, kept for the feed's lifetime.
    authors: HashMap<String, Profile>,
    /// Rows waiting for an author lookup, keyed by author id.
    parked: HashMap<String, Vec<MessageRow>>,
    pub loading: bool,
    pub pending_new_messages: bool,
}

impl MessageFeed {
    /// Open a feed for a conversation. Starts in the loading state; history
    /// arrives through [`MessageFeed::apply_history`].
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            messages: Vec::new(),
            authors: HashMap::new(),
            parked: HashMap::new(),
            loading: true,
            pending_new_messages: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn author(&self, id: &str) -> Option<&Profile> {
        self.authors.get(id)
    }

    /// Apply the historical fetch result. Results for a conversation other
    /// than the one this feed shows are stale and discarded.
    ///
    /// Returns true when accepted; the caller then scrolls to the bottom.
    pub fn apply_history(&mut self, conversation: &Conversation, messages: Vec<Message>) -> bool {
        if *conversation != self.conversation {
            tracing::debug!(?conversation, "discarding stale history response");
            return false;
        }
        self.messages.clear();
        for message in messages {
            self.authors
                .insert(message.author.id.clone(), message.author.clone());
            self.merge(message);
        }
        self.loading = false;
        self.pending_new_messages = false;
        true
    }

    /// Record a failed historical fetch: the feed stays empty, loading is
    /// cleared, no retry is issued.
    pub fn history_failed(&mut self, conversation: &Conversation) {
        if *conversation == self.conversation {
            self.loading = false;
        }
    }

    /// Handle a realtime insert payload for this feed's conversation.
    pub fn on_remote_insert(&mut self, actor_id: &str, record: &Value) -> InsertOutcome {
        let row = match self.conversation.parse_row(actor_id, record) {
            Ok(row) => row,
            Err(err) => {
                tracing::debug!(%err, "dropping insert event");
                return InsertOutcome::Rejected;
            }
        };
        if self.contains(&row.id) {
            return InsertOutcome::Duplicate;
        }
        match self.authors.get(&row.author_id) {
            Some(author) => {
                let author = author.clone();
                self.merge(row.resolve(author));
                InsertOutcome::Merged
            }
            None => {
                let author_id = row.author_id.clone();
                let pending = self.parked.entry(author_id.clone()).or_default();
                let first = pending.is_empty();
                pending.push(row);
                if first {
                    InsertOutcome::NeedsAuthor(author_id)
                } else {
                    InsertOutcome::Parked
                }
            }
        }
    }

    /// Fill the author cache and merge any rows parked on this author.
    /// Returns the number of messages merged.
    pub fn resolve_author(&mut self, author: Profile) -> usize {
        let rows = self.parked.remove(&author.id).unwrap_or_default();
        self.authors.insert(author.id.clone(), author.clone());
        let mut merged = 0;
        for row in rows {
            if !self.contains(&row.id) {
                self.merge(row.resolve(author.clone()));
                merged += 1;
            }
        }
        merged
    }

    /// Drop rows parked on an author whose lookup failed.
    pub fn author_missing(&mut self, author_id: &str) {
        if self.parked.remove(author_id).is_some() {
            tracing::warn!(author_id, "dropping messages with unresolvable author");
        }
    }

    /// Scroll policy for a just-merged arrival: follow the bottom when the
    /// viewport is within [`SCROLL_FOLLOW_THRESHOLD`] of it, otherwise raise
    /// the pending indicator and leave the viewport alone.
    ///
    /// Returns true when the caller should scroll to the bottom.
    pub fn note_arrival(&mut self, distance_from_bottom: f32) -> bool {
        if distance_from_bottom < SCROLL_FOLLOW_THRESHOLD {
            self.pending_new_messages = false;
            true
        } else {
            self.pending_new_messages = true;
            false
        }
    }

    /// The viewport reached the bottom. Idempotent; clears the pending
    /// indicator.
    pub fn mark_at_bottom(&mut self) {
        self.pending_new_messages = false;
    }

    /// Apply a successful edit echoed back by the backend. Direct-message
    /// rows carry no edited flag, so only channel messages get the marker.
    pub fn apply_edit(&mut self, id: &str, content: &str) {
        let mark = self.conversation.is_channel();
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.to_string();
            if mark {
                message.edited = true;
            }
        }
    }

    /// Apply a successful delete echoed back by the backend.
    pub fn apply_delete(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
    }

    /// Lazy view of the sequence grouped by calendar date of `created_at`,
    /// ascending, each run preserving message order. Recomputed on demand,
    /// never stored.
    pub fn group_by_date(&self) -> impl Iterator<Item = (NaiveDate, &[Message])> {
        self.messages
            .chunk_by(|a, b| a.created_at.date_naive() == b.created_at.date_naive())
            .map(|run| (run[0].created_at.date_naive(), run))
    }

    fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
            || self
                .parked
                .values()
                .any(|rows| rows.iter().any(|r| r.id == id))
    }

    /// Insert keeping `created_at` ascending order, ties resolved by keeping
    /// insertion order stable. A no-op merge when events already arrive in
    /// order, a corrective one otherwise.
    fn merge(&mut self, message: Message) {
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
    }
}

/// Display rule for one message inside its date group: show the author
/// header when it opens the group, the author changed, or more than five
/// minutes passed since the previous message.
pub fn should_show_author_header(group: &[Message], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let prev = &group[index - 1];
    let cur = &group[index];
    cur.author.id != prev.author.id || cur.created_at - prev.created_at > author_header_gap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.into(),
            full_name: format!("User {}", id),
            avatar_url: None,
            is_online: false,
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap()
    }

    fn message(id: &str, author: &str, created_at: DateTime<Utc>) -> Message {
        Message {
            id: id.into(),
            content: format!("message {}", id),
            created_at,
            author: profile(author),
            edited: false,
        }
    }

    fn channel_feed() -> MessageFeed {
        MessageFeed::new(Conversation::channel("general"))
    }

    fn insert_record(id: &str, author: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "content": "hello",
            "created_at": created_at,
            "channel_id": "general",
            "user_id": author,
        })
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(
            &conv,
            vec![message("a", "u1", at(0)), message("b", "u2", at(1))],
        );

        let before: Vec<String> = feed.messages().iter().map(|m| m.id.clone()).collect();
        let outcome =
            feed.on_remote_insert("me", &insert_record("a", "u1", "2024-05-01T10:00:00Z"));
        assert_eq!(outcome, InsertOutcome::Duplicate);
        let after: Vec<String> = feed.messages().iter().map(|m| m.id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_out_of_order_insert_is_corrected() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![message("late", "u1", at(10))]);

        let outcome =
            feed.on_remote_insert("me", &insert_record("early", "u1", "2024-05-01T10:02:00Z"));
        assert_eq!(outcome, InsertOutcome::Merged);
        let ids: Vec<&str> = feed.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![message("first", "u1", at(0))]);
        feed.on_remote_insert("me", &insert_record("second", "u1", "2024-05-01T10:00:00Z"));
        feed.on_remote_insert("me", &insert_record("third", "u1", "2024-05-01T10:00:00Z"));

        let ids: Vec<&str> = feed.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_stale_history_is_discarded() {
        // Open X, switch to Y, then X's fetch resolves: Y's feed unaffected.
        let mut feed = MessageFeed::new(Conversation::channel("y"));
        let stale = Conversation::channel("x");
        let accepted = feed.apply_history(&stale, vec![message("a", "u1", at(0))]);
        assert!(!accepted);
        assert!(feed.is_empty());
        assert!(feed.loading);

        let fresh = Conversation::channel("y");
        assert!(feed.apply_history(&fresh, vec![message("b", "u2", at(1))]));
        assert!(!feed.loading);
        assert_eq!(feed.messages().len(), 1);
    }

    #[test]
    fn test_history_failure_clears_loading_only() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.history_failed(&Conversation::channel("other"));
        assert!(feed.loading);
        feed.history_failed(&conv);
        assert!(!feed.loading);
        assert!(feed.is_empty());
    }

    #[test]
    fn test_unknown_author_parks_until_resolved() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![]);

        let first =
            feed.on_remote_insert("me", &insert_record("m1", "newbie", "2024-05-01T10:00:00Z"));
        assert_eq!(first, InsertOutcome::NeedsAuthor("newbie".into()));

        // Second event for the same author parks behind the in-flight lookup.
        let second =
            feed.on_remote_insert("me", &insert_record("m2", "newbie", "2024-05-01T10:01:00Z"));
        assert_eq!(second, InsertOutcome::Parked);
        assert!(feed.is_empty());

        let merged = feed.resolve_author(profile("newbie"));
        assert_eq!(merged, 2);
        assert_eq!(feed.messages().len(), 2);
        assert_eq!(feed.messages()[0].author.full_name, "User newbie");

        // The cache now covers this author: no further lookups.
        let third =
            feed.on_remote_insert("me", &insert_record("m3", "newbie", "2024-05-01T10:02:00Z"));
        assert_eq!(third, InsertOutcome::Merged);
    }

    #[test]
    fn test_duplicate_of_parked_row_is_dropped() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![]);

        feed.on_remote_insert("me", &insert_record("m1", "newbie", "2024-05-01T10:00:00Z"));
        let dup =
            feed.on_remote_insert("me", &insert_record("m1", "newbie", "2024-05-01T10:00:00Z"));
        assert_eq!(dup, InsertOutcome::Duplicate);

        assert_eq!(feed.resolve_author(profile("newbie")), 1);
    }

    #[test]
    fn test_author_missing_drops_parked_rows() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![]);
        feed.on_remote_insert("me", &insert_record("m1", "ghost", "2024-05-01T10:00:00Z"));
        feed.author_missing("ghost");
        assert_eq!(feed.resolve_author(profile("ghost")), 0);
        assert!(feed.is_empty());
    }

    #[test]
    fn test_foreign_conversation_insert_is_rejected() {
        let mut feed = channel_feed();
        let record = json!({
            "id": "m1",
            "content": "hi",
            "created_at": "2024-05-01T10:00:00Z",
            "channel_id": "random",
            "user_id": "u1",
        });
        assert_eq!(feed.on_remote_insert("me", &record), InsertOutcome::Rejected);
    }

    #[test]
    fn test_scroll_policy_near_bottom_follows() {
        let mut feed = channel_feed();
        feed.pending_new_messages = true;
        assert!(feed.note_arrival(99.0));
        assert!(!feed.pending_new_messages);
    }

    #[test]
    fn test_scroll_policy_far_from_bottom_sets_pending() {
        let mut feed = channel_feed();
        assert!(!feed.note_arrival(240.0));
        assert!(feed.pending_new_messages);

        // Reaching the bottom clears the indicator; doing so twice is fine.
        feed.mark_at_bottom();
        feed.mark_at_bottom();
        assert!(!feed.pending_new_messages);
    }

    #[test]
    fn test_group_by_date_runs_ascending() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        let day1 = Utc.with_ymd_and_hms(2024, 5, 1, 23, 50, 0).unwrap();
        let day2a = Utc.with_ymd_and_hms(2024, 5, 2, 0, 5, 0).unwrap();
        let day2b = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        feed.apply_history(
            &conv,
            vec![
                message("a", "u1", day1),
                message("b", "u1", day2a),
                message("c", "u2", day2b),
            ],
        );

        let groups: Vec<(NaiveDate, usize)> = feed
            .group_by_date()
            .map(|(date, run)| (date, run.len()))
            .collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, 1);
        assert_eq!(groups[1].1, 2);
        assert!(groups[0].0 < groups[1].0);

        // Restartable: a second pass yields the same view.
        assert_eq!(feed.group_by_date().count(), 2);
    }

    #[test]
    fn test_author_header_rule() {
        // [A@t0, A@t0+1m, B@t0+2m, B@t0+10m] -> [true, false, true, true]
        let group = vec![
            message("m1", "a", at(0)),
            message("m2", "a", at(1)),
            message("m3", "b", at(2)),
            message("m4", "b", at(12)),
        ];
        let headers: Vec<bool> = (0..group.len())
            .map(|i| should_show_author_header(&group, i))
            .collect();
        assert_eq!(headers, vec![true, false, true, true]);
    }

    #[test]
    fn test_apply_edit_and_delete() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(
            &conv,
            vec![message("a", "u1", at(0)), message("b", "u1", at(1))],
        );

        feed.apply_edit("a", "changed");
        assert_eq!(feed.messages()[0].content, "changed");
        assert!(feed.messages()[0].edited);

        feed.apply_delete("b");
        assert_eq!(feed.messages().len(), 1);
        feed.apply_delete("b");
        assert_eq!(feed.messages().len(), 1);
    }

    #[test]
    fn test_direct_message_edit_carries_no_marker() {
        let mut feed = MessageFeed::new(Conversation::direct("bob"));
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![message("d1", "me", at(0))]);

        feed.apply_edit("d1", "changed");
        assert_eq!(feed.messages()[0].content, "changed");
        assert!(!feed.messages()[0].edited);
    }

    #[test]
    fn test_history_seeds_author_cache() {
        let mut feed = channel_feed();
        let conv = feed.conversation().clone();
        feed.apply_history(&conv, vec![message("a", "u1", at(0))]);
        assert!(feed.author("u1").is_some());

        // A live insert from the same author needs no lookup.
        let outcome =
            feed.on_remote_insert("me", &insert_record("m2", "u1", "2024-05-01T10:05:00Z"));
        assert_eq!(outcome, InsertOutcome::Merged);
    }
}
