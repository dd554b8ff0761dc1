//! Core application state, separated from UI logic.
//!
//! `ClientState` holds all data that represents the chat session: the signed-
//! in actor, the sidebar lists, the open feed and its header meta. UI
//! components receive state as a parameter rather than owning it.

use std::time::Instant;

use crate::feed::MessageFeed;
use crate::protocol::ConversationMeta;
use crate::types::{Channel, Conversation, Profile};

/// Core application state for the chat client.
#[derive(Default)]
pub struct ClientState {
    /// The signed-in actor's own profile; `None` while on the auth screens.
    pub actor: Option<Profile>,

    /// Channels visible to the actor, ordered by name (backend order).
    pub channels: Vec<Channel>,

    /// Direct-message contacts shown in the sidebar.
    pub contacts: Vec<Profile>,

    /// The open conversation's feed; `None` on the welcome pane.
    pub feed: Option<MessageFeed>,

    /// Header data for the open conversation.
    pub meta: Option<ConversationMeta>,

    /// The open conversation's channel/peer row was not found.
    pub conversation_missing: bool,

    /// Status toast messages with creation time (auto-expire).
    pub notices: Vec<(String, Instant)>,

    /// Viewport distance from the bottom of the feed, measured last frame.
    pub scroll_from_bottom: f32,

    /// One-shot request to scroll the feed to the bottom next frame.
    pub scroll_to_bottom: bool,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor.as_ref().map(|p| p.id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.actor.is_some()
    }

    /// Open a conversation: replaces the feed (loading state) and clears the
    /// previous header meta. The caller sends the matching
    /// `BackendAction::OpenConversation`.
    pub fn open_conversation(&mut self, conversation: Conversation) {
        self.feed = Some(MessageFeed::new(conversation));
        self.meta = None;
        self.conversation_missing = false;
        self.scroll_to_bottom = false;
        self.scroll_from_bottom = 0.0;
    }

    /// Tear down all session data on sign-out.
    pub fn clear_session(&mut self) {
        self.actor = None;
        self.channels.clear();
        self.contacts.clear();
        self.feed = None;
        self.meta = None;
        self.conversation_missing = false;
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push((text.into(), Instant::now()));
    }

    /// Purge notices older than the given duration.
    pub fn purge_old_notices(&mut self, max_age_secs: u64) {
        self.notices
            .retain(|(_, created)| created.elapsed().as_secs() < max_age_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_conversation_resets_feed() {
        let mut state = ClientState::new();
        state.open_conversation(Conversation::channel("general"));
        assert!(state.feed.as_ref().unwrap().loading);
        assert!(state.meta.is_none());

        state.open_conversation(Conversation::direct("bob"));
        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.conversation(), &Conversation::direct("bob"));
        assert!(feed.loading);
    }

    #[test]
    fn test_clear_session() {
        let mut state = ClientState::new();
        state.actor = Some(Profile {
            id: "me".into(),
            full_name: "Me".into(),
            avatar_url: None,
            is_online: true,
        });
        state.open_conversation(Conversation::channel("general"));
        state.clear_session();
        assert!(!state.is_signed_in());
        assert!(state.feed.is_none());
    }

    #[test]
    fn test_notice_expiry() {
        let mut state = ClientState::new();
        state.push_notice("hello");
        state.purge_old_notices(4);
        assert_eq!(state.notices.len(), 1);
        state.purge_old_notices(0);
        assert!(state.notices.is_empty());
    }
}
