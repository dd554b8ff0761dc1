//! UI <-> backend channel protocol.

use serde_json::Value;

use crate::types::{Channel, Conversation, Message, Profile};

/// Actions sent from the UI to the backend loop.
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// Point the client at a different backend host. Only honored while
    /// signed out.
    Configure { base_url: String },
    /// Sign in against the hosted auth endpoint.
    SignIn { email: String, password: String },
    /// Create an account, then sign in.
    SignUp {
        email: String,
        password: String,
        full_name: String,
    },
    /// End the session and release the realtime subscription.
    SignOut,
    /// Refetch the sidebar: channels visible to the actor, DM contacts.
    RefreshSidebar,
    /// Open a conversation: fetch meta + history, move the subscription.
    OpenConversation(Conversation),
    /// Insert a message row into the open conversation.
    SendMessage {
        conversation: Conversation,
        content: String,
    },
    /// Update a message's content. `author_id` is checked against the
    /// current actor before the call is made.
    EditMessage {
        conversation: Conversation,
        id: String,
        author_id: String,
        content: String,
    },
    /// Delete a message, same authorship rule as editing.
    DeleteMessage {
        conversation: Conversation,
        id: String,
        author_id: String,
    },
    /// Resolve one author snapshot (cache miss on a live insert).
    FetchProfile(String),
    /// Create a channel and join it as owner.
    CreateChannel {
        name: String,
        description: String,
        is_private: bool,
    },
    /// Update the actor's display name.
    UpdateProfile { full_name: String },
}

/// Per-conversation header data.
#[derive(Debug, Clone)]
pub enum ConversationMeta {
    Channel { channel: Channel, member_count: u64 },
    Direct { peer: Profile },
}

/// Events sent from the backend loop to the UI.
#[derive(Debug, Clone)]
pub enum GuiEvent {
    /// Session established; carries the actor's own profile.
    SignedIn(Profile),
    /// Sign-in or sign-up failed.
    AuthFailed(String),
    SignedOut,
    ChannelsLoaded(Vec<Channel>),
    ContactsLoaded(Vec<Profile>),
    /// Header data for the open conversation.
    ConversationMeta(ConversationMeta),
    /// The conversation's channel/peer row does not exist.
    ConversationMissing(Conversation),
    /// Historical fetch result, keyed by the conversation it was issued for
    /// so stale responses can be discarded.
    HistoryLoaded {
        conversation: Conversation,
        messages: Vec<Message>,
    },
    /// Historical fetch failed; the feed stays empty.
    HistoryFailed { conversation: Conversation },
    /// A raw realtime insert payload for the open conversation.
    RemoteInsert {
        conversation: Conversation,
        record: Value,
    },
    /// Author snapshot lookup completed.
    ProfileLoaded(Profile),
    /// Author snapshot lookup found nothing.
    ProfileMissing(String),
    /// A send attempt finished; `ok` clears the composer.
    SendFinished { ok: bool },
    /// Edit was accepted by the backend.
    MessageEdited { id: String, content: String },
    /// Delete was accepted by the backend.
    MessageDeleted { id: String },
    ChannelCreated(Channel),
    ProfileUpdated(Profile),
    /// Transient, dismissible user-visible notice.
    Notice(String),
}
