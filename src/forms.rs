//! Form state for the auth screens, the composer, and the dialogs.
//!
//! Everything here is plain UI input state, separated from `ClientState` so
//! event processing can update both without the renderer owning either.

/// Which auth screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

/// Sign-in / sign-up form state.
#[derive(Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub backend_url: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub remember: bool,
    pub busy: bool,
    pub error: Option<String>,
}

/// An edit in progress on one of the actor's own messages.
#[derive(Debug, Clone)]
pub struct EditDraft {
    pub id: String,
    pub author_id: String,
    pub draft: String,
}

/// A message awaiting delete confirmation, carrying its row's author so the
/// mutation path can verify authorship against the current actor.
#[derive(Debug, Clone)]
pub struct DeleteTarget {
    pub id: String,
    pub author_id: String,
}

/// Message composition state for the open conversation.
#[derive(Default)]
pub struct ComposeState {
    pub input: String,
    /// A send is in flight; the composer is disabled until it finishes.
    pub sending: bool,
    pub editing: Option<EditDraft>,
    /// Message awaiting delete confirmation.
    pub confirm_delete: Option<DeleteTarget>,
    pub error: Option<String>,
}

/// Create-channel dialog state.
#[derive(Default)]
pub struct CreateChannelForm {
    pub open: bool,
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub busy: bool,
    pub error: Option<String>,
}

impl CreateChannelForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Profile settings dialog state.
#[derive(Default)]
pub struct SettingsForm {
    pub open: bool,
    pub full_name: String,
    pub saving: bool,
    pub error: Option<String>,
}

/// All form state, bundled for event processing.
#[derive(Default)]
pub struct Forms {
    pub auth: AuthForm,
    pub compose: ComposeState,
    pub create_channel: CreateChannelForm,
    pub settings: SettingsForm,
}
