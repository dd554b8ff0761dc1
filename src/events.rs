//! Backend event processing: folds `GuiEvent`s into the session state and
//! form state, issuing follow-up actions (author lookups) where needed.

use crossbeam_channel::{Receiver, Sender};

use crate::feed::InsertOutcome;
use crate::forms::Forms;
use crate::protocol::{BackendAction, ConversationMeta, GuiEvent};
use crate::state::ClientState;
use crate::types::Conversation;

/// Process all pending events from the backend.
pub fn process_events(
    event_rx: &Receiver<GuiEvent>,
    state: &mut ClientState,
    forms: &mut Forms,
    action_tx: &Sender<BackendAction>,
) {
    while let Ok(event) = event_rx.try_recv() {
        process_single_event(event, state, forms, action_tx);
    }
}

pub fn process_single_event(
    event: GuiEvent,
    state: &mut ClientState,
    forms: &mut Forms,
    action_tx: &Sender<BackendAction>,
) {
    match event {
        GuiEvent::SignedIn(profile) => {
            forms.auth.busy = false;
            forms.auth.error = None;
            forms.auth.password.clear();
            forms.settings.full_name = profile.full_name.clone();
            state.actor = Some(profile);
        }

        GuiEvent::AuthFailed(message) => {
            forms.auth.busy = false;
            forms.auth.error = Some(message);
        }

        GuiEvent::SignedOut => {
            state.clear_session();
            forms.compose = Default::default();
        }

        GuiEvent::ChannelsLoaded(channels) => {
            state.channels = channels;
        }

        GuiEvent::ContactsLoaded(contacts) => {
            state.contacts = contacts;
        }

        GuiEvent::ConversationMeta(meta) => {
            // Meta for a conversation we already left is stale.
            if let Some(feed) = &state.feed {
                if meta_matches(&meta, feed.conversation()) {
                    state.meta = Some(meta);
                }
            }
        }

        GuiEvent::ConversationMissing(conversation) => {
            if let Some(feed) = &mut state.feed {
                if *feed.conversation() == conversation {
                    state.conversation_missing = true;
                    feed.history_failed(&conversation);
                }
            }
        }

        GuiEvent::HistoryLoaded {
            conversation,
            messages,
        } => {
            if let Some(feed) = &mut state.feed {
                if feed.apply_history(&conversation, messages) {
                    state.scroll_to_bottom = true;
                }
            }
        }

        GuiEvent::HistoryFailed { conversation } => {
            if let Some(feed) = &mut state.feed {
                feed.history_failed(&conversation);
            }
        }

        GuiEvent::RemoteInsert {
            conversation,
            record,
        } => {
            let Some(actor_id) = state.actor_id().map(str::to_string) else {
                return;
            };
            if let Some(feed) = &mut state.feed {
                if *feed.conversation() != conversation {
                    return;
                }
                match feed.on_remote_insert(&actor_id, &record) {
                    InsertOutcome::Merged => {
                        if feed.note_arrival(state.scroll_from_bottom) {
                            state.scroll_to_bottom = true;
                        }
                    }
                    InsertOutcome::NeedsAuthor(author_id) => {
                        let _ = action_tx.send(BackendAction::FetchProfile(author_id));
                    }
                    InsertOutcome::Duplicate
                    | InsertOutcome::Parked
                    | InsertOutcome::Rejected => {}
                }
            }
        }

        GuiEvent::ProfileLoaded(profile) => {
            if let Some(feed) = &mut state.feed {
                if feed.resolve_author(profile) > 0 && feed.note_arrival(state.scroll_from_bottom)
                {
                    state.scroll_to_bottom = true;
                }
            }
        }

        GuiEvent::ProfileMissing(author_id) => {
            if let Some(feed) = &mut state.feed {
                feed.author_missing(&author_id);
            }
        }

        GuiEvent::SendFinished { ok } => {
            forms.compose.sending = false;
            if ok {
                forms.compose.input.clear();
                forms.compose.error = None;
            }
        }

        GuiEvent::MessageEdited { id, content } => {
            if let Some(feed) = &mut state.feed {
                feed.apply_edit(&id, &content);
            }
            if forms
                .compose
                .editing
                .as_ref()
                .is_some_and(|e| e.id == id)
            {
                forms.compose.editing = None;
            }
        }

        GuiEvent::MessageDeleted { id } => {
            if let Some(feed) = &mut state.feed {
                feed.apply_delete(&id);
            }
            forms.compose.confirm_delete = None;
            state.push_notice("Message deleted");
        }

        GuiEvent::ChannelCreated(channel) => {
            state.push_notice(format!("Channel #{} created", channel.name));
            forms.create_channel.reset();
        }

        GuiEvent::ProfileUpdated(profile) => {
            forms.settings.saving = false;
            forms.settings.full_name = profile.full_name.clone();
            state.actor = Some(profile);
            state.push_notice("Profile updated");
        }

        GuiEvent::Notice(message) => {
            // A notice also means any in-flight dialog mutation is over.
            forms.create_channel.busy = false;
            forms.settings.saving = false;
            state.push_notice(message);
        }
    }
}

fn meta_matches(meta: &ConversationMeta, conversation: &Conversation) -> bool {
    match (meta, conversation) {
        (ConversationMeta::Channel { channel, .. }, Conversation::Channel { channel_id }) => {
            channel.id == *channel_id
        }
        (ConversationMeta::Direct { peer }, Conversation::Direct { peer_id }) => {
            peer.id == *peer_id
        }
        _ => false,
    }
}
