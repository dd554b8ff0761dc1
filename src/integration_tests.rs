//! Integration tests for the chat client.
//!
//! These tests exercise full workflows across modules: backend events
//! flowing into session state, conversation switching, and the live-insert
//! path with author resolution.

#[cfg(test)]
mod integration_tests {
    use crate::events::{process_events, process_single_event};
    use crate::forms::Forms;
    use crate::protocol::{BackendAction, GuiEvent};
    use crate::state::ClientState;
    use crate::types::{Channel, Conversation, Message, Profile};
    use crossbeam_channel::unbounded;
    use serde_json::json;

    fn profile(id: &str, name: &str) -> Profile {
        Profile {
            id: id.into(),
            full_name: name.into(),
            avatar_url: None,
            is_online: true,
        }
    }

    fn message(id: &str, at: &str, author: &Profile) -> Message {
        Message {
            id: id.into(),
            content: format!("message {}", id),
            created_at: at.parse().unwrap(),
            author: author.clone(),
            edited: false,
        }
    }

    fn channel_record(id: &str, channel: &str, user: &str, at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "content": "live",
            "created_at": at,
            "channel_id": channel,
            "user_id": user,
        })
    }

    /// Full session flow: sign in, load the sidebar, open a channel, receive
    /// history, then a live insert from a known author.
    #[test]
    fn test_sign_in_open_channel_and_receive() {
        let (action_tx, _action_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let mut state = ClientState::new();
        let mut forms = Forms::default();

        let me = profile("me", "Me");
        let alice = profile("alice", "Alice");

        event_tx.send(GuiEvent::SignedIn(me.clone())).unwrap();
        event_tx
            .send(GuiEvent::ChannelsLoaded(vec![Channel {
                id: "general".into(),
                name: "general".into(),
                description: String::new(),
                is_private: false,
                created_by: "me".into(),
            }]))
            .unwrap();
        process_events(&event_rx, &mut state, &mut forms, &action_tx);

        assert!(state.is_signed_in());
        assert_eq!(state.channels.len(), 1);

        // UI opens the channel, backend answers with history.
        state.open_conversation(Conversation::channel("general"));
        event_tx
            .send(GuiEvent::HistoryLoaded {
                conversation: Conversation::channel("general"),
                messages: vec![
                    message("m1", "2024-05-01T10:00:00Z", &alice),
                    message("m2", "2024-05-01T10:01:00Z", &me),
                ],
            })
            .unwrap();
        process_events(&event_rx, &mut state, &mut forms, &action_tx);

        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages().len(), 2);
        assert!(!feed.loading);
        assert!(state.scroll_to_bottom);

        // Live insert whose author is already cached from history.
        state.scroll_to_bottom = false;
        state.scroll_from_bottom = 20.0;
        event_tx
            .send(GuiEvent::RemoteInsert {
                conversation: Conversation::channel("general"),
                record: channel_record("m3", "general", "alice", "2024-05-01T10:02:00Z"),
            })
            .unwrap();
        process_events(&event_rx, &mut state, &mut forms, &action_tx);

        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages().len(), 3);
        assert_eq!(feed.messages()[2].id, "m3");
        assert!(state.scroll_to_bottom);
    }

    /// A stale history response for a conversation that was switched away
    /// from never lands in the new feed.
    #[test]
    fn test_switching_conversations_discards_stale_history() {
        let (action_tx, _action_rx) = unbounded();
        let mut state = ClientState::new();
        let mut forms = Forms::default();
        state.actor = Some(profile("me", "Me"));

        let alice = profile("alice", "Alice");
        state.open_conversation(Conversation::channel("general"));
        state.open_conversation(Conversation::direct("alice"));

        // The response for the first conversation arrives late.
        process_single_event(
            GuiEvent::HistoryLoaded {
                conversation: Conversation::channel("general"),
                messages: vec![message("m1", "2024-05-01T10:00:00Z", &alice)],
            },
            &mut state,
            &mut forms,
            &action_tx,
        );

        let feed = state.feed.as_ref().unwrap();
        assert!(feed.is_empty());
        assert!(feed.loading);

        // The right response still lands.
        process_single_event(
            GuiEvent::HistoryLoaded {
                conversation: Conversation::direct("alice"),
                messages: vec![message("d1", "2024-05-01T10:00:00Z", &alice)],
            },
            &mut state,
            &mut forms,
            &action_tx,
        );
        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages().len(), 1);
        assert!(!feed.loading);
    }

    /// Live insert from an unknown author: the row is parked, a single
    /// profile lookup is requested, and a duplicate of the parked row is
    /// ignored.
    #[test]
    fn test_unknown_author_round_trip_with_duplicate_event() {
        let (action_tx, action_rx) = unbounded();
        let mut state = ClientState::new();
        let mut forms = Forms::default();
        state.actor = Some(profile("me", "Me"));
        state.open_conversation(Conversation::channel("general"));
        process_single_event(
            GuiEvent::HistoryLoaded {
                conversation: Conversation::channel("general"),
                messages: vec![],
            },
            &mut state,
            &mut forms,
            &action_tx,
        );

        let record = channel_record("m1", "general", "carol", "2024-05-01T10:00:00Z");
        process_single_event(
            GuiEvent::RemoteInsert {
                conversation: Conversation::channel("general"),
                record: record.clone(),
            },
            &mut state,
            &mut forms,
            &action_tx,
        );
        assert!(matches!(
            action_rx.try_recv().unwrap(),
            BackendAction::FetchProfile(id) if id == "carol"
        ));

        // The same event delivered twice parks nothing new and asks nothing.
        process_single_event(
            GuiEvent::RemoteInsert {
                conversation: Conversation::channel("general"),
                record,
            },
            &mut state,
            &mut forms,
            &action_tx,
        );
        assert!(action_rx.try_recv().is_err());

        process_single_event(
            GuiEvent::ProfileLoaded(profile("carol", "Carol")),
            &mut state,
            &mut forms,
            &action_tx,
        );
        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages().len(), 1);
        assert_eq!(feed.messages()[0].author.full_name, "Carol");
    }

    /// Sign-out tears down session state and the composer.
    #[test]
    fn test_sign_out_clears_session() {
        let (action_tx, _action_rx) = unbounded();
        let mut state = ClientState::new();
        let mut forms = Forms::default();
        state.actor = Some(profile("me", "Me"));
        state.open_conversation(Conversation::channel("general"));
        forms.compose.input = "half-typed".into();

        process_single_event(GuiEvent::SignedOut, &mut state, &mut forms, &action_tx);

        assert!(!state.is_signed_in());
        assert!(state.feed.is_none());
        assert!(forms.compose.input.is_empty());
    }

    /// Edit and delete events update the feed in place.
    #[test]
    fn test_edit_and_delete_flow() {
        let (action_tx, _action_rx) = unbounded();
        let mut state = ClientState::new();
        let mut forms = Forms::default();
        let me = profile("me", "Me");
        state.actor = Some(me.clone());
        state.open_conversation(Conversation::channel("general"));
        process_single_event(
            GuiEvent::HistoryLoaded {
                conversation: Conversation::channel("general"),
                messages: vec![
                    message("m1", "2024-05-01T10:00:00Z", &me),
                    message("m2", "2024-05-01T10:01:00Z", &me),
                ],
            },
            &mut state,
            &mut forms,
            &action_tx,
        );

        process_single_event(
            GuiEvent::MessageEdited {
                id: "m1".into(),
                content: "fixed".into(),
            },
            &mut state,
            &mut forms,
            &action_tx,
        );
        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages()[0].content, "fixed");
        assert!(feed.messages()[0].edited);

        process_single_event(
            GuiEvent::MessageDeleted { id: "m2".into() },
            &mut state,
            &mut forms,
            &action_tx,
        );
        let feed = state.feed.as_ref().unwrap();
        assert_eq!(feed.messages().len(), 1);
        assert_eq!(state.notices.len(), 1);
    }
}
