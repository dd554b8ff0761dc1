//! Backend thread main loop.
//!
//! Runs on its own thread with a dedicated Tokio runtime: drains pending
//! `BackendAction`s, then polls the realtime subscription with a short
//! timeout so the loop stays responsive to both sides.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde_json::json;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use crate::backend::client::RestClient;
use crate::backend::realtime::{Subscription, SubscriptionSlot};
use crate::error::ChatError;
use crate::feed::HISTORY_PAGE_SIZE;
use crate::protocol::{BackendAction, ConversationMeta, GuiEvent};
use crate::query::{Filter, Order};
use crate::types::{Channel, Conversation, Message, Profile};

/// How many profiles the DM contact list shows.
const CONTACT_LIST_SIZE: usize = 10;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub anon_key: String,
}

/// Entry point for the backend thread.
pub fn run_backend(
    config: BackendConfig,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) {
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start backend runtime: {}", e);
            let _ = event_tx.send(GuiEvent::Notice(format!("backend unavailable: {}", e)));
            return;
        }
    };
    runtime.block_on(backend_loop(config, action_rx, event_tx));
    info!("backend thread exiting");
}

struct Backend {
    client: RestClient,
    anon_key: String,
    event_tx: Sender<GuiEvent>,
    actor: Option<Profile>,
    open: Option<Conversation>,
    subscription: SubscriptionSlot,
}

async fn backend_loop(
    config: BackendConfig,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) {
    let mut backend = Backend {
        client: RestClient::new(&config.base_url, &config.anon_key),
        anon_key: config.anon_key.clone(),
        event_tx,
        actor: None,
        open: None,
        subscription: SubscriptionSlot::new(),
    };

    loop {
        loop {
            match action_rx.try_recv() {
                Ok(action) => backend.handle_action(action).await,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    backend.drop_subscription().await;
                    return;
                }
            }
        }

        let polled = match backend.subscription.as_mut() {
            Some(subscription) => Some(subscription.next_insert(POLL_INTERVAL).await),
            None => None,
        };
        match polled {
            Some(Ok(Some(record))) => {
                if let Some(conversation) = backend.open.clone() {
                    backend.emit(GuiEvent::RemoteInsert {
                        conversation,
                        record,
                    });
                }
            }
            Some(Ok(None)) => {}
            Some(Err(e)) => {
                warn!("realtime subscription lost: {}", e);
                backend.subscription.clear().await;
                backend.emit(GuiEvent::Notice("Live updates disconnected".into()));
            }
            None => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}

impl Backend {
    fn emit(&self, event: GuiEvent) {
        let _ = self.event_tx.send(event);
    }

    fn actor_id(&self) -> Option<String> {
        self.actor.as_ref().map(|p| p.id.clone())
    }

    /// Close the realtime subscription if one is open. Every path that
    /// changes or ends the open conversation goes through here first.
    async fn drop_subscription(&mut self) {
        self.subscription.clear().await;
    }

    async fn handle_action(&mut self, action: BackendAction) {
        match action {
            BackendAction::Configure { base_url } => {
                if self.actor.is_none() {
                    self.client = RestClient::new(&base_url, &self.anon_key);
                }
            }

            BackendAction::SignIn { email, password } => {
                match self.client.sign_in(&email, &password).await {
                    Ok(profile) => {
                        info!(user = %profile.id, "signed in");
                        self.actor = Some(profile.clone());
                        self.emit(GuiEvent::SignedIn(profile));
                        self.refresh_sidebar().await;
                    }
                    Err(e) => self.emit(GuiEvent::AuthFailed(e.to_string())),
                }
            }

            BackendAction::SignUp {
                email,
                password,
                full_name,
            } => match self.client.sign_up(&email, &password, &full_name).await {
                Ok(profile) => {
                    info!(user = %profile.id, "account created");
                    self.actor = Some(profile.clone());
                    self.emit(GuiEvent::SignedIn(profile));
                    self.refresh_sidebar().await;
                }
                Err(e) => self.emit(GuiEvent::AuthFailed(e.to_string())),
            },

            BackendAction::SignOut => {
                self.drop_subscription().await;
                self.open = None;
                self.actor = None;
                if let Err(e) = self.client.sign_out().await {
                    warn!("sign-out call failed: {}", e);
                }
                self.emit(GuiEvent::SignedOut);
            }

            BackendAction::RefreshSidebar => self.refresh_sidebar().await,

            BackendAction::OpenConversation(conversation) => {
                self.open_conversation(conversation).await;
            }

            BackendAction::SendMessage {
                conversation,
                content,
            } => {
                let Some(actor_id) = self.actor_id() else {
                    self.emit(GuiEvent::SendFinished { ok: false });
                    return;
                };
                let row = conversation.insert_row(&actor_id, &content);
                match self.client.insert(conversation.table(), &row).await {
                    Ok(_) => self.emit(GuiEvent::SendFinished { ok: true }),
                    Err(e) => {
                        warn!("send failed: {}", e);
                        self.emit(GuiEvent::SendFinished { ok: false });
                        self.emit(GuiEvent::Notice(format!("Message not sent: {}", e)));
                    }
                }
            }

            BackendAction::EditMessage {
                conversation,
                id,
                author_id,
                content,
            } => {
                if !self.authored_by_actor(&author_id) {
                    self.emit(GuiEvent::Notice(ChatError::Unauthorized.to_string()));
                    return;
                }
                let patch = if conversation.is_channel() {
                    json!({ "content": content, "is_edited": true })
                } else {
                    json!({ "content": content })
                };
                let filter = Filter::eq("id", id.clone());
                match self
                    .client
                    .update(conversation.table(), &filter, &patch)
                    .await
                {
                    Ok(()) => self.emit(GuiEvent::MessageEdited { id, content }),
                    Err(e) => self.emit(GuiEvent::Notice(format!("Edit failed: {}", e))),
                }
            }

            BackendAction::DeleteMessage {
                conversation,
                id,
                author_id,
            } => {
                if !self.authored_by_actor(&author_id) {
                    self.emit(GuiEvent::Notice(ChatError::Unauthorized.to_string()));
                    return;
                }
                let filter = Filter::eq("id", id.clone());
                match self.client.delete(conversation.table(), &filter).await {
                    Ok(()) => self.emit(GuiEvent::MessageDeleted { id }),
                    Err(e) => self.emit(GuiEvent::Notice(format!("Delete failed: {}", e))),
                }
            }

            BackendAction::FetchProfile(id) => {
                match self
                    .client
                    .fetch_one::<Profile>("profiles", &Filter::eq("id", id.clone()))
                    .await
                {
                    Ok(Some(profile)) => self.emit(GuiEvent::ProfileLoaded(profile)),
                    Ok(None) => self.emit(GuiEvent::ProfileMissing(id)),
                    Err(e) => {
                        warn!("profile lookup failed: {}", e);
                        self.emit(GuiEvent::ProfileMissing(id));
                    }
                }
            }

            BackendAction::CreateChannel {
                name,
                description,
                is_private,
            } => {
                let Some(actor_id) = self.actor_id() else {
                    return;
                };
                let row = json!({
                    "name": name,
                    "description": description,
                    "is_private": is_private,
                    "created_by": actor_id,
                });
                let created = match self.client.insert("channels", &row).await {
                    Ok(created) => created,
                    Err(e) => {
                        self.emit(GuiEvent::Notice(format!("Channel not created: {}", e)));
                        return;
                    }
                };
                let channel: Channel = match serde_json::from_value(created) {
                    Ok(channel) => channel,
                    Err(e) => {
                        self.emit(GuiEvent::Notice(format!(
                            "Channel not created: malformed row: {}",
                            e
                        )));
                        return;
                    }
                };
                // The creator joins their own channel.
                let membership = json!({ "channel_id": channel.id, "user_id": actor_id });
                if let Err(e) = self.client.insert("channel_members", &membership).await {
                    warn!("could not join created channel: {}", e);
                }
                self.emit(GuiEvent::ChannelCreated(channel));
                self.refresh_sidebar().await;
            }

            BackendAction::UpdateProfile { full_name } => {
                let Some(mut actor) = self.actor.clone() else {
                    return;
                };
                let filter = Filter::eq("id", actor.id.clone());
                let patch = json!({ "full_name": full_name });
                match self.client.update("profiles", &filter, &patch).await {
                    Ok(()) => {
                        actor.full_name = full_name;
                        self.actor = Some(actor.clone());
                        self.emit(GuiEvent::ProfileUpdated(actor));
                    }
                    Err(e) => self.emit(GuiEvent::Notice(format!("Profile not saved: {}", e))),
                }
            }
        }
    }

    fn authored_by_actor(&self, author_id: &str) -> bool {
        self.actor_id().as_deref() == Some(author_id)
    }

    /// Channels visible to the actor (public or joined) plus the DM contact
    /// list.
    async fn refresh_sidebar(&mut self) {
        let Some(actor_id) = self.actor_id() else {
            return;
        };

        let visible = Filter::any_of(vec![
            Filter::eq("is_private", "false"),
            Filter::in_subquery(
                "id",
                "channel_members",
                "channel_id",
                Filter::eq("user_id", actor_id.clone()),
            ),
        ]);
        match self
            .client
            .list_as::<Channel>("channels", Some(&visible), Some(&Order::ascending("name")), None)
            .await
        {
            Ok(channels) => self.emit(GuiEvent::ChannelsLoaded(channels)),
            Err(e) => {
                warn!("channel list fetch failed: {}", e);
                self.emit(GuiEvent::Notice(format!("Could not load channels: {}", e)));
            }
        }

        let others = Filter::neq("id", actor_id);
        match self
            .client
            .list_as::<Profile>(
                "profiles",
                Some(&others),
                Some(&Order::ascending("full_name")),
                Some(CONTACT_LIST_SIZE),
            )
            .await
        {
            Ok(contacts) => self.emit(GuiEvent::ContactsLoaded(contacts)),
            Err(e) => warn!("contact list fetch failed: {}", e),
        }
    }

    async fn open_conversation(&mut self, conversation: Conversation) {
        let Some(actor_id) = self.actor_id() else {
            return;
        };

        // At most one live subscription: close the old one before any
        // fetch for the new conversation.
        self.drop_subscription().await;
        self.open = Some(conversation.clone());

        match self.fetch_meta(&conversation).await {
            Ok(Some(meta)) => self.emit(GuiEvent::ConversationMeta(meta)),
            Ok(None) => {
                self.emit(GuiEvent::ConversationMissing(conversation));
                return;
            }
            Err(e) => warn!("conversation meta fetch failed: {}", e),
        }

        match self.fetch_history(&conversation, &actor_id).await {
            Ok(messages) => self.emit(GuiEvent::HistoryLoaded {
                conversation: conversation.clone(),
                messages,
            }),
            Err(e) => {
                warn!("history fetch failed: {}", e);
                self.emit(GuiEvent::HistoryFailed {
                    conversation: conversation.clone(),
                });
            }
        }

        let topic = conversation.topic(&actor_id);
        let filter = conversation.history_filter(&actor_id);
        let token = self
            .client
            .session()
            .map(|s| s.access_token.clone())
            .unwrap_or_default();
        let connected =
            Subscription::connect(&self.client.realtime_url(), &token, &topic, &filter).await;
        if let Err(e) = self.subscription.switch(connected).await {
            warn!("realtime subscribe failed: {}", e);
            self.emit(GuiEvent::Notice("Live updates unavailable".into()));
        }
    }

    async fn fetch_meta(
        &self,
        conversation: &Conversation,
    ) -> Result<Option<ConversationMeta>, ChatError> {
        match conversation {
            Conversation::Channel { channel_id } => {
                let channel: Option<Channel> = self
                    .client
                    .fetch_one("channels", &Filter::eq("id", channel_id.clone()))
                    .await?;
                let Some(channel) = channel else {
                    return Ok(None);
                };
                let member_count = self
                    .client
                    .count("channel_members", &Filter::eq("channel_id", channel_id.clone()))
                    .await
                    .unwrap_or(0);
                Ok(Some(ConversationMeta::Channel {
                    channel,
                    member_count,
                }))
            }
            Conversation::Direct { peer_id } => {
                let peer: Option<Profile> = self
                    .client
                    .fetch_one("profiles", &Filter::eq("id", peer_id.clone()))
                    .await?;
                Ok(peer.map(|peer| ConversationMeta::Direct { peer }))
            }
        }
    }

    /// Oldest page of the conversation, ascending, authors resolved.
    async fn fetch_history(
        &self,
        conversation: &Conversation,
        actor_id: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let rows = self
            .client
            .list(
                conversation.table(),
                Some(&conversation.history_filter(actor_id)),
                Some(&Order::ascending("created_at")),
                Some(HISTORY_PAGE_SIZE),
            )
            .await?;

        let mut parsed = Vec::with_capacity(rows.len());
        for row in &rows {
            match conversation.parse_row(actor_id, row) {
                Ok(row) => parsed.push(row),
                Err(e) => warn!("dropping unparseable history row: {}", e),
            }
        }

        let mut author_ids: Vec<String> = parsed.iter().map(|r| r.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let mut authors = std::collections::HashMap::new();
        if !author_ids.is_empty() {
            let profiles: Vec<Profile> = self
                .client
                .list_as("profiles", Some(&Filter::in_list("id", author_ids)), None, None)
                .await?;
            for profile in profiles {
                authors.insert(profile.id.clone(), profile);
            }
        }

        let mut messages = Vec::with_capacity(parsed.len());
        for row in parsed {
            match authors.get(&row.author_id) {
                Some(author) => messages.push(row.resolve(author.clone())),
                None => warn!(author = %row.author_id, "dropping row with unknown author"),
            }
        }
        Ok(messages)
    }
}
