//! Row shapes and conversation identity.
//!
//! These structs round-trip unchanged through the backend query interface;
//! the backend owns the schema, we only shape queries against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ChatError;
use crate::query::Filter;

/// Minimal profile snapshot attached to messages for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_online: bool,
}

/// A chat channel row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub created_by: String,
}

/// A fully resolved message as held by the feed: row data plus the
/// denormalized author snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Profile,
    pub edited: bool,
}

/// A message row parsed from a fetch or a realtime insert event, before the
/// author snapshot has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_id: String,
    pub edited: bool,
}

impl MessageRow {
    pub fn resolve(self, author: Profile) -> Message {
        Message {
            id: self.id,
            content: self.content,
            created_at: self.created_at,
            author,
            edited: self.edited,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelMessageRow {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    channel_id: String,
    user_id: String,
    #[serde(default)]
    is_edited: bool,
}

#[derive(Debug, Deserialize)]
struct DirectMessageRow {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    sender_id: String,
    recipient_id: String,
}

/// Which messages a feed shows: a channel, or the direct-message pair
/// between the current actor and one peer. Exactly one scope, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    Channel { channel_id: String },
    Direct { peer_id: String },
}

impl Conversation {
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Conversation::Channel {
            channel_id: channel_id.into(),
        }
    }

    pub fn direct(peer_id: impl Into<String>) -> Self {
        Conversation::Direct {
            peer_id: peer_id.into(),
        }
    }

    pub fn is_channel(&self) -> bool {
        matches!(self, Conversation::Channel { .. })
    }

    /// Table holding this conversation's rows.
    pub fn table(&self) -> &'static str {
        match self {
            Conversation::Channel { .. } => "messages",
            Conversation::Direct { .. } => "direct_messages",
        }
    }

    /// Realtime topic for insert events in this conversation. The direct
    /// topic is the sorted id pair, so both sides subscribe to the same one.
    pub fn topic(&self, actor_id: &str) -> String {
        match self {
            Conversation::Channel { channel_id } => format!("messages:{}", channel_id),
            Conversation::Direct { peer_id } => {
                let (a, b) = ordered_pair(actor_id, peer_id);
                format!("direct:{}:{}", a, b)
            }
        }
    }

    /// Filter for the historical fetch and the realtime subscription. The
    /// direct scope is the symmetric pair: authored by the actor to the peer
    /// or by the peer to the actor.
    pub fn history_filter(&self, actor_id: &str) -> Filter {
        match self {
            Conversation::Channel { channel_id } => Filter::eq("channel_id", channel_id.clone()),
            Conversation::Direct { peer_id } => Filter::any_of(vec![
                Filter::all_of(vec![
                    Filter::eq("sender_id", actor_id),
                    Filter::eq("recipient_id", peer_id.clone()),
                ]),
                Filter::all_of(vec![
                    Filter::eq("sender_id", peer_id.clone()),
                    Filter::eq("recipient_id", actor_id),
                ]),
            ]),
        }
    }

    /// Row to insert when the actor sends `content` here.
    pub fn insert_row(&self, actor_id: &str, content: &str) -> Value {
        match self {
            Conversation::Channel { channel_id } => json!({
                "content": content,
                "channel_id": channel_id,
                "user_id": actor_id,
            }),
            Conversation::Direct { peer_id } => json!({
                "content": content,
                "sender_id": actor_id,
                "recipient_id": peer_id,
                "is_read": false,
            }),
        }
    }

    /// Parse a fetched row or realtime insert payload into a [`MessageRow`].
    ///
    /// Rows scoped to a different conversation are rejected with `NotFound`;
    /// the feed drops them silently.
    pub fn parse_row(&self, actor_id: &str, value: &Value) -> Result<MessageRow, ChatError> {
        match self {
            Conversation::Channel { channel_id } => {
                let row: ChannelMessageRow = serde_json::from_value(value.clone())
                    .map_err(|e| ChatError::Backend(format!("malformed message row: {}", e)))?;
                if row.channel_id != *channel_id {
                    return Err(ChatError::NotFound);
                }
                Ok(MessageRow {
                    id: row.id,
                    content: row.content,
                    created_at: row.created_at,
                    author_id: row.user_id,
                    edited: row.is_edited,
                })
            }
            Conversation::Direct { peer_id } => {
                let row: DirectMessageRow = serde_json::from_value(value.clone())
                    .map_err(|e| ChatError::Backend(format!("malformed message row: {}", e)))?;
                let in_pair = (row.sender_id == actor_id && row.recipient_id == *peer_id)
                    || (row.sender_id == *peer_id && row.recipient_id == actor_id);
                if !in_pair {
                    return Err(ChatError::NotFound);
                }
                Ok(MessageRow {
                    id: row.id,
                    content: row.content,
                    created_at: row.created_at,
                    author_id: row.sender_id,
                    edited: false,
                })
            }
        }
    }
}

fn ordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_row(id: &str, channel: &str, user: &str) -> Value {
        json!({
            "id": id,
            "content": "hi",
            "created_at": "2024-05-01T10:00:00Z",
            "channel_id": channel,
            "user_id": user,
            "is_edited": false,
        })
    }

    #[test]
    fn test_topic_direct_is_symmetric() {
        let from_a = Conversation::direct("bob").topic("alice");
        let from_b = Conversation::direct("alice").topic("bob");
        assert_eq!(from_a, from_b);
        assert_eq!(from_a, "direct:alice:bob");
    }

    #[test]
    fn test_channel_parse_accepts_own_scope() {
        let conv = Conversation::channel("general");
        let row = conv
            .parse_row("me", &channel_row("m1", "general", "alice"))
            .unwrap();
        assert_eq!(row.id, "m1");
        assert_eq!(row.author_id, "alice");
    }

    #[test]
    fn test_channel_parse_rejects_foreign_scope() {
        let conv = Conversation::channel("general");
        let err = conv
            .parse_row("me", &channel_row("m1", "random", "alice"))
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
    }

    #[test]
    fn test_direct_parse_accepts_both_directions() {
        let conv = Conversation::direct("bob");
        let outbound = json!({
            "id": "d1",
            "content": "hey",
            "created_at": "2024-05-01T10:00:00Z",
            "sender_id": "alice",
            "recipient_id": "bob",
        });
        let inbound = json!({
            "id": "d2",
            "content": "yo",
            "created_at": "2024-05-01T10:01:00Z",
            "sender_id": "bob",
            "recipient_id": "alice",
        });
        assert!(conv.parse_row("alice", &outbound).is_ok());
        assert!(conv.parse_row("alice", &inbound).is_ok());

        // A row between two other users never lands in this feed.
        let foreign = json!({
            "id": "d3",
            "content": "psst",
            "created_at": "2024-05-01T10:02:00Z",
            "sender_id": "carol",
            "recipient_id": "bob",
        });
        assert!(conv.parse_row("alice", &foreign).is_err());
    }

    #[test]
    fn test_insert_row_shapes() {
        let channel = Conversation::channel("general").insert_row("me", "hello");
        assert_eq!(channel["channel_id"], "general");
        assert_eq!(channel["user_id"], "me");

        let direct = Conversation::direct("bob").insert_row("me", "hello");
        assert_eq!(direct["sender_id"], "me");
        assert_eq!(direct["recipient_id"], "bob");
        assert_eq!(direct["is_read"], false);
    }

    #[test]
    fn test_direct_history_filter_is_pair_scoped() {
        let filter = Conversation::direct("bob").history_filter("alice");
        let rendered = filter.render();
        assert!(rendered.contains("sender_id.eq.\"alice\""));
        assert!(rendered.contains("recipient_id.eq.\"alice\""));
        assert!(rendered.contains("sender_id.eq.\"bob\""));
    }
}
