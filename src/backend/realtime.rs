//! Realtime insert subscription over a websocket.
//!
//! The wire protocol is small: one subscribe frame per topic, then inbound
//! `insert` frames carrying the raw row. The backend loop holds at most one
//! [`Subscription`] at a time and closes it before opening the next.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::ChatError;
use crate::query::Filter;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct Subscription {
    ws: Option<WsStream>,
    topic: String,
}

impl Subscription {
    /// Connect and subscribe to insert events on `topic`, scoped by
    /// `filter`.
    pub async fn connect(
        ws_url: &str,
        token: &str,
        topic: &str,
        filter: &Filter,
    ) -> Result<Self, ChatError> {
        let (mut ws, _) = connect_async(ws_url)
            .await
            .map_err(|e| ChatError::Backend(format!("realtime connect failed: {}", e)))?;
        let frame = json!({
            "event": "subscribe",
            "topic": topic,
            "filter": filter.render(),
            "token": token,
        });
        ws.send(WsMessage::Text(frame.to_string().into()))
            .await
            .map_err(|e| ChatError::Backend(format!("realtime subscribe failed: {}", e)))?;
        debug!(topic, "realtime subscription opened");
        Ok(Self {
            ws: Some(ws),
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait up to `wait` for the next insert record on this topic.
    ///
    /// `Ok(None)` means nothing arrived in time (or a non-insert frame was
    /// skipped); `Err` means the connection is gone and the subscription
    /// must be dropped.
    pub async fn next_insert(&mut self, wait: Duration) -> Result<Option<Value>, ChatError> {
        let Some(ws) = self.ws.as_mut() else {
            return Err(ChatError::Backend("subscription already closed".into()));
        };
        let frame = match tokio::time::timeout(wait, ws.next()).await {
            Err(_) => return Ok(None),
            Ok(None) => return Err(ChatError::Backend("realtime stream ended".into())),
            Ok(Some(Err(e))) => {
                return Err(ChatError::Backend(format!("realtime read failed: {}", e)))
            }
            Ok(Some(Ok(frame))) => frame,
        };
        let WsMessage::Text(text) = frame else {
            // Pings are answered by the transport; everything else is noise.
            return Ok(None);
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "dropping malformed realtime frame");
                return Ok(None);
            }
        };
        if value["event"] != "insert" || value["topic"] != self.topic.as_str() {
            return Ok(None);
        }
        match value.get("record") {
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }

    /// Close the websocket. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
            debug!(topic = %self.topic, "realtime subscription closed");
        }
    }
}

/// A handle owning server-side subscription resources.
pub trait LiveHandle {
    async fn close(&mut self);
}

impl LiveHandle for Subscription {
    async fn close(&mut self) {
        Subscription::close(self).await;
    }
}

/// Holds at most one live subscription for the backend loop. Every change
/// routes through [`SubscriptionSlot::clear`] or [`SubscriptionSlot::switch`],
/// which close the previous handle before anything replaces it.
pub struct SubscriptionSlot<S = Subscription> {
    active: Option<S>,
}

impl<S: LiveHandle> SubscriptionSlot<S> {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn as_mut(&mut self) -> Option<&mut S> {
        self.active.as_mut()
    }

    pub fn is_live(&self) -> bool {
        self.active.is_some()
    }

    /// Close and drop the current handle, if any. Idempotent.
    pub async fn clear(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.close().await;
        }
    }

    /// Replace the current handle with a fresh connect result. The old
    /// handle is closed first; a failed connect leaves the slot empty, never
    /// holding the stale handle.
    pub async fn switch(&mut self, next: Result<S, ChatError>) -> Result<(), ChatError> {
        self.clear().await;
        self.active = Some(next?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeHandle {
        closed: Rc<Cell<usize>>,
    }

    impl FakeHandle {
        fn new() -> (Self, Rc<Cell<usize>>) {
            let closed = Rc::new(Cell::new(0));
            (
                Self {
                    closed: closed.clone(),
                },
                closed,
            )
        }
    }

    impl LiveHandle for FakeHandle {
        async fn close(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    #[tokio::test]
    async fn test_switch_closes_previous_and_keeps_one_live() {
        let mut slot: SubscriptionSlot<FakeHandle> = SubscriptionSlot::new();
        let (first, first_closed) = FakeHandle::new();
        slot.switch(Ok(first)).await.unwrap();
        assert!(slot.is_live());
        assert_eq!(first_closed.get(), 0);

        // Moving to a second conversation: the first handle is closed, the
        // second is the only live one.
        let (second, second_closed) = FakeHandle::new();
        slot.switch(Ok(second)).await.unwrap();
        assert!(slot.is_live());
        assert_eq!(first_closed.get(), 1);
        assert_eq!(second_closed.get(), 0);
    }

    #[tokio::test]
    async fn test_failed_switch_leaves_no_live_handle() {
        let mut slot: SubscriptionSlot<FakeHandle> = SubscriptionSlot::new();
        let (first, first_closed) = FakeHandle::new();
        slot.switch(Ok(first)).await.unwrap();

        let err = slot
            .switch(Err(ChatError::Backend("connect refused".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Backend(_)));
        assert!(!slot.is_live());
        assert_eq!(first_closed.get(), 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let mut slot: SubscriptionSlot<FakeHandle> = SubscriptionSlot::new();
        let (handle, closed) = FakeHandle::new();
        slot.switch(Ok(handle)).await.unwrap();

        slot.clear().await;
        slot.clear().await;
        assert!(!slot.is_live());
        assert_eq!(closed.get(), 1);
    }
}
