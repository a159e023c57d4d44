//! Websocket subscriptions, grouped into sessions with shared fan-out.
//!
//! Every live connection is a session registered under `(group, id)`.
//! `eth_subscribe` requests go out with a readable string id so the
//! node's reply can be matched back to the topic that asked for it.

mod session;

pub use session::{
    SessionEvent, SessionHandle, SessionKey, EVENT_BUFFER, OUTBOUND_BUFFER, PING_INTERVAL,
};

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::SubscriptionError;

/// What to ask the node to push.
#[derive(Debug, Clone)]
pub enum SubscribeTopic {
    /// New block headers.
    NewHeads,
    /// Matching logs, optionally narrowed to one contract and topic set.
    Logs {
        address: Option<Address>,
        topics: Vec<B256>,
    },
}

impl SubscribeTopic {
    pub fn parse(name: &str) -> Result<Self, SubscriptionError> {
        if name.eq_ignore_ascii_case("newheads") {
            Ok(Self::NewHeads)
        } else if name.eq_ignore_ascii_case("logs") {
            Ok(Self::Logs {
                address: None,
                topics: Vec::new(),
            })
        } else {
            Err(SubscriptionError::UnknownTopic(name.to_string()))
        }
    }

    /// The string id the subscribe request carries: topic name plus scope.
    pub fn correlation_id(&self) -> String {
        match self {
            Self::NewHeads => "newHeads".to_string(),
            Self::Logs {
                address: Some(address),
                ..
            } => format!("logs {address}"),
            Self::Logs { address: None, .. } => "logs".to_string(),
        }
    }

    /// The `eth_subscribe` request frame.
    pub fn request(&self) -> String {
        let params = match self {
            Self::NewHeads => json!(["newHeads"]),
            Self::Logs { address, topics } => {
                let mut filter = serde_json::Map::new();
                if let Some(address) = address {
                    filter.insert("address".to_string(), json!(address));
                }
                if !topics.is_empty() {
                    filter.insert("topics".to_string(), json!(topics));
                }
                json!(["logs", filter])
            }
        };
        json!({
            "jsonrpc": "2.0",
            "id": self.correlation_id(),
            "method": "eth_subscribe",
            "params": params,
        })
        .to_string()
    }
}

/// Registry of live sessions. One lock guards the whole map; handles are
/// cloned out before any frame is queued.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    sessions: Mutex<HashMap<String, HashMap<String, SessionHandle>>>,
}

impl SubscriptionManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Dials the node, queues the subscribe handshake, registers the
    /// session, and leaves the wire loops running in the background.
    /// The returned receiver carries everything the session observes.
    pub async fn connect(
        self: &Arc<Self>,
        key: SessionKey,
        url: &str,
        topics: &[SubscribeTopic],
    ) -> Result<mpsc::Receiver<SessionEvent>, SubscriptionError> {
        let (socket, _) = tokio_tungstenite::connect_async(url).await.map_err(|source| {
            SubscriptionError::Connect {
                url: url.to_string(),
                source,
            }
        })?;
        info!(session = %key, url, "websocket connected");

        let (sink, stream) = socket.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let handle = SessionHandle::new(key.clone(), outbound_tx.clone());
        for topic in topics {
            handle.try_queue(topic.request())?;
        }
        self.register(handle).await;

        tokio::spawn(session::write_loop(key.clone(), sink, outbound_rx));
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            session::read_loop(key.clone(), stream, outbound_tx, events_tx).await;
            manager.remove(&key).await;
        });

        Ok(events_rx)
    }

    pub async fn register(&self, handle: SessionHandle) {
        let key = handle.key().clone();
        let mut sessions = self.sessions.lock().await;
        let group = sessions.entry(key.group.clone()).or_default();
        if group.insert(key.id.clone(), handle).is_some() {
            warn!(session = %key, "replaced an existing session");
        } else {
            debug!(session = %key, "session registered");
        }
    }

    pub async fn unregister(&self, group: &str, id: &str) -> Result<(), SubscriptionError> {
        let mut sessions = self.sessions.lock().await;
        let not_found = || SubscriptionError::SessionNotFound {
            group: group.to_string(),
            id: id.to_string(),
        };
        let members = sessions.get_mut(group).ok_or_else(not_found)?;
        if members.remove(id).is_none() {
            return Err(not_found());
        }
        if members.is_empty() {
            sessions.remove(group);
        }
        debug!(group, id, "session unregistered");
        Ok(())
    }

    /// Queues a frame for one session. A dead session is pruned and the
    /// error surfaced; a full queue only drops the frame.
    pub async fn send(
        &self,
        group: &str,
        id: &str,
        text: impl Into<String>,
    ) -> Result<(), SubscriptionError> {
        let handle = {
            let sessions = self.sessions.lock().await;
            sessions.get(group).and_then(|members| members.get(id)).cloned()
        }
        .ok_or_else(|| SubscriptionError::SessionNotFound {
            group: group.to_string(),
            id: id.to_string(),
        })?;

        match handle.try_queue(text) {
            Ok(_) => Ok(()),
            Err(e) => {
                self.remove(handle.key()).await;
                Err(e)
            }
        }
    }

    /// Queues a frame for every session in a group. Returns how many
    /// sessions actually took it; dead ones are pruned along the way.
    pub async fn send_group(&self, group: &str, text: &str) -> usize {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(group)
                .map(|members| members.values().cloned().collect())
                .unwrap_or_default()
        };
        self.fan_out(handles, text).await
    }

    /// Queues a frame for every session everywhere.
    pub async fn broadcast(&self, text: &str) -> usize {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.lock().await;
            sessions
                .values()
                .flat_map(|members| members.values().cloned())
                .collect()
        };
        self.fan_out(handles, text).await
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.values().map(HashMap::len).sum()
    }

    async fn fan_out(&self, handles: Vec<SessionHandle>, text: &str) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for handle in handles {
            match handle.try_queue(text) {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(_) => dead.push(handle.key().clone()),
            }
        }
        for key in dead {
            warn!(session = %key, "pruning dead session");
            self.remove(&key).await;
        }
        delivered
    }

    async fn remove(&self, key: &SessionKey) {
        let _ = self.unregister(&key.group, &key.id).await;
    }
}
