//! One websocket session: the wire loops and frame classification.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value as Json;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::SubscriptionError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound frames queued per session before new ones are dropped.
pub const OUTBOUND_BUFFER: usize = 64;
/// Inbound events queued per session before new ones are dropped.
pub const EVENT_BUFFER: usize = 256;
/// Keepalive ping cadence.
pub const PING_INTERVAL: Duration = Duration::from_secs(15);

/// Where a session lives in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub group: String,
    pub id: String,
}

impl SessionKey {
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.id)
    }
}

/// Sending side of a session's outbound queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    key: SessionKey,
    outbound: mpsc::Sender<Message>,
}

impl SessionHandle {
    pub(crate) fn new(key: SessionKey, outbound: mpsc::Sender<Message>) -> Self {
        Self { key, outbound }
    }

    /// A handle wired to a bare channel instead of a socket.
    pub fn pair(key: SessionKey, capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(key, tx), rx)
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Queues a text frame without blocking. Returns `Ok(false)` when the
    /// queue is full and the frame was dropped.
    pub fn try_queue(&self, text: impl Into<String>) -> Result<bool, SubscriptionError> {
        match self.outbound.try_send(Message::Text(text.into())) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session = %self.key, "outbound queue full, dropping frame");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(SubscriptionError::ChannelClosed(self.key.to_string()))
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// What a session reports back to its owner.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The node acknowledged a subscribe request.
    Subscribed {
        correlation: String,
        subscription: String,
    },
    /// A push notification for an established subscription.
    Notification {
        subscription: String,
        payload: Json,
    },
    /// The node rejected a request we correlated.
    Rejected {
        correlation: String,
        message: String,
    },
    /// The socket is gone.
    Closed { reason: String },
}

enum Frame {
    Reply { id: String, result: Json },
    Error { id: String, message: String },
    Push { subscription: String, payload: Json },
    Ignored,
}

/// Sorts an inbound text frame into reply, error, push, or noise.
/// Replies correlate through the string id the subscribe request carried.
fn classify_frame(text: &str) -> Frame {
    let Ok(value) = serde_json::from_str::<Json>(text) else {
        debug!("unparseable frame, skipping");
        return Frame::Ignored;
    };

    match value.get("method").and_then(Json::as_str) {
        Some("eth_subscription") => {
            let params = value.get("params");
            let subscription = params
                .and_then(|p| p.get("subscription"))
                .and_then(Json::as_str);
            match (subscription, params.and_then(|p| p.get("result"))) {
                (Some(subscription), Some(payload)) => Frame::Push {
                    subscription: subscription.to_string(),
                    payload: payload.clone(),
                },
                _ => {
                    debug!("push without subscription id, skipping");
                    Frame::Ignored
                }
            }
        }
        Some(other) => {
            debug!(method = other, "unexpected method frame, skipping");
            Frame::Ignored
        }
        None => {
            let Some(id) = value.get("id").and_then(Json::as_str).map(str::to_string) else {
                return Frame::Ignored;
            };
            if let Some(error) = value.get("error") {
                let message = error
                    .get("message")
                    .and_then(Json::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                Frame::Error { id, message }
            } else {
                Frame::Reply {
                    id,
                    result: value.get("result").cloned().unwrap_or(Json::Null),
                }
            }
        }
    }
}

fn deliver(key: &SessionKey, events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!(session = %key, ?event, "event buffer full, dropping");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(session = %key, "event receiver gone");
        }
    }
}

/// Drains the outbound queue into the socket and pings on a fixed cadence.
pub(crate) async fn write_loop(
    key: SessionKey,
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<Message>,
) {
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(frame).await {
                        warn!(session = %key, error = %e, "write failed, closing session");
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    debug!(session = %key, "outbound queue closed");
                    break;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                    warn!(session = %key, error = %e, "ping failed, closing session");
                    break;
                }
            }
        }
    }
}

/// Reads frames until the socket dies, answering pings and forwarding
/// classified events to the session owner.
pub(crate) async fn read_loop(
    key: SessionKey,
    mut stream: SplitStream<WsStream>,
    outbound: mpsc::Sender<Message>,
    events: mpsc::Sender<SessionEvent>,
) {
    // subscription hash -> correlation id, for labeling pushes
    let mut subscriptions: HashMap<String, String> = HashMap::new();

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match classify_frame(&text) {
                Frame::Reply { id, result } => {
                    let Some(hash) = result.as_str() else {
                        debug!(session = %key, correlation = %id, "reply without a subscription id, skipping");
                        continue;
                    };
                    debug!(session = %key, correlation = %id, subscription = hash, "subscription established");
                    subscriptions.insert(hash.to_string(), id.clone());
                    deliver(
                        &key,
                        &events,
                        SessionEvent::Subscribed {
                            correlation: id,
                            subscription: hash.to_string(),
                        },
                    );
                }
                Frame::Error { id, message } => {
                    warn!(session = %key, correlation = %id, message, "subscribe request rejected");
                    deliver(
                        &key,
                        &events,
                        SessionEvent::Rejected {
                            correlation: id,
                            message,
                        },
                    );
                }
                Frame::Push {
                    subscription,
                    payload,
                } => {
                    let topic = subscriptions
                        .get(&subscription)
                        .map(String::as_str)
                        .unwrap_or("?");
                    debug!(session = %key, subscription = %subscription, topic, "notification");
                    deliver(
                        &key,
                        &events,
                        SessionEvent::Notification {
                            subscription,
                            payload,
                        },
                    );
                }
                Frame::Ignored => {}
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound.try_send(Message::Pong(payload));
            }
            Ok(Message::Pong(_)) => debug!(session = %key, "pong"),
            Ok(Message::Close(close)) => {
                let reason = close.map(|c| c.reason.into_owned()).unwrap_or_default();
                deliver(&key, &events, SessionEvent::Closed { reason });
                break;
            }
            Ok(_) => {}
            Err(e) => {
                deliver(
                    &key,
                    &events,
                    SessionEvent::Closed {
                        reason: e.to_string(),
                    },
                );
                break;
            }
        }
    }
    debug!(session = %key, "read loop ended");
}
