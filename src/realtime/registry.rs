//! Live connection registry.
//!
//! Maps each actor to the one connection currently allowed to receive pushes
//! for it. A newer connection for the same actor replaces the older one, and a
//! close only clears the entry it owns, so a late disconnect from a superseded
//! socket never evicts the fresh one.

use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    #[serde(rename = "user", alias = "rider")]
    Rider,
    #[serde(rename = "captain")]
    Captain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorKey {
    pub id: Uuid,
    pub kind: ActorKind,
}

impl ActorKey {
    pub fn rider(id: Uuid) -> Self {
        Self {
            id,
            kind: ActorKind::Rider,
        }
    }

    pub fn captain(id: Uuid) -> Self {
        Self {
            id,
            kind: ActorKind::Captain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Frame pushed to a client: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    pub event: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no live connection for actor")]
    NotConnected,

    #[error("connection {0} outbound buffer is full")]
    Backpressure(ConnectionId),

    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sending half of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    tx: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, tx }
    }

    /// Create a handle with its receiving half.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(ConnectionId::new(), tx), rx)
    }

    /// Queue a frame without waiting for the socket.
    pub fn push(&self, message: ServerMessage) -> Result<(), DeliveryError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Backpressure(self.id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed(self.id),
        })
    }
}

#[derive(Default)]
pub struct ConnectionRegistry {
    by_actor: DashMap<ActorKey, ConnectionHandle>,
    by_connection: DashMap<ConnectionId, ActorKey>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to `actor`, returning the handle it superseded, if any.
    pub fn bind(&self, actor: ActorKey, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let connection = handle.id;
        self.by_connection.insert(connection, actor);
        let previous = self.by_actor.insert(actor, handle);

        match previous {
            Some(old) if old.id != connection => {
                self.by_connection.remove_if(&old.id, |_, owner| *owner == actor);
                Some(old)
            }
            // Rebinding the same connection supersedes nothing.
            _ => None,
        }
    }

    pub fn resolve(&self, actor: &ActorKey) -> Option<ConnectionHandle> {
        self.by_actor.get(actor).map(|entry| entry.value().clone())
    }

    /// Drop the binding owned by `connection`.
    ///
    /// Returns the actor whose binding was removed. A connection that has
    /// already been superseded removes nothing.
    pub fn unbind(&self, connection: ConnectionId) -> Option<ActorKey> {
        let (_, actor) = self.by_connection.remove(&connection)?;

        self.by_actor
            .remove_if(&actor, |_, current| current.id == connection)
            .map(|(actor, _)| actor)
    }

    pub fn is_bound(&self, connection: ConnectionId) -> bool {
        self.by_connection.contains_key(&connection)
    }

    pub fn len(&self) -> usize {
        self.by_actor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_actor.is_empty()
    }
}
