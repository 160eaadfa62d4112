use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::realtime::presence;
use crate::realtime::registry::{ActorKey, ActorKind, ConnectionHandle, ConnectionId};
use crate::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationPayload {
    pub ltd: f64,
    pub lng: f64,
}

/// Frames a client may send: `{"event": "join", "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join { user_id: Uuid, user_type: ActorKind },
    #[serde(rename_all = "camelCase")]
    UpdateLocationCaptain {
        user_id: Uuid,
        location: LocationPayload,
    },
}

/// Upgrade to a WebSocket push channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (handle, mut outbound) = ConnectionHandle::channel(state.config.connection_buffer);
    let connection = handle.id;
    tracing::info!(connection_id = %connection, "Client connected");

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(connection_id = %connection, error = %e, "Failed to encode frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let session_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut session = Session::new(handle);
        while let Some(Ok(frame)) = stream.next().await {
            match frame {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => session.handle(&session_state, message).await,
                    Err(e) => {
                        tracing::warn!(connection_id = %connection, error = %e, "Unrecognised client frame");
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    disconnect(&state, connection).await;
}

/// Per-connection state: which actor, if any, this socket has joined as.
pub struct Session {
    handle: ConnectionHandle,
    actor: Option<ActorKey>,
}

impl Session {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            actor: None,
        }
    }

    pub fn actor(&self) -> Option<ActorKey> {
        self.actor
    }

    pub async fn handle(&mut self, state: &AppState, message: ClientMessage) {
        match message {
            ClientMessage::Join { user_id, user_type } => {
                self.join(
                    state,
                    ActorKey {
                        id: user_id,
                        kind: user_type,
                    },
                )
                .await
            }
            ClientMessage::UpdateLocationCaptain { user_id, location } => {
                self.update_location(state, user_id, location).await
            }
        }
    }

    async fn join(&mut self, state: &AppState, actor: ActorKey) {
        let connection = self.handle.id;

        if let Some(previous) = self.actor.take() {
            if previous != actor {
                release(state, connection).await;
            }
        }

        if let Err(e) = presence::persist_binding(&state.db, actor, connection).await {
            tracing::warn!(
                connection_id = %connection,
                actor_id = %actor.id,
                actor_kind = ?actor.kind,
                error = %e,
                "Join rejected"
            );
            return;
        }

        if let Some(superseded) = state.registry.bind(actor, self.handle.clone()) {
            tracing::debug!(
                actor_id = %actor.id,
                superseded = %superseded.id,
                "Replaced older connection"
            );
        }
        self.actor = Some(actor);

        tracing::info!(
            connection_id = %connection,
            actor_id = %actor.id,
            actor_kind = ?actor.kind,
            "Actor joined"
        );
    }

    async fn update_location(&mut self, state: &AppState, captain_id: Uuid, location: LocationPayload) {
        // A superseded socket keeps its actor but no longer owns the binding.
        if self.actor != Some(ActorKey::captain(captain_id))
            || !state.registry.is_bound(self.handle.id)
        {
            tracing::warn!(
                connection_id = %self.handle.id,
                captain_id = %captain_id,
                "Location update from a connection not bound to that captain"
            );
            return;
        }

        match presence::update_captain_location(&state.db, captain_id, location.ltd, location.lng).await {
            Ok(()) => tracing::debug!(captain_id = %captain_id, "Captain location updated"),
            Err(e) => {
                tracing::warn!(captain_id = %captain_id, error = %e, "Captain location update failed")
            }
        }
    }
}

async fn release(state: &AppState, connection: ConnectionId) {
    if let Some(actor) = state.registry.unbind(connection) {
        if let Err(e) = presence::clear_binding(&state.db, actor, connection).await {
            tracing::warn!(connection_id = %connection, error = %e, "Failed to clear stored connection");
        }
    }
}

/// Connection closed: drop its binding if it still owns one.
pub async fn disconnect(state: &AppState, connection: ConnectionId) {
    release(state, connection).await;
    tracing::info!(connection_id = %connection, "Client disconnected");
}
