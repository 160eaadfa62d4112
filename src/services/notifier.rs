use std::sync::Arc;

use serde::Serialize;

use crate::realtime::registry::{ActorKey, ConnectionRegistry, DeliveryError, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideEvent {
    NewRide,
    RideConfirmed,
    RideStarted,
    RideEnded,
}

impl RideEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideEvent::NewRide => "new-ride",
            RideEvent::RideConfirmed => "ride-confirmed",
            RideEvent::RideStarted => "ride-started",
            RideEvent::RideEnded => "ride-ended",
        }
    }
}

/// Pushes ride events to whichever connection the registry currently holds
/// for the target actor. Delivery is at most once with no retry.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<ConnectionRegistry>,
}

impl Notifier {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn send<T: Serialize>(
        &self,
        actor: ActorKey,
        event: RideEvent,
        payload: &T,
    ) -> Result<(), DeliveryError> {
        let handle = self
            .registry
            .resolve(&actor)
            .ok_or(DeliveryError::NotConnected)?;

        let message = ServerMessage {
            event: event.as_str().to_string(),
            data: serde_json::to_value(payload)?,
        };

        handle.push(message)?;

        tracing::debug!(
            actor_id = %actor.id,
            actor_kind = ?actor.kind,
            connection_id = %handle.id,
            event = event.as_str(),
            "Event pushed"
        );
        Ok(())
    }

    /// Send and swallow the outcome; failures are only logged. Returns whether
    /// the frame was queued.
    pub fn notify<T: Serialize>(&self, actor: ActorKey, event: RideEvent, payload: &T) -> bool {
        match self.send(actor, event, payload) {
            Ok(()) => true,
            Err(DeliveryError::NotConnected) => {
                tracing::debug!(
                    actor_id = %actor.id,
                    actor_kind = ?actor.kind,
                    event = event.as_str(),
                    "No live connection, event dropped"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    actor_id = %actor.id,
                    actor_kind = ?actor.kind,
                    event = event.as_str(),
                    error = %e,
                    "Event delivery failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::realtime::registry::ConnectionHandle;

    #[test]
    fn test_event_names() {
        assert_eq!(RideEvent::NewRide.as_str(), "new-ride");
        assert_eq!(RideEvent::RideConfirmed.as_str(), "ride-confirmed");
        assert_eq!(RideEvent::RideStarted.as_str(), "ride-started");
        assert_eq!(RideEvent::RideEnded.as_str(), "ride-ended");
    }

    #[test]
    fn test_delivers_to_bound_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Notifier::new(registry.clone());
        let actor = ActorKey::rider(Uuid::new_v4());
        let (handle, mut rx) = ConnectionHandle::channel(4);
        registry.bind(actor, handle);

        assert!(notifier.notify(actor, RideEvent::RideStarted, &json!({ "fare": 90 })));

        let message = rx.try_recv().unwrap();
        assert_eq!(message.event, "ride-started");
        assert_eq!(message.data["fare"], 90);
    }

    #[test]
    fn test_unbound_actor_is_dropped() {
        let notifier = Notifier::new(Arc::new(ConnectionRegistry::new()));
        let actor = ActorKey::captain(Uuid::new_v4());

        assert!(matches!(
            notifier.send(actor, RideEvent::NewRide, &json!({})),
            Err(DeliveryError::NotConnected)
        ));
        assert!(!notifier.notify(actor, RideEvent::NewRide, &json!({})));
    }

    #[test]
    fn test_closed_connection_is_not_fatal() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Notifier::new(registry.clone());
        let actor = ActorKey::rider(Uuid::new_v4());
        let (handle, rx) = ConnectionHandle::channel(4);
        registry.bind(actor, handle);
        drop(rx);

        assert!(!notifier.notify(actor, RideEvent::RideEnded, &json!({})));
    }
}
