use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::realtime::registry::ActorKind;
use crate::utils::jwt::Claims;

/// Keys the governor on the authenticated actor id set by `auth_middleware`
#[derive(Debug, Clone, Copy)]
pub struct ActorIdExtractor;

impl KeyExtractor for ActorIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type ActorGovernorLayer = GovernorLayer<
    ActorIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-actor limits
/// - Captain: 300 requests per minute; accept/start/end come in bursts at pickup
/// - Rider: 100 requests per minute
pub fn create_actor_governor(kind: ActorKind) -> ActorGovernorLayer {
    let (per_ms, burst) = match kind {
        ActorKind::Captain => (200, 300),
        ActorKind::Rider => (600, 100),
    };

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(ActorIdExtractor)
            .finish()
            .expect("valid actor governor config"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
