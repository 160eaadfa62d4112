use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::geocoding::GeocodingError;

/// Errors surfaced to callers of the HTTP surface.
///
/// Notification delivery never produces an `AppError`: once a transition has
/// committed, push failures are only logged.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input, including an unknown vehicle class.
    #[error("{0}")]
    Validation(String),

    /// A geocoding or routing lookup failed, returned nothing, or timed out.
    #[error("Geocoding service unavailable: {0}")]
    GeocodingUnavailable(String),

    /// Unknown id, OTP mismatch, or a lost accept race.
    #[error("{0}")]
    RideNotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<GeocodingError> for AppError {
    fn from(err: GeocodingError) -> Self {
        AppError::GeocodingUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::GeocodingUnavailable(_) => {
                tracing::warn!(error = %self, "Geocoding lookup failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::RideNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                AppError::GeocodingUnavailable("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::RideNotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("who".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
