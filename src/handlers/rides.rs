use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::rides::{
    self, ConfirmRideRequest, CreateRideRequest, EndRideRequest, FareQuery, FareQuote, RideView,
    StartRideRequest,
};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RideEnvelope {
    pub message: &'static str,
    pub ride: RideView,
}

/// Request a ride (rider)
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRideRequest>,
) -> AppResult<(StatusCode, Json<RideEnvelope>)> {
    let ride = rides::create_ride(&state, claims.sub, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(RideEnvelope {
            message: "Ride created successfully",
            ride,
        }),
    ))
}

/// Quote every vehicle class for a trip (rider)
pub async fn get_fares(
    State(state): State<AppState>,
    Query(query): Query<FareQuery>,
) -> AppResult<Json<FareQuote>> {
    Ok(Json(rides::quote_fares(&state, query).await?))
}

/// Accept a pending ride (captain)
pub async fn confirm_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ConfirmRideRequest>,
) -> AppResult<Json<RideEnvelope>> {
    let (ride_id, captain_id) = payload.validate()?;

    if captain_id != claims.sub {
        return Err(AppError::Forbidden(
            "Captains can only accept rides for themselves".to_string(),
        ));
    }

    let ride = rides::confirm_ride(&state, ride_id, captain_id).await?;
    Ok(Json(RideEnvelope {
        message: "Ride confirmed successfully",
        ride,
    }))
}

/// Start a ride with the rider's OTP (captain)
pub async fn start_ride(
    State(state): State<AppState>,
    Query(payload): Query<StartRideRequest>,
) -> AppResult<Json<RideEnvelope>> {
    let (ride_id, otp) = payload.validate()?;
    let ride = rides::start_ride(&state, ride_id, &otp).await?;

    Ok(Json(RideEnvelope {
        message: "Ride started successfully",
        ride,
    }))
}

/// Finish a ride (captain)
pub async fn end_ride(
    State(state): State<AppState>,
    Json(payload): Json<EndRideRequest>,
) -> AppResult<Json<RideEnvelope>> {
    let ride_id = payload.validate()?;
    let ride = rides::end_ride(&state, ride_id).await?;

    Ok(Json(RideEnvelope {
        message: "Ride ended successfully",
        ride,
    }))
}
