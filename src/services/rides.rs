//! Ride lifecycle: create, quote, confirm, start and end.
//!
//! ```text
//! pending --confirm--> accepted --start--> ongoing --end--> completed
//! ```
//!
//! `confirm` is a single conditional UPDATE on `status = 'pending'`, so of any
//! number of captains racing for one ride exactly one wins. `start` likewise
//! only moves an `accepted` ride. `end` has no status precondition.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::captain::{self, CaptainStatus};
use crate::entities::ride::{self, RideStatus, VehicleClass};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::realtime::registry::ActorKey;
use crate::services::dispatch::DispatchJob;
use crate::services::fare::{calculate_fare, format_distance, format_distance_fixed, format_duration};
use crate::services::notifier::RideEvent;
use crate::services::trip_metrics;
use crate::utils::otp::generate_otp;
use crate::AppState;

// ============ Requests ============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideRequest {
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FareQuery {
    pub pickup: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRideRequest {
    pub ride_id: Option<String>,
    pub captain_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRideRequest {
    pub ride_id: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRideRequest {
    pub ride_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRide {
    pub pickup: String,
    pub destination: String,
    pub vehicle_class: VehicleClass,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_id(value: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| AppError::Validation(format!("Invalid {}", field)))
}

impl CreateRideRequest {
    pub fn validate(self) -> AppResult<NewRide> {
        let (Some(pickup), Some(destination), Some(vehicle_type)) = (
            present(self.pickup),
            present(self.destination),
            present(self.vehicle_type),
        ) else {
            return Err(AppError::Validation(
                "Pickup, destination, and vehicle type are required".to_string(),
            ));
        };

        Ok(NewRide {
            pickup,
            destination,
            vehicle_class: vehicle_type.parse()?,
        })
    }
}

impl FareQuery {
    pub fn validate(self) -> AppResult<(String, String)> {
        match (present(self.pickup), present(self.destination)) {
            (Some(pickup), Some(destination)) => Ok((pickup, destination)),
            _ => Err(AppError::Validation(
                "Pickup and destination are required".to_string(),
            )),
        }
    }
}

impl ConfirmRideRequest {
    /// `(ride_id, captain_id)`
    pub fn validate(self) -> AppResult<(Uuid, Uuid)> {
        match (present(self.ride_id), present(self.captain_id)) {
            (Some(ride_id), Some(captain_id)) => Ok((
                parse_id(&ride_id, "ride ID")?,
                parse_id(&captain_id, "captain ID")?,
            )),
            _ => Err(AppError::Validation(
                "Ride ID and Captain ID are required".to_string(),
            )),
        }
    }
}

impl StartRideRequest {
    pub fn validate(self) -> AppResult<(Uuid, String)> {
        match (present(self.ride_id), present(self.otp)) {
            (Some(ride_id), Some(otp)) => Ok((parse_id(&ride_id, "ride ID")?, otp)),
            _ => Err(AppError::Validation(
                "Ride ID and OTP are required".to_string(),
            )),
        }
    }
}

impl EndRideRequest {
    pub fn validate(self) -> AppResult<Uuid> {
        let ride_id = present(self.ride_id)
            .ok_or_else(|| AppError::Validation("Ride ID is required".to_string()))?;
        parse_id(&ride_id, "ride ID")
    }
}

// ============ Projections ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderInfo {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub color: String,
    pub plate: String,
    pub capacity: i32,
    pub vehicle_type: VehicleClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainInfo {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub status: CaptainStatus,
    pub vehicle: VehicleInfo,
}

/// Ride as returned to callers and pushed to connections. The OTP is only
/// filled in for the rider's create response and the captain's start response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideView {
    pub id: Uuid,
    pub pickup: String,
    pub destination: String,
    pub vehicle_type: VehicleClass,
    pub fare: i32,
    pub distance_km: f64,
    pub duration_min: f64,
    pub distance: String,
    pub duration: String,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    pub rider: Option<RiderInfo>,
    pub captain: Option<CaptainInfo>,
}

impl From<user::Model> for RiderInfo {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
        }
    }
}

impl From<captain::Model> for CaptainInfo {
    fn from(c: captain::Model) -> Self {
        Self {
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            email: c.email,
            status: c.status,
            vehicle: VehicleInfo {
                color: c.vehicle_color,
                plate: c.vehicle_plate,
                capacity: c.vehicle_capacity,
                vehicle_type: c.vehicle_type,
            },
        }
    }
}

impl RideView {
    fn bare(ride: &ride::Model) -> Self {
        Self {
            id: ride.id,
            pickup: ride.pickup.clone(),
            destination: ride.destination.clone(),
            vehicle_type: ride.vehicle_type,
            fare: ride.fare,
            distance_km: ride.distance_km,
            duration_min: ride.duration_min,
            distance: format_distance(ride.distance_km),
            duration: format_duration(ride.duration_min),
            status: ride.status,
            created_at: ride.created_at.with_timezone(&Utc),
            otp: None,
            rider: None,
            captain: None,
        }
    }

    fn with_otp(mut self, otp: &str) -> Self {
        self.otp = Some(otp.to_string());
        self
    }
}

/// Ride with rider and captain details attached.
pub async fn project(db: &DatabaseConnection, ride: &ride::Model) -> AppResult<RideView> {
    let rider = user::Entity::find_by_id(ride.user_id).one(db).await?;
    let captain = match ride.captain_id {
        Some(id) => captain::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    let mut view = RideView::bare(ride);
    view.rider = rider.map(RiderInfo::from);
    view.captain = captain.map(CaptainInfo::from);
    Ok(view)
}

// ============ Fare quotes ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassQuote {
    pub fare: i32,
    pub duration: String,
    pub distance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fares {
    pub car: ClassQuote,
    pub auto: ClassQuote,
    pub moto: ClassQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuote {
    pub pickup: String,
    pub destination: String,
    pub fares: Fares,
    pub distance_km: f64,
    pub duration_min: f64,
    pub total_distance: String,
    pub total_duration: String,
}

/// Price the trip in every vehicle class. Touches no persisted state.
pub async fn quote_fares(state: &AppState, query: FareQuery) -> AppResult<FareQuote> {
    let (pickup, destination) = query.validate()?;

    let metrics = trip_metrics::resolve(
        state.geocoder.as_ref(),
        &pickup,
        &destination,
        state.config.geocoding_timeout(),
    )
    .await?;

    let quote = |class: VehicleClass| ClassQuote {
        fare: calculate_fare(metrics.distance_km, metrics.duration_min, class),
        duration: format_duration(metrics.duration_min),
        distance: format_distance_fixed(metrics.distance_km),
    };

    Ok(FareQuote {
        fares: Fares {
            car: quote(VehicleClass::Car),
            auto: quote(VehicleClass::Auto),
            moto: quote(VehicleClass::Moto),
        },
        pickup,
        destination,
        distance_km: metrics.distance_km,
        duration_min: metrics.duration_min,
        total_distance: format_distance_fixed(metrics.distance_km),
        total_duration: format_duration(metrics.duration_min),
    })
}

// ============ Transitions ============

/// Price and persist a new `pending` ride, then queue the captain fan-out.
///
/// Nothing is written if the trip metrics cannot be resolved. The fan-out runs
/// on the dispatch pool after this returns and cannot fail the creation.
pub async fn create_ride(
    state: &AppState,
    rider_id: Uuid,
    request: CreateRideRequest,
) -> AppResult<RideView> {
    let NewRide {
        pickup,
        destination,
        vehicle_class,
    } = request.validate()?;

    let metrics = trip_metrics::resolve(
        state.geocoder.as_ref(),
        &pickup,
        &destination,
        state.config.geocoding_timeout(),
    )
    .await?;

    let fare = calculate_fare(metrics.distance_km, metrics.duration_min, vehicle_class);
    let otp = generate_otp();

    let ride = ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(rider_id),
        captain_id: Set(None),
        pickup: Set(pickup.clone()),
        destination: Set(destination),
        vehicle_type: Set(vehicle_class),
        distance_km: Set(metrics.distance_km),
        duration_min: Set(metrics.duration_min),
        fare: Set(fare),
        otp: Set(otp),
        status: Set(RideStatus::Pending),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        ride_id = %ride.id,
        rider_id = %rider_id,
        vehicle_type = vehicle_class.as_str(),
        fare,
        distance_km = metrics.distance_km,
        duration_min = metrics.duration_min,
        "Ride created"
    );

    state.dispatch.submit(DispatchJob::NewRide {
        ride_id: ride.id,
        pickup,
    });

    Ok(RideView::bare(&ride).with_otp(&ride.otp))
}

/// Assign `captain_id` to a pending ride.
pub async fn confirm_ride(state: &AppState, ride_id: Uuid, captain_id: Uuid) -> AppResult<RideView> {
    let result = ride::Entity::update_many()
        .set(ride::ActiveModel {
            status: Set(RideStatus::Accepted),
            captain_id: Set(Some(captain_id)),
            ..Default::default()
        })
        .filter(ride::Column::Id.eq(ride_id))
        .filter(ride::Column::Status.eq(RideStatus::Pending))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::RideNotFound(
            "Ride not found or already accepted".to_string(),
        ));
    }

    let ride = find_ride(&state.db, ride_id).await?;
    let view = project(&state.db, &ride).await?;

    tracing::info!(ride_id = %ride_id, captain_id = %captain_id, "Ride confirmed");
    state
        .notifier
        .notify(ActorKey::rider(ride.user_id), RideEvent::RideConfirmed, &view);

    Ok(view)
}

/// Begin an accepted trip once the captain presents the rider's OTP.
///
/// A wrong OTP, an unknown ride and a ride that is not `accepted` are the same
/// error.
pub async fn start_ride(state: &AppState, ride_id: Uuid, otp: &str) -> AppResult<RideView> {
    let result = ride::Entity::update_many()
        .set(ride::ActiveModel {
            status: Set(RideStatus::Ongoing),
            ..Default::default()
        })
        .filter(ride::Column::Id.eq(ride_id))
        .filter(ride::Column::Status.eq(RideStatus::Accepted))
        .filter(ride::Column::Otp.eq(otp))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::RideNotFound(
            "Ride not found or invalid OTP".to_string(),
        ));
    }

    let ride = find_ride(&state.db, ride_id).await?;
    let view = project(&state.db, &ride).await?;

    tracing::info!(ride_id = %ride_id, "Ride started");
    state
        .notifier
        .notify(ActorKey::rider(ride.user_id), RideEvent::RideStarted, &view);

    Ok(view.with_otp(&ride.otp))
}

/// Complete a ride from whatever status it is in.
pub async fn end_ride(state: &AppState, ride_id: Uuid) -> AppResult<RideView> {
    let ride = find_ride(&state.db, ride_id).await?;
    let previous = ride.status;

    let mut active: ride::ActiveModel = ride.into();
    active.status = Set(RideStatus::Completed);
    let ride = active.update(&state.db).await?;

    let view = project(&state.db, &ride).await?;

    tracing::info!(ride_id = %ride_id, previous_status = ?previous, "Ride ended");
    state
        .notifier
        .notify(ActorKey::rider(ride.user_id), RideEvent::RideEnded, &view);

    Ok(view)
}

async fn find_ride(db: &DatabaseConnection, ride_id: Uuid) -> AppResult<ride::Model> {
    ride::Entity::find_by_id(ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::RideNotFound("Ride not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_all_fields() {
        let missing = CreateRideRequest {
            pickup: Some("MG Road".into()),
            destination: Some("  ".into()),
            vehicle_type: Some("car".into()),
        };
        assert!(matches!(missing.validate(), Err(AppError::Validation(_))));

        let unknown = CreateRideRequest {
            pickup: Some("MG Road".into()),
            destination: Some("Indiranagar".into()),
            vehicle_type: Some("bus".into()),
        };
        assert!(matches!(unknown.validate(), Err(AppError::Validation(_))));

        let ok = CreateRideRequest {
            pickup: Some("MG Road".into()),
            destination: Some("Indiranagar".into()),
            vehicle_type: Some("moto".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.vehicle_class, VehicleClass::Moto);
    }

    #[test]
    fn test_confirm_request_parses_ids() {
        let ride_id = Uuid::new_v4();
        let captain_id = Uuid::new_v4();
        let parsed = ConfirmRideRequest {
            ride_id: Some(ride_id.to_string()),
            captain_id: Some(captain_id.to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(parsed, (ride_id, captain_id));

        let bad = ConfirmRideRequest {
            ride_id: Some("not-a-uuid".into()),
            captain_id: Some(captain_id.to_string()),
        };
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));

        assert!(matches!(
            ConfirmRideRequest::default().validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_start_and_end_requests() {
        assert!(matches!(
            StartRideRequest {
                ride_id: Some(Uuid::new_v4().to_string()),
                otp: None,
            }
            .validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            EndRideRequest::default().validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_view_hides_otp_unless_attached() {
        let ride = ride::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            captain_id: None,
            pickup: "A".into(),
            destination: "B".into(),
            vehicle_type: VehicleClass::Car,
            distance_km: 3.0,
            duration_min: 75.0,
            fare: 137,
            otp: "4821".into(),
            status: RideStatus::Pending,
            created_at: Utc::now().into(),
        };

        let hidden = serde_json::to_value(RideView::bare(&ride)).unwrap();
        assert!(hidden.get("otp").is_none());
        assert_eq!(hidden["distance"], "3 km");
        assert_eq!(hidden["duration"], "1 hr 15 mins");
        assert_eq!(hidden["vehicleType"], "car");
        assert_eq!(hidden["status"], "pending");

        let shown = serde_json::to_value(RideView::bare(&ride).with_otp(&ride.otp)).unwrap();
        assert_eq!(shown["otp"], "4821");
    }
}
