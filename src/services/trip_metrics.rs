use std::future::Future;
use std::time::Duration;

use crate::services::geocoding::{Coordinates, Geocoder, GeocodingError, RouteEstimate};

/// Smallest trip ever priced when the provider reports zero distance and time
/// between two distinct points.
pub const MIN_DISTANCE_KM: f64 = 0.1;
pub const MIN_DURATION_MIN: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripMetrics {
    pub distance_km: f64,
    pub duration_min: f64,
}

async fn with_timeout<T>(
    budget: Duration,
    call: impl Future<Output = Result<T, GeocodingError>>,
) -> Result<T, GeocodingError> {
    tokio::time::timeout(budget, call)
        .await
        .map_err(|_| GeocodingError::Timeout(budget))?
}

/// Geocode one address under the lookup budget.
pub async fn resolve_point(
    geocoder: &dyn Geocoder,
    address: &str,
    budget: Duration,
) -> Result<Coordinates, GeocodingError> {
    with_timeout(budget, geocoder.geocode(address)).await
}

/// Whole kilometres and whole minutes, rounded up, with the zero-trip floor.
pub fn normalize(route: RouteEstimate) -> TripMetrics {
    let distance_km = (route.meters / 1000.0).ceil();
    let duration_min = (route.seconds / 60.0).ceil();

    if distance_km == 0.0 && duration_min == 0.0 {
        return TripMetrics {
            distance_km: MIN_DISTANCE_KM,
            duration_min: MIN_DURATION_MIN,
        };
    }

    TripMetrics {
        distance_km,
        duration_min,
    }
}

/// Resolve distance and duration between two free-text addresses.
///
/// Both addresses are geocoded concurrently. Identical coordinates short-circuit
/// to a zero trip without a routing call. Every external call is bounded by
/// `budget`.
pub async fn resolve(
    geocoder: &dyn Geocoder,
    pickup: &str,
    destination: &str,
    budget: Duration,
) -> Result<TripMetrics, GeocodingError> {
    let (origin, target) = tokio::try_join!(
        resolve_point(geocoder, pickup, budget),
        resolve_point(geocoder, destination, budget),
    )?;

    if origin == target {
        return Ok(TripMetrics {
            distance_km: 0.0,
            duration_min: 0.0,
        });
    }

    let route = with_timeout(budget, geocoder.distance_and_duration(origin, target)).await?;
    Ok(normalize(route))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_up_to_whole_units() {
        let metrics = normalize(RouteEstimate {
            meters: 12_001.0,
            seconds: 61.0,
        });
        assert_eq!(metrics.distance_km, 13.0);
        assert_eq!(metrics.duration_min, 2.0);
    }

    #[test]
    fn test_zero_route_hits_floor() {
        let metrics = normalize(RouteEstimate {
            meters: 0.0,
            seconds: 0.0,
        });
        assert_eq!(
            metrics,
            TripMetrics {
                distance_km: 0.1,
                duration_min: 5.0
            }
        );
    }

    #[test]
    fn test_floor_needs_both_zero() {
        let metrics = normalize(RouteEstimate {
            meters: 0.0,
            seconds: 30.0,
        });
        assert_eq!(metrics.distance_km, 0.0);
        assert_eq!(metrics.duration_min, 1.0);
    }
}
