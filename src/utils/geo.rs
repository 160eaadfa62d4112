pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Check if a point lies inside the spherical cap of `radius_km` around a center
pub fn is_within_radius(
    lat: f64,
    lng: f64,
    center_lat: f64,
    center_lng: f64,
    radius_km: f64,
) -> bool {
    haversine_distance(lat, lng, center_lat, center_lng) <= radius_km
}

/// Lat/lng rectangle enclosing a spherical cap. `lng` is `None` when the cap
/// reaches a pole or spans the antimeridian; only the latitude band applies then.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat: (f64, f64),
    pub lng: Option<(f64, f64)>,
}

pub fn bounding_box(center_lat: f64, center_lng: f64, radius_km: f64) -> BoundingBox {
    let angular = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let min_lat = center_lat - angular;
    let max_lat = center_lat + angular;

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return BoundingBox {
            lat: (min_lat.max(-90.0), max_lat.min(90.0)),
            lng: None,
        };
    }

    // Widest longitude span of the cap, reached away from the center latitude
    let delta_lng = ((radius_km / EARTH_RADIUS_KM).sin() / center_lat.to_radians().cos())
        .min(1.0)
        .asin()
        .to_degrees();
    let min_lng = center_lng - delta_lng;
    let max_lng = center_lng + delta_lng;

    let lng = if min_lng < -180.0 || max_lng > 180.0 {
        None
    } else {
        Some((min_lng, max_lng))
    };

    BoundingBox {
        lat: (min_lat, max_lat),
        lng,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_jakarta_bandung() {
        // Jakarta center
        let jakarta = (-6.2088, 106.8456);
        // Bandung center
        let bandung = (-6.9175, 107.6191);

        let distance = haversine_distance(jakarta.0, jakarta.1, bandung.0, bandung.1);
        // Should be approximately 120-130 km
        assert!(distance > 100.0 && distance < 150.0);
    }

    #[test]
    fn test_within_radius() {
        let center = (12.9716, 77.5946); // Bengaluru
        let nearby = (12.98, 77.60);

        assert!(is_within_radius(nearby.0, nearby.1, center.0, center.1, 10.0));
        assert!(is_within_radius(center.0, center.1, center.0, center.1, 0.001));

        let far = (13.0827, 80.2707); // Chennai
        assert!(!is_within_radius(far.0, far.1, center.0, center.1, 50.0));
    }

    #[test]
    fn test_bounding_box_contains_cap_edge() {
        let (lat, lng) = (12.9716, 77.5946);
        let bbox = bounding_box(lat, lng, 50.0);
        let (min_lng, max_lng) = bbox.lng.unwrap();

        // A point due east just inside the cap is inside the box
        let east = lng + 0.45;
        assert!(haversine_distance(lat, lng, lat, east) < 50.0);
        assert!(east >= min_lng && east <= max_lng);
        assert!(bbox.lat.0 < lat && bbox.lat.1 > lat);
    }

    #[test]
    fn test_bounding_box_near_pole_drops_longitude() {
        let bbox = bounding_box(89.9, 10.0, 50.0);
        assert!(bbox.lng.is_none());
        assert_eq!(bbox.lat.1, 90.0);
    }
}
