use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::captain;
use crate::error::AppResult;
use crate::services::geocoding::Coordinates;
use crate::utils::geo::{bounding_box, is_within_radius};

/// Captains whose last known location lies within `radius_km` great-circle
/// kilometres of `center`.
///
/// The database narrows candidates to the enclosing lat/lng box; the exact
/// spherical test runs here. Status and location age are not considered.
pub async fn captains_within_radius(
    db: &DatabaseConnection,
    center: Coordinates,
    radius_km: f64,
) -> AppResult<Vec<captain::Model>> {
    let bbox = bounding_box(center.lat, center.lng, radius_km);

    let mut condition = Condition::all()
        .add(captain::Column::LocationLtd.is_not_null())
        .add(captain::Column::LocationLng.is_not_null())
        .add(captain::Column::LocationLtd.between(bbox.lat.0, bbox.lat.1));

    if let Some((min_lng, max_lng)) = bbox.lng {
        condition = condition.add(captain::Column::LocationLng.between(min_lng, max_lng));
    }

    let candidates = captain::Entity::find()
        .filter(condition)
        .all(db)
        .await?;

    let matched = candidates
        .into_iter()
        .filter(|c| match (c.location_ltd, c.location_lng) {
            (Some(ltd), Some(lng)) => is_within_radius(ltd, lng, center.lat, center.lng, radius_km),
            _ => false,
        })
        .collect();

    Ok(matched)
}
