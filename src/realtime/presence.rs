//! Durable side of the connection registry: the last known connection id on
//! the rider/captain row, and captain location reports.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{captain, user};
use crate::error::{AppError, AppResult};
use crate::realtime::registry::{ActorKey, ActorKind, ConnectionId};

/// Record `connection` as the actor's last known connection.
pub async fn persist_binding(
    db: &DatabaseConnection,
    actor: ActorKey,
    connection: ConnectionId,
) -> AppResult<()> {
    let socket_id = Some(connection.to_string());

    let result = match actor.kind {
        ActorKind::Rider => {
            user::Entity::update_many()
                .set(user::ActiveModel {
                    socket_id: Set(socket_id),
                    ..Default::default()
                })
                .filter(user::Column::Id.eq(actor.id))
                .exec(db)
                .await?
        }
        ActorKind::Captain => {
            captain::Entity::update_many()
                .set(captain::ActiveModel {
                    socket_id: Set(socket_id),
                    ..Default::default()
                })
                .filter(captain::Column::Id.eq(actor.id))
                .exec(db)
                .await?
        }
    };

    if result.rows_affected == 0 {
        return Err(AppError::Validation(format!(
            "Unknown {:?} {}",
            actor.kind, actor.id
        )));
    }

    Ok(())
}

/// Clear the stored connection id, but only if it is still `connection`.
pub async fn clear_binding(
    db: &DatabaseConnection,
    actor: ActorKey,
    connection: ConnectionId,
) -> AppResult<()> {
    let socket_id = connection.to_string();

    match actor.kind {
        ActorKind::Rider => {
            user::Entity::update_many()
                .set(user::ActiveModel {
                    socket_id: Set(None),
                    ..Default::default()
                })
                .filter(user::Column::Id.eq(actor.id))
                .filter(user::Column::SocketId.eq(socket_id))
                .exec(db)
                .await?;
        }
        ActorKind::Captain => {
            captain::Entity::update_many()
                .set(captain::ActiveModel {
                    socket_id: Set(None),
                    ..Default::default()
                })
                .filter(captain::Column::Id.eq(actor.id))
                .filter(captain::Column::SocketId.eq(socket_id))
                .exec(db)
                .await?;
        }
    }

    Ok(())
}

pub async fn update_captain_location(
    db: &DatabaseConnection,
    captain_id: Uuid,
    ltd: f64,
    lng: f64,
) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&ltd) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation("Invalid location data".to_string()));
    }

    let result = captain::Entity::update_many()
        .set(captain::ActiveModel {
            location_ltd: Set(Some(ltd)),
            location_lng: Set(Some(lng)),
            ..Default::default()
        })
        .filter(captain::Column::Id.eq(captain_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Validation("Captain not found".to_string()));
    }

    Ok(())
}
