use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;
use super::m20250301_000002_create_captains::Captain;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    .col(uuid(Ride::UserId).not_null())
                    .col(uuid_null(Ride::CaptainId))
                    .col(string(Ride::Pickup).not_null())
                    .col(string(Ride::Destination).not_null())
                    .col(string_len(Ride::VehicleType, 16).not_null())
                    .col(double(Ride::DistanceKm).not_null())
                    .col(double(Ride::DurationMin).not_null())
                    .col(integer(Ride::Fare).not_null())
                    .col(string_len(Ride::Otp, 4).not_null())
                    .col(
                        string_len(Ride::Status, 16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_user")
                            .from(Ride::Table, Ride::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_captain")
                            .from(Ride::Table, Ride::CaptainId)
                            .to(Captain::Table, Captain::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    UserId,
    CaptainId,
    Pickup,
    Destination,
    VehicleType,
    DistanceKm,
    DurationMin,
    Fare,
    Otp,
    Status,
    CreatedAt,
}
