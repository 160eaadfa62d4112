use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Captain::Table)
                    .if_not_exists()
                    .col(uuid(Captain::Id).primary_key())
                    .col(string_len(Captain::Email, 255).not_null().unique_key())
                    .col(string_len(Captain::FirstName, 100).not_null())
                    .col(string_len_null(Captain::LastName, 100))
                    .col(string_len_null(Captain::SocketId, 64))
                    .col(
                        string_len(Captain::Status, 16)
                            .not_null()
                            .default("inactive"),
                    )
                    .col(string_len(Captain::VehicleColor, 50).not_null())
                    .col(string_len(Captain::VehiclePlate, 20).not_null())
                    .col(integer(Captain::VehicleCapacity).not_null())
                    .col(string_len(Captain::VehicleType, 16).not_null())
                    .col(double_null(Captain::LocationLtd))
                    .col(double_null(Captain::LocationLng))
                    .col(
                        timestamp_with_time_zone(Captain::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Bounding-box prefilter for radius matching
        manager
            .create_index(
                Index::create()
                    .name("idx_captain_location")
                    .table(Captain::Table)
                    .col(Captain::LocationLtd)
                    .col(Captain::LocationLng)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Captain::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Captain {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    SocketId,
    Status,
    VehicleColor,
    VehiclePlate,
    VehicleCapacity,
    VehicleType,
    LocationLtd,
    LocationLng,
    CreatedAt,
}
