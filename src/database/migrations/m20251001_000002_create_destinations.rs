use sea_orm_migration::{
    prelude::*,
    schema::{json, string, string_null, string_uniq, timestamp, timestamp_null, uuid},
};

use super::{create_updated_at_trigger, drop_updated_at_trigger};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guild::Table)
                    .if_not_exists()
                    .col(uuid(Guild::Id).primary_key())
                    .col(
                        timestamp(Guild::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp(Guild::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_null(Guild::DeletedAt))
                    .col(string_uniq(Guild::GuildId).not_null())
                    .col(string_null(Guild::InternChannelId))
                    .col(string_null(Guild::NewGradChannelId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscription::Table)
                    .if_not_exists()
                    .col(uuid(Subscription::Id).primary_key())
                    .col(
                        timestamp(Subscription::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp(Subscription::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_null(Subscription::DeletedAt))
                    .col(string(Subscription::UserId).not_null())
                    .col(string(Subscription::JobType).not_null())
                    .col(json(Subscription::Locations).not_null())
                    .col(json(Subscription::Companies).not_null())
                    .col(json(Subscription::Roles).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscription-user_id")
                    .table(Subscription::Table)
                    .col(Subscription::UserId)
                    .to_owned(),
            )
            .await?;

        create_updated_at_trigger(manager, "guild").await?;
        create_updated_at_trigger(manager, "subscription").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_updated_at_trigger(manager, "subscription").await?;
        drop_updated_at_trigger(manager, "guild").await?;

        manager
            .drop_table(Table::drop().table(Subscription::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Guild::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Guild {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    GuildId,
    InternChannelId,
    NewGradChannelId,
}

#[derive(DeriveIden)]
enum Subscription {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    UserId,
    JobType,
    Locations,
    Companies,
    Roles,
}
