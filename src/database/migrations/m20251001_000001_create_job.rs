use sea_orm_migration::{
    prelude::*,
    schema::{string, string_null, string_uniq, timestamp, timestamp_null, uuid},
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
                    .table(Job::Table)
                    .if_not_exists()
                    .col(uuid(Job::Id).primary_key())
                    .col(
                        timestamp(Job::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp(Job::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_null(Job::DeletedAt))
                    .col(string(Job::SourceName).not_null())
                    .col(string(Job::SourceUrl).not_null())
                    .col(string(Job::JobType).not_null())
                    .col(string(Job::Company).not_null())
                    .col(string_null(Job::LogoUrl))
                    .col(string(Job::Role).not_null())
                    .col(string(Job::Location).not_null())
                    // Re-scrapes of the same posting collide here
                    .col(string_uniq(Job::ApplicationLink).not_null())
                    .col(timestamp(Job::FirstSeen).not_null())
                    .to_owned(),
            )
            .await?;

        // Backlog queries filter by type and walk first_seen ascending
        manager
            .create_index(
                Index::create()
                    .name("idx-job-job_type-first_seen")
                    .table(Job::Table)
                    .col(Job::JobType)
                    .col(Job::FirstSeen)
                    .to_owned(),
            )
            .await?;

        create_updated_at_trigger(manager, "job").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_updated_at_trigger(manager, "job").await?;

        manager
            .drop_table(Table::drop().table(Job::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    SourceName,
    SourceUrl,
    JobType,
    Company,
    LogoUrl,
    Role,
    Location,
    ApplicationLink,
    FirstSeen,
}
