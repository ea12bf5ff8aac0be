use sea_orm_migration::{
    prelude::*,
    schema::{boolean, string, string_null, timestamp, timestamp_null, uuid},
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
                    .table(DeliveryReceipt::Table)
                    .if_not_exists()
                    .col(uuid(DeliveryReceipt::Id).primary_key())
                    .col(
                        timestamp(DeliveryReceipt::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp(DeliveryReceipt::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_null(DeliveryReceipt::DeletedAt))
                    .col(uuid(DeliveryReceipt::DestinationId).not_null())
                    .col(string(DeliveryReceipt::DestinationKind).not_null())
                    .col(uuid(DeliveryReceipt::JobId).not_null())
                    .col(string_null(DeliveryReceipt::MessageId))
                    .col(boolean(DeliveryReceipt::Error).not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-delivery_receipt-job_id")
                            .from(DeliveryReceipt::Table, DeliveryReceipt::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one receipt per (destination, job)
        manager
            .create_index(
                Index::create()
                    .name("idx-delivery_receipt-destination_id-job_id")
                    .table(DeliveryReceipt::Table)
                    .col(DeliveryReceipt::DestinationId)
                    .col(DeliveryReceipt::JobId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-delivery_receipt-job_id")
                    .table(DeliveryReceipt::Table)
                    .col(DeliveryReceipt::JobId)
                    .to_owned(),
            )
            .await?;

        create_updated_at_trigger(manager, "delivery_receipt").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_updated_at_trigger(manager, "delivery_receipt").await?;

        manager
            .drop_table(Table::drop().table(DeliveryReceipt::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeliveryReceipt {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    DestinationId,
    DestinationKind,
    JobId,
    MessageId,
    Error,
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
}
