pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_job;
mod m20251001_000002_create_destinations;
mod m20251001_000003_create_delivery_receipt;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_job::Migration),
            Box::new(m20251001_000002_create_destinations::Migration),
            Box::new(m20251001_000003_create_delivery_receipt::Migration),
        ]
    }
}

pub struct Migrator;

/// Keeps `updated_at` current on every row update that did not set it.
pub(crate) async fn create_updated_at_trigger(
    manager: &SchemaManager<'_>,
    table: &str,
) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            r"
            CREATE TRIGGER IF NOT EXISTS update_{table}_updated_at
                AFTER UPDATE ON {table}
                FOR EACH ROW
                WHEN NEW.updated_at = OLD.updated_at
            BEGIN
                UPDATE {table}
                SET updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
                WHERE id = NEW.id;
            END;
            "
        ))
        .await?;

    Ok(())
}

pub(crate) async fn drop_updated_at_trigger(
    manager: &SchemaManager<'_>,
    table: &str,
) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!("DROP TRIGGER IF EXISTS update_{table}_updated_at;"))
        .await?;

    Ok(())
}
