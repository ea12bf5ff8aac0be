use std::cmp;

use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::{
    cli::MigrateAction,
    config::Config,
    database::{database_url, migrations::Migrator, setup_database_connection},
};

pub async fn handle_migrate_command(config: &Config, action: MigrateAction) -> Result<(), DbErr> {
    // Plain connection, migrations are applied explicitly below
    let db = setup_database_connection(&database_url(config), 1).await?;
    run_migration_action(&db, action).await
}

pub async fn run_migration_action(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), DbErr> {
    match action {
        MigrateAction::Up { steps } => {
            let pending = Migrator::get_pending_migrations(db).await?;

            if pending.is_empty() {
                println!("✅ All migrations are already up to date");
                return Ok(());
            }

            let count = steps.map_or(pending.len(), |steps| {
                cmp::min(steps as usize, pending.len())
            });
            println!("Running {count} migration(s) up:");
            for migration in &pending[..count] {
                println!("  📄 {}", migration.name());
            }

            Migrator::up(db, steps).await?;
            println!("✅ Migrations completed successfully");
        }
        MigrateAction::Down { steps } => {
            let applied = Migrator::get_applied_migrations(db).await?;

            if applied.is_empty() {
                println!("❌ No migrations to roll back");
                return Ok(());
            }

            let count = cmp::min(steps as usize, applied.len());
            println!("Rolling back {count} migration(s):");
            for migration in applied[applied.len() - count..].iter().rev() {
                println!("  📄 {}", migration.name());
            }

            Migrator::down(db, Some(steps)).await?;
            println!("✅ Rollback completed successfully");
        }
        MigrateAction::Status => {
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;

            println!("📋 Applied migrations:");
            for migration in &applied {
                println!("  ✓ {}", migration.name());
            }

            if pending.is_empty() {
                println!("✅ All migrations are up to date");
            } else {
                println!("📋 Pending migrations:");
                for migration in &pending {
                    println!("  - {}", migration.name());
                }
            }
        }
        MigrateAction::Fresh => {
            println!("🔄 Dropping every table and migrating up (this will drop all data!)");
            Migrator::fresh(db).await?;
            println!("✅ Database recreated successfully");
        }
    }

    Ok(())
}
