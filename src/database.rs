use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::config::Config;

pub mod migrations;
pub mod models;
pub mod unique_constraint;

/// `SQLite` connection URL for the configured database file, created on demand.
#[must_use]
pub fn database_url(config: &Config) -> String {
    format!("sqlite://{}?mode=rwc", config.database_file())
}

/// Connects and brings the schema up to date before anything touches it.
pub async fn setup_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let db = setup_database_connection(&database_url(config), config.database.pool_size).await?;

    migrations::Migrator::up(&db, None).await?;
    debug!("Database migrations are up to date");

    Ok(db)
}

pub async fn setup_database_connection(
    url: &str,
    pool_size: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());

    options.sqlx_logging(false); // Disable SQL query logging to reduce noise
    options.max_connections(pool_size.max(1));

    debug!("Connecting to database at: {}", url);

    sea_orm::Database::connect(options).await
}
