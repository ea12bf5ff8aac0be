use sea_orm::DbErr;
use thiserror::Error;

use crate::{
    app::App, config::Config, database::setup_database, destinations::DestinationError,
    notifier::Notifier,
};

pub mod guild;
pub mod migrate;
pub mod scrape;
pub mod serve;
pub mod subscription;
pub mod version;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Destination(#[from] DestinationError),
}

/// Connects, migrates and wires the Discord notifier.
pub async fn build_app(config: Config) -> Result<App, CommandError> {
    let db = setup_database(&config).await?;
    let notifier = Notifier::discord(&config.discord.api_base_url, &config.discord_token)?;

    Ok(App::new(config, db, notifier)?)
}
