use tokio::signal;
use tracing::{error, info};

use super::{build_app, CommandError};
use crate::{config::Config, schedulers::start_schedulers, sources::Source};

/// Runs the three schedulers until Ctrl-C.
pub async fn handle_serve_command(config: Config) -> Result<(), CommandError> {
    let sources = Source::from_config(&config)?;
    let app = build_app(config).await?;

    info!("✅ Database is ready!");
    info!("🔎 {} source(s) configured", sources.len());

    let mut schedulers = start_schedulers(&app, sources);

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                error!("❌ Failed to listen for shutdown signal: {}", e);
            }
            info!("👋 Shutting down");
        }
        Some(result) = schedulers.join_next() => {
            if let Err(e) = result {
                error!("❌ Scheduler stopped unexpectedly: {}", e);
            }
        }
    }

    schedulers.shutdown().await;
    Ok(())
}
