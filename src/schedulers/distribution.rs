use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::{
    app::App,
    distribution::{guild::broadcast_cycle, subscription::delivery_cycle},
};

fn cycle_pause(app: &App) -> Duration {
    Duration::from_secs(app.config.distribution.interval_seconds)
}

/// Broadcasts to guild channels every few seconds, forever.
pub async fn run_guild_loop(app: App) {
    info!("📅 Guild broadcast scheduler started");

    loop {
        sleep(cycle_pause(&app)).await;

        match broadcast_cycle(&app).await {
            Ok(reports) => debug!("📣 Broadcast cycle covered {} guild(s)", reports.len()),
            Err(e) => error!("❌ Failed to list guilds: {}", e),
        }
    }
}

/// Delivers to subscribers every few seconds, forever.
pub async fn run_subscription_loop(app: App) {
    info!("📅 Subscription scheduler started");

    loop {
        sleep(cycle_pause(&app)).await;

        match delivery_cycle(&app).await {
            Ok(reports) => debug!(
                "📨 Delivery cycle covered {} subscription(s)",
                reports.len()
            ),
            Err(e) => error!("❌ Failed to list subscriptions: {}", e),
        }
    }
}
