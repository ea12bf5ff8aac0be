use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::info;

use crate::{app::App, sources::Source};

pub mod distribution;
pub mod scrape;

/// Spawns the scrape, guild broadcast and subscription loops.
///
/// The loops never return; a finished task means one of them panicked.
pub fn start_schedulers(app: &App, sources: Vec<Source>) -> JoinSet<()> {
    info!("🚀 Starting schedulers");

    let mut tasks = JoinSet::new();
    tasks.spawn(scrape::run_scrape_loop(app.clone(), Arc::new(sources)));
    tasks.spawn(distribution::run_guild_loop(app.clone()));
    tasks.spawn(distribution::run_subscription_loop(app.clone()));
    tasks
}
