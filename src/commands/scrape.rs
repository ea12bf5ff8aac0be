use super::{build_app, CommandError};
use crate::{config::Config, schedulers::scrape::scrape_cycle, sources::Source};

/// Runs a single scrape cycle and reports how many jobs were new.
pub async fn handle_scrape_command(config: Config) -> Result<(), CommandError> {
    let sources = Source::from_config(&config)?;
    let app = build_app(config).await?;

    let stored = scrape_cycle(&app, &sources).await;
    println!("✅ Scraped {} source(s), {stored} new job(s)", sources.len());

    Ok(())
}
