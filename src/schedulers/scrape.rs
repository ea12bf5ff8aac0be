use std::sync::Arc;

use tokio::time::sleep;
use tracing::{error, info};

use crate::{app::App, duration::poll_period, sources::Source, task_pool::TaskPool};

/// Scrapes every source, then waits for the poll interval, forever.
pub async fn run_scrape_loop(app: App, sources: Arc<Vec<Source>>) {
    let interval = poll_period(app.config.poll_interval());

    info!(
        "📅 Scrape scheduler started with {} source(s), every {:?}",
        sources.len(),
        interval
    );

    loop {
        scrape_cycle(&app, &sources).await;
        sleep(interval).await;
    }
}

/// Runs every source once on a bounded pool and returns how many jobs were new.
pub async fn scrape_cycle(app: &App, sources: &[Source]) -> usize {
    let pool = TaskPool::new("scrape", app.config.scraper.workers);

    let stored: usize = pool
        .run(sources.to_vec(), |source| {
            let app = app.clone();
            async move {
                match source.scrape(&app).await {
                    Ok(jobs) => jobs.len(),
                    Err(e) => {
                        error!(
                            "❌ Scrape of {} ({}) failed: {}",
                            source.name(),
                            source.url(),
                            e
                        );
                        0
                    }
                }
            }
        })
        .await
        .into_iter()
        .sum();

    info!("📅 Scrape cycle finished, {} new job(s)", stored);
    stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::setup_test::setup_test;

    #[tokio::test]
    async fn test_unreachable_source_does_not_abort_cycle() {
        let test = setup_test().await;
        let mut config = test.app.config.clone();
        config.feeds = vec![serde_json::from_value(serde_json::json!({
            "name": "Nowhere",
            "url": "http://127.0.0.1:9/listings.json",
            "type": "INTERN"
        }))
        .unwrap()];
        let sources = Source::from_config(&config).unwrap();

        assert_eq!(scrape_cycle(&test.app, &sources).await, 0);
    }
}
