use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{config::Config, database::models::job, notifier::Notifier};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Capacity of the stored-job event channel before slow receivers lag
const JOB_EVENT_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub db: DatabaseConnection,
    pub notifier: Notifier,
    /// Client used for scraping and logo lookups
    pub http: reqwest::Client,
    job_events: broadcast::Sender<job::Model>,
}

impl App {
    pub fn new(
        config: Config,
        db: DatabaseConnection,
        notifier: Notifier,
    ) -> Result<Self, reqwest::Error> {
        let http = scraper_http_client(&config)?;
        let (job_events, _) = broadcast::channel(JOB_EVENT_CAPACITY);

        Ok(Self {
            config,
            db,
            notifier,
            http,
            job_events,
        })
    }

    /// Receives every job stored from now on.
    #[must_use]
    pub fn subscribe_to_jobs(&self) -> broadcast::Receiver<job::Model> {
        self.job_events.subscribe()
    }

    pub(crate) fn publish_job(&self, job: &job::Model) {
        // No receivers is fine, distribution polls the store
        let _ = self.job_events.send(job.clone());
    }
}

fn scraper_http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.8,*/*;q=0.7",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.scraper.request_timeout_seconds))
        .build()
}
