use thiserror::Error;
use tracing::warn;

use crate::{app::App, config::Config, database::models::job, ingest};

pub mod feed;
pub mod pattern;

use feed::FeedSource;
use pattern::PatternSource;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} responded with status {status}")]
    Fetch { url: String, status: u16 },
    #[error("Failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// An external origin of job postings.
#[derive(Debug, Clone)]
pub enum Source {
    Pattern(PatternSource),
    Feed(FeedSource),
}

impl Source {
    /// Builds every configured source, sites first.
    pub fn from_config(config: &Config) -> Result<Vec<Self>, regex::Error> {
        let sites = config
            .sites
            .iter()
            .map(|site| PatternSource::new(site).map(Self::Pattern));
        let feeds = config.feeds.iter().map(|feed| {
            Ok(Self::Feed(FeedSource::new(
                feed,
                config.scraper.feed_lookback_days,
            )))
        });

        sites.chain(feeds).collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Pattern(source) => &source.name,
            Self::Feed(source) => &source.name,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Pattern(source) => &source.url,
            Self::Feed(source) => &source.url,
        }
    }

    /// Fetches the source and stores its postings, returning the new ones.
    pub async fn scrape(&self, app: &App) -> Result<Vec<job::Model>, ScrapeError> {
        match self {
            Self::Pattern(source) => source.scrape(app).await,
            Self::Feed(source) => source.scrape(app).await,
        }
    }
}

async fn fetch_text(app: &App, url: &str) -> Result<String, ScrapeError> {
    let response = app.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}

/// Hands candidates to the store one at a time, keeping what was newly stored.
async fn store_all(
    app: &App,
    source_name: &str,
    candidates: impl IntoIterator<Item = ingest::NewJob>,
) -> Vec<job::Model> {
    let mut stored = Vec::new();

    for candidate in candidates {
        let link = candidate.application_link.clone();
        match ingest::persist(app, candidate).await {
            Ok(Some(job)) => stored.push(job),
            Ok(None) => {}
            Err(e) => warn!("{}: skipping {}: {}", source_name, link, e),
        }
    }

    stored
}
