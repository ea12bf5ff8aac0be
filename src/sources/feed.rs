use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::{fetch_text, store_all, ScrapeError};
use crate::{
    app::App,
    config::FeedConfig,
    database::models::{job, job_type::JobType},
    ingest::NewJob,
};

/// One posting in a `listings.json` feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub company_name: String,
    #[serde(default)]
    pub locations: Vec<String>,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date_posted: i64,
    pub date_updated: i64,
}

/// A JSON listing endpoint serving postings of one job type.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub job_type: JobType,
    lookback: Duration,
}

impl FeedSource {
    #[must_use]
    pub fn new(feed: &FeedConfig, lookback_days: i64) -> Self {
        Self {
            name: feed.name.clone(),
            url: feed.url.clone(),
            job_type: feed.job_type,
            lookback: Duration::days(lookback_days),
        }
    }

    pub async fn scrape(&self, app: &App) -> Result<Vec<job::Model>, ScrapeError> {
        info!("🔎 Starting scrape: {}", self.url);

        let body = fetch_text(app, &self.url).await?;
        let candidates = self.extract(&body, Utc::now().naive_utc())?;
        let stored = store_all(app, &self.name, candidates).await;

        info!(
            "🔎 Finished scrape: {} ({} new job(s))",
            self.url,
            stored.len()
        );
        Ok(stored)
    }

    /// Decodes a feed body, keeping entries updated within the lookback window.
    pub fn extract(&self, body: &str, now: NaiveDateTime) -> Result<Vec<NewJob>, ScrapeError> {
        let entries: Vec<FeedEntry> =
            serde_json::from_str(body).map_err(|e| ScrapeError::Parse {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let cutoff = now - self.lookback;
        let total = entries.len();

        let candidates: Vec<NewJob> = entries
            .into_iter()
            .filter_map(|entry| {
                let updated = DateTime::<Utc>::from_timestamp(entry.date_updated, 0)?.naive_utc();
                (updated >= cutoff).then(|| NewJob {
                    source_name: self.name.clone(),
                    source_url: self.url.clone(),
                    job_type: self.job_type,
                    company: entry.company_name,
                    role: entry.title,
                    location: entry.locations.join(", "),
                    application_link: entry.url,
                    first_seen: updated,
                })
            })
            .collect();

        debug!(
            "{} of {} feed entries from {} are recent enough",
            candidates.len(),
            total,
            self.url
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FeedSource {
        FeedSource::new(
            &FeedConfig {
                name: "Simplify.jobs".to_string(),
                url: "https://example.com/listings.json".to_string(),
                job_type: JobType::NewGrad,
            },
            35,
        )
    }

    fn entry(url: &str, updated: NaiveDateTime) -> serde_json::Value {
        serde_json::json!({
            "company_name": "Acme",
            "locations": ["NYC", "Remote"],
            "title": "Software Engineer",
            "url": url,
            "date_posted": updated.and_utc().timestamp() - 3600,
            "date_updated": updated.and_utc().timestamp(),
            "active": true
        })
    }

    #[test]
    fn test_recent_entries_are_normalized() {
        let now = DateTime::<Utc>::from_timestamp(1_760_000_000, 0)
            .unwrap()
            .naive_utc();
        let updated = now - Duration::days(2);
        let body = serde_json::json!([entry("https://acme.example/1", updated)]).to_string();

        let jobs = source().extract(&body, now).unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Acme");
        assert_eq!(jobs[0].role, "Software Engineer");
        assert_eq!(jobs[0].location, "NYC, Remote");
        assert_eq!(jobs[0].job_type, JobType::NewGrad);
        assert_eq!(jobs[0].first_seen, updated);
        assert_eq!(jobs[0].source_name, "Simplify.jobs");
    }

    #[test]
    fn test_entries_past_cutoff_are_dropped() {
        let now = DateTime::<Utc>::from_timestamp(1_760_000_000, 0)
            .unwrap()
            .naive_utc();
        let body = serde_json::json!([
            entry("https://acme.example/old", now - Duration::days(36)),
            entry("https://acme.example/edge", now - Duration::days(35)),
            entry("https://acme.example/new", now - Duration::days(1)),
        ])
        .to_string();

        let links: Vec<String> = source()
            .extract(&body, now)
            .unwrap()
            .into_iter()
            .map(|job| job.application_link)
            .collect();

        assert_eq!(
            links,
            vec![
                "https://acme.example/edge".to_string(),
                "https://acme.example/new".to_string()
            ]
        );
    }

    #[test]
    fn test_undecodable_body_is_a_parse_error() {
        let result = source().extract("<html>rate limited</html>", Utc::now().naive_utc());
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }
}
