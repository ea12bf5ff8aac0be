use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    database::models::job_type::JobType,
    duration::{parse_interval, DEFAULT_POLL_INTERVAL},
};

const DEFAULT_DATABASE_NAME: &str = "internly.db";

const SIMPLIFY_INTERNSHIPS_URL: &str = "https://raw.githubusercontent.com/SimplifyJobs/Summer2026-Internships/refs/heads/dev/.github/scripts/listings.json";
const SIMPLIFY_NEW_GRAD_URL: &str = "https://raw.githubusercontent.com/SimplifyJobs/New-Grad-Positions/refs/heads/dev/.github/scripts/listings.json";

static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("valid url pattern"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config_rs::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_has_sources"))]
pub struct Config {
    #[serde(alias = "discord_token")]
    #[validate(length(min = 1, message = "missing bot token"))]
    pub discord_token: String,
    /// Database file name, `.db` is appended when missing
    #[serde(default, alias = "db_name")]
    pub db_name: String,
    /// Scrape interval such as `2h`; empty means two hours
    #[serde(default, alias = "poll_time")]
    #[validate(custom(function = "validate_poll_time"))]
    pub poll_time: String,
    #[serde(default)]
    #[validate(nested)]
    pub sites: Vec<SiteConfig>,
    #[serde(default = "default_feeds")]
    #[validate(nested)]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub logo: LogoConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

impl Config {
    /// Database file name with the `.db` suffix applied.
    #[must_use]
    pub fn database_file(&self) -> String {
        let name = self.db_name.trim();
        if name.is_empty() {
            DEFAULT_DATABASE_NAME.to_string()
        } else if name.ends_with(".db") {
            name.to_string()
        } else {
            format!("{name}.db")
        }
    }

    /// Interval between scrape cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        parse_interval(&self.poll_time).unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

/// A page scraped with a single regular expression.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[validate(length(min = 1, message = "site name must not be empty"))]
    pub name: String,
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,
    #[validate(custom(function = "validate_pattern"))]
    pub regex_pattern: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// 1-based capture group indices, 0 selects the default
    #[serde(default)]
    pub company_group: usize,
    #[serde(default)]
    pub role_group: usize,
    #[serde(default)]
    pub location_group: usize,
    #[serde(default)]
    pub application_link_group: usize,
    /// 0 disables age parsing
    #[serde(default)]
    pub age_group: usize,
}

/// A JSON listing endpoint for one job type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    #[validate(length(min = 1, message = "feed name must not be empty"))]
    pub name: String,
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "Simplify.jobs".to_string(),
            url: SIMPLIFY_INTERNSHIPS_URL.to_string(),
            job_type: JobType::Intern,
        },
        FeedConfig {
            name: "Simplify.jobs".to_string(),
            url: SIMPLIFY_NEW_GRAD_URL.to_string(),
            job_type: JobType::NewGrad,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

const fn default_pool_size() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    /// Sources scraped in parallel (default: 5)
    #[serde(default = "default_scraper_workers")]
    pub workers: usize,
    /// Feed entries updated longer ago than this are skipped (default: 35)
    #[serde(default = "default_feed_lookback_days")]
    pub feed_lookback_days: i64,
    /// HTTP timeout for source requests in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            workers: default_scraper_workers(),
            feed_lookback_days: default_feed_lookback_days(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

const fn default_scraper_workers() -> usize {
    5
}

const fn default_feed_lookback_days() -> i64 {
    35
}

const fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionConfig {
    /// Pause between broadcast cycles in seconds (default: 10)
    #[serde(default = "default_distribution_interval")]
    pub interval_seconds: u64,
    /// Destinations processed in parallel per loop (default: 3)
    #[serde(default = "default_distribution_workers")]
    pub workers: usize,
    /// Pause after every delivered message in milliseconds (default: 500)
    #[serde(default = "default_pacing_millis")]
    pub pacing_millis: u64,
    /// Maximum jobs delivered to one destination per cycle (default: 250)
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u64,
    /// Jobs first seen longer ago than this are never delivered (default: 30)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_distribution_interval(),
            workers: default_distribution_workers(),
            pacing_millis: default_pacing_millis(),
            batch_limit: default_batch_limit(),
            lookback_days: default_lookback_days(),
        }
    }
}

const fn default_distribution_interval() -> u64 {
    10
}

const fn default_distribution_workers() -> usize {
    3
}

const fn default_pacing_millis() -> u64 {
    500
}

const fn default_batch_limit() -> u64 {
    250
}

const fn default_lookback_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoConfig {
    #[serde(default = "default_logo_enabled")]
    pub enabled: bool,
    #[serde(default = "default_logo_url")]
    pub url: String,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enabled: default_logo_enabled(),
            url: default_logo_url(),
        }
    }
}

const fn default_logo_enabled() -> bool {
    true
}

fn default_logo_url() -> String {
    "https://autocomplete.clearbit.com/v1/companies/suggest".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    #[serde(default = "default_discord_api")]
    pub api_base_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_discord_api(),
        }
    }
}

fn default_discord_api() -> String {
    "https://discord.com/api/v10".to_string()
}

fn validate_has_sources(config: &Config) -> Result<(), ValidationError> {
    if config.sites.is_empty() && config.feeds.is_empty() {
        return Err(ValidationError::new("no_sources")
            .with_message("at least one site or feed must be configured".into()));
    }
    Ok(())
}

fn validate_poll_time(poll_time: &str) -> Result<(), ValidationError> {
    parse_interval(poll_time).map(|_| ()).map_err(|e| {
        ValidationError::new("invalid_poll_time").with_message(e.to_string().into())
    })
}

fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if HTTP_URL.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_url").with_message("expected an http(s) URL".into()))
    }
}

fn validate_pattern(pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern).map(|_| ()).map_err(|e| {
        ValidationError::new("invalid_regex").with_message(e.to_string().into())
    })
}
