use std::sync::LazyLock;

use chrono::{NaiveDateTime, Utc};
use regex::{Captures, Regex};
use tracing::{info, warn};

use super::{fetch_text, store_all, ScrapeError};
use crate::{
    app::App,
    config::SiteConfig,
    database::models::{job, job_type::JobType},
    duration::parse_age,
    ingest::NewJob,
};

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid markup pattern"));

/// 1-based capture group indices for each job field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGroups {
    pub company: usize,
    pub role: usize,
    pub location: usize,
    pub application_link: usize,
    pub age: Option<usize>,
}

impl Default for CaptureGroups {
    fn default() -> Self {
        Self {
            company: 1,
            role: 2,
            location: 3,
            application_link: 4,
            age: None,
        }
    }
}

impl CaptureGroups {
    #[must_use]
    pub fn from_site(site: &SiteConfig) -> Self {
        let defaults = Self::default();
        let or_default = |configured: usize, default: usize| {
            if configured == 0 {
                default
            } else {
                configured
            }
        };

        Self {
            company: or_default(site.company_group, defaults.company),
            role: or_default(site.role_group, defaults.role),
            location: or_default(site.location_group, defaults.location),
            application_link: or_default(
                site.application_link_group,
                defaults.application_link,
            ),
            age: (site.age_group > 0).then_some(site.age_group),
        }
    }
}

/// A site whose listing page is parsed with one regular expression.
#[derive(Debug, Clone)]
pub struct PatternSource {
    pub name: String,
    pub url: String,
    pub job_type: JobType,
    pattern: Regex,
    groups: CaptureGroups,
}

/// Fields captured from one match before the company is resolved
struct RawMatch {
    company: String,
    role: String,
    location: String,
    application_link: String,
    first_seen: NaiveDateTime,
}

impl PatternSource {
    pub fn new(site: &SiteConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            name: site.name.clone(),
            url: site.url.clone(),
            job_type: site.job_type,
            pattern: Regex::new(&site.regex_pattern)?,
            groups: CaptureGroups::from_site(site),
        })
    }

    pub async fn scrape(&self, app: &App) -> Result<Vec<job::Model>, ScrapeError> {
        info!("🔎 Starting scrape: {}", self.url);

        let body = fetch_text(app, &self.url).await?;
        let candidates = self.extract(&body, Utc::now().naive_utc());
        let stored = store_all(app, &self.name, candidates).await;

        info!(
            "🔎 Finished scrape: {} ({} new job(s))",
            self.url,
            stored.len()
        );
        Ok(stored)
    }

    /// Turns a fetched page into job candidates, last match on the page first.
    ///
    /// Matches are walked in reverse document order. A match without a company
    /// takes the next company found further along that walk, or failing that the
    /// nearest one already resolved.
    #[must_use]
    pub fn extract(&self, body: &str, now: NaiveDateTime) -> Vec<NewJob> {
        let mut matches: Vec<RawMatch> = self
            .pattern
            .captures_iter(body)
            .filter_map(|captures| self.read_match(&captures, now))
            .collect();
        matches.reverse();

        let mut candidates = Vec::with_capacity(matches.len());
        let mut previous_company: Option<String> = None;

        for (index, raw) in matches.iter().enumerate() {
            let company = if raw.company.is_empty() {
                matches[index + 1..]
                    .iter()
                    .map(|later| later.company.as_str())
                    .find(|company| !company.is_empty())
                    .map(ToString::to_string)
                    .or_else(|| previous_company.clone())
            } else {
                Some(raw.company.clone())
            };

            let Some(company) = company else {
                warn!(
                    "No company found for {} on {}, skipping",
                    raw.application_link, self.url
                );
                continue;
            };
            previous_company = Some(company.clone());

            candidates.push(NewJob {
                source_name: self.name.clone(),
                source_url: self.url.clone(),
                job_type: self.job_type,
                company,
                role: raw.role.clone(),
                location: raw.location.clone(),
                application_link: raw.application_link.clone(),
                first_seen: raw.first_seen,
            });
        }

        candidates
    }

    fn read_match(&self, captures: &Captures<'_>, now: NaiveDateTime) -> Option<RawMatch> {
        let group = |index: usize, field: &str| {
            let value = captures.get(index).map(|m| m.as_str().to_string());
            if value.is_none() {
                let error = ScrapeError::Parse {
                    url: self.url.clone(),
                    reason: format!("capture group {index} ({field}) did not match"),
                };
                warn!("{}", error);
            }
            value
        };

        let role = group(self.groups.role, "role")?;
        let location = group(self.groups.location, "location")?;
        let application_link = group(self.groups.application_link, "application link")?;
        let company = captures
            .get(self.groups.company)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let first_seen = self
            .groups
            .age
            .and_then(|index| captures.get(index))
            .map_or(now, |age| match parse_age(age.as_str()) {
                Ok(age) => now.checked_sub_signed(age).unwrap_or_else(|| {
                    warn!("Age {:?} on {} is out of range", age, self.url);
                    now
                }),
                Err(e) => {
                    warn!("Unreadable age on {}: {}", self.url, e);
                    now
                }
            });

        Some(RawMatch {
            company,
            role,
            location: clean_location(&location),
            application_link,
            first_seen,
        })
    }
}

/// Strips markup and emphasis markers from a captured location.
#[must_use]
pub fn clean_location(raw: &str) -> String {
    MARKUP.replace_all(raw, " ").replace('*', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn site(pattern: &str) -> SiteConfig {
        SiteConfig {
            name: "Board".to_string(),
            url: "https://example.com/jobs".to_string(),
            regex_pattern: pattern.to_string(),
            job_type: JobType::Intern,
            company_group: 0,
            role_group: 0,
            location_group: 0,
            application_link_group: 0,
            age_group: 0,
        }
    }

    const ROW: &str = r"<tr><td>(.*?)</td><td>(.*?)</td><td>(.*?)</td><td><a href='(.*?)'>";

    fn row(company: &str, role: &str, location: &str, link: &str) -> String {
        format!("<tr><td>{company}</td><td>{role}</td><td>{location}</td><td><a href='{link}'>")
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    #[test]
    fn test_extract_defaults_and_reverse_order() {
        let source = PatternSource::new(&site(ROW)).unwrap();
        let body = [
            row("Acme", "Intern A", "NYC", "https://a.example/1"),
            row("Globex", "Intern B", "SF", "https://b.example/2"),
        ]
        .concat();

        let jobs = source.extract(&body, now());

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].company, "Globex");
        assert_eq!(jobs[0].application_link, "https://b.example/2");
        assert_eq!(jobs[1].company, "Acme");
        assert_eq!(jobs[1].source_name, "Board");
        assert_eq!(jobs[1].job_type, JobType::Intern);
    }

    #[test]
    fn test_empty_company_takes_following_row_company() {
        let source = PatternSource::new(&site(ROW)).unwrap();
        let body = [
            row("", "R1", "NYC", "https://a.example/1"),
            row("Acme", "R2", "SF", "https://a.example/2"),
        ]
        .concat();

        let jobs = source.extract(&body, now());

        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|job| job.company == "Acme"));
    }

    #[test]
    fn test_empty_company_scans_forward_in_processing_order() {
        let source = PatternSource::new(&site(ROW)).unwrap();
        let body = [
            row("Initech", "R1", "NYC", "https://a.example/1"),
            row("Acme", "R2", "SF", "https://a.example/2"),
            row("", "R3", "SF", "https://a.example/3"),
        ]
        .concat();

        let jobs = source.extract(&body, now());

        assert_eq!(jobs[0].role, "R3");
        assert_eq!(jobs[0].company, "Acme");
    }

    #[test]
    fn test_page_without_any_company_yields_nothing() {
        let source = PatternSource::new(&site(ROW)).unwrap();
        let body = row("", "R1", "NYC", "https://a.example/1");

        assert!(source.extract(&body, now()).is_empty());
    }

    #[test]
    fn test_location_markup_is_cleaned() {
        assert_eq!(clean_location("<b>**NYC**</b><br>"), "NYC");
        assert_eq!(
            clean_location("Austin, TX</br>Remote"),
            "Austin, TX Remote"
        );
    }

    #[test]
    fn test_custom_groups_and_age() {
        let mut config = site(
            r"<li data-link='(.*?)'><span>(.*?)</span><em>(.*?)</em><i>(.*?)</i><time>(.*?)</time></li>",
        );
        config.application_link_group = 1;
        config.company_group = 2;
        config.role_group = 3;
        config.location_group = 4;
        config.age_group = 5;
        let source = PatternSource::new(&config).unwrap();
        let now = now();

        let body = "<li data-link='https://a.example/1'><span>Acme</span><em>Intern</em><i>Remote</i><time>3d</time></li>\
                    <li data-link='https://a.example/2'><span>Globex</span><em>Intern</em><i>NYC</i><time>soon</time></li>";
        let jobs = source.extract(body, now);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].company, "Globex");
        assert_eq!(jobs[0].first_seen, now);
        assert_eq!(jobs[1].company, "Acme");
        assert_eq!(jobs[1].first_seen, now - Duration::days(3));
    }

    #[test]
    fn test_out_of_range_age_defaults_to_now() {
        let mut config = site(r"<p>([^|]*)\|([^|]+)\|([^|]+)\|([^|]+)\|([^<]+)</p>");
        config.age_group = 5;
        let source = PatternSource::new(&config).unwrap();
        let now = now();

        let body = "<p>Acme|Intern|NYC|https://a.example/1|300000y</p>\
                    <p>Globex|Intern|SF|https://a.example/2|99999999999999999999999999y</p>";
        let jobs = source.extract(body, now);

        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|job| job.first_seen == now));
    }

    #[test]
    fn test_missing_group_drops_candidate() {
        let source =
            PatternSource::new(&site(r"<p>(\w+)\|(\w+)\|(\w+)(?:\|([^<]+))?</p>")).unwrap();
        let body = "<p>Acme|Intern|NYC|https://a.example/1</p><p>Acme|Intern|SF</p>";

        let jobs = source.extract(body, now());

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].location, "NYC");
    }
}
