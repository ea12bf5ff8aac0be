use serde::Deserialize;
use tracing::trace;

use crate::app::App;

/// One entry of the company autocomplete response
#[derive(Debug, Clone, Deserialize)]
pub struct CompanySuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Looks up a logo for `company` with the configured autocomplete service.
pub async fn lookup(app: &App, company: &str) -> Result<Option<String>, reqwest::Error> {
    trace!("Looking up logo for {}", company);

    let suggestions: Vec<CompanySuggestion> = app
        .http
        .get(&app.config.logo.url)
        .query(&[("query", company)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(best_logo(&suggestions))
}

/// The top suggestion's logo, if it has one.
#[must_use]
pub fn best_logo(suggestions: &[CompanySuggestion]) -> Option<String> {
    suggestions
        .first()
        .and_then(|suggestion| suggestion.logo.clone())
        .filter(|logo| !logo.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_suggestion_wins() {
        let suggestions: Vec<CompanySuggestion> = serde_json::from_str(
            r#"[
                {"name": "Acme", "domain": "acme.com", "logo": "https://logo.clearbit.com/acme.com"},
                {"name": "Acme Labs", "domain": "acmelabs.io", "logo": "https://logo.clearbit.com/acmelabs.io"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            best_logo(&suggestions).as_deref(),
            Some("https://logo.clearbit.com/acme.com")
        );
    }

    #[test]
    fn test_no_suggestions_means_no_logo() {
        assert_eq!(best_logo(&[]), None);

        let blank: Vec<CompanySuggestion> =
            serde_json::from_str(r#"[{"name": "Acme", "domain": "acme.com", "logo": ""}]"#).unwrap();
        assert_eq!(best_logo(&blank), None);
    }
}
