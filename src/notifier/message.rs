use chrono::NaiveDateTime;
use serde::Serialize;

use crate::database::models::job;

pub const EMBED_COLOR: u32 = 0x0015_2949;

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const LINK_BUTTON_STYLE: u8 = 5;

/// Discord message payload announcing one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobMessage {
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    pub fields: Vec<EmbedField>,
    pub description: String,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    pub url: String,
}

impl JobMessage {
    #[must_use]
    pub fn from_job(job: &job::Model) -> Self {
        let thumbnail = job
            .logo_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| EmbedThumbnail { url: url.clone() });

        Self {
            embeds: vec![Embed {
                title: job.company.clone(),
                url: job.application_link.clone(),
                color: EMBED_COLOR,
                thumbnail,
                fields: vec![
                    EmbedField {
                        name: "Role".to_string(),
                        value: job.role.clone(),
                    },
                    EmbedField {
                        name: "Location".to_string(),
                        value: job.location.clone(),
                    },
                ],
                description: format!("First Seen: {}", relative_timestamp(job.first_seen)),
                footer: EmbedFooter {
                    text: format!("Source: {}", job.source_name),
                },
            }],
            components: vec![ActionRow {
                kind: ACTION_ROW,
                components: vec![Button {
                    kind: BUTTON,
                    style: LINK_BUTTON_STYLE,
                    label: "Apply".to_string(),
                    url: job.application_link.clone(),
                }],
            }],
        }
    }

    /// Company named in the embed title
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.embeds.first().map(|embed| embed.title.as_str())
    }
}

/// Discord timestamp markup rendered relative to the reader's clock
fn relative_timestamp(at: NaiveDateTime) -> String {
    format!("<t:{}:R>", at.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use sea_orm::prelude::Uuid;

    use super::*;
    use crate::database::models::job_type::JobType;

    fn job(logo_url: Option<&str>) -> job::Model {
        let first_seen = DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
            .unwrap()
            .naive_utc();
        job::Model {
            id: Uuid::new_v4(),
            created_at: first_seen,
            updated_at: first_seen,
            deleted_at: None,
            source_name: "Simplify.jobs".to_string(),
            source_url: "https://example.com/listings.json".to_string(),
            job_type: JobType::Intern,
            company: "Acme".to_string(),
            logo_url: logo_url.map(ToString::to_string),
            role: "Software Intern".to_string(),
            location: "Remote".to_string(),
            application_link: "https://acme.example/apply".to_string(),
            first_seen,
        }
    }

    #[test]
    fn test_message_layout() {
        let message = JobMessage::from_job(&job(Some("https://logo.example/acme.png")));
        let value = serde_json::to_value(&message).unwrap();

        let embed = &value["embeds"][0];
        assert_eq!(embed["title"], "Acme");
        assert_eq!(embed["url"], "https://acme.example/apply");
        assert_eq!(embed["color"], 0x15_2949);
        assert_eq!(embed["thumbnail"]["url"], "https://logo.example/acme.png");
        assert_eq!(embed["fields"][0]["name"], "Role");
        assert_eq!(embed["fields"][0]["value"], "Software Intern");
        assert_eq!(embed["fields"][1]["name"], "Location");
        assert_eq!(embed["description"], "First Seen: <t:1700000000:R>");
        assert_eq!(embed["footer"]["text"], "Source: Simplify.jobs");

        let button = &value["components"][0]["components"][0];
        assert_eq!(value["components"][0]["type"], 1);
        assert_eq!(button["type"], 2);
        assert_eq!(button["style"], 5);
        assert_eq!(button["label"], "Apply");
        assert_eq!(button["url"], "https://acme.example/apply");
    }

    #[test]
    fn test_missing_logo_omits_thumbnail() {
        let value = serde_json::to_value(JobMessage::from_job(&job(None))).unwrap();
        assert!(value["embeds"][0].get("thumbnail").is_none());
        assert_eq!(JobMessage::from_job(&job(None)).title(), Some("Acme"));
    }
}
