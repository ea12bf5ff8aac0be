//! `SeaORM` Entity for per-user subscriptions

use crate::database::models::job_type::JobType;
use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

/// Substring terms of one filter group, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct FilterTerms(pub Vec<String>);

impl FilterTerms {
    /// Splits a comma separated list, trimming entries and dropping empty ones.
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl std::fmt::Display for FilterTerms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "any")
        } else {
            write!(f, "{}", self.0.join(", "))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Only jobs stored after this instant are eligible
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
    /// Discord user snowflake
    pub user_id: String,
    pub job_type: JobType,
    #[sea_orm(column_type = "Json")]
    pub locations: FilterTerms,
    #[sea_orm(column_type = "Json")]
    pub companies: FilterTerms,
    #[sea_orm(column_type = "Json")]
    pub roles: FilterTerms,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv_trims_and_drops_empty_terms() {
        let terms = FilterTerms::from_csv(" Google, ,Meta ,");
        assert_eq!(terms.0, vec!["Google".to_string(), "Meta".to_string()]);
    }

    #[test]
    fn test_empty_csv_is_wildcard() {
        assert!(FilterTerms::from_csv("").is_empty());
        assert_eq!(FilterTerms::from_csv("").to_string(), "any");
    }
}
