use sea_orm::{entity::prelude::StringLen, DeriveActiveEnum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind of posting a job belongs to.
///
/// Guilds configure one channel per job type and every subscription filters
/// on exactly one of them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobType {
    #[sea_orm(string_value = "INTERN")]
    Intern,
    #[sea_orm(string_value = "NEW_GRAD")]
    NewGrad,
}

impl JobType {
    /// Order in which guild broadcasts walk the job types.
    pub const BROADCAST_ORDER: [Self; 2] = [Self::NewGrad, Self::Intern];
}
