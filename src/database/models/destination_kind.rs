use sea_orm::{entity::prelude::StringLen, DeriveActiveEnum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which destination table a delivery receipt's `destination_id` points at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DestinationKind {
    /// A guild channel configured for one job type
    #[sea_orm(string_value = "guild")]
    Guild,
    /// A user's private-message subscription
    #[sea_orm(string_value = "subscription")]
    Subscription,
}
