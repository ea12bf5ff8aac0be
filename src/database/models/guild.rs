//! `SeaORM` Entity for guild broadcast destinations

use crate::database::models::job_type::JobType;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "guild")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
    /// Discord guild snowflake
    #[sea_orm(unique)]
    pub guild_id: String,
    pub intern_channel_id: Option<String>,
    pub new_grad_channel_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Channel configured for a job type, if the guild is subscribed to it
    #[must_use]
    pub fn channel_for(&self, job_type: JobType) -> Option<&str> {
        let channel = match job_type {
            JobType::Intern => self.intern_channel_id.as_deref(),
            JobType::NewGrad => self.new_grad_channel_id.as_deref(),
        };
        channel.filter(|id| !id.is_empty())
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Column holding the channel id for a job type
#[must_use]
pub const fn channel_column(job_type: JobType) -> Column {
    match job_type {
        JobType::Intern => Column::InternChannelId,
        JobType::NewGrad => Column::NewGradChannelId,
    }
}
