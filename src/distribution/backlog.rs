use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{
    prelude::Uuid, sea_query::Query, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use super::filter::SubscriptionFilter;
use crate::{
    config::DistributionConfig,
    database::models::{delivery_receipt, job, job_type::JobType},
};

/// Which jobs a destination is still owed.
#[derive(Debug, Clone)]
pub struct Backlog<'a> {
    pub job_type: JobType,
    pub destination_id: Uuid,
    pub lookback: Duration,
    pub limit: u64,
    /// Only jobs stored after this instant
    pub stored_after: Option<NaiveDateTime>,
    pub filter: Option<&'a SubscriptionFilter>,
}

impl<'a> Backlog<'a> {
    #[must_use]
    pub fn new(job_type: JobType, destination_id: Uuid, config: &DistributionConfig) -> Self {
        Self {
            job_type,
            destination_id,
            lookback: Duration::days(config.lookback_days),
            limit: config.batch_limit,
            stored_after: None,
            filter: None,
        }
    }

    #[must_use]
    pub fn stored_after(mut self, watermark: NaiveDateTime) -> Self {
        self.stored_after = Some(watermark);
        self
    }

    #[must_use]
    pub fn matching(mut self, filter: &'a SubscriptionFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Undelivered jobs for a destination, oldest first.
pub async fn pending_jobs(
    db: &DatabaseConnection,
    backlog: &Backlog<'_>,
) -> Result<Vec<job::Model>, DbErr> {
    let window_start = Utc::now().naive_utc() - backlog.lookback;

    let delivered = Query::select()
        .column(delivery_receipt::Column::JobId)
        .from(delivery_receipt::Entity)
        .and_where(delivery_receipt::Column::DestinationId.eq(backlog.destination_id))
        .to_owned();

    let mut query = job::Entity::find()
        .filter(job::Column::JobType.eq(backlog.job_type))
        .filter(job::Column::FirstSeen.gt(window_start))
        .filter(job::Column::DeletedAt.is_null())
        .filter(job::Column::Id.not_in_subquery(delivered));

    if let Some(watermark) = backlog.stored_after {
        query = query.filter(job::Column::CreatedAt.gt(watermark));
    }

    if let Some(filter) = backlog.filter {
        query = query.filter(filter.condition());
    }

    query
        .order_by_asc(job::Column::FirstSeen)
        .order_by_asc(job::Column::CreatedAt)
        .limit(backlog.limit)
        .all(db)
        .await
}
