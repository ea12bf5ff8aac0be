use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tracing::{debug, error, info, warn};

use super::{
    backlog::{pending_jobs, Backlog},
    filter::SubscriptionFilter,
    pace, record_delivery, DistributionError,
};
use crate::{
    app::App,
    database::models::{destination_kind::DestinationKind, subscription},
    notifier::{message::JobMessage, DeliveryError},
    task_pool::TaskPool,
};

/// Outcome of one delivery run for one subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionReport {
    pub sent: usize,
    /// Delivery stopped early; the rest waits for the next cycle
    pub interrupted: bool,
    /// The user's private channel could not be opened
    pub unreachable: bool,
}

pub async fn active_subscriptions(
    db: &DatabaseConnection,
) -> Result<Vec<subscription::Model>, DbErr> {
    subscription::Entity::find()
        .filter(subscription::Column::DeletedAt.is_null())
        .all(db)
        .await
}

/// Delivers to every active subscription on a bounded pool.
pub async fn delivery_cycle(app: &App) -> Result<Vec<SubscriptionReport>, DbErr> {
    let subscriptions = active_subscriptions(&app.db).await?;
    debug!("📨 Delivering to {} subscription(s)", subscriptions.len());

    let pool = TaskPool::new("subscription-delivery", app.config.distribution.workers);
    let reports = pool
        .run(subscriptions, |subscription| {
            let app = app.clone();
            async move {
                match deliver_to_subscription(&app, &subscription).await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        error!(
                            "❌ Delivery to subscription {} failed: {}",
                            subscription.id, e
                        );
                        None
                    }
                }
            }
        })
        .await;

    Ok(reports.into_iter().flatten().collect())
}

/// Sends the subscriber every matching job stored since they subscribed.
///
/// Any delivery failure ends the run for this cycle without disabling the
/// subscription. A job Discord rejects as malformed is recorded so it is not
/// offered again.
pub async fn deliver_to_subscription(
    app: &App,
    subscription: &subscription::Model,
) -> Result<SubscriptionReport, DistributionError> {
    let mut report = SubscriptionReport::default();
    let filter = SubscriptionFilter::from_subscription(subscription);

    let jobs = pending_jobs(
        &app.db,
        &Backlog::new(
            subscription.job_type,
            subscription.id,
            &app.config.distribution,
        )
        .stored_after(subscription.created_at)
        .matching(&filter),
    )
    .await?;

    if jobs.is_empty() {
        return Ok(report);
    }

    let channel_id = match app.notifier.open_private_channel(&subscription.user_id).await {
        Ok(channel_id) => channel_id,
        Err(e) => {
            warn!(
                "Cannot open a private channel with user {} for subscription {}: {}",
                subscription.user_id, subscription.id, e
            );
            report.unreachable = true;
            return Ok(report);
        }
    };

    for job in jobs {
        match app.notifier.send(&channel_id, &JobMessage::from_job(&job)).await {
            Ok(message_id) => {
                report.sent += 1;
                if let Err(e) = record_delivery(
                    app,
                    subscription.id,
                    DestinationKind::Subscription,
                    job.id,
                    Some(message_id),
                )
                .await
                {
                    error!(
                        "❌ Failed to record job {} for subscription {}: {}",
                        job.id, subscription.id, e
                    );
                }
                pace(app).await;
            }
            Err(DeliveryError::MalformedContent(reason)) => {
                warn!(
                    "Job {} rejected for subscription {}: {}",
                    job.id, subscription.id, reason
                );
                record_delivery(
                    app,
                    subscription.id,
                    DestinationKind::Subscription,
                    job.id,
                    None,
                )
                .await?;
                report.interrupted = true;
                break;
            }
            Err(DeliveryError::RateLimited(reason) | DeliveryError::Transport(reason)) => {
                warn!(
                    "Stopping delivery to subscription {} this cycle: {}",
                    subscription.id, reason
                );
                report.interrupted = true;
                break;
            }
        }
    }

    if report.sent > 0 {
        info!(
            "📨 Subscription {} of user {}: {} sent",
            subscription.id, subscription.user_id, report.sent
        );
    }

    Ok(report)
}
