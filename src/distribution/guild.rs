use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use tracing::{debug, error, info, warn};

use super::{
    backlog::{pending_jobs, Backlog},
    pace, record_delivery,
};
use crate::{
    app::App,
    database::models::{
        destination_kind::DestinationKind,
        guild::{self, channel_column},
        job_type::JobType,
    },
    notifier::{message::JobMessage, DeliveryError},
    task_pool::TaskPool,
};

/// Outcome of one broadcast to one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    /// Jobs Discord refused as malformed
    pub rejected: usize,
    /// Job types whose channel was cleared after a delivery failure
    pub disabled: Vec<JobType>,
}

/// Guilds that have not left.
pub async fn active_guilds(db: &DatabaseConnection) -> Result<Vec<guild::Model>, DbErr> {
    guild::Entity::find()
        .filter(guild::Column::DeletedAt.is_null())
        .all(db)
        .await
}

/// Broadcasts to every active guild on a bounded pool.
pub async fn broadcast_cycle(app: &App) -> Result<Vec<BroadcastReport>, DbErr> {
    let guilds = active_guilds(&app.db).await?;
    debug!("📣 Broadcasting to {} guild(s)", guilds.len());

    let pool = TaskPool::new("guild-broadcast", app.config.distribution.workers);
    let reports = pool
        .run(guilds, |guild| {
            let app = app.clone();
            async move { broadcast_to_guild(&app, &guild).await }
        })
        .await;

    Ok(reports)
}

/// Sends every undelivered job to the guild's configured channels.
///
/// New-grad postings go out before intern postings. A channel that fails with
/// a transport error is cleared, which stops that job type for the guild until
/// it is configured again. A rate limit only pauses the channel until the next
/// cycle. Store errors end the current job type, never the other one.
pub async fn broadcast_to_guild(app: &App, guild: &guild::Model) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for job_type in JobType::BROADCAST_ORDER {
        let Some(channel_id) = guild.channel_for(job_type) else {
            continue;
        };

        let jobs = match pending_jobs(
            &app.db,
            &Backlog::new(job_type, guild.id, &app.config.distribution),
        )
        .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(
                    "❌ Failed to load {} backlog for guild {}: {}",
                    job_type, guild.guild_id, e
                );
                continue;
            }
        };

        for job in jobs {
            match app.notifier.send(channel_id, &JobMessage::from_job(&job)).await {
                Ok(message_id) => {
                    report.sent += 1;
                    if let Err(e) =
                        record_delivery(app, guild.id, DestinationKind::Guild, job.id, Some(message_id))
                            .await
                    {
                        error!(
                            "❌ Failed to record job {} for guild {}: {}",
                            job.id, guild.guild_id, e
                        );
                    }
                    pace(app).await;
                }
                Err(DeliveryError::MalformedContent(reason)) => {
                    warn!(
                        "Job {} rejected by channel {} of guild {}: {}",
                        job.id, channel_id, guild.guild_id, reason
                    );
                    report.rejected += 1;
                    if let Err(e) =
                        record_delivery(app, guild.id, DestinationKind::Guild, job.id, None).await
                    {
                        error!(
                            "❌ Failed to record rejected job {} for guild {}: {}",
                            job.id, guild.guild_id, e
                        );
                    }
                }
                Err(DeliveryError::RateLimited(reason)) => {
                    warn!(
                        "Pausing {} channel {} of guild {} until next cycle: {}",
                        job_type, channel_id, guild.guild_id, reason
                    );
                    break;
                }
                Err(DeliveryError::Transport(reason)) => {
                    warn!(
                        "Disabling {} channel {} of guild {}: {}",
                        job_type, channel_id, guild.guild_id, reason
                    );
                    match disable_channel(&app.db, guild, job_type).await {
                        Ok(()) => report.disabled.push(job_type),
                        Err(e) => error!(
                            "❌ Failed to disable {} channel of guild {}: {}",
                            job_type, guild.guild_id, e
                        ),
                    }
                    break;
                }
            }
        }
    }

    if report.sent > 0 || !report.disabled.is_empty() {
        info!(
            "📣 Guild {}: {} sent, {} rejected, {} channel(s) disabled",
            guild.guild_id,
            report.sent,
            report.rejected,
            report.disabled.len()
        );
    }

    report
}

/// Clears one job type's channel, leaving the other untouched.
async fn disable_channel(
    db: &DatabaseConnection,
    guild: &guild::Model,
    job_type: JobType,
) -> Result<(), DbErr> {
    guild::Entity::update_many()
        .col_expr(channel_column(job_type), Expr::value(Option::<String>::None))
        .filter(guild::Column::Id.eq(guild.id))
        .exec(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

    use super::*;
    use crate::{
        database::models::delivery_receipt,
        destinations::{configure_guild, remove_guild},
        notifier::{mock::MockFailure, Notifier},
        tests::{
            discord_stub::DiscordStub, fixtures::insert_job, setup_test::setup_test,
        },
    };

    async fn configured_guild(test: &crate::tests::setup_test::TestUtils) -> guild::Model {
        configure_guild(&test.app, "g-1", Some("intern-ch"), Some("grad-ch"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_sends_oldest_first_and_never_resends() {
        let test = setup_test().await;
        let guild = configured_guild(&test).await;

        insert_job(&test.app, "Second", JobType::Intern, Duration::days(1)).await;
        insert_job(&test.app, "First", JobType::Intern, Duration::days(3)).await;
        insert_job(&test.app, "Grad", JobType::NewGrad, Duration::days(2)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;

        assert_eq!(report.sent, 3);
        assert_eq!(test.sent_titles("intern-ch"), vec!["First", "Second"]);
        assert_eq!(test.sent_titles("grad-ch"), vec!["Grad"]);
        let sent = test.notifier.sent();
        assert_eq!(sent[0].channel_id, "grad-ch");

        let again = broadcast_to_guild(&test.app, &guild).await;
        assert_eq!(again, BroadcastReport::default());
        assert_eq!(test.notifier.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_unconfigured_channel_is_skipped() {
        let test = setup_test().await;
        let guild = configure_guild(&test.app, "g-1", Some("intern-ch"), None)
            .await
            .unwrap();

        insert_job(&test.app, "Grad", JobType::NewGrad, Duration::days(1)).await;
        insert_job(&test.app, "Intern", JobType::Intern, Duration::days(1)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;

        assert_eq!(report.sent, 1);
        assert_eq!(test.sent_titles("intern-ch"), vec!["Intern"]);
    }

    #[tokio::test]
    async fn test_transport_failure_disables_only_that_channel() {
        let test = setup_test().await;
        let guild = configured_guild(&test).await;
        test.notifier.fail_channel("grad-ch", MockFailure::Transport);

        insert_job(&test.app, "Grad A", JobType::NewGrad, Duration::days(2)).await;
        insert_job(&test.app, "Grad B", JobType::NewGrad, Duration::days(1)).await;
        insert_job(&test.app, "Intern", JobType::Intern, Duration::days(1)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;

        assert_eq!(report.disabled, vec![JobType::NewGrad]);
        assert_eq!(report.sent, 1);
        assert_eq!(test.sent_titles("intern-ch"), vec!["Intern"]);

        let stored = guild::Entity::find_by_id(guild.id)
            .one(test.db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.new_grad_channel_id, None);
        assert_eq!(stored.intern_channel_id.as_deref(), Some("intern-ch"));

        // Undelivered grad jobs are picked up once the channel is configured again
        let reconfigured = configure_guild(&test.app, "g-1", None, Some("grad-ch-2"))
            .await
            .unwrap();
        let report = broadcast_to_guild(&test.app, &reconfigured).await;
        assert_eq!(report.sent, 2);
        assert_eq!(test.sent_titles("grad-ch-2"), vec!["Grad A", "Grad B"]);
    }

    #[tokio::test]
    async fn test_malformed_job_is_recorded_and_skipped() {
        let test = setup_test().await;
        let guild = configure_guild(&test.app, "g-1", Some("intern-ch"), None)
            .await
            .unwrap();
        test.notifier
            .fail_channel("intern-ch", MockFailure::MalformedContent);

        insert_job(&test.app, "Acme", JobType::Intern, Duration::days(1)).await;
        insert_job(&test.app, "Globex", JobType::Intern, Duration::days(2)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;
        assert_eq!(report.rejected, 2);
        assert!(report.disabled.is_empty());

        let receipts = delivery_receipt::Entity::find().all(test.db()).await.unwrap();
        assert_eq!(receipts.len(), 2);
        assert!(receipts.iter().all(|r| r.error && r.message_id.is_none()));

        let again = broadcast_to_guild(&test.app, &guild).await;
        assert_eq!(again.rejected, 0);
    }

    #[tokio::test]
    async fn test_concurrent_cycles_record_each_job_once() {
        let test = setup_test().await;
        configured_guild(&test).await;
        for index in 0..5 {
            insert_job(
                &test.app,
                &format!("Company {index}"),
                JobType::Intern,
                Duration::days(1),
            )
            .await;
        }

        let (first, second) = tokio::join!(broadcast_cycle(&test.app), broadcast_cycle(&test.app));
        first.unwrap();
        second.unwrap();

        assert_eq!(
            delivery_receipt::Entity::find()
                .count(test.db())
                .await
                .unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_removed_guild_is_not_broadcast_to() {
        let test = setup_test().await;
        configured_guild(&test).await;
        remove_guild(&test.app, "g-1").await.unwrap();
        insert_job(&test.app, "Acme", JobType::Intern, Duration::days(1)).await;

        let reports = broadcast_cycle(&test.app).await.unwrap();

        assert!(reports.is_empty());
        assert!(test.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_channel_is_kept() {
        let test = setup_test().await;
        let guild = configured_guild(&test).await;
        test.notifier
            .fail_channel("intern-ch", MockFailure::RateLimited);

        insert_job(&test.app, "Acme", JobType::Intern, Duration::days(1)).await;
        insert_job(&test.app, "Grad", JobType::NewGrad, Duration::days(1)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;

        assert!(report.disabled.is_empty());
        assert_eq!(report.sent, 1);
        let stored = guild::Entity::find_by_id(guild.id)
            .one(test.db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.intern_channel_id.as_deref(), Some("intern-ch"));
        assert_eq!(
            delivery_receipt::Entity::find()
                .count(test.db())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_discord_rate_limit_does_not_clear_channel() {
        let test = setup_test().await;
        let guild = configure_guild(&test.app, "g-1", Some("intern-ch"), None)
            .await
            .unwrap();
        insert_job(&test.app, "Acme", JobType::Intern, Duration::days(1)).await;

        let stub = DiscordStub::start(vec![(429, r#"{"retry_after": 0.01}"#)]).await;
        let mut app = test.app.clone();
        app.notifier = Notifier::discord(&stub.base_url, "token").unwrap();

        let report = broadcast_to_guild(&app, &guild).await;

        assert!(report.disabled.is_empty());
        assert_eq!(report.sent, 0);
        let stored = guild::Entity::find_by_id(guild.id)
            .one(test.db())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.intern_channel_id.as_deref(), Some("intern-ch"));
    }

    #[tokio::test]
    async fn test_failed_disable_does_not_stop_other_channel() {
        let test = setup_test().await;
        let guild = configured_guild(&test).await;
        test.notifier.fail_channel("grad-ch", MockFailure::Transport);
        test.db()
            .execute_unprepared(
                "CREATE TRIGGER block_guild_updates BEFORE UPDATE ON guild \
                 BEGIN SELECT RAISE(ABORT, 'guild updates blocked'); END;",
            )
            .await
            .unwrap();

        insert_job(&test.app, "Grad", JobType::NewGrad, Duration::days(1)).await;
        insert_job(&test.app, "Intern", JobType::Intern, Duration::days(1)).await;

        let report = broadcast_to_guild(&test.app, &guild).await;

        assert!(report.disabled.is_empty());
        assert_eq!(report.sent, 1);
        assert_eq!(test.sent_titles("intern-ch"), vec!["Intern"]);
    }
}
