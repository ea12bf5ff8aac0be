use chrono::Utc;
use sea_orm::{
    prelude::Uuid, ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    app::App,
    database::{
        models::{
            guild,
            job_type::JobType,
            subscription::{self, FilterTerms},
        },
        unique_constraint::{handle_unique_constraint_violation, UniqueConstraintError},
    },
};

/// Active subscriptions one user may hold.
pub const SUBSCRIPTION_LIMIT: u64 = 5;

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("Guild {0} is not registered")]
    NotFound(String),
    #[error("You can only have {0} subscriptions at a time")]
    SubscriptionLimitReached(u64),
    #[error("There is no subscription at position {0}")]
    InvalidPosition(usize),
    #[error("Database error: {0}")]
    Store(#[from] DbErr),
}

impl From<UniqueConstraintError> for DestinationError {
    fn from(error: UniqueConstraintError) -> Self {
        match error {
            UniqueConstraintError::UniquenessError(field) => {
                Self::Store(DbErr::Custom(format!("{field} is already taken")))
            }
            UniqueConstraintError::Other(e) => Self::Store(e),
        }
    }
}

async fn find_guild(app: &App, guild_id: &str) -> Result<Option<guild::Model>, DbErr> {
    guild::Entity::find()
        .filter(guild::Column::GuildId.eq(guild_id))
        .one(&app.db)
        .await
}

/// Makes sure the guild is stored and active.
///
/// An unknown guild is created, one that left earlier is brought back with
/// its previous channels.
pub async fn register_guild(app: &App, guild_id: &str) -> Result<guild::Model, DestinationError> {
    match find_guild(app, guild_id).await? {
        Some(existing) if existing.is_active() => Ok(existing),
        Some(existing) => {
            info!("👋 Guild {} is back", guild_id);
            let mut record = existing.into_active_model();
            record.deleted_at = Set(None);
            Ok(record.update(&app.db).await?)
        }
        None => {
            let now = Utc::now().naive_utc();
            let record = guild::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
                guild_id: Set(guild_id.to_string()),
                intern_channel_id: Set(None),
                new_grad_channel_id: Set(None),
            };

            match record
                .insert(&app.db)
                .await
                .map_err(handle_unique_constraint_violation("guild_id"))
            {
                Ok(created) => {
                    info!("👋 Registered guild {}", guild_id);
                    Ok(created)
                }
                // Registered concurrently
                Err(UniqueConstraintError::UniquenessError(_)) => find_guild(app, guild_id)
                    .await?
                    .ok_or_else(|| DestinationError::NotFound(guild_id.to_string())),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Soft-deletes a guild so it stops receiving broadcasts.
pub async fn remove_guild(app: &App, guild_id: &str) -> Result<(), DestinationError> {
    let Some(existing) = find_guild(app, guild_id)
        .await?
        .filter(guild::Model::is_active)
    else {
        return Err(DestinationError::NotFound(guild_id.to_string()));
    };

    let mut record = existing.into_active_model();
    record.deleted_at = Set(Some(Utc::now().naive_utc()));
    record.update(&app.db).await?;

    info!("👋 Removed guild {}", guild_id);
    Ok(())
}

/// Sets the broadcast channels of a guild, registering it when needed.
///
/// `None` keeps the current channel, an empty id clears it.
pub async fn configure_guild(
    app: &App,
    guild_id: &str,
    intern_channel_id: Option<&str>,
    new_grad_channel_id: Option<&str>,
) -> Result<guild::Model, DestinationError> {
    let existing = register_guild(app, guild_id).await?;
    let mut record = existing.clone().into_active_model();

    let channel = |id: &str| Some(id.trim().to_string()).filter(|id| !id.is_empty());
    if let Some(id) = intern_channel_id {
        record.intern_channel_id = Set(channel(id));
    }
    if let Some(id) = new_grad_channel_id {
        record.new_grad_channel_id = Set(channel(id));
    }

    if !record.is_changed() {
        return Ok(existing);
    }

    let updated = record.update(&app.db).await?;
    debug!(
        "Guild {} channels: intern {:?}, new grad {:?}",
        guild_id, updated.intern_channel_id, updated.new_grad_channel_id
    );

    Ok(updated)
}

/// Creates a subscription from comma separated filter terms.
pub async fn subscribe(
    app: &App,
    user_id: &str,
    job_type: JobType,
    locations: &str,
    companies: &str,
    roles: &str,
) -> Result<subscription::Model, DestinationError> {
    let active = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::DeletedAt.is_null())
        .count(&app.db)
        .await?;

    if active >= SUBSCRIPTION_LIMIT {
        return Err(DestinationError::SubscriptionLimitReached(SUBSCRIPTION_LIMIT));
    }

    let now = Utc::now().naive_utc();
    let record = subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        user_id: Set(user_id.to_string()),
        job_type: Set(job_type),
        locations: Set(FilterTerms::from_csv(locations)),
        companies: Set(FilterTerms::from_csv(companies)),
        roles: Set(FilterTerms::from_csv(roles)),
    };

    let created = record.insert(&app.db).await?;
    info!("🔔 User {} subscribed to {} jobs", user_id, job_type);

    Ok(created)
}

/// Active subscriptions of a user, newest first.
pub async fn list_subscriptions(
    app: &App,
    user_id: &str,
) -> Result<Vec<subscription::Model>, DestinationError> {
    Ok(subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::DeletedAt.is_null())
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&app.db)
        .await?)
}

/// Removes the subscription at a 1-based position of [`list_subscriptions`].
pub async fn unsubscribe(
    app: &App,
    user_id: &str,
    position: usize,
) -> Result<subscription::Model, DestinationError> {
    let subscriptions = list_subscriptions(app, user_id).await?;

    let Some(target) = position
        .checked_sub(1)
        .and_then(|index| subscriptions.into_iter().nth(index))
    else {
        return Err(DestinationError::InvalidPosition(position));
    };

    let mut record = target.into_active_model();
    record.deleted_at = Set(Some(Utc::now().naive_utc()));
    let removed = record.update(&app.db).await?;

    info!("🔕 User {} unsubscribed from {}", user_id, removed.id);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::setup_test::setup_test;

    #[tokio::test]
    async fn test_register_creates_then_is_idempotent() {
        let test = setup_test().await;

        let created = register_guild(&test.app, "g-1").await.unwrap();
        let again = register_guild(&test.app, "g-1").await.unwrap();

        assert_eq!(created.id, again.id);
        assert!(again.is_active());
        assert_eq!(guild::Entity::find().count(test.db()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_removed_guild_is_revived_with_its_channels() {
        let test = setup_test().await;
        let configured = configure_guild(&test.app, "g-1", Some("intern-ch"), None)
            .await
            .unwrap();

        remove_guild(&test.app, "g-1").await.unwrap();
        let removed = guild::Entity::find_by_id(configured.id)
            .one(test.db())
            .await
            .unwrap()
            .unwrap();
        assert!(!removed.is_active());

        let revived = register_guild(&test.app, "g-1").await.unwrap();
        assert_eq!(revived.id, configured.id);
        assert!(revived.is_active());
        assert_eq!(revived.intern_channel_id.as_deref(), Some("intern-ch"));
    }

    #[tokio::test]
    async fn test_remove_unknown_guild_is_not_found() {
        let test = setup_test().await;
        assert!(matches!(
            remove_guild(&test.app, "missing").await,
            Err(DestinationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_configure_keeps_or_clears_channels() {
        let test = setup_test().await;
        configure_guild(&test.app, "g-1", Some("intern-ch"), Some("grad-ch"))
            .await
            .unwrap();

        let kept = configure_guild(&test.app, "g-1", None, Some("grad-ch-2"))
            .await
            .unwrap();
        assert_eq!(kept.intern_channel_id.as_deref(), Some("intern-ch"));
        assert_eq!(kept.new_grad_channel_id.as_deref(), Some("grad-ch-2"));

        let cleared = configure_guild(&test.app, "g-1", Some(""), None)
            .await
            .unwrap();
        assert_eq!(cleared.intern_channel_id, None);
        assert_eq!(cleared.channel_for(JobType::Intern), None);
    }

    #[tokio::test]
    async fn test_subscription_cap() {
        let test = setup_test().await;

        for _ in 0..SUBSCRIPTION_LIMIT {
            subscribe(&test.app, "user-1", JobType::Intern, "", "", "")
                .await
                .unwrap();
        }

        assert!(matches!(
            subscribe(&test.app, "user-1", JobType::Intern, "", "", "").await,
            Err(DestinationError::SubscriptionLimitReached(_))
        ));
        // Other users are unaffected
        subscribe(&test.app, "user-2", JobType::NewGrad, "", "", "")
            .await
            .unwrap();

        // A freed slot can be reused
        unsubscribe(&test.app, "user-1", 1).await.unwrap();
        subscribe(&test.app, "user-1", JobType::Intern, "", "", "")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_and_unsubscribe_by_position() {
        let test = setup_test().await;
        subscribe(&test.app, "user-1", JobType::Intern, "", "Google", "")
            .await
            .unwrap();
        subscribe(&test.app, "user-1", JobType::NewGrad, "Remote", "", "")
            .await
            .unwrap();

        let listed = list_subscriptions(&test.app, "user-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].job_type, JobType::NewGrad);
        assert_eq!(listed[0].locations.to_string(), "Remote");

        assert!(matches!(
            unsubscribe(&test.app, "user-1", 0).await,
            Err(DestinationError::InvalidPosition(0))
        ));
        assert!(matches!(
            unsubscribe(&test.app, "user-1", 3).await,
            Err(DestinationError::InvalidPosition(3))
        ));

        let removed = unsubscribe(&test.app, "user-1", 2).await.unwrap();
        assert_eq!(removed.job_type, JobType::Intern);

        let remaining = list_subscriptions(&test.app, "user-1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].job_type, JobType::NewGrad);
    }
}
