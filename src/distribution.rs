use std::time::Duration;

use chrono::Utc;
use sea_orm::{prelude::Uuid, ActiveModelTrait, DbErr, Set};
use thiserror::Error;
use tracing::debug;

use crate::{
    app::App,
    database::{
        models::{delivery_receipt, destination_kind::DestinationKind},
        unique_constraint::is_unique_violation,
    },
};

pub mod backlog;
pub mod filter;
pub mod guild;
pub mod subscription;

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("Database error: {0}")]
    Store(#[from] DbErr),
}

/// Records that `job_id` was handled for a destination.
///
/// Returns `false` when another cycle already recorded the pair. A receipt
/// without a message id marks a job Discord refused to accept.
pub async fn record_delivery(
    app: &App,
    destination_id: Uuid,
    destination_kind: DestinationKind,
    job_id: Uuid,
    message_id: Option<String>,
) -> Result<bool, DbErr> {
    let now = Utc::now().naive_utc();
    let error = message_id.is_none();

    let receipt = delivery_receipt::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        destination_id: Set(destination_id),
        destination_kind: Set(destination_kind),
        job_id: Set(job_id),
        message_id: Set(message_id),
        error: Set(error),
    };

    match receipt.insert(&app.db).await {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => {
            debug!(
                "Job {} was already recorded for {} {}",
                job_id, destination_kind, destination_id
            );
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Pause between two messages to the same destination.
async fn pace(app: &App) {
    let pacing = app.config.distribution.pacing_millis;
    if pacing > 0 {
        tokio::time::sleep(Duration::from_millis(pacing)).await;
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};

    use super::*;
    use crate::{
        database::models::job_type::JobType,
        tests::{fixtures::insert_job, setup_test::setup_test},
    };

    #[tokio::test]
    async fn test_second_receipt_for_same_pair_is_ignored() {
        let test = setup_test().await;
        let job = insert_job(&test.app, "Acme", JobType::Intern, chrono::Duration::days(1)).await;
        let destination = Uuid::new_v4();

        let first = record_delivery(
            &test.app,
            destination,
            DestinationKind::Guild,
            job.id,
            Some("10".to_string()),
        )
        .await
        .unwrap();
        let second = record_delivery(
            &test.app,
            destination,
            DestinationKind::Guild,
            job.id,
            Some("11".to_string()),
        )
        .await
        .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(
            delivery_receipt::Entity::find()
                .count(test.db())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_receipt_without_message_is_an_error_receipt() {
        let test = setup_test().await;
        let job = insert_job(&test.app, "Acme", JobType::Intern, chrono::Duration::days(1)).await;

        record_delivery(&test.app, Uuid::new_v4(), DestinationKind::Subscription, job.id, None)
            .await
            .unwrap();

        let receipt = delivery_receipt::Entity::find()
            .one(test.db())
            .await
            .unwrap()
            .unwrap();
        assert!(receipt.error);
        assert_eq!(receipt.message_id, None);
        assert_eq!(receipt.destination_kind, DestinationKind::Subscription);
    }
}
