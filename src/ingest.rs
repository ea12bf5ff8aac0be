use chrono::{NaiveDateTime, Utc};
use sea_orm::{prelude::Uuid, ActiveModelTrait, DbErr, IntoActiveModel, Set};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    app::App,
    database::{
        models::{job, job_type::JobType},
        unique_constraint::{handle_unique_constraint_violation, UniqueConstraintError},
    },
};

pub mod logo;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to store job: {0}")]
    Store(#[from] DbErr),
}

/// A normalized posting produced by a source, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub source_name: String,
    pub source_url: String,
    pub job_type: JobType,
    pub company: String,
    pub role: String,
    pub location: String,
    pub application_link: String,
    pub first_seen: NaiveDateTime,
}

/// Stores a candidate unless a job with the same application link exists.
///
/// Returns the stored job, or `None` when the posting was already known.
pub async fn persist(app: &App, candidate: NewJob) -> Result<Option<job::Model>, IngestError> {
    let now = Utc::now().naive_utc();
    let application_link = candidate.application_link.clone();

    let record = job::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        source_name: Set(candidate.source_name),
        source_url: Set(candidate.source_url),
        job_type: Set(candidate.job_type),
        company: Set(candidate.company),
        logo_url: Set(None),
        role: Set(candidate.role),
        location: Set(candidate.location),
        application_link: Set(candidate.application_link),
        first_seen: Set(candidate.first_seen),
    };

    let stored = match record
        .insert(&app.db)
        .await
        .map_err(handle_unique_constraint_violation("application_link"))
    {
        Ok(stored) => stored,
        Err(UniqueConstraintError::UniquenessError(_)) => {
            debug!("Job {} already stored, skipping", application_link);
            return Ok(None);
        }
        Err(UniqueConstraintError::Other(e)) => return Err(IngestError::Store(e)),
    };

    debug!("💾 Stored job {} ({})", stored.id, stored.application_link);

    let stored = attach_logo(app, stored).await;
    app.publish_job(&stored);

    Ok(Some(stored))
}

/// Best-effort logo enrichment; the stored job is kept whatever happens.
async fn attach_logo(app: &App, stored: job::Model) -> job::Model {
    if !app.config.logo.enabled {
        return stored;
    }

    let logo_url = match logo::lookup(app, &stored.company).await {
        Ok(Some(logo_url)) => logo_url,
        Ok(None) => return stored,
        Err(e) => {
            warn!("Logo lookup for {} failed: {}", stored.company, e);
            return stored;
        }
    };

    let mut record = stored.clone().into_active_model();
    record.logo_url = Set(Some(logo_url));

    match record.update(&app.db).await {
        Ok(updated) => updated,
        Err(e) => {
            warn!("Failed to save logo for job {}: {}", stored.id, e);
            stored
        }
    }
}
