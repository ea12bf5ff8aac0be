use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UniqueConstraintError {
    #[error("The value for field '{0}' must be unique.")]
    UniquenessError(&'static str),
    #[error("Database error: {0}")]
    Other(DbErr),
}

/// Whether the error is a unique-constraint violation on any index.
#[must_use]
pub fn is_unique_violation(db_err: &DbErr) -> bool {
    if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    let message = db_err.to_string();
    message.contains("UNIQUE constraint failed")
        || message.contains("duplicate key value violates unique constraint")
}

/// Maps database unique constraint violations to uniqueness errors
pub fn handle_unique_constraint_violation(
    field_name: &'static str,
) -> impl Fn(DbErr) -> UniqueConstraintError {
    move |db_err: DbErr| {
        if is_unique_violation(&db_err) {
            UniqueConstraintError::UniquenessError(field_name)
        } else {
            UniqueConstraintError::Other(db_err)
        }
    }
}
