use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Preference {0} not found")]
    NotFound(i64),
    #[error("Preference {preference_id} does not belong to user {user_id}")]
    Unauthorized { preference_id: i64, user_id: String },
}

pub type InboxResult<T> = Result<T, InboxError>;

impl From<DieselError> for InboxError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                InboxError::ConstraintViolation(info.message().to_string())
            }
            other => InboxError::StoreUnavailable(other.to_string()),
        }
    }
}
