use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const USERNAME_TAKEN: &str = "Username already taken";

/// Errors raised by the credential core and the account/blog services.
///
/// A wrong password is never an error at the hasher level; it only becomes
/// [`AuthError::InvalidCredential`] once a login flow decides to reject it.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Token has expired")]
    ExpiredCredential,

    /// Authenticated, but not allowed to act on the target.
    #[error("You do not have permission to access this resource")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{resource} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// `Conflict` for a UNIQUE violation on an account column, `None` for
    /// any other database error.
    #[must_use]
    pub fn from_unique_violation(err: &DbErr) -> Option<Self> {
        match err.sql_err()? {
            SqlErr::UniqueConstraintViolation(detail) => {
                Some(Self::conflict(conflict_message(&detail)))
            }
            _ => None,
        }
    }
}

/// SQLite reports the failing column as `table.column`.
fn conflict_message(detail: &str) -> &'static str {
    if detail.contains(".username") {
        USERNAME_TAKEN
    } else {
        EMAIL_TAKEN
    }
}

impl From<DbErr> for AuthError {
    fn from(err: DbErr) -> Self {
        Self::from_unique_violation(&err).unwrap_or_else(|| Self::Internal(err.to_string()))
    }
}

/// Repositories wrap typed failures in `anyhow`; those are recovered here
/// instead of being flattened into `Internal`.
impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(typed) => typed,
            Err(err) => Self::Internal(format!("{err:#}")),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_conflict_message_names_the_column() {
        assert_eq!(
            conflict_message("UNIQUE constraint failed: users.username"),
            USERNAME_TAKEN
        );
        assert_eq!(
            conflict_message("UNIQUE constraint failed: admins.email"),
            EMAIL_TAKEN
        );
    }

    #[test]
    fn test_typed_error_survives_anyhow() {
        let wrapped = anyhow::Error::new(AuthError::conflict(EMAIL_TAKEN));
        assert!(matches!(
            AuthError::from(wrapped),
            AuthError::Conflict(msg) if msg == EMAIL_TAKEN
        ));
    }

    #[test]
    fn test_other_failures_stay_internal() {
        let result: anyhow::Result<()> =
            Err(DbErr::Custom("disk full".to_string())).context("Failed to insert user");
        let err = AuthError::from(result.unwrap_err());
        assert!(matches!(err, AuthError::Internal(msg) if msg.contains("disk full")));

        assert!(AuthError::from_unique_violation(&DbErr::RecordNotInserted).is_none());
    }
}
