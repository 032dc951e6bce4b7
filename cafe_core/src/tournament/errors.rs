//! Tournament and registration error types.

use super::validation::ValidationErrors;
use crate::db::timeouts::TimeoutError;
use crate::error::ErrorKind;
use std::time::Duration;
use thiserror::Error;

use super::models::TournamentId;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Player already registered")]
    AlreadyRegistered,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("No waitlisted registration to promote")]
    NoWaitlistEntry,

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Registration closed: {0}")]
    RegistrationClosed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimeoutError> for TournamentError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => TournamentError::Timeout(duration),
            TimeoutError::Database(e) => TournamentError::Database(e),
        }
    }
}

impl TournamentError {
    /// Classify the error for transport mapping
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::NotFound(_) | TournamentError::RegistrationNotFound => {
                ErrorKind::NotFound
            }
            TournamentError::Validation(_) => ErrorKind::Validation,
            TournamentError::AlreadyRegistered | TournamentError::RegistrationClosed(_) => {
                ErrorKind::Conflict
            }
            TournamentError::NoWaitlistEntry => ErrorKind::NotFound,
            TournamentError::TournamentFull => ErrorKind::Capacity,
            TournamentError::Database(_) | TournamentError::Timeout(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    ///
    /// Database errors are replaced so SQL details never reach a client.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::Timeout(_) => {
                "Internal server error".to_string()
            }
            TournamentError::NotFound(_) => "Tournament not found".to_string(),
            _ => self.to_string(),
        }
    }

    /// Map a unique-constraint violation on the registration pair
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                TournamentError::AlreadyRegistered
            }
            _ => TournamentError::Database(err),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(TournamentError::NotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(TournamentError::AlreadyRegistered.kind(), ErrorKind::Conflict);
        assert_eq!(TournamentError::TournamentFull.kind(), ErrorKind::Capacity);
        assert_eq!(
            TournamentError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_timeout_is_internal() {
        let err = TournamentError::from(TimeoutError::Timeout(Duration::from_secs(10)));
        assert!(matches!(err, TournamentError::Timeout(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_database_message_is_sanitized() {
        let err = TournamentError::Database(sqlx::Error::Protocol("relation x".into()));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("relation x"));
    }
}
