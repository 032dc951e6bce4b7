//! Statistics engine error types.

use crate::db::timeouts::TimeoutError;
use crate::error::ErrorKind;
use crate::tournament::{TournamentId, ValidationErrors};
use std::time::Duration;
use thiserror::Error;

/// Statistics errors
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TimeoutError> for StatsError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => StatsError::Timeout(duration),
            TimeoutError::Database(e) => StatsError::Database(e),
        }
    }
}

impl StatsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatsError::TournamentNotFound(_) => ErrorKind::NotFound,
            StatsError::Validation(_) => ErrorKind::Validation,
            StatsError::Database(_) | StatsError::Timeout(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            StatsError::Database(_) | StatsError::Timeout(_) => "Internal server error".to_string(),
            StatsError::TournamentNotFound(_) => "Tournament not found".to_string(),
            StatsError::Validation(_) => self.to_string(),
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_messages() {
        assert_eq!(StatsError::TournamentNotFound(2).kind(), ErrorKind::NotFound);
        let err = StatsError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.client_message(), "Internal server error");
    }
}
