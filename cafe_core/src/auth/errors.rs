//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// JWT token error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Token lacks the privileges the operation needs
    #[error("Administrator privileges required")]
    NotAdmin,

    /// The secret is too short to sign tokens safely
    #[error("JWT secret must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak token internals
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Jwt(_) => "Authentication failed".to_string(),
            AuthError::WeakSecret { .. } => "Internal server error".to_string(),
            AuthError::NotAdmin => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
