//! Authentication data models.

use serde::{Deserialize, Serialize};

/// User ID type
pub type UserId = i64;

/// JWT claims for access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: UserId, // User ID
    pub username: String,
    pub is_admin: bool,
    pub exp: i64, // Expiration timestamp
    pub iat: i64, // Issued at timestamp
}
