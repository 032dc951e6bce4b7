//! HS256 access-token verification and issuance.
//!
//! Accounts, passwords and sessions live in the account service; this side
//! only has to trust a bearer token and know who the caller is.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, UserId},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
}

impl TokenService {
    /// Create a token service with the default 15 minute token lifetime
    ///
    /// # Errors
    ///
    /// * `AuthError::WeakSecret` - secret shorter than [`MIN_SECRET_LEN`]
    pub fn new(jwt_secret: &str) -> AuthResult<Self> {
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: jwt_secret.len(),
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_duration: Duration::minutes(15),
        })
    }

    /// Override the token lifetime
    pub fn with_access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Verify an access token and return its claims
    pub fn verify(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data =
            decode::<AccessTokenClaims>(token, &self.decoding_key, &Validation::default())?;

        Ok(token_data.claims)
    }

    /// Verify a token and require the admin flag
    pub fn verify_admin(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let claims = self.verify(token)?;
        if !claims.is_admin {
            return Err(AuthError::NotAdmin);
        }
        Ok(claims)
    }

    /// Issue an access token for a user
    pub fn issue(&self, user_id: UserId, username: &str, is_admin: bool) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            is_admin,
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_testing_only_0123456789";

    #[test]
    fn test_issue_then_verify() {
        let tokens = TokenService::new(SECRET).unwrap();
        let token = tokens.issue(42, "meeple", false).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "meeple");
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = TokenService::new("short").err().unwrap();
        assert!(matches!(err, AuthError::WeakSecret { actual: 5, .. }));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = TokenService::new(SECRET).unwrap();
        let verifier = TokenService::new(&"x".repeat(40)).unwrap();
        let token = issuer.issue(1, "a", true).unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert_eq!(err.client_message(), "Authentication failed");
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new(SECRET)
            .unwrap()
            .with_access_token_duration(Duration::minutes(-10));
        let token = tokens.issue(1, "late", false).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_verify_admin() {
        let tokens = TokenService::new(SECRET).unwrap();
        let player = tokens.issue(1, "player", false).unwrap();
        let admin = tokens.issue(2, "host", true).unwrap();

        assert!(matches!(
            tokens.verify_admin(&player),
            Err(AuthError::NotAdmin)
        ));
        assert_eq!(tokens.verify_admin(&admin).unwrap().sub, 2);
    }
}
