//! Bearer-token middleware for user and admin routes.
//!
//! Both layers verify the `Authorization: Bearer <token>` header and insert
//! an [`AuthUser`] into the request extensions; handlers take it with
//! `Extension<AuthUser>`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use cafe_core::auth::{AccessTokenClaims, AuthError};

use super::{AppState, error::ApiError};
use crate::logging::log_security_event;

/// Caller identity taken from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl From<AccessTokenClaims> for AuthUser {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    match state.tokens.verify(token) {
        Ok(claims) => Ok(AuthUser::from(claims)),
        Err(e) => {
            log_security_event("invalid_token", None, &e.to_string());
            Err(e.into())
        }
    }
}

/// Require any authenticated user
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Require an authenticated administrator
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers())?;
    if !user.is_admin {
        log_security_event(
            "admin_required",
            Some(user.user_id),
            &format!("{} {}", request.method(), request.uri().path()),
        );
        return Err(AuthError::NotAdmin.into());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
