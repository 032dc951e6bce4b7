//! API error type and its JSON response.
//!
//! Every failure leaves the server as `{"error": "<message>", "code": "<kind>"}`
//! with a status derived from the error's [`ErrorKind`].

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cafe_core::{
    ErrorKind, auth::AuthError, stats::StatsError, tournament::TournamentError,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tournament(#[from] TournamentError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No bearer token was presented
    #[error("Authentication required")]
    Unauthorized,

    /// Malformed query or body
    #[error("{0}")]
    BadRequest(String),
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::Capacity => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Tournament(e) => status_for(e.kind()),
            ApiError::Stats(e) => status_for(e.kind()),
            ApiError::Auth(AuthError::NotAdmin) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::Jwt(_)) | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::WeakSecret { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Tournament(e) => e.kind().as_str(),
            ApiError::Stats(e) => e.kind().as_str(),
            ApiError::Auth(AuthError::NotAdmin) => "forbidden",
            ApiError::Auth(AuthError::Jwt(_)) | ApiError::Unauthorized => "unauthorized",
            ApiError::Auth(AuthError::WeakSecret { .. }) => ErrorKind::Internal.as_str(),
            ApiError::BadRequest(_) => ErrorKind::Validation.as_str(),
        }
    }

    /// Client-safe message
    pub fn message(&self) -> String {
        match self {
            ApiError::Tournament(e) => e.client_message(),
            ApiError::Stats(e) => e.client_message(),
            ApiError::Auth(e) => e.client_message(),
            ApiError::Unauthorized | ApiError::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
