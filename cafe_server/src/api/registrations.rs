//! Registration and waitlist handlers.
//!
//! Registering and unregistering act on the caller's own entry; promotion,
//! status changes and counter repair are organizer tools.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use cafe_core::{
    registration::{
        CounterSnapshot, Participant, PromotionOutcome, Registration, RegistrationReceipt,
        RegistrationStatus, UnregisterOutcome,
    },
    tournament::TournamentId,
};
use serde::Deserialize;

use super::{AppState, error::ApiError, middleware::AuthUser};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantsQuery {
    pub include_waitlist: bool,
}

/// Body of `POST /api/tournaments/{id}/promote`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromoteRequest {
    pub user_id: Option<i64>,
}

impl PromoteRequest {
    /// An empty body promotes the earliest waitlisted user
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: RegistrationStatus,
}

/// `POST /api/tournaments/{id}/register`
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<(StatusCode, Json<RegistrationReceipt>), ApiError> {
    match state.ledger.register(user.user_id, tournament_id).await {
        Ok(receipt) => {
            metrics::registrations_total(if receipt.is_waitlist {
                "waitlisted"
            } else {
                "admitted"
            });
            Ok((StatusCode::CREATED, Json(receipt)))
        }
        Err(e) => {
            metrics::registrations_total(e.kind().as_str());
            Err(e.into())
        }
    }
}

/// `DELETE /api/tournaments/{id}/register`
pub async fn unregister(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<UnregisterOutcome>, ApiError> {
    let outcome = state.ledger.unregister(user.user_id, tournament_id).await?;

    metrics::unregistrations_total();
    if outcome.promoted_user_id.is_some() {
        metrics::promotions_total("unregister");
    }
    Ok(Json(outcome))
}

/// `GET /api/tournaments/{id}/participants`
pub async fn participants(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    query: Result<Query<ParticipantsQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let Query(query) = query?;
    // 404 for unknown tournaments instead of an empty list
    state.tournaments.get(tournament_id).await?;

    let participants = state
        .ledger
        .participants(tournament_id, query.include_waitlist)
        .await?;
    Ok(Json(participants))
}

/// `POST /api/tournaments/{id}/promote`
pub async fn promote(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    body: Bytes,
) -> Result<Json<PromotionOutcome>, ApiError> {
    let request = PromoteRequest::parse(&body)?;
    let outcome = state
        .ledger
        .promote_from_waitlist(tournament_id, request.user_id)
        .await?;

    metrics::promotions_total("manual");
    Ok(Json(outcome))
}

/// `PATCH /api/tournaments/{id}/registrations/{userId}`
pub async fn update_status(
    State(state): State<AppState>,
    Path((tournament_id, user_id)): Path<(TournamentId, i64)>,
    body: Result<Json<StatusUpdateRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Registration>, ApiError> {
    let Json(request) = body?;
    let registration = state
        .ledger
        .update_registration_status(tournament_id, user_id, request.status)
        .await?;
    Ok(Json(registration))
}

/// `POST /api/tournaments/{id}/reconcile`
pub async fn reconcile(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<CounterSnapshot>, ApiError> {
    let counters = state.ledger.reconcile(tournament_id).await?;
    Ok(Json(counters))
}

/// `GET /api/users/me/registrations`
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let registrations = state.ledger.registrations_for_user(user.user_id).await?;
    Ok(Json(registrations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote_request_parsing() {
        assert_eq!(PromoteRequest::parse(b"").unwrap().user_id, None);
        assert_eq!(PromoteRequest::parse(b"  \n").unwrap().user_id, None);
        assert_eq!(PromoteRequest::parse(b"{}").unwrap().user_id, None);
        assert_eq!(
            PromoteRequest::parse(br#"{"userId": 42}"#).unwrap().user_id,
            Some(42)
        );
        assert!(PromoteRequest::parse(b"{not json").is_err());
    }

    #[test]
    fn test_status_update_request() {
        let request: StatusUpdateRequest =
            serde_json::from_str(r#"{"status": "no-show"}"#).unwrap();
        assert_eq!(request.status, RegistrationStatus::NoShow);
        assert!(serde_json::from_str::<StatusUpdateRequest>(r#"{"status": "late"}"#).is_err());
    }
}
