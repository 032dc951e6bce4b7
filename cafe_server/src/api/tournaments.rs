//! Tournament catalogue handlers.
//!
//! ```bash
//! curl 'http://localhost:3000/api/tournaments?status=upcoming&hasAvailableSpots=true'
//!
//! curl -X POST http://localhost:3000/api/tournaments \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"title": "Catan Cup", "gameId": 11, "startDate": "2030-04-12T20:30:00Z"}'
//! ```

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use cafe_core::tournament::{
    Page, RegistrationEligibility, SortField, SortOrder, SweepReport, Tournament,
    TournamentDraft, TournamentFilter, TournamentId, TournamentPatch, TournamentStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{AppState, error::ApiError, middleware::AuthUser};
use crate::{logging::log_database_operation, metrics};

/// Query string of `GET /api/tournaments`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub registration_open: Option<bool>,
    pub has_available_spots: Option<bool>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn into_filter(self) -> Result<TournamentFilter, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TournamentStatus>)
            .transpose()
            .map_err(ApiError::BadRequest)?;

        Ok(TournamentFilter {
            status,
            category: self.category,
            from: self.from,
            to: self.to,
            registration_open: self.registration_open,
            has_available_spots: self.has_available_spots,
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(0),
        })
    }
}

/// Tournament with the derived fields a client renders
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub eligibility: RegistrationEligibility,
    pub available_spots: i32,
    pub is_campaign: bool,
    pub date_range: String,
    pub spots: String,
}

impl TournamentView {
    pub fn at(tournament: Tournament, now: DateTime<Utc>) -> Self {
        Self {
            eligibility: tournament.can_register(now),
            available_spots: tournament.available_spots(),
            is_campaign: tournament.is_campaign(),
            date_range: tournament.date_range_label(),
            spots: tournament.spots_label(),
            tournament,
        }
    }
}

/// `GET /api/tournaments`
pub async fn list_tournaments(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Page<TournamentView>>, ApiError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let page = state.tournaments.list(&filter).await?;

    let now = Utc::now();
    Ok(Json(Page {
        items: page
            .items
            .into_iter()
            .map(|t| TournamentView::at(t, now))
            .collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

/// `GET /api/tournaments/{id}`
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<TournamentView>, ApiError> {
    let tournament = state.tournaments.get(tournament_id).await?;
    Ok(Json(TournamentView::at(tournament, Utc::now())))
}

/// `POST /api/tournaments`
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<TournamentDraft>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let Json(draft) = body?;
    let tournament = state.tournaments.create(draft, Some(user.user_id)).await?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// `PUT /api/tournaments/{id}`
pub async fn update_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
    body: Result<Json<TournamentPatch>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Tournament>, ApiError> {
    let Json(patch) = body?;
    let tournament = state.tournaments.update(tournament_id, patch).await?;
    Ok(Json(tournament))
}

/// `DELETE /api/tournaments/{id}`
pub async fn delete_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<StatusCode, ApiError> {
    state.tournaments.delete(tournament_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/tournaments/expire`
pub async fn expire_tournaments(
    State(state): State<AppState>,
) -> Result<Json<SweepReport>, ApiError> {
    let report = run_sweep(&state).await?;
    Ok(Json(report))
}

/// Run the status sweep once, shared by the endpoint and the background task
pub async fn run_sweep(state: &AppState) -> Result<SweepReport, ApiError> {
    let started = Instant::now();
    let report = state.tournaments.expire_past_tournaments(Utc::now()).await?;

    log_database_operation(
        "UPDATE",
        "tournaments",
        report.started + report.completed,
        started.elapsed().as_millis() as u64,
    );
    metrics::tournaments_swept_total(report.started, report.completed);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let filter = ListQuery::default().into_filter().unwrap();
        assert_eq!(filter.status, None);
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), 20);
        assert_eq!(filter.sort, SortField::StartDate);
    }

    #[test]
    fn test_list_query_status() {
        let query = ListQuery {
            status: Some("ongoing".to_string()),
            has_available_spots: Some(true),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(TournamentStatus::Ongoing));
        assert_eq!(filter.has_available_spots, Some(true));

        let query = ListQuery {
            status: Some("postponed".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_list_query_huge_page_is_capped() {
        let query: ListQuery =
            serde_json::from_str(r#"{"page": 9223372036854775807, "limit": 100}"#).unwrap();
        let filter = query.into_filter().unwrap();
        assert!(filter.offset() >= 0);
        assert_eq!(filter.limit(), 100);
    }
}
