//! Player statistics, badges and leaderboard handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use cafe_core::{
    stats::{Badge, BadgeAward, LeaderboardEntry, ResultInput, ResultRecorded, UserStatistics},
    tournament::TournamentId,
};
use serde::Deserialize;

use super::{AppState, error::ApiError, request_id::RequestId};
use crate::metrics;

/// Body of `POST /api/tournaments/{id}/results`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResultRequest {
    pub user_id: i64,
    #[serde(flatten)]
    pub result: ResultInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// `POST /api/tournaments/{id}/results`
pub async fn record_result(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(tournament_id): Path<TournamentId>,
    body: Result<Json<RecordResultRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<ResultRecorded>), ApiError> {
    let Json(request) = body?;
    let recorded = state
        .stats
        .record_result(request.user_id, tournament_id, request.result)
        .await?;

    metrics::results_recorded_total(recorded.replaced);
    match &recorded.badges {
        BadgeAward::Awarded { badges } => {
            for badge in badges {
                metrics::badges_awarded_total(&badge.badge_name);
            }
        }
        BadgeAward::Failed { error } => {
            metrics::badge_failures_total();
            tracing::warn!(
                request_id = request_id.as_str(),
                user_id = request.user_id,
                error = error.as_str(),
                "result stored without badges"
            );
        }
    }

    Ok((StatusCode::CREATED, Json(recorded)))
}

/// `GET /api/users/{id}/statistics`
pub async fn user_statistics(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserStatistics>, ApiError> {
    Ok(Json(state.stats.statistics(user_id).await?))
}

/// `GET /api/users/{id}/badges`
pub async fn user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Badge>>, ApiError> {
    Ok(Json(state.stats.badges(user_id).await?))
}

/// `GET /api/statistics/leaderboard`
pub async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.stats.leaderboard(query.limit).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_result_request_flattens_result() {
        let request: RecordResultRequest = serde_json::from_str(
            r#"{"userId": 9, "finalPosition": 1, "gamesWon": 3, "campaignCompleted": true}"#,
        )
        .unwrap();

        assert_eq!(request.user_id, 9);
        assert_eq!(request.result.final_position, 1);
        assert_eq!(request.result.games_won, 3);
        assert!(request.result.campaign_completed);
        assert_eq!(request.result.games_lost, 0);
    }

    #[test]
    fn test_record_result_requires_user() {
        assert!(serde_json::from_str::<RecordResultRequest>(r#"{"finalPosition": 1}"#).is_err());
    }
}
