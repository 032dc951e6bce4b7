//! Result recording, statistics recomputation and badge awarding.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::badges::{Badge, BadgeAward, eligible_badges};
use super::errors::{StatsError, StatsResult};
use super::models::{LeaderboardEntry, ResultInput, ResultRecord, UserStatistics};
use super::store::{StatisticsStore, StatisticsTx, UpsertedResult};
use crate::db::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_transaction_timeout};
use crate::tournament::TournamentId;

/// Leaderboard size when none is given
pub const DEFAULT_LEADERBOARD_SIZE: i64 = 10;

/// Largest leaderboard a client may request
pub const MAX_LEADERBOARD_SIZE: i64 = 100;

/// Everything produced by recording one result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecorded {
    pub result: ResultRecord,
    pub statistics: UserStatistics,
    /// `true` when an earlier result for the pair was overwritten and the
    /// statistics were rebuilt from the stored results
    pub replaced: bool,
    pub badges: BadgeAward,
}

/// Statistics engine over a storage backend
pub struct StatisticsEngine<S> {
    store: S,
    transaction_timeout: Duration,
}

impl<S: StatisticsStore> StatisticsEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a user's result and update their statistics
    ///
    /// The first result for a (tournament, user) pair is folded into the
    /// statistics. A later submission overwrites the stored row and the
    /// user's statistics are rebuilt from all their results in the same
    /// transaction. Badges are awarded afterwards and never fail the
    /// recording.
    ///
    /// # Errors
    ///
    /// * `StatsError::Validation` - malformed result
    /// * `StatsError::TournamentNotFound` - tournament doesn't exist
    /// * `StatsError::Timeout` - the transaction outlived its timeout
    pub async fn record_result(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
        input: ResultInput,
    ) -> StatsResult<ResultRecorded> {
        self.record_result_at(user_id, tournament_id, input, Utc::now())
            .await
    }

    pub async fn record_result_at(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
        input: ResultInput,
        now: DateTime<Utc>,
    ) -> StatsResult<ResultRecorded> {
        input.validate()?;

        let (upserted, statistics) = with_transaction_timeout(
            self.transaction_timeout,
            self.write_result(user_id, tournament_id, &input, now),
        )
        .await?;

        tracing::info!(
            user_id,
            tournament_id,
            final_position = input.final_position,
            replaced = !upserted.inserted,
            "result recorded"
        );

        let badges = match self.award_eligible_badges(user_id).await {
            Ok(badges) => BadgeAward::Awarded { badges },
            Err(e) => {
                tracing::warn!(user_id, error = %e, "badge award failed");
                BadgeAward::Failed {
                    error: e.client_message(),
                }
            }
        };

        Ok(ResultRecorded {
            result: upserted.record,
            statistics,
            replaced: !upserted.inserted,
            badges,
        })
    }

    async fn write_result(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
        input: &ResultInput,
        now: DateTime<Utc>,
    ) -> StatsResult<(UpsertedResult, UserStatistics)> {
        let mut tx = self.store.begin().await?;
        if !tx.tournament_exists(tournament_id).await? {
            return Err(StatsError::TournamentNotFound(tournament_id));
        }

        let upserted = tx.upsert_result(user_id, tournament_id, input, now).await?;
        let mut statistics = tx.lock_statistics(user_id).await?;
        if upserted.inserted {
            statistics.apply_result(input, now);
        } else {
            let results = tx.user_results(user_id).await?;
            statistics = UserStatistics::rebuild(user_id, &results, now);
        }
        tx.save_statistics(&statistics).await?;
        tx.commit().await?;

        Ok((upserted, statistics))
    }

    /// Award every badge the user's statistics qualify for and they don't hold
    ///
    /// Returns only the newly awarded badges; calling it again with unchanged
    /// statistics awards nothing.
    pub async fn award_eligible_badges(&self, user_id: i64) -> StatsResult<Vec<Badge>> {
        let statistics = self.statistics(user_id).await?;
        let held: Vec<String> = self
            .store
            .badges(user_id)
            .await?
            .into_iter()
            .map(|b| b.badge_name)
            .collect();

        let mut awarded = Vec::new();
        for kind in eligible_badges(&statistics, &held) {
            if let Some(badge) = self.store.insert_badge(user_id, kind, Utc::now()).await? {
                tracing::info!(user_id, badge = badge.badge_name.as_str(), "badge awarded");
                awarded.push(badge);
            }
        }
        Ok(awarded)
    }

    /// A user's statistics, all zeros before their first result
    pub async fn statistics(&self, user_id: i64) -> StatsResult<UserStatistics> {
        Ok(self
            .store
            .statistics(user_id)
            .await?
            .unwrap_or_else(|| UserStatistics::empty(user_id)))
    }

    pub async fn badges(&self, user_id: i64) -> StatsResult<Vec<Badge>> {
        self.store.badges(user_id).await
    }

    /// Top users; `limit` is clamped to `1..=MAX_LEADERBOARD_SIZE`
    pub async fn leaderboard(&self, limit: Option<i64>) -> StatsResult<Vec<LeaderboardEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
            .clamp(1, MAX_LEADERBOARD_SIZE);
        self.store.leaderboard(limit).await
    }
}
