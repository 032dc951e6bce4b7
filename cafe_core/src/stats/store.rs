//! Storage seams for the statistics engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::badges::{Badge, BadgeKind};
use super::errors::StatsResult;
use super::models::{LeaderboardEntry, ResultInput, ResultRecord, UserStatistics};
use crate::tournament::TournamentId;

/// A result row after an upsert
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertedResult {
    pub record: ResultRecord,
    /// `false` when an existing row for the pair was overwritten
    pub inserted: bool,
}

/// Trait for statistics storage
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    type Tx: StatisticsTx;

    async fn begin(&self) -> StatsResult<Self::Tx>;

    /// Stored statistics, `None` before the first result
    async fn statistics(&self, user_id: i64) -> StatsResult<Option<UserStatistics>>;

    /// Badges held by a user, oldest first
    async fn badges(&self, user_id: i64) -> StatsResult<Vec<Badge>>;

    /// Award a badge; `None` when the user already holds it
    async fn insert_badge(
        &self,
        user_id: i64,
        kind: BadgeKind,
        earned_at: DateTime<Utc>,
    ) -> StatsResult<Option<Badge>>;

    /// Top users by wins, then win rate, then tournaments played
    async fn leaderboard(&self, limit: i64) -> StatsResult<Vec<LeaderboardEntry>>;
}

/// Trait for one result-recording transaction
#[async_trait]
pub trait StatisticsTx: Send {
    async fn tournament_exists(&mut self, tournament_id: TournamentId) -> StatsResult<bool>;

    /// Insert or overwrite the (tournament, user) result
    async fn upsert_result(
        &mut self,
        user_id: i64,
        tournament_id: TournamentId,
        input: &ResultInput,
        recorded_at: DateTime<Utc>,
    ) -> StatsResult<UpsertedResult>;

    /// Lock the user's statistics, creating a zero row when absent
    async fn lock_statistics(&mut self, user_id: i64) -> StatsResult<UserStatistics>;

    /// Every stored result of a user, oldest submission first
    async fn user_results(&mut self, user_id: i64) -> StatsResult<Vec<ResultRecord>>;

    async fn save_statistics(&mut self, stats: &UserStatistics) -> StatsResult<()>;

    async fn commit(self) -> StatsResult<()>;
}
