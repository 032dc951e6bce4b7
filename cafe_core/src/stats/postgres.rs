//! PostgreSQL statistics backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use super::badges::{BADGE_COLUMNS, Badge, BadgeKind};
use super::errors::StatsResult;
use super::models::{
    LeaderboardEntry, RESULT_COLUMNS, ResultInput, ResultRecord, STATISTICS_COLUMNS,
    UserStatistics,
};
use super::store::{StatisticsStore, StatisticsTx, UpsertedResult};
use crate::tournament::TournamentId;

/// Default PostgreSQL implementation of `StatisticsStore`
#[derive(Clone)]
pub struct PgStatisticsStore {
    pool: Arc<PgPool>,
}

impl PgStatisticsStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

pub struct PgStatisticsTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    record: ResultRecord,
    inserted: bool,
}

#[async_trait]
impl StatisticsStore for PgStatisticsStore {
    type Tx = PgStatisticsTx;

    async fn begin(&self) -> StatsResult<PgStatisticsTx> {
        Ok(PgStatisticsTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn statistics(&self, user_id: i64) -> StatsResult<Option<UserStatistics>> {
        let stats = sqlx::query_as::<_, UserStatistics>(&format!(
            "SELECT {STATISTICS_COLUMNS} FROM user_statistics WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(stats)
    }

    async fn badges(&self, user_id: i64) -> StatsResult<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLUMNS} FROM user_badges WHERE user_id = $1 ORDER BY earned_date, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(badges)
    }

    async fn insert_badge(
        &self,
        user_id: i64,
        kind: BadgeKind,
        earned_at: DateTime<Utc>,
    ) -> StatsResult<Option<Badge>> {
        let badge = sqlx::query_as::<_, Badge>(&format!(
            "INSERT INTO user_badges (user_id, badge_name, badge_type, description, icon, earned_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, badge_name) DO NOTHING
             RETURNING {BADGE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(kind.name())
        .bind(kind.badge_type())
        .bind(kind.description())
        .bind(kind.icon())
        .bind(earned_at)
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(badge)
    }

    async fn leaderboard(&self, limit: i64) -> StatsResult<Vec<LeaderboardEntry>> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT s.user_id, u.username, s.tournaments_played, s.tournaments_won,
                   s.tournaments_podium, s.win_rate
            FROM user_statistics s
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.tournaments_played > 0
            ORDER BY s.tournaments_won DESC,
                     CAST(s.win_rate AS NUMERIC) DESC,
                     s.tournaments_played DESC,
                     s.user_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(entries)
    }
}

#[async_trait]
impl StatisticsTx for PgStatisticsTx {
    async fn tournament_exists(&mut self, tournament_id: TournamentId) -> StatsResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tournaments WHERE id = $1)")
                .bind(tournament_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn upsert_result(
        &mut self,
        user_id: i64,
        tournament_id: TournamentId,
        input: &ResultInput,
        recorded_at: DateTime<Utc>,
    ) -> StatsResult<UpsertedResult> {
        // xmax is zero only for a freshly inserted tuple
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r#"
            INSERT INTO tournament_results (tournament_id, user_id, final_position, games_won,
                                            games_lost, hours_played, prize_won,
                                            campaign_completed, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (tournament_id, user_id) DO UPDATE
            SET final_position = EXCLUDED.final_position,
                games_won = EXCLUDED.games_won,
                games_lost = EXCLUDED.games_lost,
                hours_played = EXCLUDED.hours_played,
                prize_won = EXCLUDED.prize_won,
                campaign_completed = EXCLUDED.campaign_completed,
                recorded_at = EXCLUDED.recorded_at
            RETURNING {RESULT_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(tournament_id)
        .bind(user_id)
        .bind(input.final_position)
        .bind(input.games_won)
        .bind(input.games_lost)
        .bind(input.hours_played)
        .bind(input.prize_won)
        .bind(input.campaign_completed)
        .bind(recorded_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(UpsertedResult {
            record: row.record,
            inserted: row.inserted,
        })
    }

    async fn lock_statistics(&mut self, user_id: i64) -> StatsResult<UserStatistics> {
        sqlx::query("INSERT INTO user_statistics (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        let stats = sqlx::query_as::<_, UserStatistics>(&format!(
            "SELECT {STATISTICS_COLUMNS} FROM user_statistics WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(stats)
    }

    async fn user_results(&mut self, user_id: i64) -> StatsResult<Vec<ResultRecord>> {
        let results = sqlx::query_as::<_, ResultRecord>(&format!(
            "SELECT {RESULT_COLUMNS} FROM tournament_results WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(results)
    }

    async fn save_statistics(&mut self, stats: &UserStatistics) -> StatsResult<()> {
        sqlx::query(
            r#"
            UPDATE user_statistics
            SET tournaments_played = $2, tournaments_won = $3, tournaments_podium = $4,
                total_games_played = $5, total_hours_played = $6, total_prize_money = $7,
                highest_prize_won = $8, current_win_streak = $9, longest_win_streak = $10,
                dnd_campaigns_completed = $11, win_rate = $12, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(stats.user_id)
        .bind(stats.tournaments_played)
        .bind(stats.tournaments_won)
        .bind(stats.tournaments_podium)
        .bind(stats.total_games_played)
        .bind(stats.total_hours_played)
        .bind(stats.total_prize_money)
        .bind(stats.highest_prize_won)
        .bind(stats.current_win_streak)
        .bind(stats.longest_win_streak)
        .bind(stats.dnd_campaigns_completed)
        .bind(&stats.win_rate)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> StatsResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
