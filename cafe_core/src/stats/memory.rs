//! In-memory statistics backend for tests and local tooling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use super::badges::{Badge, BadgeKind};
use super::errors::StatsResult;
use super::models::{LeaderboardEntry, ResultInput, ResultRecord, UserStatistics};
use super::store::{StatisticsStore, StatisticsTx, UpsertedResult};
use crate::tournament::TournamentId;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tournaments: HashSet<TournamentId>,
    usernames: HashMap<i64, String>,
    results: Vec<ResultRecord>,
    statistics: HashMap<i64, UserStatistics>,
    badges: Vec<Badge>,
    next_id: i64,
    fail_badge_writes: bool,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-backed implementation of `StatisticsStore`
#[derive(Clone, Default)]
pub struct MemoryStatisticsStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a store that is still being built
    ///
    /// # Panics
    ///
    /// If a transaction is open; seeding happens before the store is shared.
    fn seed(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .try_lock()
            .expect("memory store seeded while a transaction is open")
    }

    /// Seed a tournament results can be recorded against
    pub fn with_tournament(self, tournament_id: TournamentId) -> Self {
        self.seed().tournaments.insert(tournament_id);
        self
    }

    pub fn with_user(self, user_id: i64, username: &str) -> Self {
        self.seed().usernames.insert(user_id, username.to_string());
        self
    }

    /// Make every badge insert fail with a database error
    pub fn with_failing_badge_writes(self) -> Self {
        self.seed().fail_badge_writes = true;
        self
    }

    /// Stored result rows, for assertions
    pub async fn results(&self) -> Vec<ResultRecord> {
        self.state.lock().await.results.clone()
    }
}

pub struct MemoryStatisticsTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StatisticsStore for MemoryStatisticsStore {
    type Tx = MemoryStatisticsTx;

    async fn begin(&self) -> StatsResult<MemoryStatisticsTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryStatisticsTx { guard, working })
    }

    async fn statistics(&self, user_id: i64) -> StatsResult<Option<UserStatistics>> {
        Ok(self.state.lock().await.statistics.get(&user_id).cloned())
    }

    async fn badges(&self, user_id: i64) -> StatsResult<Vec<Badge>> {
        let state = self.state.lock().await;
        Ok(state
            .badges
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_badge(
        &self,
        user_id: i64,
        kind: BadgeKind,
        earned_at: DateTime<Utc>,
    ) -> StatsResult<Option<Badge>> {
        let mut state = self.state.lock().await;
        if state.fail_badge_writes {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        if state
            .badges
            .iter()
            .any(|b| b.user_id == user_id && b.badge_name == kind.name())
        {
            return Ok(None);
        }

        let badge = Badge {
            id: state.next_id(),
            user_id,
            badge_name: kind.name().to_string(),
            badge_type: kind.badge_type().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            earned_date: earned_at,
        };
        state.badges.push(badge.clone());
        Ok(Some(badge))
    }

    async fn leaderboard(&self, limit: i64) -> StatsResult<Vec<LeaderboardEntry>> {
        let state = self.state.lock().await;
        let mut ranked: Vec<&UserStatistics> = state
            .statistics
            .values()
            .filter(|s| s.tournaments_played > 0)
            .collect();
        ranked.sort_by(|a, b| {
            b.tournaments_won
                .cmp(&a.tournaments_won)
                .then(b.win_rate_value().total_cmp(&a.win_rate_value()))
                .then(b.tournaments_played.cmp(&a.tournaments_played))
                .then(a.user_id.cmp(&b.user_id))
        });

        Ok(ranked
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|s| LeaderboardEntry {
                user_id: s.user_id,
                username: state.usernames.get(&s.user_id).cloned(),
                tournaments_played: s.tournaments_played,
                tournaments_won: s.tournaments_won,
                tournaments_podium: s.tournaments_podium,
                win_rate: s.win_rate.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl StatisticsTx for MemoryStatisticsTx {
    async fn tournament_exists(&mut self, tournament_id: TournamentId) -> StatsResult<bool> {
        Ok(self.working.tournaments.contains(&tournament_id))
    }

    async fn upsert_result(
        &mut self,
        user_id: i64,
        tournament_id: TournamentId,
        input: &ResultInput,
        recorded_at: DateTime<Utc>,
    ) -> StatsResult<UpsertedResult> {
        let existing = self
            .working
            .results
            .iter()
            .position(|r| r.tournament_id == tournament_id && r.user_id == user_id);
        let id = match existing {
            Some(index) => self.working.results[index].id,
            None => self.working.next_id(),
        };

        let record = ResultRecord {
            id,
            tournament_id,
            user_id,
            final_position: input.final_position,
            games_won: input.games_won,
            games_lost: input.games_lost,
            hours_played: input.hours_played,
            prize_won: input.prize_won,
            campaign_completed: input.campaign_completed,
            recorded_at,
        };

        match existing {
            Some(index) => self.working.results[index] = record.clone(),
            None => self.working.results.push(record.clone()),
        }

        Ok(UpsertedResult {
            record,
            inserted: existing.is_none(),
        })
    }

    async fn lock_statistics(&mut self, user_id: i64) -> StatsResult<UserStatistics> {
        Ok(self
            .working
            .statistics
            .entry(user_id)
            .or_insert_with(|| UserStatistics::empty(user_id))
            .clone())
    }

    async fn user_results(&mut self, user_id: i64) -> StatsResult<Vec<ResultRecord>> {
        let mut results: Vec<ResultRecord> = self
            .working
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.id);
        Ok(results)
    }

    async fn save_statistics(&mut self, stats: &UserStatistics) -> StatsResult<()> {
        self.working.statistics.insert(stats.user_id, stats.clone());
        Ok(())
    }

    async fn commit(self) -> StatsResult<()> {
        let MemoryStatisticsTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
