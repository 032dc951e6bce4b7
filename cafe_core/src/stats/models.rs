//! Results, per-user statistics and leaderboard rows.

use crate::tournament::{TournamentId, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most games one result may report as won or lost
pub const MAX_GAMES_PER_RESULT: i32 = 10_000;

/// Outcome of one user in one tournament, as submitted by an organizer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultInput {
    /// 1 for the winner
    pub final_position: i32,
    pub games_won: i32,
    pub games_lost: i32,
    pub hours_played: f64,
    pub prize_won: f64,
    /// Completed a D&D campaign
    pub campaign_completed: bool,
}

impl ResultInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.final_position < 1 {
            errors.push("Final position must be at least 1");
        }
        if self.games_won < 0 || self.games_lost < 0 {
            errors.push("Game counts cannot be negative");
        }
        if self.games_won > MAX_GAMES_PER_RESULT || self.games_lost > MAX_GAMES_PER_RESULT {
            errors.push(format!("Game counts cannot exceed {MAX_GAMES_PER_RESULT}"));
        }
        if self.hours_played < 0.0 || self.hours_played.is_nan() {
            errors.push("Hours played cannot be negative");
        }
        if self.prize_won < 0.0 || self.prize_won.is_nan() {
            errors.push("Prize cannot be negative");
        }
        errors.into_result()
    }

    pub fn is_win(&self) -> bool {
        self.final_position == 1
    }

    pub fn is_podium(&self) -> bool {
        self.final_position <= 3
    }
}

/// Stored `tournament_results` row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: i64,
    pub tournament_id: TournamentId,
    pub user_id: i64,
    pub final_position: i32,
    pub games_won: i32,
    pub games_lost: i32,
    pub hours_played: f64,
    pub prize_won: f64,
    pub campaign_completed: bool,
    pub recorded_at: DateTime<Utc>,
}

impl From<&ResultRecord> for ResultInput {
    fn from(record: &ResultRecord) -> Self {
        Self {
            final_position: record.final_position,
            games_won: record.games_won,
            games_lost: record.games_lost,
            hours_played: record.hours_played,
            prize_won: record.prize_won,
            campaign_completed: record.campaign_completed,
        }
    }
}

pub(crate) const RESULT_COLUMNS: &str = "id, tournament_id, user_id, final_position, games_won, \
     games_lost, hours_played, prize_won, campaign_completed, recorded_at";

/// Aggregate statistics of one user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub user_id: i64,
    pub tournaments_played: i32,
    pub tournaments_won: i32,
    pub tournaments_podium: i32,
    pub total_games_played: i32,
    pub total_hours_played: f64,
    pub total_prize_money: f64,
    pub highest_prize_won: f64,
    pub current_win_streak: i32,
    pub longest_win_streak: i32,
    pub dnd_campaigns_completed: i32,
    /// Percentage with two decimals, e.g. `"66.67"`
    pub win_rate: String,
    pub updated_at: Option<DateTime<Utc>>,
}

pub(crate) const STATISTICS_COLUMNS: &str = "user_id, tournaments_played, tournaments_won, \
     tournaments_podium, total_games_played, total_hours_played, total_prize_money, \
     highest_prize_won, current_win_streak, longest_win_streak, dnd_campaigns_completed, \
     win_rate, updated_at";

/// `won / played * 100` with two decimals; `"0.00"` before any tournament
pub fn format_win_rate(won: i32, played: i32) -> String {
    if played <= 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", f64::from(won) / f64::from(played) * 100.0)
}

impl UserStatistics {
    /// All-zero statistics for a user without results
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            tournaments_played: 0,
            tournaments_won: 0,
            tournaments_podium: 0,
            total_games_played: 0,
            total_hours_played: 0.0,
            total_prize_money: 0.0,
            highest_prize_won: 0.0,
            current_win_streak: 0,
            longest_win_streak: 0,
            dnd_campaigns_completed: 0,
            win_rate: format_win_rate(0, 0),
            updated_at: None,
        }
    }

    /// Fold one tournament result into the aggregates
    pub fn apply_result(&mut self, result: &ResultInput, now: DateTime<Utc>) {
        self.tournaments_played = self.tournaments_played.saturating_add(1);
        self.total_games_played = self
            .total_games_played
            .saturating_add(result.games_won.saturating_add(result.games_lost));
        self.total_hours_played += result.hours_played;
        self.total_prize_money += result.prize_won;

        if result.is_win() {
            self.tournaments_won = self.tournaments_won.saturating_add(1);
            self.current_win_streak = self.current_win_streak.saturating_add(1);
            self.longest_win_streak = self.longest_win_streak.max(self.current_win_streak);
            self.highest_prize_won = self.highest_prize_won.max(result.prize_won);
        } else {
            self.current_win_streak = 0;
        }

        if result.is_podium() {
            self.tournaments_podium = self.tournaments_podium.saturating_add(1);
        }
        if result.campaign_completed {
            self.dnd_campaigns_completed = self.dnd_campaigns_completed.saturating_add(1);
        }

        self.win_rate = format_win_rate(self.tournaments_won, self.tournaments_played);
        self.updated_at = Some(now);
    }

    /// Statistics folded from stored results, oldest submission first
    pub fn rebuild(user_id: i64, results: &[ResultRecord], now: DateTime<Utc>) -> Self {
        let mut stats = Self::empty(user_id);
        for record in results {
            stats.apply_result(&ResultInput::from(record), now);
        }
        stats
    }

    /// Win rate as a number, for sorting
    pub fn win_rate_value(&self) -> f64 {
        self.win_rate.parse().unwrap_or(0.0)
    }
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: Option<String>,
    pub tournaments_played: i32,
    pub tournaments_won: i32,
    pub tournaments_podium: i32,
    pub win_rate: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(prize: f64) -> ResultInput {
        ResultInput {
            final_position: 1,
            prize_won: prize,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_win() {
        let mut stats = UserStatistics::empty(5);
        stats.apply_result(
            &ResultInput {
                final_position: 1,
                prize_won: 50.0,
                games_won: 3,
                games_lost: 1,
                hours_played: 2.0,
                campaign_completed: false,
            },
            Utc::now(),
        );

        assert_eq!(stats.tournaments_played, 1);
        assert_eq!(stats.tournaments_won, 1);
        assert_eq!(stats.tournaments_podium, 1);
        assert_eq!(stats.total_games_played, 4);
        assert_eq!(stats.current_win_streak, 1);
        assert_eq!(stats.longest_win_streak, 1);
        assert_eq!(stats.highest_prize_won, 50.0);
        assert_eq!(stats.win_rate, "100.00");
    }

    #[test]
    fn test_streak_resets_but_longest_stays() {
        let mut stats = UserStatistics::empty(5);
        let now = Utc::now();
        stats.apply_result(&win(10.0), now);
        stats.apply_result(&win(30.0), now);
        stats.apply_result(
            &ResultInput {
                final_position: 4,
                ..Default::default()
            },
            now,
        );

        assert_eq!(stats.current_win_streak, 0);
        assert_eq!(stats.longest_win_streak, 2);
        assert_eq!(stats.highest_prize_won, 30.0);
        assert_eq!(stats.tournaments_podium, 2);
        assert_eq!(stats.win_rate, "66.67");
    }

    #[test]
    fn test_rebuild_matches_folding() {
        let now = Utc::now();
        let record = |id: i64, final_position: i32| ResultRecord {
            id,
            tournament_id: id,
            user_id: 5,
            final_position,
            games_won: 2,
            games_lost: 1,
            hours_played: 1.5,
            prize_won: 0.0,
            campaign_completed: false,
            recorded_at: now,
        };
        let results = [record(1, 1), record(2, 1), record(3, 5)];

        let mut folded = UserStatistics::empty(5);
        for r in &results {
            folded.apply_result(&ResultInput::from(r), now);
        }
        let rebuilt = UserStatistics::rebuild(5, &results, now);

        assert_eq!(rebuilt, folded);
        assert_eq!(rebuilt.tournaments_won, 2);
        assert_eq!(rebuilt.longest_win_streak, 2);
        assert_eq!(rebuilt.current_win_streak, 0);
        assert_eq!(rebuilt.total_games_played, 9);
        assert_eq!(UserStatistics::rebuild(5, &[], now).tournaments_played, 0);
    }

    #[test]
    fn test_win_rate_formatting() {
        assert_eq!(format_win_rate(0, 0), "0.00");
        assert_eq!(format_win_rate(1, 3), "33.33");
        assert_eq!(format_win_rate(0, 4), "0.00");
        assert_eq!(UserStatistics::empty(1).win_rate_value(), 0.0);
    }

    #[test]
    fn test_input_validation() {
        assert!(win(0.0).validate().is_ok());
        let bad = ResultInput {
            final_position: 0,
            games_won: -1,
            prize_won: -5.0,
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().messages().len(), 3);
    }

    #[test]
    fn test_game_counts_are_bounded() {
        let huge = ResultInput {
            final_position: 2,
            games_won: i32::MAX,
            games_lost: 1,
            ..Default::default()
        };
        let errors = huge.validate().unwrap_err();
        assert_eq!(
            errors.messages(),
            ["Game counts cannot exceed 10000".to_string()]
        );

        let busy = ResultInput {
            final_position: 2,
            games_won: MAX_GAMES_PER_RESULT,
            games_lost: MAX_GAMES_PER_RESULT,
            ..Default::default()
        };
        assert!(busy.validate().is_ok());
    }

    #[test]
    fn test_totals_saturate() {
        let mut stats = UserStatistics::empty(5);
        stats.total_games_played = i32::MAX - 1;
        stats.apply_result(
            &ResultInput {
                final_position: 2,
                games_won: i32::MAX,
                games_lost: 1,
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(stats.total_games_played, i32::MAX);
        assert_eq!(stats.tournaments_played, 1);
    }

    #[test]
    fn test_input_json_defaults() {
        let input: ResultInput =
            serde_json::from_str(r#"{"finalPosition": 2, "campaignCompleted": true}"#).unwrap();
        assert_eq!(input.final_position, 2);
        assert_eq!(input.games_won, 0);
        assert!(input.campaign_completed);
    }
}
