//! Badge catalogue and award rules.

use super::models::UserStatistics;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The fixed set of badges a user can earn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKind {
    PrimoPasso,
    PrimoTrionfo,
    Campione,
    Veterano,
    Inarrestabile,
    Avventuriero,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 6] = [
        BadgeKind::PrimoPasso,
        BadgeKind::PrimoTrionfo,
        BadgeKind::Campione,
        BadgeKind::Veterano,
        BadgeKind::Inarrestabile,
        BadgeKind::Avventuriero,
    ];

    /// Stored `badge_name`
    pub fn name(self) -> &'static str {
        match self {
            BadgeKind::PrimoPasso => "Primo Passo",
            BadgeKind::PrimoTrionfo => "Primo Trionfo",
            BadgeKind::Campione => "Campione",
            BadgeKind::Veterano => "Veterano",
            BadgeKind::Inarrestabile => "Inarrestabile",
            BadgeKind::Avventuriero => "Avventuriero",
        }
    }

    pub fn badge_type(self) -> &'static str {
        match self {
            BadgeKind::PrimoPasso | BadgeKind::Veterano => "participation",
            BadgeKind::PrimoTrionfo | BadgeKind::Campione => "victory",
            BadgeKind::Inarrestabile => "streak",
            BadgeKind::Avventuriero => "campaign",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BadgeKind::PrimoPasso => "Hai partecipato al tuo primo torneo",
            BadgeKind::PrimoTrionfo => "Hai vinto il tuo primo torneo",
            BadgeKind::Campione => "Hai vinto 5 tornei",
            BadgeKind::Veterano => "Hai partecipato a 10 tornei",
            BadgeKind::Inarrestabile => "Hai vinto 3 tornei di fila",
            BadgeKind::Avventuriero => "Hai completato una campagna di D&D",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            BadgeKind::PrimoPasso => "🎲",
            BadgeKind::PrimoTrionfo => "🏆",
            BadgeKind::Campione => "👑",
            BadgeKind::Veterano => "🎖️",
            BadgeKind::Inarrestabile => "🔥",
            BadgeKind::Avventuriero => "🐉",
        }
    }

    /// Threshold rule
    pub fn is_earned(self, stats: &UserStatistics) -> bool {
        match self {
            BadgeKind::PrimoPasso => stats.tournaments_played >= 1,
            BadgeKind::PrimoTrionfo => stats.tournaments_won >= 1,
            BadgeKind::Campione => stats.tournaments_won >= 5,
            BadgeKind::Veterano => stats.tournaments_played >= 10,
            BadgeKind::Inarrestabile => stats.current_win_streak >= 3,
            BadgeKind::Avventuriero => stats.dnd_campaigns_completed >= 1,
        }
    }
}

/// Badges earned by `stats` that the user doesn't hold yet, in catalogue order
pub fn eligible_badges<S: AsRef<str>>(stats: &UserStatistics, held: &[S]) -> Vec<BadgeKind> {
    BadgeKind::ALL
        .into_iter()
        .filter(|kind| kind.is_earned(stats))
        .filter(|kind| !held.iter().any(|name| name.as_ref() == kind.name()))
        .collect()
}

/// Stored `user_badges` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub user_id: i64,
    pub badge_name: String,
    pub badge_type: String,
    pub description: String,
    pub icon: String,
    pub earned_date: DateTime<Utc>,
}

pub(crate) const BADGE_COLUMNS: &str =
    "id, user_id, badge_name, badge_type, description, icon, earned_date";

/// Result of the best-effort badge step after recording a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BadgeAward {
    /// Newly awarded badges, possibly none
    Awarded { badges: Vec<Badge> },
    /// Awarding failed; the recorded result stands
    Failed { error: String },
}

impl BadgeAward {
    pub fn awarded(&self) -> &[Badge] {
        match self {
            BadgeAward::Awarded { badges } => badges,
            BadgeAward::Failed { .. } => &[],
        }
    }
}
