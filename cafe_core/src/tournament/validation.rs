//! Create/update payload validation.
//!
//! Validation never stops at the first problem: every violated rule is
//! collected so a client can fix its form in one round trip.

use super::models::{Tournament, TournamentFormat, TournamentStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Minimum title length in characters
pub const MIN_TITLE_LEN: usize = 3;

/// Every rule a payload violated
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Tournament payload as submitted by an organizer
///
/// Enumerated fields stay strings here so that an unknown value is reported
/// as a validation error instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TournamentDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub game_id: Option<i64>,
    pub category: Option<String>,
    pub format: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub min_participants: Option<i32>,
    pub max_participants: Option<i32>,
    pub entry_fee: Option<f64>,
    pub prizes: Option<Vec<Value>>,
    pub rules: Option<Vec<Value>>,
    pub included: Option<Vec<Value>>,
    pub party_composition: Option<Vec<Value>>,
    pub status: Option<String>,
    pub registration_open: Option<bool>,
}

/// Default seat count when a draft leaves it out
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 16;

/// Default minimum when a draft leaves it out
pub const DEFAULT_MIN_PARTICIPANTS: i32 = 2;

impl TournamentDraft {
    /// Check every rule and report all violations together
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title_len = self
            .title
            .as_deref()
            .map(|t| t.trim().chars().count())
            .unwrap_or(0);
        if title_len < MIN_TITLE_LEN {
            errors.push(format!(
                "Title must be at least {MIN_TITLE_LEN} characters"
            ));
        }

        if self.game_id.is_none() {
            errors.push("Game is required");
        }

        match (self.start_date, self.end_date) {
            (None, _) => errors.push("Start date is required"),
            (Some(start), Some(end)) if end < start => {
                errors.push("End date cannot be before start date")
            }
            _ => {}
        }

        let min = self.min_participants.unwrap_or(DEFAULT_MIN_PARTICIPANTS);
        let max = self.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
        if max < 1 {
            errors.push("Maximum participants must be at least 1");
        }
        if min < 0 {
            errors.push("Minimum participants cannot be negative");
        }
        if min > max {
            errors.push("Minimum participants cannot exceed maximum participants");
        }

        if self.entry_fee.is_some_and(|fee| fee < 0.0 || fee.is_nan()) {
            errors.push("Entry fee cannot be negative");
        }

        if let Some(status) = self.status.as_deref() {
            if status.parse::<TournamentStatus>().is_err() {
                errors.push(format!(
                    "Status must be one of: {}",
                    TournamentStatus::ALL.map(|s| s.as_str()).join(", ")
                ));
            }
        }

        if let Some(format) = self.format.as_deref() {
            if format.parse::<TournamentFormat>().is_err() {
                errors.push(format!(
                    "Format must be one of: {}",
                    TournamentFormat::ALL.map(|f| f.as_str()).join(", ")
                ));
            }
        }

        errors.into_result()
    }

    /// Draft describing an existing tournament, used to re-validate updates
    pub fn from_tournament(tournament: &Tournament) -> Self {
        Self {
            title: Some(tournament.title.clone()),
            description: tournament.description.clone(),
            game_id: Some(tournament.game_id),
            category: Some(tournament.category.clone()),
            format: Some(tournament.format.as_str().to_string()),
            start_date: Some(tournament.start_date),
            end_date: tournament.end_date,
            registration_deadline: tournament.registration_deadline,
            min_participants: Some(tournament.min_participants),
            max_participants: Some(tournament.max_participants),
            entry_fee: Some(tournament.entry_fee),
            prizes: Some(tournament.prizes.clone()),
            rules: Some(tournament.rules.clone()),
            included: Some(tournament.included.clone()),
            party_composition: Some(tournament.party_composition.clone()),
            status: Some(tournament.status.as_str().to_string()),
            registration_open: Some(tournament.registration_open),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn valid_draft() -> TournamentDraft {
        TournamentDraft {
            title: Some("Carcassonne Open".to_string()),
            game_id: Some(4),
            start_date: Some(Utc.with_ymd_and_hms(2030, 1, 5, 18, 0, 0).unwrap()),
            max_participants: Some(12),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let draft = TournamentDraft {
            title: Some("ab".to_string()),
            start_date: None,
            ..Default::default()
        };

        let errors = draft.validate().unwrap_err();
        let message = errors.to_string();
        assert!(message.contains("Title must be at least 3 characters"));
        assert!(message.contains("Start date is required"));
        assert!(message.contains("Game is required"));
        assert_eq!(errors.messages().len(), 3);
    }

    #[test]
    fn test_date_order_and_capacity_rules() {
        let mut draft = valid_draft();
        draft.end_date = Some(draft.start_date.unwrap() - chrono::Duration::hours(1));
        draft.min_participants = Some(10);
        draft.max_participants = Some(4);
        draft.entry_fee = Some(-2.5);

        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.messages(),
            &[
                "End date cannot be before start date".to_string(),
                "Minimum participants cannot exceed maximum participants".to_string(),
                "Entry fee cannot be negative".to_string(),
            ]
        );
    }

    #[test]
    fn test_enumerated_fields() {
        let mut draft = valid_draft();
        draft.status = Some("postponed".to_string());
        draft.format = Some("ladder".to_string());

        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.messages().len(), 2);
        assert!(errors.messages()[0].starts_with("Status must be one of"));
        assert!(errors.messages()[1].contains("round_robin"));
    }

    #[test]
    fn test_whitespace_title_is_too_short() {
        let mut draft = valid_draft();
        draft.title = Some("  a  ".to_string());
        assert!(draft.validate().is_err());
    }
}
