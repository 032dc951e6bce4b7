//! Registration ledger data models.

use crate::tournament::models::{RegistrationEligibility, registration_eligibility};
use crate::tournament::{TournamentId, TournamentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::counters::CounterChange;

/// Registration ID type
pub type RegistrationId = i64;

/// Attendance status of a registration, independent of waitlist state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::NoShow => "no-show",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "no-show" => Ok(RegistrationStatus::NoShow),
            other => Err(format!("unknown registration status '{other}'")),
        }
    }
}

/// A user's entry in a tournament, active or waitlisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: RegistrationId,
    pub user_id: i64,
    pub tournament_id: TournamentId,
    pub registration_date: DateTime<Utc>,
    pub status: RegistrationStatus,
    pub is_waitlist: bool,
    pub notes: Option<String>,
}

/// Raw `tournament_registrations` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    pub id: RegistrationId,
    pub user_id: i64,
    pub tournament_id: TournamentId,
    pub registration_date: DateTime<Utc>,
    pub status: String,
    pub is_waitlist: bool,
    pub notes: Option<String>,
}

pub(crate) const REGISTRATION_COLUMNS: &str =
    "id, user_id, tournament_id, registration_date, status, is_waitlist, notes";

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|e| {
            log::warn!("registration {}: {}", row.id, e);
            RegistrationStatus::Confirmed
        });
        Self {
            id: row.id,
            user_id: row.user_id,
            tournament_id: row.tournament_id,
            registration_date: row.registration_date,
            status,
            is_waitlist: row.is_waitlist,
            notes: row.notes,
        }
    }
}

/// Capacity snapshot of a tournament, read under lock by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSlot {
    pub tournament_id: TournamentId,
    pub max_participants: i32,
    pub current_participants: i32,
    pub waitlist_count: i32,
    pub status: TournamentStatus,
    pub registration_open: bool,
    pub registration_deadline: Option<DateTime<Utc>>,
}

impl TournamentSlot {
    /// Open, upcoming tournament with no entries
    pub fn open(tournament_id: TournamentId, max_participants: i32) -> Self {
        Self {
            tournament_id,
            max_participants,
            current_participants: 0,
            waitlist_count: 0,
            status: TournamentStatus::Upcoming,
            registration_open: true,
            registration_deadline: None,
        }
    }

    pub fn eligibility(&self, now: DateTime<Utc>) -> RegistrationEligibility {
        registration_eligibility(
            self.status,
            self.registration_open,
            self.registration_deadline,
            self.current_participants,
            self.max_participants,
            now,
        )
    }

    pub fn has_free_slot(&self) -> bool {
        self.current_participants < self.max_participants
    }
}

/// Whether a new registration takes a seat or joins the waitlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Waitlisted,
}

impl Admission {
    /// Waitlist exactly when every seat is taken
    pub fn decide(current_participants: i32, max_participants: i32) -> Self {
        if current_participants >= max_participants {
            Admission::Waitlisted
        } else {
            Admission::Admitted
        }
    }

    pub fn is_waitlist(self) -> bool {
        self == Admission::Waitlisted
    }

    pub(crate) fn counter_change(self) -> CounterChange {
        match self {
            Admission::Admitted => CounterChange::AdmitParticipant,
            Admission::Waitlisted => CounterChange::JoinWaitlist,
        }
    }
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub registration_id: RegistrationId,
    pub is_waitlist: bool,
    /// 1-based seat number, or waitlist rank when waitlisted
    pub position: i32,
}

/// Result of an unregistration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterOutcome {
    pub was_waitlisted: bool,
    /// User moved off the waitlist into the freed seat
    pub promoted_user_id: Option<i64>,
}

/// Result of a waitlist promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionOutcome {
    pub registration_id: RegistrationId,
    pub user_id: i64,
    pub current_participants: i32,
    pub waitlist_count: i32,
}

/// Participant listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub registration_id: RegistrationId,
    pub user_id: i64,
    pub username: Option<String>,
    pub registration_date: DateTime<Utc>,
    pub status: String,
    pub is_waitlist: bool,
    /// 1-based rank, only for waitlisted entries
    pub waitlist_position: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_rule() {
        assert_eq!(Admission::decide(0, 2), Admission::Admitted);
        assert_eq!(Admission::decide(1, 2), Admission::Admitted);
        assert_eq!(Admission::decide(2, 2), Admission::Waitlisted);
        // Over-full tournaments (capacity lowered by an admin) still waitlist
        assert_eq!(Admission::decide(5, 2), Admission::Waitlisted);
    }

    #[test]
    fn test_registration_status_strings() {
        assert_eq!("no-show".parse(), Ok(RegistrationStatus::NoShow));
        assert_eq!(RegistrationStatus::Cancelled.as_str(), "cancelled");
        assert!("maybe".parse::<RegistrationStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&RegistrationStatus::NoShow).unwrap(),
            "\"no-show\""
        );
    }

    #[test]
    fn test_slot_eligibility() {
        let now = Utc::now();
        let mut slot = TournamentSlot::open(1, 1);
        assert!(slot.eligibility(now).can_register);

        slot.current_participants = 1;
        assert!(!slot.has_free_slot());
        assert!(slot.eligibility(now).can_waitlist);

        slot.registration_open = false;
        assert!(!slot.eligibility(now).accepts_registration());
    }
}
