//! Tournament domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Tournament ID type
pub type TournamentId = i64;

/// Stored tournament status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Scheduled, may accept registrations
    Upcoming,
    /// In play
    Ongoing,
    /// Finished
    Completed,
    /// Called off
    Cancelled,
}

impl TournamentStatus {
    pub const ALL: [TournamentStatus; 4] = [
        TournamentStatus::Upcoming,
        TournamentStatus::Ongoing,
        TournamentStatus::Completed,
        TournamentStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Completed => "completed",
            TournamentStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown tournament status '{s}'"))
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bracket or play format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
    /// Multi-session role-playing campaign
    Campaign,
    Casual,
}

impl TournamentFormat {
    pub const ALL: [TournamentFormat; 6] = [
        TournamentFormat::SingleElimination,
        TournamentFormat::DoubleElimination,
        TournamentFormat::RoundRobin,
        TournamentFormat::Swiss,
        TournamentFormat::Campaign,
        TournamentFormat::Casual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single_elimination",
            TournamentFormat::DoubleElimination => "double_elimination",
            TournamentFormat::RoundRobin => "round_robin",
            TournamentFormat::Swiss => "swiss",
            TournamentFormat::Campaign => "campaign",
            TournamentFormat::Casual => "casual",
        }
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("unknown tournament format '{s}'"))
    }
}

/// Raw `tournaments` row as stored
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TournamentRow {
    pub id: TournamentId,
    pub title: String,
    pub description: Option<String>,
    pub game_id: i64,
    pub category: String,
    pub format: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub min_participants: i32,
    pub max_participants: i32,
    pub current_participants: i32,
    pub waitlist_count: i32,
    pub entry_fee: f64,
    pub prizes: Option<String>,
    pub rules: Option<String>,
    pub included: Option<String>,
    pub party_composition: Option<String>,
    pub status: String,
    pub registration_open: bool,
    pub organizer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`TournamentRow`]
pub(crate) const TOURNAMENT_COLUMNS: &str = "id, title, description, game_id, category, format, \
     start_date, end_date, registration_deadline, min_participants, max_participants, \
     current_participants, waitlist_count, entry_fee, prizes, rules, included, \
     party_composition, status, registration_open, organizer_id, created_at, updated_at";

/// Tournament domain object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub description: Option<String>,
    pub game_id: i64,
    pub category: String,
    pub format: TournamentFormat,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub min_participants: i32,
    pub max_participants: i32,
    pub current_participants: i32,
    pub waitlist_count: i32,
    pub entry_fee: f64,
    pub prizes: Vec<Value>,
    pub rules: Vec<Value>,
    pub included: Vec<Value>,
    pub party_composition: Vec<Value>,
    pub status: TournamentStatus,
    pub registration_open: bool,
    pub organizer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of the registration eligibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEligibility {
    pub can_register: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub can_waitlist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RegistrationEligibility {
    fn open() -> Self {
        Self {
            can_register: true,
            can_waitlist: false,
            reason: None,
        }
    }

    fn waitlist_only() -> Self {
        Self {
            can_register: false,
            can_waitlist: true,
            reason: Some("Tournament is full".to_string()),
        }
    }

    fn closed(reason: &str) -> Self {
        Self {
            can_register: false,
            can_waitlist: false,
            reason: Some(reason.to_string()),
        }
    }

    /// Whether a registration attempt would be accepted, admitted or waitlisted
    pub fn accepts_registration(&self) -> bool {
        self.can_register || self.can_waitlist
    }
}

/// Decode a JSON array column, falling back to empty on anything malformed
pub fn parse_json_array(raw: Option<&str>) -> Vec<Value> {
    match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Array(items))) => items,
        Some(Ok(_)) | Some(Err(_)) => {
            log::debug!("Ignoring malformed JSON array column");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn encode_json_array(items: &[Value]) -> Option<String> {
    Some(Value::Array(items.to_vec()).to_string())
}

impl Tournament {
    /// Build the domain object from a stored row
    ///
    /// Unknown status or format strings degrade to `upcoming` and
    /// `single_elimination` rather than failing the whole read.
    pub fn from_row(row: TournamentRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|e| {
            log::warn!("tournament {}: {}", row.id, e);
            TournamentStatus::Upcoming
        });
        let format = row.format.parse().unwrap_or_else(|e| {
            log::warn!("tournament {}: {}", row.id, e);
            TournamentFormat::SingleElimination
        });

        Self {
            id: row.id,
            prizes: parse_json_array(row.prizes.as_deref()),
            rules: parse_json_array(row.rules.as_deref()),
            included: parse_json_array(row.included.as_deref()),
            party_composition: parse_json_array(row.party_composition.as_deref()),
            title: row.title,
            description: row.description,
            game_id: row.game_id,
            category: row.category,
            format,
            start_date: row.start_date,
            end_date: row.end_date,
            registration_deadline: row.registration_deadline,
            min_participants: row.min_participants,
            max_participants: row.max_participants,
            current_participants: row.current_participants,
            waitlist_count: row.waitlist_count,
            entry_fee: row.entry_fee,
            status,
            registration_open: row.registration_open,
            organizer_id: row.organizer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Encode the domain object into its stored representation
    pub fn to_row(&self) -> TournamentRow {
        TournamentRow {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            game_id: self.game_id,
            category: self.category.clone(),
            format: self.format.as_str().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            registration_deadline: self.registration_deadline,
            min_participants: self.min_participants,
            max_participants: self.max_participants,
            current_participants: self.current_participants,
            waitlist_count: self.waitlist_count,
            entry_fee: self.entry_fee,
            prizes: encode_json_array(&self.prizes),
            rules: encode_json_array(&self.rules),
            included: encode_json_array(&self.included),
            party_composition: encode_json_array(&self.party_composition),
            status: self.status.as_str().to_string(),
            registration_open: self.registration_open,
            organizer_id: self.organizer_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // The stored status is the single source of truth for these predicates.
    // Wall-clock drift is reconciled by the expiry sweep, not here.

    pub fn is_upcoming(&self) -> bool {
        self.status == TournamentStatus::Upcoming
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == TournamentStatus::Ongoing
    }

    pub fn is_completed(&self) -> bool {
        self.status == TournamentStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == TournamentStatus::Cancelled
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn available_spots(&self) -> i32 {
        (self.max_participants - self.current_participants).max(0)
    }

    pub fn is_campaign(&self) -> bool {
        self.format == TournamentFormat::Campaign || self.category.eq_ignore_ascii_case("dnd")
    }

    /// Whether a user could register at `now`
    pub fn can_register(&self, now: DateTime<Utc>) -> RegistrationEligibility {
        registration_eligibility(
            self.status,
            self.registration_open,
            self.registration_deadline,
            self.current_participants,
            self.max_participants,
            now,
        )
    }

    /// Human readable schedule, e.g. `12/04/2025 20:30 - 23:00`
    pub fn date_range_label(&self) -> String {
        let start = self.start_date.format("%d/%m/%Y %H:%M");
        match self.end_date {
            Some(end) if end.date_naive() == self.start_date.date_naive() => {
                format!("{} - {}", start, end.format("%H:%M"))
            }
            Some(end) => format!("{} - {}", start, end.format("%d/%m/%Y %H:%M")),
            None => start.to_string(),
        }
    }

    /// Occupancy label, e.g. `6/8` or `8/8 (+2 in waitlist)`
    pub fn spots_label(&self) -> String {
        let base = format!("{}/{}", self.current_participants, self.max_participants);
        if self.waitlist_count > 0 {
            format!("{} (+{} in waitlist)", base, self.waitlist_count)
        } else {
            base
        }
    }
}

/// Eligibility rule shared by the entity and the ledger
pub(crate) fn registration_eligibility(
    status: TournamentStatus,
    registration_open: bool,
    deadline: Option<DateTime<Utc>>,
    current_participants: i32,
    max_participants: i32,
    now: DateTime<Utc>,
) -> RegistrationEligibility {
    if status != TournamentStatus::Upcoming {
        return RegistrationEligibility::closed("Tournament is not upcoming");
    }
    if !registration_open {
        return RegistrationEligibility::closed("Registrations are closed");
    }
    if deadline.is_some_and(|deadline| deadline < now) {
        return RegistrationEligibility::closed("Registration deadline has passed");
    }
    if current_participants >= max_participants {
        return RegistrationEligibility::waitlist_only();
    }
    RegistrationEligibility::open()
}
