//! Typed partial updates.
//!
//! A [`TournamentPatch`] carries only the fields a client wants to change.
//! Present fields become `SET` assignments with bound parameters; absent
//! fields are never touched.

use super::models::{Tournament, TournamentFormat, TournamentStatus};
use super::validation::TournamentDraft;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

/// Partial tournament update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TournamentPatch {
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

impl TournamentPatch {
    /// Patch that only changes the status
    pub fn status(status: TournamentStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignments_count() == 0
    }

    fn assignments_count(&self) -> usize {
        [
            self.title.is_some(),
            self.description.is_some(),
            self.game_id.is_some(),
            self.category.is_some(),
            self.format.is_some(),
            self.start_date.is_some(),
            self.end_date.is_some(),
            self.registration_deadline.is_some(),
            self.min_participants.is_some(),
            self.max_participants.is_some(),
            self.entry_fee.is_some(),
            self.prizes.is_some(),
            self.rules.is_some(),
            self.included.is_some(),
            self.party_composition.is_some(),
            self.status.is_some(),
            self.registration_open.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// The draft that results from applying this patch to `current`
    ///
    /// Used to validate the merged state before anything is written.
    pub fn merged_draft(&self, current: &Tournament) -> TournamentDraft {
        let mut draft = TournamentDraft::from_tournament(current);
        let patch = self.clone();

        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    draft.$field = Some(value);
                })*
            };
        }
        overlay!(
            title,
            description,
            game_id,
            category,
            format,
            start_date,
            end_date,
            registration_deadline,
            min_participants,
            max_participants,
            entry_fee,
            prizes,
            rules,
            included,
            party_composition,
            status,
            registration_open,
        );

        draft
    }

    /// Append `col = $n` assignments for every present field
    ///
    /// Enumerated fields are normalised through their enum so only canonical
    /// spellings reach the table; callers validate before building.
    pub fn push_assignments(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut set = builder.separated(", ");

        if let Some(title) = &self.title {
            set.push("title = ").push_bind_unseparated(title.trim().to_string());
        }
        if let Some(description) = &self.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(game_id) = self.game_id {
            set.push("game_id = ").push_bind_unseparated(game_id);
        }
        if let Some(category) = &self.category {
            set.push("category = ").push_bind_unseparated(category.clone());
        }
        if let Some(format) = self
            .format
            .as_deref()
            .and_then(|f| f.parse::<TournamentFormat>().ok())
        {
            set.push("format = ").push_bind_unseparated(format.as_str());
        }
        if let Some(start_date) = self.start_date {
            set.push("start_date = ").push_bind_unseparated(start_date);
        }
        if let Some(end_date) = self.end_date {
            set.push("end_date = ").push_bind_unseparated(end_date);
        }
        if let Some(deadline) = self.registration_deadline {
            set.push("registration_deadline = ")
                .push_bind_unseparated(deadline);
        }
        if let Some(min) = self.min_participants {
            set.push("min_participants = ").push_bind_unseparated(min);
        }
        if let Some(max) = self.max_participants {
            set.push("max_participants = ").push_bind_unseparated(max);
        }
        if let Some(fee) = self.entry_fee {
            set.push("entry_fee = ").push_bind_unseparated(fee);
        }
        for (column, items) in [
            ("prizes", &self.prizes),
            ("rules", &self.rules),
            ("included", &self.included),
            ("party_composition", &self.party_composition),
        ] {
            if let Some(items) = items {
                set.push(format!("{column} = "))
                    .push_bind_unseparated(Value::Array(items.clone()).to_string());
            }
        }
        if let Some(status) = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<TournamentStatus>().ok())
        {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(open) = self.registration_open {
            set.push("registration_open = ").push_bind_unseparated(open);
        }

        set.push("updated_at = NOW()");
    }
}
