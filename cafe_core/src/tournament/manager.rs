//! Tournament manager: organizer CRUD, listing and the status sweep.

use super::errors::{TournamentError, TournamentResult};
use super::filter::{Page, TournamentFilter};
use super::models::{
    TOURNAMENT_COLUMNS, Tournament, TournamentFormat, TournamentId, TournamentRow,
    TournamentStatus,
};
use super::patch::TournamentPatch;
use super::validation::{
    DEFAULT_MAX_PARTICIPANTS, DEFAULT_MIN_PARTICIPANTS, TournamentDraft, ValidationErrors,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

/// Number of tournaments moved by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// `upcoming` → `ongoing`
    pub started: u64,
    /// `upcoming`/`ongoing` → `completed`
    pub completed: u64,
}

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    pool: Arc<PgPool>,
}

fn json_text(items: Option<&Vec<Value>>) -> String {
    Value::Array(items.cloned().unwrap_or_default()).to_string()
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a tournament from a validated draft
    ///
    /// # Errors
    ///
    /// * `TournamentError::Validation` - every rule the draft violates
    pub async fn create(
        &self,
        draft: TournamentDraft,
        organizer_id: Option<i64>,
    ) -> TournamentResult<Tournament> {
        draft.validate()?;

        let (Some(title), Some(game_id), Some(start_date)) =
            (draft.title.as_deref(), draft.game_id, draft.start_date)
        else {
            return Err(ValidationErrors(vec!["Incomplete tournament draft".to_string()]).into());
        };
        let format = draft
            .format
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or(TournamentFormat::SingleElimination);
        let status = draft
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(TournamentStatus::Upcoming);

        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            r#"
            INSERT INTO tournaments (title, description, game_id, category, format, start_date,
                                     end_date, registration_deadline, min_participants,
                                     max_participants, entry_fee, prizes, rules, included,
                                     party_composition, status, registration_open, organizer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(title.trim())
        .bind(draft.description.clone())
        .bind(game_id)
        .bind(draft.category.as_deref().unwrap_or("strategy"))
        .bind(format.as_str())
        .bind(start_date)
        .bind(draft.end_date)
        .bind(draft.registration_deadline)
        .bind(draft.min_participants.unwrap_or(DEFAULT_MIN_PARTICIPANTS))
        .bind(draft.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS))
        .bind(draft.entry_fee.unwrap_or(0.0))
        .bind(json_text(draft.prizes.as_ref()))
        .bind(json_text(draft.rules.as_ref()))
        .bind(json_text(draft.included.as_ref()))
        .bind(json_text(draft.party_composition.as_ref()))
        .bind(status.as_str())
        .bind(draft.registration_open.unwrap_or(true))
        .bind(organizer_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        log::info!("Created tournament {} '{}'", row.id, row.title);
        Ok(Tournament::from_row(row))
    }

    /// Get a tournament by id
    pub async fn get(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        let row = sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(tournament_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))?;

        Ok(Tournament::from_row(row))
    }

    /// Apply a partial update after validating the merged result
    pub async fn update(
        &self,
        tournament_id: TournamentId,
        patch: TournamentPatch,
    ) -> TournamentResult<Tournament> {
        let current = self.get(tournament_id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        patch.merged_draft(&current).validate()?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE tournaments SET ");
        patch.push_assignments(&mut builder);
        builder.push(" WHERE id = ").push_bind(tournament_id);
        builder.push(format!(" RETURNING {TOURNAMENT_COLUMNS}"));

        let row = builder
            .build_query_as::<TournamentRow>()
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;

        Ok(Tournament::from_row(row))
    }

    /// Delete a tournament; registrations and results cascade
    pub async fn delete(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(TournamentError::NotFound(tournament_id));
        }

        log::info!("Deleted tournament {}", tournament_id);
        Ok(())
    }

    /// List tournaments matching a filter, one page at a time
    pub async fn list(&self, filter: &TournamentFilter) -> TournamentResult<Page<Tournament>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tournaments");
        filter.push_where(&mut count);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments"));
        filter.push_where(&mut select);
        filter.push_order_and_page(&mut select);
        let rows = select
            .build_query_as::<TournamentRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Tournament::from_row).collect(),
            filter.page(),
            filter.limit(),
            total,
        ))
    }

    /// Move stored statuses forward to match the clock
    ///
    /// Tournaments whose end lies before `now` become `completed` (a missing
    /// end date counts as one day after the start); upcoming tournaments that have started become
    /// `ongoing`. Cancelled and completed tournaments are left alone.
    pub async fn expire_past_tournaments(&self, now: DateTime<Utc>) -> TournamentResult<SweepReport> {
        let completed = sqlx::query(
            r#"
            UPDATE tournaments
            SET status = 'completed', registration_open = FALSE, updated_at = NOW()
            WHERE status IN ('upcoming', 'ongoing')
              AND COALESCE(end_date, start_date + INTERVAL '1 day') < $1
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        let started = sqlx::query(
            r#"
            UPDATE tournaments
            SET status = 'ongoing', registration_open = FALSE, updated_at = NOW()
            WHERE status = 'upcoming' AND start_date <= $1
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        let report = SweepReport { started, completed };
        if report != SweepReport::default() {
            log::info!(
                "Status sweep: {} started, {} completed",
                report.started,
                report.completed
            );
        }
        Ok(report)
    }
}
