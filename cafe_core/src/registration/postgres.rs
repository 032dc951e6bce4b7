//! PostgreSQL ledger backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

use super::counters::{self, CounterChange, CounterSnapshot};
use super::models::{
    Participant, REGISTRATION_COLUMNS, Registration, RegistrationId, RegistrationRow,
    RegistrationStatus, TournamentSlot,
};
use super::store::{LedgerStore, LedgerTx};
use crate::tournament::{TournamentError, TournamentId, TournamentResult, TournamentStatus};

/// Default PostgreSQL implementation of `LedgerStore`
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: Arc<PgPool>,
}

impl PgLedgerStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Open ledger transaction; rolls back on drop
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> TournamentResult<PgLedgerTx> {
        Ok(PgLedgerTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn participants(
        &self,
        tournament_id: TournamentId,
        include_waitlist: bool,
    ) -> TournamentResult<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT r.id AS registration_id, r.user_id, u.username, r.registration_date,
                   r.status, r.is_waitlist,
                   CASE WHEN r.is_waitlist THEN
                       ROW_NUMBER() OVER (PARTITION BY r.is_waitlist
                                          ORDER BY r.registration_date, r.id)
                   END AS waitlist_position
            FROM tournament_registrations r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.tournament_id = $1 AND ($2 OR NOT r.is_waitlist)
            ORDER BY r.is_waitlist, r.registration_date, r.id
            "#,
        )
        .bind(tournament_id)
        .bind(include_waitlist)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(participants)
    }

    async fn registrations_for_user(&self, user_id: i64) -> TournamentResult<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM tournament_registrations
             WHERE user_id = $1 ORDER BY registration_date DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        user_id: i64,
        status: RegistrationStatus,
    ) -> TournamentResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE tournament_registrations SET status = $3
             WHERE tournament_id = $1 AND user_id = $2
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(tournament_id)
        .bind(user_id)
        .bind(status.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Registration::from))
    }

    async fn reconcile(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<CounterSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        Ok(counters::reconcile(&mut *conn, tournament_id).await?)
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_slot(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<TournamentSlot>> {
        let row = sqlx::query(
            r#"
            SELECT max_participants, current_participants, waitlist_count, status,
                   registration_open, registration_deadline
            FROM tournaments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.get("status");
        let status = status.parse().unwrap_or_else(|e| {
            log::warn!("tournament {}: {}", tournament_id, e);
            TournamentStatus::Upcoming
        });

        Ok(Some(TournamentSlot {
            tournament_id,
            max_participants: row.get("max_participants"),
            current_participants: row.get("current_participants"),
            waitlist_count: row.get("waitlist_count"),
            status,
            registration_open: row.get("registration_open"),
            registration_deadline: row.get("registration_deadline"),
        }))
    }

    async fn find_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
    ) -> TournamentResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM tournament_registrations
             WHERE tournament_id = $1 AND user_id = $2
             FOR UPDATE"
        ))
        .bind(tournament_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Registration::from))
    }

    async fn insert_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
        is_waitlist: bool,
        registered_at: DateTime<Utc>,
    ) -> TournamentResult<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO tournament_registrations
                 (user_id, tournament_id, registration_date, status, is_waitlist)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(tournament_id)
        .bind(registered_at)
        .bind(RegistrationStatus::Confirmed.as_str())
        .bind(is_waitlist)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(TournamentError::from_insert)?;

        Ok(Registration::from(row))
    }

    async fn delete_registration(&mut self, registration_id: RegistrationId) -> TournamentResult<()> {
        sqlx::query("DELETE FROM tournament_registrations WHERE id = $1")
            .bind(registration_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn earliest_waitlisted(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM tournament_registrations
             WHERE tournament_id = $1 AND is_waitlist
             ORDER BY registration_date ASC, id ASC
             LIMIT 1
             FOR UPDATE"
        ))
        .bind(tournament_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Registration::from))
    }

    async fn activate(&mut self, registration_id: RegistrationId) -> TournamentResult<()> {
        sqlx::query("UPDATE tournament_registrations SET is_waitlist = FALSE WHERE id = $1")
            .bind(registration_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn adjust_counters(
        &mut self,
        tournament_id: TournamentId,
        change: CounterChange,
    ) -> TournamentResult<CounterSnapshot> {
        counters::apply(&mut *self.tx, tournament_id, change)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    async fn commit(self) -> TournamentResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
