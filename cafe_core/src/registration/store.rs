//! Storage seams for the registration ledger.
//!
//! The ledger logic lives once in [`RegistrationLedger`](super::RegistrationLedger);
//! backends only provide row-level primitives. Every mutating operation runs
//! inside one [`LedgerTx`], which holds the tournament's lock from
//! [`LedgerTx::lock_slot`] until [`LedgerTx::commit`]. Dropping a transaction
//! without committing discards its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::counters::{CounterChange, CounterSnapshot};
use super::models::{
    Participant, Registration, RegistrationId, RegistrationStatus, TournamentSlot,
};
use crate::tournament::{TournamentId, TournamentResult};

/// Trait for registration ledger storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Start a transaction
    async fn begin(&self) -> TournamentResult<Self::Tx>;

    /// Registrations of a tournament: active first, then waitlist in FIFO order
    async fn participants(
        &self,
        tournament_id: TournamentId,
        include_waitlist: bool,
    ) -> TournamentResult<Vec<Participant>>;

    /// Every registration a user holds, newest first
    async fn registrations_for_user(&self, user_id: i64) -> TournamentResult<Vec<Registration>>;

    /// Set the attendance status; `None` when no such registration exists
    async fn update_status(
        &self,
        tournament_id: TournamentId,
        user_id: i64,
        status: RegistrationStatus,
    ) -> TournamentResult<Option<Registration>>;

    /// Recompute cached counters; `None` when the tournament does not exist
    async fn reconcile(&self, tournament_id: TournamentId)
    -> TournamentResult<Option<CounterSnapshot>>;
}

/// Trait for one ledger transaction
#[async_trait]
pub trait LedgerTx: Send {
    /// Lock the tournament row and read its capacity
    async fn lock_slot(&mut self, tournament_id: TournamentId)
    -> TournamentResult<Option<TournamentSlot>>;

    /// Find a user's registration in a tournament
    async fn find_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
    ) -> TournamentResult<Option<Registration>>;

    /// Insert a registration
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyRegistered` - the (user, tournament) pair exists
    async fn insert_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
        is_waitlist: bool,
        registered_at: DateTime<Utc>,
    ) -> TournamentResult<Registration>;

    /// Delete a registration by id
    async fn delete_registration(&mut self, registration_id: RegistrationId)
    -> TournamentResult<()>;

    /// Oldest waitlisted registration, ties broken by id
    async fn earliest_waitlisted(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<Registration>>;

    /// Move a registration off the waitlist
    async fn activate(&mut self, registration_id: RegistrationId) -> TournamentResult<()>;

    /// Apply a counter change to the locked tournament
    async fn adjust_counters(
        &mut self,
        tournament_id: TournamentId,
        change: CounterChange,
    ) -> TournamentResult<CounterSnapshot>;

    /// Make every write of this transaction visible
    async fn commit(self) -> TournamentResult<()>;
}
