//! In-memory ledger backend for tests and local tooling.
//!
//! A transaction holds the store's lock for its whole lifetime and works on a
//! copy of the state, so concurrent operations serialise exactly like row
//! locks do and an uncommitted transaction leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use super::counters::{CounterChange, CounterSnapshot};
use super::models::{
    Participant, Registration, RegistrationId, RegistrationStatus, TournamentSlot,
};
use super::store::{LedgerStore, LedgerTx};
use crate::tournament::{TournamentError, TournamentId, TournamentResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    slots: HashMap<TournamentId, TournamentSlot>,
    registrations: Vec<Registration>,
    usernames: HashMap<i64, String>,
    next_id: RegistrationId,
}

impl MemoryState {
    fn find(&self, tournament_id: TournamentId, user_id: i64) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.tournament_id == tournament_id && r.user_id == user_id)
    }

    /// Registrations of one tournament in FIFO order
    fn ordered(&self, tournament_id: TournamentId, waitlisted: bool) -> Vec<&Registration> {
        let mut entries: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.tournament_id == tournament_id && r.is_waitlist == waitlisted)
            .collect();
        entries.sort_by_key(|r| (r.registration_date, r.id));
        entries
    }
}

/// Mutex-backed implementation of `LedgerStore`
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
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

    /// Seed a tournament
    pub fn with_tournament(self, slot: TournamentSlot) -> Self {
        self.seed().slots.insert(slot.tournament_id, slot);
        self
    }

    /// Seed a username for participant listings
    pub fn with_user(self, user_id: i64, username: &str) -> Self {
        self.seed().usernames.insert(user_id, username.to_string());
        self
    }

    /// Current capacity snapshot of a tournament
    pub async fn slot(&self, tournament_id: TournamentId) -> Option<TournamentSlot> {
        self.state.lock().await.slots.get(&tournament_id).cloned()
    }

    /// Overwrite a tournament's state, e.g. to close registrations
    pub async fn put_slot(&self, slot: TournamentSlot) {
        self.state.lock().await.slots.insert(slot.tournament_id, slot);
    }

    /// Look up a registration
    pub async fn registration(
        &self,
        tournament_id: TournamentId,
        user_id: i64,
    ) -> Option<Registration> {
        self.state.lock().await.find(tournament_id, user_id).cloned()
    }
}

/// Open in-memory transaction
pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryLedgerTx;

    async fn begin(&self) -> TournamentResult<MemoryLedgerTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryLedgerTx { guard, working })
    }

    async fn participants(
        &self,
        tournament_id: TournamentId,
        include_waitlist: bool,
    ) -> TournamentResult<Vec<Participant>> {
        let state = self.state.lock().await;
        let to_participant = |r: &Registration, waitlist_position: Option<i64>| Participant {
            registration_id: r.id,
            user_id: r.user_id,
            username: state.usernames.get(&r.user_id).cloned(),
            registration_date: r.registration_date,
            status: r.status.as_str().to_string(),
            is_waitlist: r.is_waitlist,
            waitlist_position,
        };

        let mut participants: Vec<Participant> = state
            .ordered(tournament_id, false)
            .into_iter()
            .map(|r| to_participant(r, None))
            .collect();

        if include_waitlist {
            participants.extend(
                state
                    .ordered(tournament_id, true)
                    .into_iter()
                    .zip(1_i64..)
                    .map(|(r, position)| to_participant(r, Some(position))),
            );
        }

        Ok(participants)
    }

    async fn registrations_for_user(&self, user_id: i64) -> TournamentResult<Vec<Registration>> {
        let state = self.state.lock().await;
        let mut registrations: Vec<Registration> = state
            .registrations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| std::cmp::Reverse((r.registration_date, r.id)));
        Ok(registrations)
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        user_id: i64,
        status: RegistrationStatus,
    ) -> TournamentResult<Option<Registration>> {
        let mut state = self.state.lock().await;
        let updated = state
            .registrations
            .iter_mut()
            .find(|r| r.tournament_id == tournament_id && r.user_id == user_id)
            .map(|r| {
                r.status = status;
                r.clone()
            });
        Ok(updated)
    }

    async fn reconcile(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<CounterSnapshot>> {
        let mut state = self.state.lock().await;
        let active = state.ordered(tournament_id, false).len() as i32;
        let waitlisted = state.ordered(tournament_id, true).len() as i32;

        Ok(state.slots.get_mut(&tournament_id).map(|slot| {
            slot.current_participants = active;
            slot.waitlist_count = waitlisted;
            CounterSnapshot {
                current_participants: active,
                waitlist_count: waitlisted,
            }
        }))
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_slot(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<TournamentSlot>> {
        Ok(self.working.slots.get(&tournament_id).cloned())
    }

    async fn find_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
    ) -> TournamentResult<Option<Registration>> {
        Ok(self.working.find(tournament_id, user_id).cloned())
    }

    async fn insert_registration(
        &mut self,
        tournament_id: TournamentId,
        user_id: i64,
        is_waitlist: bool,
        registered_at: DateTime<Utc>,
    ) -> TournamentResult<Registration> {
        if self.working.find(tournament_id, user_id).is_some() {
            return Err(TournamentError::AlreadyRegistered);
        }

        self.working.next_id += 1;
        let registration = Registration {
            id: self.working.next_id,
            user_id,
            tournament_id,
            registration_date: registered_at,
            status: RegistrationStatus::Confirmed,
            is_waitlist,
            notes: None,
        };
        self.working.registrations.push(registration.clone());
        Ok(registration)
    }

    async fn delete_registration(&mut self, registration_id: RegistrationId) -> TournamentResult<()> {
        self.working
            .registrations
            .retain(|r| r.id != registration_id);
        Ok(())
    }

    async fn earliest_waitlisted(
        &mut self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Option<Registration>> {
        Ok(self
            .working
            .ordered(tournament_id, true)
            .first()
            .map(|r| (*r).clone()))
    }

    async fn activate(&mut self, registration_id: RegistrationId) -> TournamentResult<()> {
        if let Some(registration) = self
            .working
            .registrations
            .iter_mut()
            .find(|r| r.id == registration_id)
        {
            registration.is_waitlist = false;
        }
        Ok(())
    }

    async fn adjust_counters(
        &mut self,
        tournament_id: TournamentId,
        change: CounterChange,
    ) -> TournamentResult<CounterSnapshot> {
        let slot = self
            .working
            .slots
            .get_mut(&tournament_id)
            .ok_or(TournamentError::NotFound(tournament_id))?;

        let counters = change.apply_to(CounterSnapshot {
            current_participants: slot.current_participants,
            waitlist_count: slot.waitlist_count,
        });
        slot.current_participants = counters.current_participants;
        slot.waitlist_count = counters.waitlist_count;
        Ok(counters)
    }

    async fn commit(self) -> TournamentResult<()> {
        let MemoryLedgerTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
