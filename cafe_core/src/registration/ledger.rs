//! Registration ledger: admission, waitlist and promotion rules.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::counters::{CounterChange, CounterSnapshot};
use super::models::{
    Admission, Participant, PromotionOutcome, Registration, RegistrationReceipt,
    RegistrationStatus, TournamentSlot, UnregisterOutcome,
};
use super::store::{LedgerStore, LedgerTx};
use crate::db::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_transaction_timeout};
use crate::tournament::{TournamentError, TournamentId, TournamentResult};

/// Registration ledger over a storage backend
///
/// Each mutating operation is one transaction that starts by locking the
/// tournament, so concurrent registrations for the same tournament are
/// serialised and the cached counters always match the committed rows.
/// A transaction that outlives the timeout is rolled back.
pub struct RegistrationLedger<S> {
    store: S,
    transaction_timeout: Duration,
}

impl<S: LedgerStore> RegistrationLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a user, taking a free seat or joining the waitlist
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - tournament doesn't exist
    /// * `TournamentError::AlreadyRegistered` - user already holds a registration
    /// * `TournamentError::RegistrationClosed` - tournament isn't accepting entries
    pub async fn register(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
    ) -> TournamentResult<RegistrationReceipt> {
        self.register_at(user_id, tournament_id, Utc::now()).await
    }

    /// [`register`](Self::register) with an explicit clock reading
    pub async fn register_at(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
        now: DateTime<Utc>,
    ) -> TournamentResult<RegistrationReceipt> {
        with_transaction_timeout(
            self.transaction_timeout,
            self.register_tx(user_id, tournament_id, now),
        )
        .await
    }

    async fn register_tx(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
        now: DateTime<Utc>,
    ) -> TournamentResult<RegistrationReceipt> {
        let mut tx = self.store.begin().await?;
        let slot = lock(&mut tx, tournament_id).await?;

        if tx.find_registration(tournament_id, user_id).await?.is_some() {
            return Err(TournamentError::AlreadyRegistered);
        }

        let eligibility = slot.eligibility(now);
        if !eligibility.accepts_registration() {
            return Err(TournamentError::RegistrationClosed(
                eligibility.reason.unwrap_or_default(),
            ));
        }

        let admission = Admission::decide(slot.current_participants, slot.max_participants);
        let registration = tx
            .insert_registration(tournament_id, user_id, admission.is_waitlist(), now)
            .await?;
        let counters = tx
            .adjust_counters(tournament_id, admission.counter_change())
            .await?;
        tx.commit().await?;

        let position = match admission {
            Admission::Admitted => counters.current_participants,
            Admission::Waitlisted => counters.waitlist_count,
        };

        tracing::info!(
            user_id,
            tournament_id,
            waitlist = admission.is_waitlist(),
            position,
            "registration accepted"
        );

        Ok(RegistrationReceipt {
            registration_id: registration.id,
            is_waitlist: admission.is_waitlist(),
            position,
        })
    }

    /// Remove a user's registration
    ///
    /// Freeing an active seat promotes the oldest waitlisted entry in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - tournament doesn't exist
    /// * `TournamentError::RegistrationNotFound` - user isn't registered
    pub async fn unregister(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
    ) -> TournamentResult<UnregisterOutcome> {
        with_transaction_timeout(
            self.transaction_timeout,
            self.unregister_tx(user_id, tournament_id),
        )
        .await
    }

    async fn unregister_tx(
        &self,
        user_id: i64,
        tournament_id: TournamentId,
    ) -> TournamentResult<UnregisterOutcome> {
        let mut tx = self.store.begin().await?;
        let slot = lock(&mut tx, tournament_id).await?;

        let registration = tx
            .find_registration(tournament_id, user_id)
            .await?
            .ok_or(TournamentError::RegistrationNotFound)?;
        tx.delete_registration(registration.id).await?;

        if registration.is_waitlist {
            tx.adjust_counters(tournament_id, CounterChange::LeaveWaitlist)
                .await?;
            tx.commit().await?;

            tracing::info!(user_id, tournament_id, "left waitlist");
            return Ok(UnregisterOutcome {
                was_waitlisted: true,
                promoted_user_id: None,
            });
        }

        let counters = tx
            .adjust_counters(tournament_id, CounterChange::ReleaseParticipant)
            .await?;

        let mut promoted_user_id = None;
        if counters.current_participants < slot.max_participants
            && let Some(next) = tx.earliest_waitlisted(tournament_id).await?
        {
            tx.activate(next.id).await?;
            tx.adjust_counters(tournament_id, CounterChange::Promote)
                .await?;
            promoted_user_id = Some(next.user_id);
        }
        tx.commit().await?;

        tracing::info!(user_id, tournament_id, ?promoted_user_id, "seat released");
        Ok(UnregisterOutcome {
            was_waitlisted: false,
            promoted_user_id,
        })
    }

    /// Move a waitlisted entry into a free seat
    ///
    /// With `user_id` the named user's waitlist entry is promoted, otherwise
    /// the oldest one.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - tournament doesn't exist
    /// * `TournamentError::NoWaitlistEntry` - nothing (or not that user) to promote
    /// * `TournamentError::TournamentFull` - every seat is taken
    pub async fn promote_from_waitlist(
        &self,
        tournament_id: TournamentId,
        user_id: Option<i64>,
    ) -> TournamentResult<PromotionOutcome> {
        with_transaction_timeout(
            self.transaction_timeout,
            self.promote_tx(tournament_id, user_id),
        )
        .await
    }

    async fn promote_tx(
        &self,
        tournament_id: TournamentId,
        user_id: Option<i64>,
    ) -> TournamentResult<PromotionOutcome> {
        let mut tx = self.store.begin().await?;
        let slot = lock(&mut tx, tournament_id).await?;

        let entry = match user_id {
            Some(user_id) => tx
                .find_registration(tournament_id, user_id)
                .await?
                .filter(|r| r.is_waitlist),
            None => tx.earliest_waitlisted(tournament_id).await?,
        }
        .ok_or(TournamentError::NoWaitlistEntry)?;

        if !slot.has_free_slot() {
            return Err(TournamentError::TournamentFull);
        }

        tx.activate(entry.id).await?;
        let counters = tx
            .adjust_counters(tournament_id, CounterChange::Promote)
            .await?;
        tx.commit().await?;

        tracing::info!(
            user_id = entry.user_id,
            tournament_id,
            "promoted from waitlist"
        );

        Ok(PromotionOutcome {
            registration_id: entry.id,
            user_id: entry.user_id,
            current_participants: counters.current_participants,
            waitlist_count: counters.waitlist_count,
        })
    }

    /// Change a registration's attendance status; counters are untouched
    pub async fn update_registration_status(
        &self,
        tournament_id: TournamentId,
        user_id: i64,
        status: RegistrationStatus,
    ) -> TournamentResult<Registration> {
        self.store
            .update_status(tournament_id, user_id, status)
            .await?
            .ok_or(TournamentError::RegistrationNotFound)
    }

    /// List a tournament's registrations, active first
    pub async fn participants(
        &self,
        tournament_id: TournamentId,
        include_waitlist: bool,
    ) -> TournamentResult<Vec<Participant>> {
        self.store.participants(tournament_id, include_waitlist).await
    }

    pub async fn registrations_for_user(&self, user_id: i64) -> TournamentResult<Vec<Registration>> {
        self.store.registrations_for_user(user_id).await
    }

    /// Rebuild cached counters from the ledger rows
    pub async fn reconcile(&self, tournament_id: TournamentId) -> TournamentResult<CounterSnapshot> {
        let counters = self
            .store
            .reconcile(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;

        tracing::info!(
            tournament_id,
            current_participants = counters.current_participants,
            waitlist_count = counters.waitlist_count,
            "counters reconciled"
        );
        Ok(counters)
    }
}

async fn lock<T: LedgerTx>(tx: &mut T, tournament_id: TournamentId) -> TournamentResult<TournamentSlot> {
    tx.lock_slot(tournament_id)
        .await?
        .ok_or(TournamentError::NotFound(tournament_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::MemoryLedgerStore;
    use crate::tournament::TournamentStatus;
    use chrono::Duration;

    fn ledger(max: i32) -> RegistrationLedger<MemoryLedgerStore> {
        RegistrationLedger::new(MemoryLedgerStore::new().with_tournament(TournamentSlot::open(1, max)))
    }

    #[tokio::test]
    async fn test_register_takes_seat_then_waitlists() {
        let ledger = ledger(1);

        let first = ledger.register(10, 1).await.unwrap();
        assert!(!first.is_waitlist);
        assert_eq!(first.position, 1);

        let second = ledger.register(11, 1).await.unwrap();
        assert!(second.is_waitlist);
        assert_eq!(second.position, 1);

        let slot = ledger.store().slot(1).await.unwrap();
        assert_eq!((slot.current_participants, slot.waitlist_count), (1, 1));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let ledger = ledger(4);
        ledger.register(10, 1).await.unwrap();

        let err = ledger.register(10, 1).await.unwrap_err();
        assert!(matches!(err, TournamentError::AlreadyRegistered));
        assert_eq!(ledger.store().slot(1).await.unwrap().current_participants, 1);
    }

    #[tokio::test]
    async fn test_stalled_transaction_times_out() {
        let ledger = ledger(4).with_transaction_timeout(std::time::Duration::from_millis(20));

        // An open transaction holds the tournament
        let held = ledger.store().begin().await.unwrap();
        let err = ledger.register(10, 1).await.unwrap_err();
        assert!(matches!(err, TournamentError::Timeout(_)));
        assert!(matches!(
            ledger.unregister(10, 1).await.unwrap_err(),
            TournamentError::Timeout(_)
        ));
        drop(held);

        assert!(!ledger.register(10, 1).await.unwrap().is_waitlist);
        assert_eq!(ledger.store().slot(1).await.unwrap().current_participants, 1);
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let err = ledger(4).register(10, 99).await.unwrap_err();
        assert!(matches!(err, TournamentError::NotFound(99)));
    }

    #[tokio::test]
    async fn test_closed_registration_is_rejected() {
        let ledger = ledger(4);
        let mut slot = ledger.store().slot(1).await.unwrap();
        slot.status = TournamentStatus::Ongoing;
        ledger.store().put_slot(slot).await;

        let err = ledger.register(10, 1).await.unwrap_err();
        assert!(matches!(err, TournamentError::RegistrationClosed(_)));
    }

    #[tokio::test]
    async fn test_deadline_is_checked_against_clock() {
        let ledger = ledger(4);
        let now = Utc::now();
        let mut slot = ledger.store().slot(1).await.unwrap();
        slot.registration_deadline = Some(now - Duration::minutes(1));
        ledger.store().put_slot(slot).await;

        let err = ledger.register_at(10, 1, now).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Registration closed: Registration deadline has passed"
        );
        assert!(
            ledger
                .register_at(10, 1, now - Duration::minutes(5))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_leaving_waitlist_promotes_nobody() {
        let ledger = ledger(1);
        ledger.register(10, 1).await.unwrap();
        ledger.register(11, 1).await.unwrap();

        let outcome = ledger.unregister(11, 1).await.unwrap();
        assert!(outcome.was_waitlisted);
        assert_eq!(outcome.promoted_user_id, None);

        let slot = ledger.store().slot(1).await.unwrap();
        assert_eq!((slot.current_participants, slot.waitlist_count), (1, 0));
    }

    #[tokio::test]
    async fn test_unregister_unknown_registration() {
        let err = ledger(2).unregister(10, 1).await.unwrap_err();
        assert!(matches!(err, TournamentError::RegistrationNotFound));
    }

    #[tokio::test]
    async fn test_manual_promotion_requires_free_seat() {
        let ledger = ledger(1);
        ledger.register(10, 1).await.unwrap();
        ledger.register(11, 1).await.unwrap();

        let err = ledger.promote_from_waitlist(1, None).await.unwrap_err();
        assert!(matches!(err, TournamentError::TournamentFull));

        let err = ledger.promote_from_waitlist(1, Some(10)).await.unwrap_err();
        assert!(matches!(err, TournamentError::NoWaitlistEntry));
    }

    #[tokio::test]
    async fn test_manual_promotion_of_named_user() {
        let ledger = ledger(1);
        let now = Utc::now();
        ledger.register_at(10, 1, now).await.unwrap();
        ledger.register_at(11, 1, now + Duration::seconds(1)).await.unwrap();
        ledger.register_at(12, 1, now + Duration::seconds(2)).await.unwrap();

        let mut slot = ledger.store().slot(1).await.unwrap();
        slot.max_participants = 2;
        ledger.store().put_slot(slot).await;

        let outcome = ledger.promote_from_waitlist(1, Some(12)).await.unwrap();
        assert_eq!(outcome.user_id, 12);
        assert_eq!(outcome.current_participants, 2);
        assert_eq!(outcome.waitlist_count, 1);
        assert!(ledger.store().registration(1, 11).await.unwrap().is_waitlist);
    }

    #[tokio::test]
    async fn test_status_update_leaves_counters() {
        let ledger = ledger(2);
        ledger.register(10, 1).await.unwrap();

        let registration = ledger
            .update_registration_status(1, 10, RegistrationStatus::NoShow)
            .await
            .unwrap();
        assert_eq!(registration.status, RegistrationStatus::NoShow);
        assert_eq!(ledger.store().slot(1).await.unwrap().current_participants, 1);

        let err = ledger
            .update_registration_status(1, 99, RegistrationStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::RegistrationNotFound));
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let ledger = ledger(2);
        ledger.register(10, 1).await.unwrap();
        ledger.register(11, 1).await.unwrap();
        ledger.register(12, 1).await.unwrap();

        let mut slot = ledger.store().slot(1).await.unwrap();
        slot.current_participants = 0;
        slot.waitlist_count = 7;
        ledger.store().put_slot(slot).await;

        let counters = ledger.reconcile(1).await.unwrap();
        assert_eq!(
            counters,
            CounterSnapshot {
                current_participants: 2,
                waitlist_count: 1
            }
        );
    }
}
