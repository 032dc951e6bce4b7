//! Capacity counter sync.
//!
//! `tournaments.current_participants` and `tournaments.waitlist_count` cache
//! how many ledger rows are active and waitlisted. Every statement here takes
//! the caller's connection so it commits or rolls back together with the
//! ledger write it mirrors. Decrements are floor-clamped at zero.

use crate::tournament::TournamentId;
use serde::Serialize;
use sqlx::PgConnection;

/// Counter values after a change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub current_participants: i32,
    pub waitlist_count: i32,
}

/// One counter mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    /// participants + 1
    AdmitParticipant,
    /// participants - 1
    ReleaseParticipant,
    /// waitlist + 1
    JoinWaitlist,
    /// waitlist - 1
    LeaveWaitlist,
    /// participants + 1 and waitlist - 1
    Promote,
}

fn floor_decrement(value: i32) -> i32 {
    if value > 0 { value - 1 } else { 0 }
}

impl CounterChange {
    /// Apply the change to in-memory counters with the same clamping as SQL
    pub fn apply_to(self, counters: CounterSnapshot) -> CounterSnapshot {
        let CounterSnapshot {
            current_participants,
            waitlist_count,
        } = counters;
        match self {
            CounterChange::AdmitParticipant => CounterSnapshot {
                current_participants: current_participants + 1,
                waitlist_count,
            },
            CounterChange::ReleaseParticipant => CounterSnapshot {
                current_participants: floor_decrement(current_participants),
                waitlist_count,
            },
            CounterChange::JoinWaitlist => CounterSnapshot {
                current_participants,
                waitlist_count: waitlist_count + 1,
            },
            CounterChange::LeaveWaitlist => CounterSnapshot {
                current_participants,
                waitlist_count: floor_decrement(waitlist_count),
            },
            CounterChange::Promote => CounterSnapshot {
                current_participants: current_participants + 1,
                waitlist_count: floor_decrement(waitlist_count),
            },
        }
    }

    fn sql(self) -> &'static str {
        match self {
            CounterChange::AdmitParticipant => INCREMENT_PARTICIPANTS,
            CounterChange::ReleaseParticipant => DECREMENT_PARTICIPANTS,
            CounterChange::JoinWaitlist => INCREMENT_WAITLIST,
            CounterChange::LeaveWaitlist => DECREMENT_WAITLIST,
            CounterChange::Promote => PROMOTE,
        }
    }
}

const INCREMENT_PARTICIPANTS: &str = r#"
    UPDATE tournaments
    SET current_participants = current_participants + 1, updated_at = NOW()
    WHERE id = $1
    RETURNING current_participants, waitlist_count
"#;

const DECREMENT_PARTICIPANTS: &str = r#"
    UPDATE tournaments
    SET current_participants = CASE WHEN current_participants > 0
                                    THEN current_participants - 1 ELSE 0 END,
        updated_at = NOW()
    WHERE id = $1
    RETURNING current_participants, waitlist_count
"#;

const INCREMENT_WAITLIST: &str = r#"
    UPDATE tournaments
    SET waitlist_count = waitlist_count + 1, updated_at = NOW()
    WHERE id = $1
    RETURNING current_participants, waitlist_count
"#;

const DECREMENT_WAITLIST: &str = r#"
    UPDATE tournaments
    SET waitlist_count = CASE WHEN waitlist_count > 0 THEN waitlist_count - 1 ELSE 0 END,
        updated_at = NOW()
    WHERE id = $1
    RETURNING current_participants, waitlist_count
"#;

const PROMOTE: &str = r#"
    UPDATE tournaments
    SET current_participants = current_participants + 1,
        waitlist_count = CASE WHEN waitlist_count > 0 THEN waitlist_count - 1 ELSE 0 END,
        updated_at = NOW()
    WHERE id = $1
    RETURNING current_participants, waitlist_count
"#;

const RECONCILE: &str = r#"
    UPDATE tournaments t
    SET current_participants = (
            SELECT COUNT(*) FROM tournament_registrations r
            WHERE r.tournament_id = t.id AND NOT r.is_waitlist
        ),
        waitlist_count = (
            SELECT COUNT(*) FROM tournament_registrations r
            WHERE r.tournament_id = t.id AND r.is_waitlist
        ),
        updated_at = NOW()
    WHERE t.id = $1
    RETURNING current_participants, waitlist_count
"#;

/// Apply a counter change; `None` when the tournament does not exist
pub async fn apply(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
    change: CounterChange,
) -> sqlx::Result<Option<CounterSnapshot>> {
    sqlx::query_as::<_, CounterSnapshot>(change.sql())
        .bind(tournament_id)
        .fetch_optional(conn)
        .await
}

pub async fn increment_participants(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    apply(conn, tournament_id, CounterChange::AdmitParticipant).await
}

pub async fn decrement_participants(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    apply(conn, tournament_id, CounterChange::ReleaseParticipant).await
}

pub async fn increment_waitlist(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    apply(conn, tournament_id, CounterChange::JoinWaitlist).await
}

pub async fn decrement_waitlist(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    apply(conn, tournament_id, CounterChange::LeaveWaitlist).await
}

/// Move one count from the waitlist to the participants in a single statement
pub async fn promote_counters(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    apply(conn, tournament_id, CounterChange::Promote).await
}

/// Recompute both counters from the ledger rows
pub async fn reconcile(
    conn: &mut PgConnection,
    tournament_id: TournamentId,
) -> sqlx::Result<Option<CounterSnapshot>> {
    sqlx::query_as::<_, CounterSnapshot>(RECONCILE)
        .bind(tournament_id)
        .fetch_optional(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(current_participants: i32, waitlist_count: i32) -> CounterSnapshot {
        CounterSnapshot {
            current_participants,
            waitlist_count,
        }
    }

    #[test]
    fn test_increments() {
        assert_eq!(
            CounterChange::AdmitParticipant.apply_to(snapshot(1, 0)),
            snapshot(2, 0)
        );
        assert_eq!(
            CounterChange::JoinWaitlist.apply_to(snapshot(2, 0)),
            snapshot(2, 1)
        );
        assert_eq!(CounterChange::Promote.apply_to(snapshot(1, 1)), snapshot(2, 0));
    }

    #[test]
    fn test_decrements_never_go_negative() {
        assert_eq!(
            CounterChange::ReleaseParticipant.apply_to(snapshot(0, 0)),
            snapshot(0, 0)
        );
        assert_eq!(
            CounterChange::LeaveWaitlist.apply_to(snapshot(3, 0)),
            snapshot(3, 0)
        );
        assert_eq!(CounterChange::Promote.apply_to(snapshot(0, 0)), snapshot(1, 0));
    }

    #[test]
    fn test_every_statement_returns_counters() {
        for change in [
            CounterChange::AdmitParticipant,
            CounterChange::ReleaseParticipant,
            CounterChange::JoinWaitlist,
            CounterChange::LeaveWaitlist,
            CounterChange::Promote,
        ] {
            assert!(
                change
                    .sql()
                    .contains("RETURNING current_participants, waitlist_count")
            );
        }
        assert!(DECREMENT_PARTICIPANTS.contains("ELSE 0 END"));
        assert!(DECREMENT_WAITLIST.contains("ELSE 0 END"));
    }
}
