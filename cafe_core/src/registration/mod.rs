//! Tournament registration ledger.
//!
//! This module provides:
//! - Registration with automatic waitlisting once every seat is taken
//! - Unregistration with FIFO promotion of the oldest waitlisted entry
//! - Manual promotion, attendance status updates and participant listings
//! - Cached capacity counters kept in step with the ledger rows
//!
//! The rules live in [`RegistrationLedger`]; storage is pluggable through
//! [`LedgerStore`] with a PostgreSQL backend and an in-memory one.

pub mod counters;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use counters::{CounterChange, CounterSnapshot};
pub use ledger::RegistrationLedger;
pub use memory::MemoryLedgerStore;
pub use models::{
    Admission, Participant, PromotionOutcome, Registration, RegistrationId, RegistrationReceipt,
    RegistrationStatus, TournamentSlot, UnregisterOutcome,
};
pub use postgres::PgLedgerStore;
pub use store::{LedgerStore, LedgerTx};
