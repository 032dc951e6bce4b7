//! # Cafe Core
//!
//! Tournament registrations and player statistics for a board-game café.
//!
//! The library owns the persistent state of the tournament subsystem: the
//! tournament catalogue, the registration ledger with its waitlist, and the
//! per-player statistics and badges that tournament results feed into.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Tournament entity, validation, listing and status sweep
//! - [`registration`]: Registration ledger, waitlist promotion and capacity counters
//! - [`stats`]: Result recording, aggregate statistics, badges and leaderboard
//! - [`auth`]: Bearer token issue and verification
//! - [`db`]: Connection pool, migrations and query timeouts
//!
//! ## Example
//!
//! ```
//! use cafe_core::registration::{MemoryLedgerStore, RegistrationLedger, TournamentSlot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryLedgerStore::new().with_tournament(TournamentSlot::open(1, 1));
//!     let ledger = RegistrationLedger::new(store);
//!
//!     let first = ledger.register(7, 1).await.unwrap();
//!     let second = ledger.register(8, 1).await.unwrap();
//!     assert!(!first.is_waitlist);
//!     assert!(second.is_waitlist);
//! }
//! ```

/// Bearer token authentication.
pub mod auth;

/// Database connectivity.
pub mod db;

/// Error classification shared by every module.
pub mod error;
pub use error::ErrorKind;

/// Registration ledger and waitlist.
pub mod registration;
pub use registration::{RegistrationLedger, RegistrationReceipt, UnregisterOutcome};

/// Player statistics and badges.
pub mod stats;
pub use stats::{BadgeAward, StatisticsEngine};

/// Tournament entity model and organizer operations.
pub mod tournament;
pub use tournament::{Tournament, TournamentError, TournamentManager, TournamentStatus};
