//! Tournament entity model and organizer operations.
//!
//! This module provides:
//! - Row ↔ domain conversion with defensive JSON column decoding
//! - Payload validation that reports every violated rule at once
//! - Status predicates and registration eligibility
//! - Typed partial updates, filtered listing and the status sweep
//!
//! ## Example
//!
//! ```no_run
//! use cafe_core::tournament::{TournamentDraft, TournamentManager};
//! use cafe_core::db::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let tournaments = TournamentManager::new(Arc::new(db.pool().clone()));
//!
//!     let draft = TournamentDraft {
//!         title: Some("Friday Carcassonne".to_string()),
//!         game_id: Some(3),
//!         start_date: Some(chrono::Utc::now() + chrono::Duration::days(7)),
//!         max_participants: Some(8),
//!         ..Default::default()
//!     };
//!
//!     let tournament = tournaments.create(draft, None).await?;
//!     println!("Created tournament: {}", tournament.id);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod filter;
pub mod manager;
pub mod models;
pub mod patch;
pub mod validation;

pub use errors::{TournamentError, TournamentResult};
pub use filter::{Page, SortField, SortOrder, TournamentFilter};
pub use manager::{SweepReport, TournamentManager};
pub use models::{
    RegistrationEligibility, Tournament, TournamentFormat, TournamentId, TournamentRow,
    TournamentStatus,
};
pub use patch::TournamentPatch;
pub use validation::{TournamentDraft, ValidationErrors};
