//! Player statistics and badges.
//!
//! Recording a tournament result updates the player's aggregate statistics
//! in one transaction and then awards any badge whose threshold was crossed.
//! Badge awarding is best effort and reported as a [`BadgeAward`].

pub mod badges;
pub mod engine;
pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use badges::{Badge, BadgeAward, BadgeKind, eligible_badges};
pub use engine::{ResultRecorded, StatisticsEngine};
pub use errors::{StatsError, StatsResult};
pub use memory::MemoryStatisticsStore;
pub use models::{
    LeaderboardEntry, MAX_GAMES_PER_RESULT, ResultInput, ResultRecord, UserStatistics,
    format_win_rate,
};
pub use postgres::PgStatisticsStore;
pub use store::{StatisticsStore, StatisticsTx, UpsertedResult};
