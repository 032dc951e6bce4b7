//! # Cafe Server
//!
//! HTTP front end for the tournament platform: the axum router, its
//! authentication layers, configuration loading, logging and metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
