//! HTTP API for the tournament platform.
//!
//! # Modules
//!
//! - [`tournaments`]: Catalogue listing, organizer CRUD and the status sweep
//! - [`registrations`]: Register/unregister, waitlist promotion, participant lists
//! - [`statistics`]: Result recording, player statistics, badges and leaderboard
//! - [`middleware`]: Bearer-token layers for user and admin routes
//! - [`request_id`]: Request correlation and access logging
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                                     public
//! GET    /api/tournaments                            public
//! GET    /api/tournaments/{id}                       public
//! GET    /api/tournaments/{id}/participants          public
//! GET    /api/users/{id}/statistics                  public
//! GET    /api/users/{id}/badges                      public
//! GET    /api/statistics/leaderboard                 public
//! POST   /api/tournaments/{id}/register              user
//! DELETE /api/tournaments/{id}/register              user
//! GET    /api/users/me/registrations                 user
//! POST   /api/tournaments                            admin
//! PUT    /api/tournaments/{id}                       admin
//! DELETE /api/tournaments/{id}                       admin
//! POST   /api/tournaments/expire                     admin
//! POST   /api/tournaments/{id}/promote               admin
//! PATCH  /api/tournaments/{id}/registrations/{user}  admin
//! POST   /api/tournaments/{id}/reconcile             admin
//! POST   /api/tournaments/{id}/results               admin
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cafe_core::{auth::TokenService, db::{Database, DatabaseConfig}};
//! use cafe_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(&DatabaseConfig::from_env()).await?;
//! let tokens = TokenService::new("a_development_secret_of_32_bytes_or_more")?;
//! let app = create_router(AppState::new(db, tokens));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is permissive; put the API behind a proxy that restricts origins in
//! production.

pub mod error;
pub mod middleware;
pub mod registrations;
pub mod request_id;
pub mod statistics;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
};
use cafe_core::{
    auth::TokenService,
    db::Database,
    registration::{PgLedgerStore, RegistrationLedger},
    stats::{PgStatisticsStore, StatisticsEngine},
    tournament::TournamentManager,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub tournaments: Arc<TournamentManager>,
    pub ledger: Arc<RegistrationLedger<PgLedgerStore>>,
    pub stats: Arc<StatisticsEngine<PgStatisticsStore>>,
    pub db: Database,
}

impl AppState {
    /// Wire every component to one connection pool
    pub fn new(db: Database, tokens: TokenService) -> Self {
        let pool = Arc::new(db.pool().clone());
        Self {
            tokens: Arc::new(tokens),
            tournaments: Arc::new(TournamentManager::new(pool.clone())),
            ledger: Arc::new(RegistrationLedger::new(PgLedgerStore::new(pool.clone()))),
            stats: Arc::new(StatisticsEngine::new(PgStatisticsStore::new(pool))),
            db,
        }
    }
}

/// Create the complete router with all endpoints and middleware
pub fn create_router(state: AppState) -> Router {
    let api_routes = create_api_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_api_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/tournaments", get(tournaments::list_tournaments))
        .route("/tournaments/{id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{id}/participants",
            get(registrations::participants),
        )
        .route("/users/{id}/statistics", get(statistics::user_statistics))
        .route("/users/{id}/badges", get(statistics::user_badges))
        .route("/statistics/leaderboard", get(statistics::leaderboard));

    let user_routes = Router::new()
        .route(
            "/tournaments/{id}/register",
            post(registrations::register).delete(registrations::unregister),
        )
        .route("/users/me/registrations", get(registrations::my_registrations))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_user,
        ));

    let admin_routes = Router::new()
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{id}",
            axum::routing::put(tournaments::update_tournament)
                .delete(tournaments::delete_tournament),
        )
        .route("/tournaments/expire", post(tournaments::expire_tournaments))
        .route("/tournaments/{id}/promote", post(registrations::promote))
        .route(
            "/tournaments/{id}/registrations/{user_id}",
            patch(registrations::update_status),
        )
        .route("/tournaments/{id}/reconcile", post(registrations::reconcile))
        .route("/tournaments/{id}/results", post(statistics::record_result))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
}

/// `GET /health`: 200 when the database answers, 503 otherwise
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = state.db.health_check().await.is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
