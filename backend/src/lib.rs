//! # Pilltime Backend
//!
//! Medication-reminder service: users register pills with recurrence rules,
//! and the service derives per-day checklists and month calendars, records
//! taken/not-taken state, and lets caregivers manage linked members.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (REST handlers, identity extraction)
//!     ↓
//! Domain Layer (recurrence engine, services)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```

pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::{PillService, ScheduleService, UserService};
use crate::io::alerting::{LogNotifier, SharedNotifier};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub pill_service: PillService,
    pub schedule_service: ScheduleService,
    pub user_service: UserService,
    pub notifier: SharedNotifier,
}

impl AppState {
    pub fn new(db: DbConnection) -> Self {
        Self {
            pill_service: PillService::new(db.clone()),
            schedule_service: ScheduleService::new(db.clone()),
            user_service: UserService::new(db),
            notifier: Arc::new(LogNotifier),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend() -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::init().await?;

    info!("Setting up domain services");
    Ok(AppState::new(db))
}

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    // CORS setup to allow the app frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::api_router())
        .layer(cors)
        .with_state(state)
}
