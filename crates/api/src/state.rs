//! Shared application state for the Axum API server.

use sqlx::PgPool;

use vigia_common::config::AppConfig;
use vigia_push::PushClient;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub push: PushClient,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, push: PushClient) -> Self {
        Self { pool, config, push }
    }
}
