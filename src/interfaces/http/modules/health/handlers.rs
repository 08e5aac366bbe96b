//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::CheckInVerifier;

#[derive(Clone)]
pub struct HealthState {
    /// `None` when running on the in-memory store
    pub db: Option<DatabaseConnection>,
    pub storage: &'static str,
    pub checkin: Arc<CheckInVerifier>,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: ComponentHealth,
    pub active_scan_sessions: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub backend: String,
    pub status: String,
    pub latency_ms: Option<u64>,
}

async fn ping(db: &DatabaseConnection) -> bool {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "SELECT 1".to_string(),
    ))
    .await
    .is_ok()
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(state): State<HealthState>,
) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let reachable = match &state.db {
        Some(db) => ping(db).await,
        None => true,
    };

    let storage = ComponentHealth {
        backend: state.storage.to_string(),
        status: if reachable { "ok" } else { "error" }.to_string(),
        latency_ms: reachable.then(|| started.elapsed().as_millis() as u64),
    };

    let (http_status, overall) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status: overall.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            storage,
            active_scan_sessions: state.checkin.active_sessions(),
        }),
    )
}
