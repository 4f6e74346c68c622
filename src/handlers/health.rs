// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::{common::error::AppError, config::AppState};

// Liveness: o processo está de pé.
pub async fn liveness() -> &'static str {
    "OK"
}

// ---
// Prontidão: roda o relatório de consistência.
// 200 com o relatório quando pronto, 503 com o mesmo corpo quando não.
// ---
pub async fn consistency(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = app_state.reporter().report().await?;

    let status = if report.is_ready() {
        StatusCode::OK
    } else {
        tracing::warn!("⚠️ Sistema não está pronto: {:?}", report.readiness_failures());
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(report)))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(liveness))
        .route("/api/health/consistency", get(consistency))
        .with_state(app_state)
}
