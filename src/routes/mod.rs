//! Rutas HTTP

pub mod audit_routes;
pub mod vehicle_status_routes;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

/// Header con el nombre del operador que hace la petición
pub const OPERATOR_HEADER: &str = "x-operator";

/// Router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/vehicles", vehicle_status_routes::create_vehicle_router())
        .nest("/api/status", vehicle_status_routes::create_status_router())
        .nest("/api/audit", audit_routes::create_audit_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "auditWriteFailures": state.audit.write_failures(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("metrics unavailable: {}", e),
        ),
    }
}
