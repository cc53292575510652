use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};

use crate::controllers::audit_controller::AuditController;
use crate::dto::audit_dto::{ArchiveRequest, HistoryQuery, StatsQuery};
use crate::dto::ApiResponse;
use crate::models::audit::{ArchiveOutcome, AuditEntry, AuditStats};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_audit_router() -> Router<AppState> {
    Router::new()
        .route("/", delete(clear_all))
        .route("/vehicle/:id", get(vehicle_history))
        .route("/batch/:batch_id", get(batch_history))
        .route("/stats", get(stats))
        .route("/archive", post(archive))
}

fn controller(state: &AppState) -> AuditController {
    AuditController::new(state.audit.clone(), !state.config.is_production())
}

async fn vehicle_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEntry>>>, AppError> {
    let entries = controller(&state).vehicle_history(id, query).await?;
    Ok(Json(ApiResponse::success(entries)))
}

async fn batch_history(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AuditEntry>>>, AppError> {
    let entries = controller(&state).batch_history(&batch_id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<AuditStats>>, AppError> {
    let stats = controller(&state).stats(query).await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn archive(
    State(state): State<AppState>,
    Json(request): Json<ArchiveRequest>,
) -> Result<Json<ApiResponse<ArchiveOutcome>>, AppError> {
    let outcome = controller(&state).archive(request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn clear_all(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, AppError> {
    controller(&state).clear_all().await?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Audit trail cleared".to_string(),
    )))
}
