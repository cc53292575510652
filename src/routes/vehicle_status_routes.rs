use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::controllers::vehicle_status_controller::VehicleStatusController;
use crate::dto::vehicle_status_dto::{
    BatchResponse, ResolveRequest, TransitionRequest, UpdateStatusRequest, ValidateNameRequest,
    ValidateStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::status_update::{
    MatchCandidate, NameValidation, TransitionOutcome, UpdateResult, ValidationOutcome,
};
use crate::models::vehicle::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/resolve", post(resolve_vehicle))
}

pub fn create_status_router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_status))
        .route("/transition", post(validate_transition))
        .route("/name", post(validate_name))
        .route("/update", post(update_status))
        .route("/batch", post(update_batch))
}

fn controller(state: &AppState) -> VehicleStatusController {
    VehicleStatusController::new(state.orchestrator.clone())
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Vehicle>>>, AppError> {
    let vehicles = controller(&state).list().await?;
    Ok(Json(ApiResponse::success(vehicles)))
}

async fn resolve_vehicle(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<Vec<MatchCandidate>>>, AppError> {
    let candidates = controller(&state).resolve(request).await?;
    Ok(Json(ApiResponse::success(candidates)))
}

async fn validate_status(
    State(state): State<AppState>,
    Json(request): Json<ValidateStatusRequest>,
) -> Json<ApiResponse<ValidationOutcome>> {
    Json(ApiResponse::success(controller(&state).validate_status(request)))
}

async fn validate_transition(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<TransitionOutcome>>, AppError> {
    let outcome = controller(&state).validate_transition(request)?;
    Ok(Json(ApiResponse::success(outcome)))
}

async fn validate_name(
    State(state): State<AppState>,
    Json(request): Json<ValidateNameRequest>,
) -> Json<ApiResponse<NameValidation>> {
    Json(ApiResponse::success(controller(&state).validate_name(request)))
}

async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateStatusRequest>,
) -> Json<ApiResponse<UpdateResult>> {
    let ctx = state.operator_context(&headers);
    let result = controller(&state).update(request, ctx).await;
    let message = result.message.clone().or_else(|| result.error.clone()).unwrap_or_default();
    Json(ApiResponse::success_with_message(result, message))
}

async fn update_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<ApiResponse<BatchResponse>>, AppError> {
    let ctx = state.operator_context(&headers);
    let response = controller(&state).batch(payload, ctx).await?;
    Ok(Json(ApiResponse::success(response)))
}
