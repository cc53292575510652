use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::dto::vehicle_status_dto::{
    BatchResponse, ResolveRequest, TransitionRequest, UpdateStatusRequest, ValidateNameRequest,
    ValidateStatusRequest,
};
use crate::models::audit::OperatorContext;
use crate::models::status_update::{
    MatchCandidate, NameValidation, TransitionOutcome, UpdateResult, ValidationOutcome,
};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::services::status_validator::StatusValidator;
use crate::services::update_orchestrator::UpdateOrchestrator;
use crate::utils::errors::AppError;

pub struct VehicleStatusController {
    orchestrator: Arc<UpdateOrchestrator>,
}

impl VehicleStatusController {
    pub fn new(orchestrator: Arc<UpdateOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn list(&self) -> Result<Vec<Vehicle>, AppError> {
        self.orchestrator.list_vehicles().await
    }

    pub async fn resolve(&self, request: ResolveRequest) -> Result<Vec<MatchCandidate>, AppError> {
        request.validate()?;
        self.orchestrator
            .resolve_vehicle(&request.name, request.min_similarity)
            .await
    }

    pub fn validate_status(&self, request: ValidateStatusRequest) -> ValidationOutcome {
        self.orchestrator
            .validator()
            .validate_status(request.status.as_deref())
    }

    pub fn validate_transition(&self, request: TransitionRequest) -> Result<TransitionOutcome, AppError> {
        let old = self.parse_status("oldStatus", &request.old_status)?;
        let new = self.parse_status("newStatus", &request.new_status)?;
        Ok(StatusValidator::validate_transition(old, new))
    }

    pub fn validate_name(&self, request: ValidateNameRequest) -> NameValidation {
        StatusValidator::validate_name(request.name.as_deref())
    }

    pub async fn update(&self, request: UpdateStatusRequest, mut ctx: OperatorContext) -> UpdateResult {
        if let Some(operator) = request.operator.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            ctx.operator = operator.to_string();
        }
        if let Some(reason) = request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            ctx = ctx.with_reason(reason);
        }
        self.orchestrator
            .update_single(&request.car_name, request.status.as_deref(), &ctx)
            .await
    }

    pub async fn batch(&self, payload: Value, ctx: OperatorContext) -> Result<BatchResponse, AppError> {
        let ctx = ctx.with_reason("batch status update");
        let report = self.orchestrator.update_batch_value(&payload, &ctx).await?;
        let report_text = self.orchestrator.generate_report(&report);
        Ok(BatchResponse { report, report_text })
    }

    fn parse_status(&self, field: &str, raw: &str) -> Result<VehicleStatus, AppError> {
        let outcome = self.orchestrator.validator().validate_status(Some(raw));
        outcome.normalized_status.ok_or_else(|| {
            AppError::BadRequest(format!(
                "{}: {}",
                field,
                outcome.error.unwrap_or_else(|| "invalid status".to_string())
            ))
        })
    }
}
