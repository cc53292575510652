use std::sync::Arc;
use validator::Validate;

use crate::dto::audit_dto::{ArchiveRequest, HistoryQuery, StatsQuery, DEFAULT_HISTORY_LIMIT};
use crate::models::audit::{ArchiveOutcome, AuditEntry, AuditStats};
use crate::services::audit_logger::AuditLogger;
use crate::utils::errors::AppError;

pub struct AuditController {
    audit: Arc<AuditLogger>,
    allow_clear: bool,
}

impl AuditController {
    pub fn new(audit: Arc<AuditLogger>, allow_clear: bool) -> Self {
        Self { audit, allow_clear }
    }

    pub async fn vehicle_history(&self, vehicle_id: i64, query: HistoryQuery) -> Result<Vec<AuditEntry>, AppError> {
        query.validate()?;
        self.audit
            .history_for_vehicle(vehicle_id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    }

    pub async fn batch_history(&self, batch_id: &str) -> Result<Vec<AuditEntry>, AppError> {
        self.audit.history_for_batch(batch_id).await
    }

    pub async fn stats(&self, query: StatsQuery) -> Result<AuditStats, AppError> {
        let (start, end) = query.window()?;
        self.audit.stats_between(start, end).await
    }

    pub async fn archive(&self, request: ArchiveRequest) -> Result<ArchiveOutcome, AppError> {
        request.validate()?;
        self.audit.archive(request.days_to_keep).await
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        if !self.allow_clear {
            return Err(AppError::Forbidden(
                "clearing the audit trail is disabled in production".to_string(),
            ));
        }
        self.audit.clear_all().await
    }
}
