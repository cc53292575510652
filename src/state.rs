//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::models::audit::OperatorContext;
use crate::repositories::VehicleStore;
use crate::routes::OPERATOR_HEADER;
use crate::services::audit_logger::AuditLogger;
use crate::services::metrics::StatusMetrics;
use crate::services::name_matcher::NameMatcher;
use crate::services::update_orchestrator::UpdateOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub orchestrator: Arc<UpdateOrchestrator>,
    pub audit: Arc<AuditLogger>,
    pub metrics: Arc<StatusMetrics>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, store: Arc<dyn VehicleStore>) -> Result<Self, prometheus::Error> {
        let metrics = Arc::new(StatusMetrics::new()?);
        let audit = Arc::new(AuditLogger::new(&config.audit_log_dir).with_metrics(metrics.clone()));
        let orchestrator = Arc::new(
            UpdateOrchestrator::new(store, audit.clone(), metrics.clone())
                .with_matcher(NameMatcher::new(config.matcher_config())),
        );

        Ok(Self {
            config,
            orchestrator,
            audit,
            metrics,
        })
    }

    /// Operador desde el header `x-operator`, o el default configurado
    pub fn operator_context(&self, headers: &HeaderMap) -> OperatorContext {
        let operator = headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.config.default_operator.as_str());
        OperatorContext::new(operator, "http")
    }
}
