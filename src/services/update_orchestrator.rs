//! Orquestador de actualizaciones de estado
//!
//! Compone matcher + validador + store + auditoría. Cada ítem recorre:
//! Pending → Matched|Unmatched → Validated|Invalid → Applied|Unchanged|Failed.
//! Un ítem fallido nunca aborta un lote; lo único que devuelve error al
//! caller es un payload de lote que no es un array.

use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::models::audit::{AuditEvent, AuditPayload, OperatorContext};
use crate::models::status_update::{BatchReport, MatchCandidate, StatusUpdateRequest, UpdateResult};
use crate::models::vehicle::Vehicle;
use crate::repositories::{StoreError, VehicleStore};
use crate::services::audit_logger::{new_batch_id, AuditLogger};
use crate::services::batch_report::render_report;
use crate::services::metrics::StatusMetrics;
use crate::services::name_matcher::NameMatcher;
use crate::services::status_validator::StatusValidator;
use crate::utils::errors::{bad_request_error, AppResult};

// Ítem de lote ya parseado, o la razón por la que no se pudo parsear
type BatchItem = Result<StatusUpdateRequest, String>;

pub struct UpdateOrchestrator {
    store: Arc<dyn VehicleStore>,
    audit: Arc<AuditLogger>,
    metrics: Arc<StatusMetrics>,
    matcher: NameMatcher,
    validator: StatusValidator,
}

impl UpdateOrchestrator {
    pub fn new(store: Arc<dyn VehicleStore>, audit: Arc<AuditLogger>, metrics: Arc<StatusMetrics>) -> Self {
        Self {
            store,
            audit,
            metrics,
            matcher: NameMatcher::default(),
            validator: StatusValidator::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: NameMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_validator(mut self, validator: StatusValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn validator(&self) -> &StatusValidator {
        &self.validator
    }

    pub fn audit(&self) -> &Arc<AuditLogger> {
        &self.audit
    }

    pub async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        Ok(self.store.list_all().await?)
    }

    /// Candidatos para un nombre; por defecto al umbral de sugerencias
    pub async fn resolve_vehicle(&self, name: &str, min_similarity: Option<f64>) -> AppResult<Vec<MatchCandidate>> {
        let vehicles = self.store.list_all().await?;
        let threshold = min_similarity.unwrap_or(self.matcher.config().suggestion_threshold);
        Ok(self.matcher.resolve(name, &vehicles, threshold))
    }

    /// Actualizar un vehículo. Nunca falla: el error va dentro del resultado.
    pub async fn update_single(
        &self,
        car_name: &str,
        raw_status: Option<&str>,
        ctx: &OperatorContext,
    ) -> UpdateResult {
        self.process_item(car_name, raw_status, ctx, None).await
    }

    pub async fn update_batch(&self, requests: &[StatusUpdateRequest], ctx: &OperatorContext) -> BatchReport {
        let items = requests.iter().cloned().map(Ok).collect();
        self.run_batch(items, ctx, None).await
    }

    /// Igual que `update_batch`, pero no empieza ningún ítem después de `deadline`.
    /// El reporte refleja solo los ítems intentados.
    pub async fn update_batch_until(
        &self,
        requests: &[StatusUpdateRequest],
        ctx: &OperatorContext,
        deadline: Instant,
    ) -> BatchReport {
        let items = requests.iter().cloned().map(Ok).collect();
        self.run_batch(items, ctx, Some(deadline)).await
    }

    /// Lote desde JSON sin tipar. Un payload que no es array se rechaza antes
    /// de leer el store o escribir auditoría; un ítem mal formado es un fallo
    /// de ese ítem.
    pub async fn update_batch_value(&self, payload: &Value, ctx: &OperatorContext) -> AppResult<BatchReport> {
        let raw_items = payload
            .as_array()
            .ok_or_else(|| bad_request_error("Batch payload must be a JSON array of {carName, status} objects"))?;

        let items = raw_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<StatusUpdateRequest>(item.clone())
                    .map_err(|e| format!("Malformed item #{}: {}", index + 1, e))
            })
            .collect();

        Ok(self.run_batch(items, ctx, None).await)
    }

    pub fn generate_report(&self, report: &BatchReport) -> String {
        render_report(report)
    }

    async fn run_batch(&self, items: Vec<BatchItem>, ctx: &OperatorContext, deadline: Option<Instant>) -> BatchReport {
        let batch_id = new_batch_id();
        let mut report = BatchReport::new(batch_id.clone(), items.len(), chrono::Utc::now());

        info!("📦 Lote {} iniciado por {}: {} ítems", batch_id, ctx.operator, items.len());
        self.audit
            .log(
                AuditPayload::new(AuditEvent::BatchStart, ctx)
                    .with_batch(Some(&batch_id))
                    .with_meta("total", items.len()),
            )
            .await;

        for (index, item) in items.iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    report.cancelled = true;
                    report.skipped = items.len() - index;
                    warn!("⏱️ Lote {} cortado por deadline: {} ítems sin intentar", batch_id, report.skipped);
                    break;
                }
            }

            let result = match item {
                Ok(request) => {
                    self.process_item(&request.car_name, Some(&request.desired_status), ctx, Some(&batch_id))
                        .await
                }
                Err(reason) => self.record_malformed(index, reason, ctx, &batch_id).await,
            };
            report.push(result);
        }

        report.finish(chrono::Utc::now());
        self.metrics.record_batch();

        let mut payload = AuditPayload::new(AuditEvent::BatchComplete, ctx)
            .with_batch(Some(&batch_id))
            .with_meta("total", report.total)
            .with_meta("updated", report.summary.updated)
            .with_meta("unchanged", report.summary.unchanged)
            .with_meta("failed", report.summary.failed)
            .with_meta("skipped", report.skipped)
            .with_meta("cancelled", report.cancelled)
            .with_meta("durationMs", report.duration_ms)
            .with_meta("failureReasons", report.failure_reasons());
        payload.success = report.summary.failed == 0 && !report.cancelled;
        if !payload.success {
            payload.error = Some(format!(
                "{} item(s) failed, {} skipped",
                report.summary.failed, report.skipped
            ));
        }
        self.audit.log(payload).await;

        info!(
            "✅ Lote {} terminado en {} ms: {} actualizados, {} sin cambios, {} fallidos",
            batch_id, report.duration_ms, report.summary.updated, report.summary.unchanged, report.summary.failed
        );
        report
    }

    async fn record_malformed(&self, index: usize, reason: &str, ctx: &OperatorContext, batch_id: &str) -> UpdateResult {
        warn!("⚠️ Ítem mal formado en lote {}: {}", batch_id, reason);
        let result = UpdateResult::failed(format!("#{}", index + 1), reason);
        self.metrics.record_update(result.outcome());

        // Sin carName: cuenta como no resuelto en las estadísticas
        let mut payload = AuditPayload::new(AuditEvent::StatusUpdate, ctx)
            .with_batch(Some(batch_id))
            .with_meta("itemIndex", index + 1);
        payload.success = false;
        payload.error = result.error.clone();
        self.audit.log(payload).await;

        result
    }

    /// Un ítem completo: aplicar + métrica + entrada de auditoría (siempre)
    async fn process_item(
        &self,
        car_name: &str,
        raw_status: Option<&str>,
        ctx: &OperatorContext,
        batch_id: Option<&str>,
    ) -> UpdateResult {
        let mut payload = AuditPayload::new(AuditEvent::StatusUpdate, ctx)
            .with_batch(batch_id)
            .with_meta("requestedName", car_name);
        if let Some(raw) = raw_status {
            payload = payload.with_meta("requestedStatus", raw);
        }

        let result = self.apply(car_name, raw_status, &mut payload).await;
        self.metrics.record_update(result.outcome());

        payload.car_id = result.vehicle_id;
        payload.car_name = Some(result.car_name.clone());
        payload.old_status = result.old_status;
        payload.new_status = result.new_status;
        payload.success = result.success;
        payload.error = result.error.clone();
        payload.metadata.insert("changed".to_string(), result.changed.into());
        if !result.suggestions.is_empty() {
            payload.metadata.insert("suggestions".to_string(), result.suggestions.clone().into());
        }
        self.audit.log(payload).await;

        result
    }

    async fn apply(&self, car_name: &str, raw_status: Option<&str>, payload: &mut AuditPayload) -> UpdateResult {
        let name_check = StatusValidator::validate_name(Some(car_name));
        if !name_check.is_valid {
            return UpdateResult::failed(car_name.trim(), name_check.error.unwrap_or_default());
        }
        if !name_check.warnings.is_empty() {
            warn!("⚠️ Nombre sospechoso '{}': {}", car_name, name_check.warnings.join("; "));
            payload
                .metadata
                .insert("nameWarnings".to_string(), name_check.warnings.clone().into());
        }
        let name = name_check.normalized_name.unwrap_or_else(|| car_name.trim().to_string());

        let vehicles = match self.store.list_all().await {
            Ok(vehicles) => vehicles,
            Err(e) => {
                error!("❌ No se pudo leer la flota: {}", e);
                return UpdateResult::failed(name, format!("Vehicle store unavailable: {}", e));
            }
        };

        let candidate = match self.matcher.find_best(&name, &vehicles) {
            Some(candidate) => candidate,
            None => {
                let suggestions = self.matcher.suggestions(&name, &vehicles);
                info!("🔍 Vehículo '{}' no encontrado ({} sugerencias)", name, suggestions.len());
                return UpdateResult::failed(&name, format!("Vehicle '{}' not found", name))
                    .with_suggestions(suggestions);
            }
        };
        payload
            .metadata
            .insert("matchType".to_string(), serde_json::to_value(candidate.match_type).unwrap_or(Value::Null));
        payload
            .metadata
            .insert("similarity".to_string(), candidate.similarity.into());
        let vehicle = candidate.vehicle;

        let status_check = self.validator.validate_status(raw_status);
        let desired = match status_check.normalized_status {
            Some(status) if status_check.is_valid => status,
            _ => {
                let error = status_check.error.unwrap_or_else(|| "Invalid status".to_string());
                return UpdateResult::failed(&vehicle.name, error).for_vehicle(&vehicle);
            }
        };

        if vehicle.status == desired {
            info!("⏸️ {} ya está en {}", vehicle.name, desired);
            return UpdateResult::unchanged(&vehicle);
        }

        let transition = StatusValidator::validate_transition(vehicle.status, desired);
        if let Some(warning) = &transition.warning {
            warn!("⚠️ {} ({})", warning, vehicle.name);
            payload
                .metadata
                .insert("transitionWarning".to_string(), warning.clone().into());
        }

        // Compare-and-set contra el estado observado al hacer el match
        match self.store.set_status(vehicle.id, Some(vehicle.status), desired).await {
            Ok(updated) => {
                info!("✅ {}: {} → {}", updated.name, vehicle.status, desired);
                UpdateResult::updated(&updated, vehicle.status, desired)
            }
            Err(StoreError::NotFound(id)) => {
                warn!("⚠️ Vehículo {} desapareció antes de actualizarse", id);
                UpdateResult::failed(&vehicle.name, format!("Vehicle '{}' no longer exists", vehicle.name))
                    .for_vehicle(&vehicle)
            }
            Err(e @ StoreError::Conflict { .. }) => {
                warn!("⚠️ Conflicto de concurrencia: {}", e);
                UpdateResult::failed(&vehicle.name, e.to_string()).for_vehicle(&vehicle)
            }
            Err(e) => {
                error!("❌ Error actualizando {}: {}", vehicle.name, e);
                UpdateResult::failed(&vehicle.name, format!("Store update failed: {}", e)).for_vehicle(&vehicle)
            }
        }
    }
}
