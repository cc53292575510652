//! Modelos de auditoría
//!
//! AuditEntry es append-only: se construye una vez por evento lógico y
//! nunca se modifica después de escribirse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::vehicle::VehicleStatus;

/// Tipo de evento auditado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    StatusUpdate,
    BatchStart,
    BatchComplete,
}

impl AuditEvent {
    /// Nombre en el log de texto
    pub fn as_log_str(&self) -> &'static str {
        match self {
            AuditEvent::StatusUpdate => "STATUS_UPDATE",
            AuditEvent::BatchStart => "BATCH_START",
            AuditEvent::BatchComplete => "BATCH_COMPLETE",
        }
    }
}

/// Quién pidió la operación y desde dónde
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    pub operator: String,
    pub source: String,
    pub reason: String,
}

impl OperatorContext {
    pub fn new(operator: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            source: source.into(),
            reason: "manual status update".to_string(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

impl Default for OperatorContext {
    fn default() -> Self {
        Self::new("system", "api")
    }
}

/// Datos estructurados que el caller entrega al logger
#[derive(Debug, Clone)]
pub struct AuditPayload {
    pub event: AuditEvent,
    pub car_id: Option<i64>,
    pub car_name: Option<String>,
    pub old_status: Option<VehicleStatus>,
    pub new_status: Option<VehicleStatus>,
    pub reason: String,
    pub source: String,
    pub operator: String,
    pub batch_id: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: Map<String, Value>,
}

impl AuditPayload {
    pub fn new(event: AuditEvent, ctx: &OperatorContext) -> Self {
        Self {
            event,
            car_id: None,
            car_name: None,
            old_status: None,
            new_status: None,
            reason: ctx.reason.clone(),
            source: ctx.source.clone(),
            operator: ctx.operator.clone(),
            batch_id: None,
            success: true,
            error: None,
            metadata: Map::new(),
        }
    }

    pub fn with_batch(mut self, batch_id: Option<&str>) -> Self {
        self.batch_id = batch_id.map(str::to_string);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

// Un valor libre no puede partir la línea ni falsear el separador
fn escape_log_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '|' => out.push_str("\\|"),
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    out
}

/// Entrada inmutable del trail de auditoría (una línea JSON en audit.jsonl)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<VehicleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<VehicleStatus>,
    pub reason: String,
    pub source: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AuditEntry {
    pub fn from_payload(audit_id: String, timestamp: DateTime<Utc>, payload: AuditPayload) -> Self {
        Self {
            audit_id,
            timestamp,
            event: payload.event,
            car_id: payload.car_id,
            car_name: payload.car_name,
            old_status: payload.old_status,
            new_status: payload.new_status,
            reason: payload.reason,
            source: payload.source,
            operator: payload.operator,
            batch_id: payload.batch_id,
            success: payload.success,
            error: payload.error,
            metadata: payload.metadata,
        }
    }

    /// Línea del log legible:
    /// `[<ts>] <EVENT> <SUCCESS|ERROR> <auditId> - key:value | key:value`
    pub fn to_log_line(&self) -> String {
        let mut details: Vec<String> = Vec::new();
        if let Some(id) = self.car_id {
            details.push(format!("carId:{}", id));
        }
        if let Some(name) = &self.car_name {
            details.push(format!("carName:{}", escape_log_value(name)));
        }
        if let Some(old) = self.old_status {
            details.push(format!("oldStatus:{}", old));
        }
        if let Some(new) = self.new_status {
            details.push(format!("newStatus:{}", new));
        }
        details.push(format!("operator:{}", escape_log_value(&self.operator)));
        details.push(format!("source:{}", escape_log_value(&self.source)));
        details.push(format!("reason:{}", escape_log_value(&self.reason)));
        if let Some(batch) = &self.batch_id {
            details.push(format!("batchId:{}", escape_log_value(batch)));
        }
        if let Some(error) = &self.error {
            details.push(format!("error:{}", escape_log_value(error)));
        }
        for (key, value) in &self.metadata {
            let rendered = match value {
                Value::String(s) => escape_log_value(s),
                other => escape_log_value(&other.to_string()),
            };
            details.push(format!("{}:{}", escape_log_value(key), rendered));
        }

        format!(
            "[{}] {} {} {} - {}",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.event.as_log_str(),
            if self.success { "SUCCESS" } else { "ERROR" },
            escape_log_value(&self.audit_id),
            details.join(" | ")
        )
    }
}

/// Estadísticas de eventos status_update en una ventana
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_updates: usize,
    pub successful_updates: usize,
    pub failed_updates: usize,
    /// "old → new" -> cantidad, solo cambios aplicados
    pub status_transition_counts: BTreeMap<String, usize>,
    pub per_vehicle_counts: BTreeMap<String, usize>,
    pub per_operator_counts: BTreeMap<String, usize>,
}

/// Resultado de un barrido de retención
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub archived: usize,
    pub retained: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_file: Option<PathBuf>,
}
