//! Modelos del pipeline de actualización de estado
//!
//! Requests de operador, candidatos de matching, resultados de validación
//! y resultados por ítem / por lote.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vehicle::{Vehicle, VehicleStatus};

/// Request de actualización tal como lo escribe el operador
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdateRequest {
    #[serde(rename = "carName", alias = "name")]
    pub car_name: String,
    #[serde(rename = "status", alias = "desiredStatus")]
    pub desired_status: String,
}

impl StatusUpdateRequest {
    pub fn new(car_name: impl Into<String>, desired_status: impl Into<String>) -> Self {
        Self {
            car_name: car_name.into(),
            desired_status: desired_status.into(),
        }
    }
}

/// Tipo de coincidencia de un candidato
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Exact,
    CaseInsensitive,
    Fuzzy,
}

/// Candidato devuelto por el matcher, ordenado de mejor a peor
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub vehicle: Vehicle,
    pub similarity: f64,
    pub match_type: MatchType,
}

/// Resultado de validar un label de estado
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid(status: VehicleStatus) -> Self {
        Self {
            is_valid: true,
            normalized_status: Some(status),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            normalized_status: None,
            error: Some(error.into()),
        }
    }
}

/// Clasificación de una transición old -> new
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub is_valid: bool,
    pub is_no_change: bool,
    pub is_upgrade: bool,
    pub is_downgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Resultado de validar un nombre de vehículo
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NameValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Clasificación final de un ítem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
    Failed,
}

impl UpdateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOutcome::Updated => "updated",
            UpdateOutcome::Unchanged => "unchanged",
            UpdateOutcome::Failed => "failed",
        }
    }
}

/// Resultado de una actualización individual
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    pub changed: bool,
    pub car_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl UpdateResult {
    pub fn updated(vehicle: &Vehicle, old_status: VehicleStatus, new_status: VehicleStatus) -> Self {
        Self {
            success: true,
            changed: true,
            car_name: vehicle.name.clone(),
            vehicle_id: Some(vehicle.id),
            old_status: Some(old_status),
            new_status: Some(new_status),
            message: Some(format!("{}: {} → {}", vehicle.name, old_status, new_status)),
            error: None,
            suggestions: Vec::new(),
        }
    }

    pub fn unchanged(vehicle: &Vehicle) -> Self {
        Self {
            success: true,
            changed: false,
            car_name: vehicle.name.clone(),
            vehicle_id: Some(vehicle.id),
            old_status: Some(vehicle.status),
            new_status: Some(vehicle.status),
            message: Some(format!("{}: status already set to {}", vehicle.name, vehicle.status)),
            error: None,
            suggestions: Vec::new(),
        }
    }

    pub fn failed(car_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: false,
            car_name: car_name.into(),
            vehicle_id: None,
            old_status: None,
            new_status: None,
            message: None,
            error: Some(error.into()),
            suggestions: Vec::new(),
        }
    }

    /// Adjuntar el vehículo resuelto a un fallo posterior al matching
    pub fn for_vehicle(mut self, vehicle: &Vehicle) -> Self {
        self.car_name = vehicle.name.clone();
        self.vehicle_id = Some(vehicle.id);
        self.old_status = Some(vehicle.status);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn outcome(&self) -> UpdateOutcome {
        match (self.success, self.changed) {
            (true, true) => UpdateOutcome::Updated,
            (true, false) => UpdateOutcome::Unchanged,
            (false, _) => UpdateOutcome::Failed,
        }
    }
}

/// Contadores agregados de un lote
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Agregado de una ejecución por lotes. No se persiste, solo las entradas de auditoría.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: String,
    pub total: usize,
    pub successful_items: Vec<UpdateResult>,
    pub failed_items: Vec<UpdateResult>,
    pub unchanged_items: Vec<UpdateResult>,
    pub summary: BatchSummary,
    /// Ítems no intentados porque venció el deadline
    pub skipped: usize,
    pub cancelled: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
}

impl BatchReport {
    pub fn new(batch_id: String, total: usize, start_time: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            total,
            successful_items: Vec::new(),
            failed_items: Vec::new(),
            unchanged_items: Vec::new(),
            summary: BatchSummary::default(),
            skipped: 0,
            cancelled: false,
            start_time,
            end_time: start_time,
            duration_ms: 0,
        }
    }

    /// Clasificar un resultado en updated / unchanged / failed
    pub fn push(&mut self, result: UpdateResult) {
        match result.outcome() {
            UpdateOutcome::Updated => {
                self.summary.updated += 1;
                self.successful_items.push(result);
            }
            UpdateOutcome::Unchanged => {
                self.summary.unchanged += 1;
                self.unchanged_items.push(result);
            }
            UpdateOutcome::Failed => {
                self.summary.failed += 1;
                self.failed_items.push(result);
            }
        }
    }

    pub fn attempted(&self) -> usize {
        self.summary.updated + self.summary.unchanged + self.summary.failed
    }

    pub fn finish(&mut self, end_time: DateTime<Utc>) {
        self.end_time = end_time;
        self.duration_ms = (end_time - self.start_time).num_milliseconds().max(0);
    }

    /// Razones de fallo "nombre: error", en orden de entrada
    pub fn failure_reasons(&self) -> Vec<String> {
        self.failed_items
            .iter()
            .map(|item| {
                format!(
                    "{}: {}",
                    item.car_name,
                    item.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect()
    }
}
