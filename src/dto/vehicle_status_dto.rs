use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::status_update::BatchReport;

// Request para resolver un nombre contra la flota
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(rename = "minSimilarity")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_similarity: Option<f64>,
}

// Request para validar un label de estado
#[derive(Debug, Deserialize)]
pub struct ValidateStatusRequest {
    pub status: Option<String>,
}

// Request para clasificar una transición
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(rename = "oldStatus")]
    pub old_status: String,
    #[serde(rename = "newStatus")]
    pub new_status: String,
}

// Request para validar un nombre
#[derive(Debug, Deserialize)]
pub struct ValidateNameRequest {
    pub name: Option<String>,
}

// Request de actualización individual
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(rename = "carName", alias = "name")]
    pub car_name: String,
    pub status: Option<String>,
    pub operator: Option<String>,
    pub reason: Option<String>,
}

// Response de un lote: el reporte estructurado más su versión legible
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub report: BatchReport,
    #[serde(rename = "reportText")]
    pub report_text: String,
}
