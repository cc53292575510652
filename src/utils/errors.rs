//! Sistema de manejo de errores
//!
//! Este módulo define los errores que pueden llegar al caller y su
//! conversión a respuestas HTTP. Los fallos por ítem de una actualización
//! NO pasan por aquí: viajan como campos de `UpdateResult`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::repositories::StoreError;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorResponse) {
        match self {
            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::Store(e) => {
                error!("Store error: {}", e);
                let status = match e {
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::Conflict { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::SERVICE_UNAVAILABLE,
                };
                (
                    status,
                    ErrorResponse {
                        error: "Store Error".to_string(),
                        message: e.to_string(),
                        details: None,
                        code: Some("STORE_ERROR".to_string()),
                    },
                )
            }

            AppError::Io(e) => {
                error!("Audit log I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Audit Log Error".to_string(),
                        message: "An error occurred while accessing the audit log".to_string(),
                        details: Some(json!({ "io_error": e.to_string() })),
                        code: Some("AUDIT_IO_ERROR".to_string()),
                    },
                )
            }

            AppError::Serialization(e) => {
                error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Serialization Error".to_string(),
                        message: "An error occurred while encoding data".to_string(),
                        details: Some(json!({ "serde_error": e.to_string() })),
                        code: Some("SERIALIZATION_ERROR".to_string()),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::VehicleStatus;

    #[test]
    fn test_store_errors_map_to_http_status() {
        let not_found = AppError::from(StoreError::NotFound(1)).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = AppError::from(StoreError::Conflict {
            id: 1,
            expected: VehicleStatus::Good,
            actual: VehicleStatus::Bad,
        })
        .into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_request_helper() {
        let response = bad_request_error("batch payload must be a JSON array").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
