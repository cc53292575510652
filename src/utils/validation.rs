//! Utilidades de validación
//!
//! Helpers de texto compartidos por el validador de nombres y los DTOs HTTP.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // Marcado que sugiere inyección (HTML / scripts) en texto libre
    static ref MARKUP_REGEX: Regex = Regex::new(r"(?i)[<>]|javascript:|\bon\w+\s*=").unwrap();
}

/// Validar y convertir string a datetime
pub fn validate_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"RFC3339".to_string());
            error
        })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud mínima y máxima (en caracteres, no bytes)
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// Detectar marcado sospechoso (no rechaza, solo avisa)
pub fn contains_markup(value: &str) -> bool {
    MARKUP_REGEX.is_match(value)
}
