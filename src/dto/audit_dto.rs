use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::utils::errors::AppError;
use crate::utils::validation::validate_datetime;
use chrono::{DateTime, Utc};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// Query de historial de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

// Query de estadísticas (RFC3339)
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: String,
    pub end: String,
}

impl StatsQuery {
    /// Parsear ambos extremos de la ventana
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let mut errors = ValidationErrors::new();
        let start = validate_datetime(&self.start).map_err(|e| errors.add("start", e)).ok();
        let end = validate_datetime(&self.end).map_err(|e| errors.add("end", e)).ok();

        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

// Request de archivado
#[derive(Debug, Deserialize, Validate)]
pub struct ArchiveRequest {
    #[serde(rename = "daysToKeep")]
    #[validate(range(max = 3650))]
    pub days_to_keep: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_window_parses_rfc3339() {
        let query = StatsQuery {
            start: "2026-10-01T00:00:00Z".to_string(),
            end: "2026-10-19T00:00:00+03:00".to_string(),
        };
        let (start, end) = query.window().unwrap();
        assert!(start < end);
    }

    #[test]
    fn test_stats_window_reports_bad_fields() {
        let query = StatsQuery {
            start: "yesterday".to_string(),
            end: "2026-10-19T00:00:00Z".to_string(),
        };
        match query.window() {
            Err(AppError::Validation(errors)) => assert!(errors.field_errors().contains_key("start")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_history_limit_bounds() {
        assert!(HistoryQuery { limit: Some(0) }.validate().is_err());
        assert!(HistoryQuery { limit: Some(10) }.validate().is_ok());
        assert!(HistoryQuery { limit: None }.validate().is_ok());
    }
}
