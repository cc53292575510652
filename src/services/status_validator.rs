//! Validador de estados
//!
//! Normaliza labels de estado escritos a mano (ruso o inglés, cualquier
//! mayúscula) al enum canónico, clasifica transiciones y valida nombres.

use std::collections::HashMap;

use crate::models::status_update::{NameValidation, TransitionOutcome, ValidationOutcome};
use crate::models::vehicle::VehicleStatus;
use crate::utils::validation::{contains_markup, validate_length, validate_not_empty};

pub const MAX_NAME_LENGTH: usize = 100;
const MIN_NAME_LENGTH: usize = 2;

/// Tabla por defecto label -> estado. Agregar un idioma es agregar filas.
const DEFAULT_STATUS_LABELS: &[(&str, VehicleStatus)] = &[
    ("хорошее", VehicleStatus::Good),
    ("среднее", VehicleStatus::Average),
    ("плохое", VehicleStatus::Bad),
    ("good", VehicleStatus::Good),
    ("average", VehicleStatus::Average),
    ("bad", VehicleStatus::Bad),
];

/// Diccionario de labels aceptados, indexado por la forma normalizada
#[derive(Debug, Clone)]
pub struct StatusLexicon {
    labels: HashMap<String, VehicleStatus>,
}

impl Default for StatusLexicon {
    fn default() -> Self {
        let mut lexicon = Self {
            labels: HashMap::new(),
        };
        for (label, status) in DEFAULT_STATUS_LABELS {
            lexicon.insert(label, *status);
        }
        lexicon
    }
}

impl StatusLexicon {
    /// Forma de comparación: sin espacios extremos, minúsculas Unicode
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase().to_lowercase()
    }

    pub fn with_synonym(mut self, label: &str, status: VehicleStatus) -> Self {
        self.insert(label, status);
        self
    }

    fn insert(&mut self, label: &str, status: VehicleStatus) {
        self.labels.insert(Self::normalize(label), status);
    }

    pub fn lookup(&self, raw: &str) -> Option<VehicleStatus> {
        self.labels.get(&Self::normalize(raw)).copied()
    }

    /// Labels aceptados, ordenados (para mensajes de error)
    pub fn accepted_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.labels.keys().cloned().collect();
        labels.sort();
        labels
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusValidator {
    lexicon: StatusLexicon,
}

impl StatusValidator {
    pub fn new(lexicon: StatusLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &StatusLexicon {
        &self.lexicon
    }

    /// Validar un label de estado; `None` y vacío son inválidos
    pub fn validate_status(&self, raw: Option<&str>) -> ValidationOutcome {
        let raw = match raw {
            Some(value) if !value.trim().is_empty() => value,
            _ => return ValidationOutcome::invalid("Status is empty"),
        };

        match self.lexicon.lookup(raw) {
            Some(status) => ValidationOutcome::valid(status),
            None => ValidationOutcome::invalid(format!(
                "Unknown status '{}'. Accepted values: {}",
                raw.trim(),
                self.lexicon.accepted_labels().join(", ")
            )),
        }
    }

    /// Clasificar la transición en la escala Bad < Average < Good.
    /// Todas las transiciones se permiten; una baja solo genera un aviso.
    pub fn validate_transition(old: VehicleStatus, new: VehicleStatus) -> TransitionOutcome {
        let is_upgrade = new.rank() > old.rank();
        let is_downgrade = new.rank() < old.rank();
        TransitionOutcome {
            is_valid: true,
            is_no_change: old == new,
            is_upgrade,
            is_downgrade,
            warning: is_downgrade.then(|| format!("Status downgrade: {} → {}", old, new)),
        }
    }

    /// Validar un nombre de vehículo. Recorta espacios pero respeta mayúsculas.
    pub fn validate_name(raw: Option<&str>) -> NameValidation {
        let trimmed = raw.unwrap_or_default().trim();

        let error = if validate_not_empty(trimmed).is_err() {
            Some("Vehicle name is empty".to_string())
        } else if validate_length(trimmed, 0, MAX_NAME_LENGTH).is_err() {
            Some(format!("Vehicle name is longer than {} characters", MAX_NAME_LENGTH))
        } else if validate_length(trimmed, MIN_NAME_LENGTH, MAX_NAME_LENGTH).is_err() {
            Some("Vehicle name is too short".to_string())
        } else {
            None
        };

        if let Some(error) = error {
            return NameValidation {
                is_valid: false,
                normalized_name: None,
                error: Some(error),
                warnings: Vec::new(),
            };
        }

        let mut warnings = Vec::new();
        if contains_markup(trimmed) {
            warnings.push("Vehicle name contains markup characters".to_string());
        }

        NameValidation {
            is_valid: true,
            normalized_name: Some(trimmed.to_string()),
            error: None,
            warnings,
        }
    }
}
