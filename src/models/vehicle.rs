//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y el enum de estado operativo.
//! Mapea a la tabla `vehicles` {id, name, status, last_maintenance}.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado operativo del vehículo
///
/// Los labels canónicos son los que se guardan en la columna `status`
/// y los que se serializan en el log de auditoría.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleStatus {
    #[serde(rename = "Плохое")]
    Bad,
    #[serde(rename = "Среднее")]
    Average,
    #[serde(rename = "Хорошее")]
    Good,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 3] = [VehicleStatus::Good, VehicleStatus::Average, VehicleStatus::Bad];

    /// Label canónico (el que se persiste)
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Good => "Хорошее",
            VehicleStatus::Average => "Среднее",
            VehicleStatus::Bad => "Плохое",
        }
    }

    /// Posición en la escala Bad < Average < Good
    pub fn rank(&self) -> u8 {
        match self {
            VehicleStatus::Bad => 1,
            VehicleStatus::Average => 2,
            VehicleStatus::Good => 3,
        }
    }

    /// Parsear exactamente un label canónico (filas de BD, no input de operador)
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vehicle principal - una fila de la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub status: VehicleStatus,
    pub last_maintenance: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn new(id: i64, name: impl Into<String>, status: VehicleStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            last_maintenance: None,
        }
    }
}
