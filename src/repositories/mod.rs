//! Repositorios
//!
//! El Vehicle Store es un colaborador externo: el núcleo solo depende del
//! trait `VehicleStore`. Hay una implementación PostgreSQL y una en memoria.

pub mod memory_vehicle_repository;
pub mod vehicle_repository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::vehicle::{Vehicle, VehicleStatus};

pub use memory_vehicle_repository::InMemoryVehicleStore;
pub use vehicle_repository::PgVehicleStore;

/// Errores del store de vehículos
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("vehicle {0} not found")]
    NotFound(i64),

    #[error("vehicle {id} was modified concurrently: expected {expected}, found {actual}")]
    Conflict {
        id: i64,
        expected: VehicleStatus,
        actual: VehicleStatus,
    },

    #[error("invalid status '{0}' stored for vehicle")]
    InvalidStatus(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Contrato del store canónico de vehículos
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Todos los vehículos, en orden estable (por id)
    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Vehicle>, StoreError>;

    /// Compare-and-set del estado. Si `expected` es `Some`, la fila debe tener
    /// todavía ese estado; si no, devuelve `StoreError::Conflict`.
    /// Cada cambio aplicado sella `last_maintenance` con la hora actual.
    async fn set_status(
        &self,
        id: i64,
        expected: Option<VehicleStatus>,
        new_status: VehicleStatus,
    ) -> Result<Vehicle, StoreError>;
}
