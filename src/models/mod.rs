//! Modelos del sistema
//!
//! Vehículos y su estado canónico, resultados de actualización y
//! entradas del registro de auditoría.

pub mod audit;
pub mod status_update;
pub mod vehicle;

pub use vehicle::{Vehicle, VehicleStatus};
