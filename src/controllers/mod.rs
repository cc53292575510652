//! Controladores: validan la entrada HTTP y delegan en los servicios

pub mod audit_controller;
pub mod vehicle_status_controller;
