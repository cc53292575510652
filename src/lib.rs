//! Reconciliación de estados de vehículos
//!
//! Resuelve nombres libres contra la flota, valida etiquetas de estado,
//! aplica actualizaciones individuales o por lotes y deja un registro de
//! auditoría en disco.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
