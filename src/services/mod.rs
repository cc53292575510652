//! Services module
//!
//! Este módulo contiene la lógica de negocio: resolución de nombres,
//! validación de estados, orquestación de actualizaciones y auditoría.

pub mod audit_logger;
pub mod batch_report;
pub mod metrics;
pub mod name_matcher;
pub mod status_validator;
pub mod update_orchestrator;

pub use audit_logger::AuditLogger;
pub use name_matcher::{MatcherConfig, NameMatcher};
pub use status_validator::{StatusLexicon, StatusValidator};
pub use update_orchestrator::UpdateOrchestrator;
