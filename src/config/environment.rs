//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Valores ausentes o
//! inválidos caen al default con un warning.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::services::name_matcher::MatcherConfig;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ {}='{}' inválido, usando default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub audit_log_dir: PathBuf,
    pub match_threshold: f64,
    pub suggestion_threshold: f64,
    pub max_suggestions: usize,
    pub default_operator: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        let matcher = MatcherConfig::default();
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            audit_log_dir: PathBuf::from("logs"),
            match_threshold: matcher.match_threshold,
            suggestion_threshold: matcher.suggestion_threshold,
            max_suggestions: matcher.max_suggestions,
            default_operator: "system".to_string(),
            cors_origins: Vec::new(),
            log_level: "debug".to_string(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: env_or("PORT", defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            audit_log_dir: env::var("AUDIT_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log_dir),
            match_threshold: env_or("MATCH_THRESHOLD", defaults.match_threshold).clamp(0.0, 1.0),
            suggestion_threshold: env_or("SUGGESTION_THRESHOLD", defaults.suggestion_threshold).clamp(0.0, 1.0),
            max_suggestions: env_or("MAX_SUGGESTIONS", defaults.max_suggestions),
            default_operator: env::var("DEFAULT_OPERATOR").unwrap_or(defaults.default_operator),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            match_threshold: self.match_threshold,
            suggestion_threshold: self.suggestion_threshold,
            max_suggestions: self.max_suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert!(!config.is_production());
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert_eq!(config.matcher_config().max_suggestions, 3);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("FLEET_STATUS_TEST_PORT", "not-a-port");
        assert_eq!(env_or("FLEET_STATUS_TEST_PORT", 8080u16), 8080);
        env::set_var("FLEET_STATUS_TEST_PORT", " 9090 ");
        assert_eq!(env_or("FLEET_STATUS_TEST_PORT", 8080u16), 9090);
        env::remove_var("FLEET_STATUS_TEST_PORT");
    }
}
