//! Métricas Prometheus del servicio
//!
//! Registro propio por instancia (no el global) para que los tests no
//! compartan contadores.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::models::status_update::UpdateOutcome;

pub struct StatusMetrics {
    registry: Registry,
    status_updates: IntCounterVec,
    batches: IntCounter,
    audit_write_failures: IntCounter,
}

impl StatusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("fleet_status".to_string()), None)?;

        let status_updates = IntCounterVec::new(
            Opts::new("status_updates_total", "Status update attempts by outcome"),
            &["outcome"],
        )?;
        let batches = IntCounter::new("batches_total", "Batch update runs")?;
        let audit_write_failures = IntCounter::new(
            "audit_write_failures_total",
            "Audit entries that could not be written to disk",
        )?;

        registry.register(Box::new(status_updates.clone()))?;
        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(audit_write_failures.clone()))?;

        Ok(Self {
            registry,
            status_updates,
            batches,
            audit_write_failures,
        })
    }

    pub fn record_update(&self, outcome: UpdateOutcome) {
        self.status_updates.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_batch(&self) {
        self.batches.inc();
    }

    pub fn record_audit_failure(&self) {
        self.audit_write_failures.inc();
    }

    pub fn updates_with_outcome(&self, outcome: UpdateOutcome) -> u64 {
        self.status_updates.with_label_values(&[outcome.as_str()]).get()
    }

    /// Formato de texto de Prometheus para GET /metrics
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        let metrics = StatusMetrics::new().unwrap();
        metrics.record_update(UpdateOutcome::Updated);
        metrics.record_update(UpdateOutcome::Failed);
        metrics.record_audit_failure();

        let text = metrics.render().unwrap();
        assert!(text.contains("fleet_status_status_updates_total{outcome=\"updated\"} 1"));
        assert!(text.contains("fleet_status_audit_write_failures_total 1"));
        assert_eq!(metrics.updates_with_outcome(UpdateOutcome::Failed), 1);
    }
}
