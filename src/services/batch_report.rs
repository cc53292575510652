//! Render del reporte de lote para el operador
//!
//! Es solo presentación: la persistencia es el trail de auditoría.

use std::fmt::Write;

use crate::models::status_update::{BatchReport, UpdateResult};

fn status_pair(item: &UpdateResult) -> String {
    match (item.old_status, item.new_status) {
        (Some(old), Some(new)) if old != new => format!("{} → {}", old, new),
        (_, Some(new)) => new.to_string(),
        _ => "-".to_string(),
    }
}

/// Reporte legible y determinista (mismo BatchReport, mismo texto)
pub fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 Batch {}", report.batch_id);
    let _ = writeln!(
        out,
        "Total: {} | Updated: {} | Unchanged: {} | Failed: {}",
        report.total, report.summary.updated, report.summary.unchanged, report.summary.failed
    );
    if report.cancelled {
        let _ = writeln!(out, "⏱️ Deadline reached, {} item(s) not attempted", report.skipped);
    }
    let _ = writeln!(out, "Duration: {} ms", report.duration_ms);

    if !report.successful_items.is_empty() {
        let _ = writeln!(out, "\n✅ Updated:");
        for item in &report.successful_items {
            let _ = writeln!(out, "  • {}: {}", item.car_name, status_pair(item));
        }
    }

    if !report.unchanged_items.is_empty() {
        let _ = writeln!(out, "\n⏸️ Unchanged:");
        for item in &report.unchanged_items {
            let _ = writeln!(out, "  • {}: {} (already set)", item.car_name, status_pair(item));
        }
    }

    if !report.failed_items.is_empty() {
        let _ = writeln!(out, "\n❌ Failed:");
        for item in &report.failed_items {
            let _ = writeln!(
                out,
                "  • {}: {}",
                item.car_name,
                item.error.as_deref().unwrap_or("unknown error")
            );
            if !item.suggestions.is_empty() {
                let _ = writeln!(out, "    did you mean: {}?", item.suggestions.join(", "));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::{Vehicle, VehicleStatus};
    use chrono::Utc;

    fn sample_report() -> BatchReport {
        let bmw = Vehicle::new(1, "BMW 4-Series", VehicleStatus::Good);
        let audi = Vehicle::new(2, "Audi RS6", VehicleStatus::Bad);
        let start = Utc::now();
        let mut report = BatchReport::new("batch_1_x".to_string(), 3, start);
        report.push(UpdateResult::updated(&bmw, VehicleStatus::Good, VehicleStatus::Average));
        report.push(UpdateResult::unchanged(&audi));
        report.push(
            UpdateResult::failed("Audi", "Vehicle 'Audi' not found")
                .with_suggestions(vec!["Audi RS6".to_string()]),
        );
        report.finish(start);
        report
    }

    #[test]
    fn test_render_report_sections() {
        let text = render_report(&sample_report());
        assert!(text.contains("Total: 3 | Updated: 1 | Unchanged: 1 | Failed: 1"));
        assert!(text.contains("  • BMW 4-Series: Хорошее → Среднее"));
        assert!(text.contains("  • Audi RS6: Плохое (already set)"));
        assert!(text.contains("  • Audi: Vehicle 'Audi' not found"));
        assert!(text.contains("did you mean: Audi RS6?"));
        assert!(!text.contains("Deadline"));
    }

    #[test]
    fn test_render_report_is_deterministic() {
        let report = sample_report();
        assert_eq!(render_report(&report), render_report(&report));
    }
}
