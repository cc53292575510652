//! Logger de auditoría append-only
//!
//! Cada evento se escribe dos veces, bajo el mismo mutex y en este orden:
//! una línea legible en `audit.log` y una línea JSON en `audit.jsonl`.
//! Las consultas leen solo `audit.jsonl`. Un fallo de escritura nunca se
//! propaga al caller: se registra con `error!`, suma al contador de fallos
//! y a la métrica `audit_write_failures_total`.

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::audit::{ArchiveOutcome, AuditEntry, AuditEvent, AuditPayload, AuditStats};
use crate::services::metrics::StatusMetrics;
use crate::utils::errors::{AppError, AppResult};

pub const TEXT_LOG_FILE: &str = "audit.log";
pub const STRUCTURED_LOG_FILE: &str = "audit.jsonl";
pub const ARCHIVE_PREFIX: &str = "audit-archive-";

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// `audit_<millis>_<aleatorio>`
pub fn new_audit_id(now: DateTime<Utc>) -> String {
    format!("audit_{}_{}", now.timestamp_millis(), random_suffix())
}

/// `batch_<millis>_<aleatorio>`, compartido por el bracket y sus ítems
pub fn new_batch_id() -> String {
    format!("batch_{}_{}", Utc::now().timestamp_millis(), random_suffix())
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    let mut buffer = String::with_capacity(line.len() + 1);
    buffer.push_str(line);
    buffer.push('\n');
    file.write_all(buffer.as_bytes()).await?;
    file.flush().await
}

/// Escribir a un temporal, fsync y rename sobre el destino
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&temp_path, path).await
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn join_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn parse_line(line: &str) -> Option<AuditEntry> {
    match serde_json::from_str(line) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("⚠️ Línea de auditoría ilegible ignorada: {}", e);
            None
        }
    }
}

pub struct AuditLogger {
    log_dir: PathBuf,
    text_log: PathBuf,
    structured_log: PathBuf,
    write_lock: Mutex<()>,
    write_failures: AtomicU64,
    metrics: Option<Arc<StatusMetrics>>,
}

impl AuditLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        Self {
            text_log: log_dir.join(TEXT_LOG_FILE),
            structured_log: log_dir.join(STRUCTURED_LOG_FILE),
            log_dir,
            write_lock: Mutex::new(()),
            write_failures: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<StatusMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn structured_log_path(&self) -> &Path {
        &self.structured_log
    }

    pub fn text_log_path(&self) -> &Path {
        &self.text_log
    }

    /// Escrituras que fallaron desde que arrancó el proceso
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Construir y escribir una entrada. Siempre devuelve la entrada,
    /// aunque no se haya podido persistir.
    pub async fn log(&self, payload: AuditPayload) -> AuditEntry {
        let _guard = self.write_lock.lock().await;

        let now = Utc::now();
        let entry = AuditEntry::from_payload(new_audit_id(now), now, payload);

        if let Err(e) = self.append(&entry).await {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            if let Some(metrics) = &self.metrics {
                metrics.record_audit_failure();
            }
            error!(
                "❌ No se pudo escribir la entrada de auditoría {} ({}): {}",
                entry.audit_id,
                entry.event.as_log_str(),
                e
            );
        } else {
            debug!("📝 Auditoría {} {}", entry.event.as_log_str(), entry.audit_id);
        }

        entry
    }

    // Llamar con write_lock tomado
    async fn append(&self, entry: &AuditEntry) -> AppResult<()> {
        let json = serde_json::to_string(entry)?;
        fs::create_dir_all(&self.log_dir).await?;
        append_line(&self.text_log, &entry.to_log_line()).await?;
        append_line(&self.structured_log, &json).await?;
        Ok(())
    }

    // Llamar con write_lock tomado
    async fn read_raw(&self) -> AppResult<String> {
        match fs::read_to_string(&self.structured_log).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_entries(&self) -> AppResult<Vec<AuditEntry>> {
        let _guard = self.write_lock.lock().await;
        let content = self.read_raw().await?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_line)
            .collect())
    }

    /// Historial de un vehículo, más reciente primero
    pub async fn history_for_vehicle(&self, vehicle_id: i64, limit: usize) -> AppResult<Vec<AuditEntry>> {
        let entries = self.read_entries().await?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| e.car_id == Some(vehicle_id))
            .take(limit)
            .collect())
    }

    /// Entradas de un lote en orden de escritura (batch_start primero)
    pub async fn history_for_batch(&self, batch_id: &str) -> AppResult<Vec<AuditEntry>> {
        let entries = self.read_entries().await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.batch_id.as_deref() == Some(batch_id))
            .collect())
    }

    /// Estadísticas de eventos status_update con timestamp en [start, end]
    pub async fn stats_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<AuditStats> {
        if start > end {
            return Err(AppError::BadRequest("start must not be after end".to_string()));
        }

        let entries = self.read_entries().await?;
        let mut stats = AuditStats::default();
        let mut transitions: BTreeMap<String, usize> = BTreeMap::new();

        for entry in entries
            .iter()
            .filter(|e| e.event == AuditEvent::StatusUpdate)
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
        {
            stats.total_updates += 1;
            if entry.success {
                stats.successful_updates += 1;
            } else {
                stats.failed_updates += 1;
            }

            if let (true, Some(old), Some(new)) = (entry.success, entry.old_status, entry.new_status) {
                if old != new {
                    *transitions.entry(format!("{} → {}", old, new)).or_default() += 1;
                }
            }

            let vehicle = entry.car_name.clone().unwrap_or_else(|| "<unresolved>".to_string());
            *stats.per_vehicle_counts.entry(vehicle).or_default() += 1;
            *stats.per_operator_counts.entry(entry.operator.clone()).or_default() += 1;
        }

        stats.status_transition_counts = transitions;
        Ok(stats)
    }

    /// Mover a un archivo de archivo las entradas más viejas que `days_to_keep`.
    ///
    /// El archivo se escribe completo antes de reescribir el log principal, y
    /// ambos por rename atómico: un crash intermedio puede duplicar entradas
    /// pero no perderlas. Las líneas ilegibles se conservan en el log principal.
    /// `audit.log` (texto) no se toca.
    pub async fn archive(&self, days_to_keep: u32) -> AppResult<ArchiveOutcome> {
        let _guard = self.write_lock.lock().await;

        // Una retención más allá del rango de fechas no archiva nada
        let cutoff = Utc::now()
            .checked_sub_signed(Duration::days(i64::from(days_to_keep)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let content = self.read_raw().await?;

        let mut archived: Vec<&str> = Vec::new();
        let mut retained: Vec<&str> = Vec::new();
        let mut retained_entries = 0;

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match parse_line(line) {
                Some(entry) if entry.timestamp < cutoff => archived.push(line),
                Some(_) => {
                    retained_entries += 1;
                    retained.push(line);
                }
                None => retained.push(line),
            }
        }

        if archived.is_empty() {
            info!("🗄️ Nada que archivar (corte: {})", cutoff.to_rfc3339());
            return Ok(ArchiveOutcome {
                archived: 0,
                retained: retained_entries,
                archive_file: None,
            });
        }

        let archive_file = self.log_dir.join(format!(
            "{}{}.jsonl",
            ARCHIVE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ));

        write_atomic(&archive_file, join_lines(&archived).as_bytes()).await?;
        write_atomic(&self.structured_log, join_lines(&retained).as_bytes()).await?;

        info!(
            "🗄️ {} entradas archivadas en {}, {} conservadas",
            archived.len(),
            archive_file.display(),
            retained_entries
        );

        Ok(ArchiveOutcome {
            archived: archived.len(),
            retained: retained_entries,
            archive_file: Some(archive_file),
        })
    }

    /// Archivos de archivo existentes, ordenados por nombre (= por fecha)
    pub async fn archive_files(&self) -> AppResult<Vec<PathBuf>> {
        self.list_archives().await
    }

    async fn list_archives(&self) -> AppResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut dir = match fs::read_dir(&self.log_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(ARCHIVE_PREFIX) && name.ends_with(".jsonl") {
                files.push(item.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Borra ambos logs y todos los archivos. Irreversible; solo para tests/reset.
    pub async fn clear_all(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let archives = self.list_archives().await?;
        remove_if_exists(&self.text_log).await?;
        remove_if_exists(&self.structured_log).await?;
        for archive in &archives {
            remove_if_exists(archive).await?;
        }

        warn!("🧹 Trail de auditoría borrado ({} archivos de archivo)", archives.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::OperatorContext;
    use crate::models::vehicle::VehicleStatus;
    use tempfile::TempDir;

    fn update_payload(car_id: i64, success: bool) -> AuditPayload {
        let mut payload = AuditPayload::new(AuditEvent::StatusUpdate, &OperatorContext::new("olga", "test"));
        payload.car_id = Some(car_id);
        payload.car_name = Some(format!("car-{}", car_id));
        payload.old_status = Some(VehicleStatus::Good);
        payload.new_status = Some(VehicleStatus::Bad);
        payload.success = success;
        if !success {
            payload.error = Some("boom".to_string());
        }
        payload
    }

    #[test]
    fn test_ids_have_prefix_and_are_unique() {
        let now = Utc::now();
        let a = new_audit_id(now);
        let b = new_audit_id(now);
        assert!(a.starts_with(&format!("audit_{}_", now.timestamp_millis())));
        assert_ne!(a, b);
        assert!(new_batch_id().starts_with("batch_"));
    }

    #[tokio::test]
    async fn test_log_writes_both_files() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());

        let entry = logger.log(update_payload(1, true)).await;

        let text = std::fs::read_to_string(logger.text_log_path()).unwrap();
        let json = std::fs::read_to_string(logger.structured_log_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(&entry.audit_id));
        let parsed: AuditEntry = serde_json::from_str(json.lines().next().unwrap()).unwrap();
        assert_eq!(parsed, entry);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // Un archivo donde debería ir el directorio de logs
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let metrics = Arc::new(StatusMetrics::new().unwrap());
        let logger = AuditLogger::new(&blocker).with_metrics(metrics.clone());

        let entry = logger.log(update_payload(1, true)).await;

        assert_eq!(entry.car_id, Some(1));
        assert_eq!(logger.write_failures(), 1);
        assert!(metrics.render().unwrap().contains("audit_write_failures_total 1"));
    }

    #[tokio::test]
    async fn test_vehicle_history_is_newest_first_and_limited() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        let first = logger.log(update_payload(1, true)).await;
        logger.log(update_payload(2, true)).await;
        let third = logger.log(update_payload(1, false)).await;

        let history = logger.history_for_vehicle(1, 10).await.unwrap();
        assert_eq!(
            history.iter().map(|e| e.audit_id.clone()).collect::<Vec<_>>(),
            vec![third.audit_id.clone(), first.audit_id]
        );
        assert_eq!(logger.history_for_vehicle(1, 1).await.unwrap()[0].audit_id, third.audit_id);
    }

    #[tokio::test]
    async fn test_reads_skip_garbage_lines() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        logger.log(update_payload(1, true)).await;
        append_line(logger.structured_log_path(), "{not json").await.unwrap();
        logger.log(update_payload(1, true)).await;

        assert_eq!(logger.history_for_vehicle(1, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stats_between() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        let start = Utc::now() - Duration::seconds(1);
        logger.log(update_payload(1, true)).await;
        logger.log(update_payload(2, false)).await;
        logger
            .log(AuditPayload::new(AuditEvent::BatchStart, &OperatorContext::default()))
            .await;
        let end = Utc::now() + Duration::seconds(1);

        let stats = logger.stats_between(start, end).await.unwrap();
        assert_eq!(stats.total_updates, 2);
        assert_eq!(stats.successful_updates, 1);
        assert_eq!(stats.failed_updates, 1);
        assert_eq!(stats.status_transition_counts.get("Хорошее → Плохое"), Some(&1));
        assert_eq!(stats.per_operator_counts.get("olga"), Some(&2));
        assert_eq!(stats.per_vehicle_counts.len(), 2);

        let empty = logger.stats_between(end, end + Duration::hours(1)).await.unwrap();
        assert_eq!(empty.total_updates, 0);
        assert!(logger.stats_between(end, start).await.is_err());
    }

    #[tokio::test]
    async fn test_archive_with_nothing_old() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        logger.log(update_payload(1, true)).await;

        let outcome = logger.archive(30).await.unwrap();
        assert_eq!(outcome, ArchiveOutcome { archived: 0, retained: 1, archive_file: None });
        assert!(logger.archive_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_removes_everything() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        logger.log(update_payload(1, true)).await;
        // days_to_keep = 0: todo lo anterior a "ahora" se archiva
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let outcome = logger.archive(0).await.unwrap();
        assert_eq!(outcome.archived, 1);

        logger.clear_all().await.unwrap();

        assert!(!logger.structured_log_path().exists());
        assert!(!logger.text_log_path().exists());
        assert!(logger.archive_files().await.unwrap().is_empty());
        assert!(logger.history_for_vehicle(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_archive_with_huge_retention_keeps_everything() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        logger.log(update_payload(1, true)).await;
        logger.log(update_payload(2, true)).await;

        let outcome = logger.archive(u32::MAX).await.unwrap();
        assert_eq!(outcome, ArchiveOutcome { archived: 0, retained: 2, archive_file: None });
        assert_eq!(logger.history_for_vehicle(1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_racing_archive_leaves_no_archive() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path());
        logger.log(update_payload(1, true)).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let (archived, cleared) = tokio::join!(logger.archive(0), logger.clear_all());
        archived.unwrap();
        cleared.unwrap();

        assert!(logger.archive_files().await.unwrap().is_empty());
        assert!(!logger.structured_log_path().exists());
    }
}
