//! Cumulative run counters with optional persistence.

use crate::core::pipeline::TrackingOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for tracking runs.
#[derive(Debug)]
pub struct RunLog {
    /// Day records fetched from the source
    days_fetched: AtomicU64,
    /// Days skipped during window selection
    days_skipped: AtomicU64,
    /// Initialization windows selected
    windows_selected: AtomicU64,
    /// Trace labels aggregated
    labels_aggregated: AtomicU64,
    /// Outlier points seen
    outlier_points: AtomicU64,
    /// Targets that failed
    runs_failed: AtomicU64,
    /// Reports written to disk
    reports_exported: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RunLog {
    /// Create a new run log.
    pub fn new() -> Self {
        Self {
            days_fetched: AtomicU64::new(0),
            days_skipped: AtomicU64::new(0),
            windows_selected: AtomicU64::new(0),
            labels_aggregated: AtomicU64::new(0),
            outlier_points: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            reports_exported: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a run log that resumes from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous run stats: {e}");
        }

        log
    }

    /// Record everything a successful run produced.
    pub fn record_outcome(&self, outcome: &TrackingOutcome) {
        self.days_fetched
            .fetch_add(outcome.day_count as u64, Ordering::Relaxed);
        self.days_skipped
            .fetch_add(outcome.window.skipped_indices.len() as u64, Ordering::Relaxed);
        if !outcome.window.is_empty() {
            self.windows_selected.fetch_add(1, Ordering::Relaxed);
        }
        self.labels_aggregated
            .fetch_add(outcome.labels.series.len() as u64, Ordering::Relaxed);
        self.outlier_points
            .fetch_add(outcome.labels.outlier_count() as u64, Ordering::Relaxed);
    }

    /// Record a failed run.
    pub fn record_failure(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record exported reports.
    pub fn record_reports_exported(&self, count: u64) {
        self.reports_exported.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            days_fetched: self.days_fetched.load(Ordering::Relaxed),
            days_skipped: self.days_skipped.load(Ordering::Relaxed),
            windows_selected: self.windows_selected.load(Ordering::Relaxed),
            labels_aggregated: self.labels_aggregated.load(Ordering::Relaxed),
            outlier_points: self.outlier_points.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            reports_exported: self.reports_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Day records fetched: {}\n\
             - Days skipped for sensor mismatch: {}\n\
             - Initialization windows selected: {}\n\
             - Trace labels aggregated: {}\n\
             - Outlier points: {}\n\
             - Failed runs: {}\n\
             - Reports exported: {}",
            stats.days_fetched,
            stats.days_skipped,
            stats.windows_selected,
            stats.labels_aggregated,
            stats.outlier_points,
            stats.runs_failed,
            stats.reports_exported
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                days_fetched: stats.days_fetched,
                days_skipped: stats.days_skipped,
                windows_selected: stats.windows_selected,
                labels_aggregated: stats.labels_aggregated,
                outlier_points: stats.outlier_points,
                runs_failed: stats.runs_failed,
                reports_exported: stats.reports_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.days_fetched
                    .store(persisted.days_fetched, Ordering::Relaxed);
                self.days_skipped
                    .store(persisted.days_skipped, Ordering::Relaxed);
                self.windows_selected
                    .store(persisted.windows_selected, Ordering::Relaxed);
                self.labels_aggregated
                    .store(persisted.labels_aggregated, Ordering::Relaxed);
                self.outlier_points
                    .store(persisted.outlier_points, Ordering::Relaxed);
                self.runs_failed
                    .store(persisted.runs_failed, Ordering::Relaxed);
                self.reports_exported
                    .store(persisted.reports_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.days_fetched.store(0, Ordering::Relaxed);
        self.days_skipped.store(0, Ordering::Relaxed);
        self.windows_selected.store(0, Ordering::Relaxed);
        self.labels_aggregated.store(0, Ordering::Relaxed);
        self.outlier_points.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
        self.reports_exported.store(0, Ordering::Relaxed);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub days_fetched: u64,
    pub days_skipped: u64,
    pub windows_selected: u64,
    pub labels_aggregated: u64,
    pub outlier_points: u64,
    pub runs_failed: u64,
    pub reports_exported: u64,
    pub session_start: DateTime<Utc>,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    days_fetched: u64,
    days_skipped: u64,
    windows_selected: u64,
    labels_aggregated: u64,
    outlier_points: u64,
    #[serde(default)]
    runs_failed: u64,
    reports_exported: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared run log.
pub type SharedRunLog = Arc<RunLog>;

/// Create a new shared run log.
pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

/// Create a new shared run log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}
