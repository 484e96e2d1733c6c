// Editor metrics
//
// Lightweight counters for what happened during a session, logged on shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session counters
///
/// Uses atomic operations so commands running on tokio workers can record
/// without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Documents successfully opened
    pub documents_opened: AtomicU64,

    /// Documents successfully written
    pub documents_saved: AtomicU64,

    /// Open attempts that failed (I/O, malformed XML, bad values)
    pub load_failures: AtomicU64,

    /// Save attempts that failed (serialization or I/O)
    pub save_failures: AtomicU64,

    /// Command invocations ignored because the same command was still running
    pub rejected_invocations: AtomicU64,

    /// Property change notifications delivered to bindings
    pub property_notifications: AtomicU64,

    /// Total time spent in load and save operations, in milliseconds
    pub io_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            documents_opened: AtomicU64::new(0),
            documents_saved: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            rejected_invocations: AtomicU64::new(0),
            property_notifications: AtomicU64::new(0),
            io_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_document_opened(&self) {
        self.documents_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_document_saved(&self) {
        self.documents_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_invocation(&self) {
        self.rejected_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_property_notification(&self) {
        self.property_notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_io_time(&self, duration: Duration) {
        self.io_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Documents: {} opened, {} saved",
            self.documents_opened.load(Ordering::Relaxed),
            self.documents_saved.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Failures: {} load, {} save",
            self.load_failures.load(Ordering::Relaxed),
            self.save_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Ignored re-entrant commands: {}, property notifications: {}",
            self.rejected_invocations.load(Ordering::Relaxed),
            self.property_notifications.load(Ordering::Relaxed)
        );
        tracing::info!("File I/O time: {}ms", self.io_time_ms.load(Ordering::Relaxed));
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
