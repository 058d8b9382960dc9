use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks scan counters shared between the workers of one pool
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    files_scanned: Arc<AtomicU64>,
    files_skipped: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_skipped: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a file that was read and searched
    pub fn record_file_scanned(&self, bytes: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        debug!("Read {} bytes, total: {} bytes", bytes, total);
    }

    /// Records a file that could not be read or decoded
    pub fn record_file_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the current counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }

    /// Logs current counters
    pub fn log_stats(&self) {
        self.get_stats().log();
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of scan counters, cheap to copy and to send across processes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub bytes_read: u64,
}

impl ScanStats {
    pub fn log(&self) {
        info!(
            "Scan stats:\n\
             Files scanned: {}\n\
             Files skipped: {}\n\
             Bytes read: {}",
            self.files_scanned, self.files_skipped, self.bytes_read
        );
    }
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
        self.bytes_read += other.bytes_read;
    }
}
