//! Registry persistence metrics.
//!
//! Provides functions for recording load/save timings and registry size.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Persistence operation being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    Load,
    Save,
}

impl StorageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOperation::Load => "load",
            StorageOperation::Save => "save",
        }
    }

    fn duration_metric(&self) -> &'static str {
        match self {
            StorageOperation::Load => "registry_load_duration_seconds",
            StorageOperation::Save => "registry_save_duration_seconds",
        }
    }
}

/// Record a failed load or save.
pub fn record_persistence_error(operation: StorageOperation) {
    counter!(
        "registry_persistence_errors_total",
        "operation" => operation.as_str()
    )
    .increment(1);
}

/// Record the number of groups reachable from the registry, main included.
pub fn record_group_count(count: usize) {
    gauge!("registry_groups").set(count as f64);
}

/// Times a persistence operation.
///
/// ```ignore
/// let timer = StorageTimer::new(StorageOperation::Save);
/// let result = self.write_document();
/// timer.record();
/// ```
pub struct StorageTimer {
    operation: StorageOperation,
    start: Instant,
}

impl StorageTimer {
    pub fn new(operation: StorageOperation) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        histogram!(self.operation.duration_metric()).record(self.start.elapsed().as_secs_f64());
    }
}
