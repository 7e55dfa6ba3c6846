//! Execution metrics for kernels
//!
//! Each kernel call records one [`ExecutionMetrics`] and emits it as a
//! structured `tracing` event at debug level.
//!
//! ## Example
//!
//! ```text
//! use uniform_core::instrumentation::ExecutionMetrics;
//!
//! let start = std::time::Instant::now();
//! // ... execute operation ...
//! let metrics = ExecutionMetrics::new("uniform_like", n, n * 4, start);
//! metrics.log();
//! ```

use std::time::Instant;

/// Metrics for one operation execution
#[derive(Debug, Clone)]
pub struct ExecutionMetrics {
    /// Operation name (e.g., "uniform_like", "fill_with_test_pattern")
    pub operation_name: &'static str,
    /// Number of elements produced
    pub elements: usize,
    /// Number of bytes written
    pub bytes: usize,
    /// Wall-clock duration in microseconds
    pub duration_us: u64,
}

impl ExecutionMetrics {
    /// Create execution metrics from start time
    pub fn new(operation_name: &'static str, elements: usize, bytes: usize, start: Instant) -> Self {
        Self {
            operation_name,
            elements,
            bytes,
            duration_us: start.elapsed().as_micros() as u64,
        }
    }

    /// Elements produced per second
    pub fn elements_per_second(&self) -> f64 {
        if self.duration_us == 0 {
            return 0.0;
        }
        (self.elements as f64 / self.duration_us as f64) * 1_000_000.0
    }

    /// Write bandwidth in MiB/s
    pub fn bandwidth_mbps(&self) -> f64 {
        if self.duration_us == 0 {
            return 0.0;
        }
        (self.bytes as f64 / self.duration_us as f64) * 1_000_000.0 / (1024.0 * 1024.0)
    }

    /// Log metrics via tracing
    pub fn log(&self) {
        tracing::debug!(
            operation = self.operation_name,
            elements = self.elements,
            bytes = self.bytes,
            duration_us = self.duration_us,
            elements_per_second = self.elements_per_second(),
            bandwidth_mbps = self.bandwidth_mbps(),
            "operation_executed"
        );
    }
}
