use std::{num::NonZeroUsize, thread, time::Duration};

use crate::barrier::BarrierMode;

/// Settings for a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Requested worker count. Clamped to the array length at run time.
    pub workers: usize,
    /// How workers register at the barrier.
    pub barrier_mode: BarrierMode,
    /// Upper bound for every barrier wait. `None` waits forever.
    pub barrier_timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            barrier_mode: BarrierMode::default(),
            barrier_timeout: None,
        }
    }
}

impl ScanConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_barrier_mode(mut self, mode: BarrierMode) -> Self {
        self.barrier_mode = mode;
        self
    }

    pub fn with_barrier_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.barrier_timeout = timeout;
        self
    }
}
