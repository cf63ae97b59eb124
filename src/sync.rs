//! Atomics used by the barrier, swapped for loom's under `--cfg loom`.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Spins before falling back to yielding the time slice.
const SPIN_LIMIT: u32 = 64;

/// Progressive backoff for spin-wait loops.
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    #[inline]
    pub(crate) fn new() -> Self {
        Backoff { step: 0 }
    }

    #[cfg(not(loom))]
    #[inline]
    pub(crate) fn snooze(&mut self) {
        if self.step < SPIN_LIMIT {
            std::hint::spin_loop();
            self.step += 1;
        } else {
            std::thread::yield_now();
        }
    }

    // loom has to be told explicitly that a spinning thread cannot make progress
    #[cfg(loom)]
    #[inline]
    pub(crate) fn snooze(&mut self) {
        self.step = self.step.saturating_add(1);
        loom::thread::yield_now();
    }

    /// Whether it is worth reading the clock on this iteration.
    #[inline]
    pub(crate) fn should_check_deadline(&self) -> bool {
        self.step >= SPIN_LIMIT
    }
}
