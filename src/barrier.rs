//! Counting barrier built on a single shared counter.
//!
//! The counter records how many `(round, worker)` rendezvous points have completed so far. In
//! round `i` with `M` participants, every worker bumps it once and then waits for it to reach
//! `(i + 1) * M`. The counter never goes down, so one instance serves every round of a scan.

use std::time::{Duration, Instant};

use crate::{
    error::{Result, ScanError},
    sync::{AtomicBool, AtomicUsize, Backoff, Ordering},
};

/// How workers register their arrival within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarrierMode {
    /// Workers register strictly by id: worker `w` waits until the counter reads
    /// `round * M + w` and then advances it by compare-and-swap.
    Ordered,
    /// Workers register in any order with a fetch-and-increment. Drops the fixed registration
    /// order of [`BarrierMode::Ordered`]; the release condition is unchanged.
    #[default]
    Unordered,
}

/// A reusable spin-wait rendezvous for a fixed number of participants.
///
/// ## Failure mode
///
/// If a participant never reaches [`CountingBarrier::synchronize`] for a round it owes, everyone
/// else waits forever unless a timeout is set, in which case they fail with
/// [`ScanError::BarrierTimeout`]. A participant that gives up should call
/// [`CountingBarrier::abandon`] so the others stop waiting on it.
#[derive(Debug)]
pub struct CountingBarrier {
    counter: AtomicUsize,
    abandoned: AtomicBool,
    parties: usize,
    mode: BarrierMode,
    timeout: Option<Duration>,
}

impl CountingBarrier {
    /// # Panics
    ///
    /// Panics if `parties` is 0.
    pub fn new(parties: usize, mode: BarrierMode) -> Self {
        assert!(parties > 0, "a barrier needs at least one participant");
        CountingBarrier {
            counter: AtomicUsize::new(0),
            abandoned: AtomicBool::new(false),
            parties,
            mode,
            timeout: None,
        }
    }

    /// Bounds how long a single [`CountingBarrier::synchronize`] call may wait.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn parties(&self) -> usize {
        self.parties
    }

    #[inline]
    pub fn mode(&self) -> BarrierMode {
        self.mode
    }

    /// Current counter value.
    #[inline]
    pub fn counter(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }

    /// Marks the barrier as unusable and wakes every waiter with
    /// [`ScanError::BarrierAbandoned`].
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Blocks `worker` until all participants have reached this call for `round`.
    ///
    /// Every participant must call this exactly once per round, rounds in increasing order
    /// starting at 0, with `worker` in `0..parties`.
    pub fn synchronize(&self, worker: usize, round: usize) -> Result<()> {
        debug_assert!(worker < self.parties, "worker {worker} is not a participant");

        let base = round * self.parties;
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

        match self.mode {
            BarrierMode::Ordered => {
                let turn = base + worker;
                self.wait_until(worker, round, turn, deadline, |count| count >= turn)?;
                // only this worker may move the counter off `turn`
                if let Err(observed) =
                    self.counter
                        .compare_exchange(turn, turn + 1, Ordering::AcqRel, Ordering::Acquire)
                {
                    self.abandon();
                    return Err(ScanError::BarrierOutOfTurn {
                        worker,
                        round,
                        observed,
                        expected: turn,
                    });
                }
            }
            BarrierMode::Unordered => {
                let previous = self.counter.fetch_add(1, Ordering::AcqRel);
                debug_assert!(
                    previous >= base && previous < base + self.parties,
                    "worker {worker} registered for round {round} at counter {previous}"
                );
            }
        }

        let release = base + self.parties;
        self.wait_until(worker, round, release, deadline, |count| count >= release)
    }

    fn wait_until(
        &self,
        worker: usize,
        round: usize,
        expected: usize,
        deadline: Option<Instant>,
        done: impl Fn(usize) -> bool,
    ) -> Result<()> {
        let mut backoff = Backoff::new();
        loop {
            if self.is_abandoned() {
                return Err(ScanError::BarrierAbandoned { worker, round });
            }
            let observed = self.counter.load(Ordering::Acquire);
            if done(observed) {
                return Ok(());
            }
            if let Some(deadline) = deadline {
                if backoff.should_check_deadline() && Instant::now() >= deadline {
                    self.abandon();
                    return Err(ScanError::BarrierTimeout {
                        worker,
                        round,
                        observed,
                        expected,
                    });
                }
            }
            backoff.snooze();
        }
    }
}
