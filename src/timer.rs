use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Per-run timing collector shared by every worker of a scan.
///
/// Besides wall-clock durations it hands out logical timestamps from a single atomic clock, so
/// events recorded by different workers can be totally ordered.
#[derive(Debug)]
pub struct Timer {
    /// Scan start.
    init_timestamp: Instant,

    /// Logical clock; every recorded event takes the next tick.
    clock: AtomicU64,
}

impl Timer {
    #[inline]
    pub fn new() -> Self {
        Self {
            init_timestamp: Instant::now(),
            clock: AtomicU64::new(0),
        }
    }

    #[inline]
    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    /// Local recorder for one worker. Records are kept by the worker and handed back to the
    /// orchestrator when it exits, so no slot is ever written by two threads.
    #[inline]
    pub fn worker(&self, thread_id: usize) -> WorkerTimer<'_> {
        WorkerTimer {
            timer: self,
            thread_id,
            records: Vec::new(),
            pending: None,
        }
    }

    /// Stops the clock and assembles the per-worker records, indexed by worker id.
    pub fn finalize(&self, records_per_thread: Vec<Vec<RoundRecord>>) -> TimingStats {
        TimingStats {
            init_timestamp: self.init_timestamp,
            completion_timestamp: Instant::now(),
            records_per_thread,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// What one worker did in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRecord {
    pub round: usize,
    /// Logical time the compute phase began.
    pub compute_started: u64,
    /// Logical time the worker reached the barrier.
    pub arrived: u64,
    /// Logical time the barrier let the worker go.
    pub released: u64,
    pub computation_time: Duration,
    pub wait_time: Duration,
}

#[derive(Debug, Clone, Copy)]
struct PendingRound {
    round: usize,
    compute_started: u64,
    started_at: Instant,
    arrived: u64,
    arrived_at: Instant,
}

/// A single worker's view of the [`Timer`].
#[derive(Debug)]
pub struct WorkerTimer<'a> {
    timer: &'a Timer,
    thread_id: usize,
    records: Vec<RoundRecord>,
    pending: Option<PendingRound>,
}

impl WorkerTimer<'_> {
    #[inline]
    pub fn thread_id(&self) -> usize {
        self.thread_id
    }

    /// Marks the start of the compute phase of `round`.
    #[inline]
    pub fn start_computation(&mut self, round: usize) {
        let compute_started = self.timer.tick();
        let now = Instant::now();
        self.pending = Some(PendingRound {
            round,
            compute_started,
            started_at: now,
            arrived: compute_started,
            arrived_at: now,
        });
    }

    /// Marks the end of the compute phase, right before entering the barrier.
    #[inline]
    pub fn end_computation(&mut self) {
        let arrived = self.timer.tick();
        if let Some(pending) = self.pending.as_mut() {
            pending.arrived = arrived;
            pending.arrived_at = Instant::now();
        }
    }

    /// Marks the barrier release and files the round.
    #[inline]
    pub fn released(&mut self) {
        let released = self.timer.tick();
        let now = Instant::now();
        if let Some(pending) = self.pending.take() {
            self.records.push(RoundRecord {
                round: pending.round,
                compute_started: pending.compute_started,
                arrived: pending.arrived,
                released,
                computation_time: pending.arrived_at.duration_since(pending.started_at),
                wait_time: now.duration_since(pending.arrived_at),
            });
        }
    }

    #[inline]
    pub fn into_records(self) -> Vec<RoundRecord> {
        self.records
    }
}

/// Timing statistics of one scan.
#[derive(Debug, Clone)]
pub struct TimingStats {
    /// Scan start
    pub init_timestamp: Instant,
    /// Scan completion
    pub completion_timestamp: Instant,
    /// Round records organized by \[thread_id\]\[round\]
    pub records_per_thread: Vec<Vec<RoundRecord>>,
}

impl TimingStats {
    /// Total runtime from init to completion.
    #[inline]
    pub fn total_runtime(&self) -> Duration {
        self.completion_timestamp
            .duration_since(self.init_timestamp)
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.records_per_thread.len()
    }

    /// Sum of a thread's compute phases.
    #[inline]
    pub fn thread_total_computation_time(&self, thread_id: usize) -> Option<Duration> {
        let records = self.records_per_thread.get(thread_id)?;
        Some(records.iter().map(|r| r.computation_time).sum())
    }

    /// Sum of a thread's barrier waits.
    #[inline]
    pub fn thread_total_wait_time(&self, thread_id: usize) -> Option<Duration> {
        let records = self.records_per_thread.get(thread_id)?;
        Some(records.iter().map(|r| r.wait_time).sum())
    }

    #[inline]
    pub fn thread_round_count(&self, thread_id: usize) -> usize {
        self.records_per_thread
            .get(thread_id)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Checks that no worker started round `i + 1` before every worker had arrived at the
    /// barrier of round `i`.
    pub fn rounds_are_fenced(&self) -> bool {
        let rounds = self
            .records_per_thread
            .iter()
            .map(|records| records.len())
            .max()
            .unwrap_or(0);

        (1..rounds).all(|round| {
            let last_arrival = self
                .records_per_thread
                .iter()
                .filter_map(|records| records.get(round - 1))
                .map(|r| r.arrived)
                .max();
            let first_start = self
                .records_per_thread
                .iter()
                .filter_map(|records| records.get(round))
                .map(|r| r.compute_started)
                .min();
            match (last_arrival, first_start) {
                (Some(arrived), Some(started)) => arrived < started,
                _ => true,
            }
        })
    }

    /// Prints a table of compute times, one row per round and one column per worker.
    ///
    /// The summary rows show total compute time, total barrier wait and the compute share of
    /// the whole runtime for each worker.
    pub fn plot(&self) {
        let max_rounds = self
            .records_per_thread
            .iter()
            .map(|records| records.len())
            .max()
            .unwrap_or(0);

        let num_threads = self.num_threads();

        if max_rounds == 0 || num_threads == 0 {
            println!("No timing data available to plot.");
            return;
        }

        let total_runtime = self.total_runtime();

        println!("\nCOMPUTATION TIME TABLE");
        println!("Time format: milliseconds (ms) with microsecond precision");
        println!("Total Runtime: {:.3} ms", duration_to_ms(total_runtime));
        println!("{}", "=".repeat(12 + num_threads * 13));

        print!("{:<12}", "Round");
        for thread_id in 0..num_threads {
            print!(" {:<12}", format!("Worker {}", thread_id));
        }
        println!();

        print!("{}", "-".repeat(12));
        for _ in 0..num_threads {
            print!(" {}", "-".repeat(12));
        }
        println!();

        for round in 0..max_rounds {
            print!("{:<12}", round);
            for records in &self.records_per_thread {
                match records.get(round) {
                    Some(record) => print!(" {:<12.3}", duration_to_ms(record.computation_time)),
                    None => print!(" {:<12}", "-"),
                }
            }
            println!();
        }

        println!("{}", "=".repeat(12 + num_threads * 13));

        print!("{:<12}", "Total Comp");
        for thread_id in 0..num_threads {
            let total = self.thread_total_computation_time(thread_id).unwrap_or_default();
            print!(" {:<12.3}", duration_to_ms(total));
        }
        println!();

        print!("{:<12}", "Total Wait");
        for thread_id in 0..num_threads {
            let total = self.thread_total_wait_time(thread_id).unwrap_or_default();
            print!(" {:<12.3}", duration_to_ms(total));
        }
        println!();

        print!("{:<12}", "Comp Ratio%");
        for thread_id in 0..num_threads {
            let comp_time = self.thread_total_computation_time(thread_id).unwrap_or_default();
            if total_runtime.as_nanos() > 0 {
                let ratio = comp_time.as_nanos() as f64 / total_runtime.as_nanos() as f64;
                print!(" {:<12.1}", ratio * 100.0);
            } else {
                print!(" {:<12}", "0.0");
            }
        }
        println!();
    }
}

/// Convert Duration to milliseconds as f64
#[inline]
fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}
