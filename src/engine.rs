//! The Hillis–Steele round driver.
//!
//! Round `i` combines every element with the one `2^i` places before it:
//!
//! ```text
//! next[k] = current[k]                     if k < 2^i
//! next[k] = current[k] + current[k - 2^i]  otherwise
//! ```
//!
//! After `floor(log2(N)) + 1` rounds every element holds the sum of all elements up to and
//! including itself.

use std::thread;

use log::{debug, info, trace, warn};

use crate::{
    Element,
    barrier::CountingBarrier,
    config::ScanConfig,
    error::{Result, ScanError},
    memory::{BlockWriter, DoubleBuffer, Side},
    partition::{Block, compute_blocks, effective_workers},
    timer::{RoundRecord, Timer, TimingStats},
};

/// Number of rounds needed to scan `len` elements: `floor(log2(len)) + 1`, or 0 when empty.
#[inline]
pub fn round_count(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (usize::BITS - 1 - len.leading_zeros()) as usize + 1
    }
}

/// Compute phase of one worker for one round. Reads only the current side and writes only the
/// worker's block of the next side, so it never blocks and cannot fail.
pub(crate) fn combine_block(memory: &DoubleBuffer, writer: &BlockWriter<'_>, round: usize) {
    let offset = 1usize << round;
    let current = Side::current_for(round);
    let next = current.flip();

    for k in writer.block().range() {
        let value = if k < offset {
            memory.read(current, k)
        } else {
            memory
                .read(current, k)
                .wrapping_add(memory.read(current, k - offset))
        };
        writer.write(next, k, value);
    }
}

/// Abandons the barrier if the owning worker unwinds, so its peers fail instead of hanging.
struct AbandonOnPanic<'a>(&'a CountingBarrier);

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abandon();
        }
    }
}

fn worker_loop(
    worker: usize,
    block: Block,
    memory: &DoubleBuffer,
    barrier: &CountingBarrier,
    rounds: usize,
    timer: &Timer,
) -> Result<Vec<RoundRecord>> {
    let _guard = AbandonOnPanic(barrier);
    let writer = memory.block_writer(worker, block);
    let mut clock = timer.worker(worker);

    for round in 0..rounds {
        clock.start_computation(round);
        combine_block(memory, &writer, round);
        clock.end_computation();

        trace!("worker {worker} finished round {round} over {block:?}");
        barrier.synchronize(worker, round)?;
        clock.released();
    }

    Ok(clock.into_records())
}

/// What [`drive_rounds`] leaves behind.
#[derive(Debug)]
pub struct RoundsOutcome {
    /// The buffer holding the final values.
    pub result_side: Side,
    /// Round records indexed by worker id.
    pub records: Vec<Vec<RoundRecord>>,
}

/// Runs `rounds` rounds over `memory` with one worker per block.
///
/// The pool is spawned once; every worker drives all rounds on its own and meets the others
/// only at `barrier`, which must have exactly `blocks.len()` participants and a zero counter.
/// The input must already be on [`Side::A`].
///
/// If the pool cannot be fully started, or a worker fails, the barrier is abandoned so every
/// other worker returns; the first root-cause error is reported.
///
/// # Panics
///
/// Panics if the barrier and the partition disagree on the worker count.
pub fn drive_rounds(
    memory: &mut DoubleBuffer,
    blocks: &[Block],
    rounds: usize,
    barrier: &CountingBarrier,
    timer: &Timer,
) -> Result<RoundsOutcome> {
    assert_eq!(
        blocks.len(),
        barrier.parties(),
        "partition has {} blocks but the barrier expects {} workers",
        blocks.len(),
        barrier.parties()
    );

    let memory = &*memory;
    let results: Vec<Result<Vec<RoundRecord>>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(blocks.len());
        let mut spawn_error = None;

        for (worker, &block) in blocks.iter().enumerate() {
            let spawned = thread::Builder::new()
                .name(format!("scan-worker-{worker}"))
                .spawn_scoped(scope, move || {
                    worker_loop(worker, block, memory, barrier, rounds, timer)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    warn!("could not spawn worker {worker}, abandoning the scan");
                    barrier.abandon();
                    spawn_error = Some(ScanError::Spawn { worker, source });
                    break;
                }
            }
        }

        let mut results: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(ScanError::WorkerPanicked { worker }))
            })
            .collect();
        results.extend(spawn_error.map(Err));
        results
    });

    let mut records = Vec::with_capacity(results.len());
    let mut failure: Option<ScanError> = None;
    for result in results {
        match result {
            Ok(worker_records) => records.push(worker_records),
            Err(err) => {
                debug!("worker failed: {err}");
                let replace = match &failure {
                    None => true,
                    Some(current) => current.is_secondary() && !err.is_secondary(),
                };
                if replace {
                    failure = Some(err);
                }
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(RoundsOutcome {
            result_side: Side::result_after(rounds),
            records,
        }),
    }
}

/// Result of a complete scan.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// The inclusive prefix sum.
    pub values: Vec<Element>,
    /// The buffer the values were read from.
    pub result_side: Side,
    pub rounds: usize,
    /// The partition used, one block per worker that actually ran.
    pub blocks: Vec<Block>,
    pub stats: TimingStats,
}

/// Orchestrates a scan: validation, partitioning, allocation, the worker pool and read-out.
#[derive(Debug, Clone, Default)]
pub struct ScanEngine {
    config: ScanConfig,
}

impl ScanEngine {
    pub fn new(config: ScanConfig) -> Self {
        ScanEngine { config }
    }

    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Computes the inclusive prefix sum of `input`.
    ///
    /// Input and configuration problems are reported before any buffer is allocated or any
    /// worker started. Shared buffers are released on every path out of this function.
    pub fn run(&self, input: &[Element]) -> Result<ScanOutput> {
        if input.is_empty() {
            return Err(ScanError::EmptyInput);
        }
        if self.config.workers == 0 {
            return Err(ScanError::NoWorkers);
        }

        let len = input.len();
        let workers = effective_workers(len, self.config.workers);
        if workers < self.config.workers {
            warn!(
                "{} workers requested for {len} elements, running {workers}",
                self.config.workers
            );
        }

        let blocks = compute_blocks(len, workers);
        let rounds = round_count(len);
        debug!("scanning {len} elements in {rounds} rounds, blocks {blocks:?}");

        let mut memory = DoubleBuffer::from_slice(input)?;
        debug!("allocated 2 x {len} shared elements");

        let barrier = CountingBarrier::new(workers, self.config.barrier_mode)
            .with_timeout(self.config.barrier_timeout);
        let timer = Timer::new();

        let outcome = drive_rounds(&mut memory, &blocks, rounds, &barrier, &timer)?;
        let values = memory.to_vec(outcome.result_side);
        let stats = timer.finalize(outcome.records);

        info!(
            "scanned {len} elements with {workers} workers in {:?}",
            stats.total_runtime()
        );

        Ok(ScanOutput {
            values,
            result_side: outcome.result_side,
            rounds,
            blocks,
            stats,
        })
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::barrier::BarrierMode;

    #[test]
    fn round_count_is_floor_log2_plus_one() {
        assert_eq!(round_count(0), 0);
        assert_eq!(round_count(1), 1);
        assert_eq!(round_count(2), 2);
        assert_eq!(round_count(3), 2);
        assert_eq!(round_count(4), 3);
        assert_eq!(round_count(7), 3);
        assert_eq!(round_count(8), 4);
        assert_eq!(round_count(1000), 10);
        assert_eq!(round_count(1024), 11);
    }

    #[test]
    fn round_zero_combines_neighbours() {
        let memory = DoubleBuffer::from_slice(&[4, 3, 2, 1]).unwrap();
        let writer = memory.block_writer(0, Block::new(0, 4));
        combine_block(&memory, &writer, 0);

        // index 0 is copied, every other index adds its left neighbour
        assert_eq!(memory.to_vec(Side::B), vec![4, 7, 5, 3]);
        assert_eq!(memory.to_vec(Side::A), vec![4, 3, 2, 1]);
    }

    #[test]
    fn rounds_follow_the_worked_example() {
        let memory = DoubleBuffer::from_slice(&[1, 1, 1, 1]).unwrap();
        let left = memory.block_writer(0, Block::new(0, 2));
        let right = memory.block_writer(1, Block::new(2, 4));

        for writer in [&left, &right] {
            combine_block(&memory, writer, 0);
        }
        assert_eq!(memory.to_vec(Side::B), vec![1, 2, 2, 2]);

        for writer in [&left, &right] {
            combine_block(&memory, writer, 1);
        }
        assert_eq!(memory.to_vec(Side::A), vec![1, 2, 3, 4]);

        // the last round's offset reaches past the array and only copies
        for writer in [&left, &right] {
            combine_block(&memory, writer, 2);
        }
        assert_eq!(memory.to_vec(Side::B), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_block_writes_nothing() {
        let memory = DoubleBuffer::from_slice(&[1, 2]).unwrap();
        let writer = memory.block_writer(1, Block::new(2, 2));
        combine_block(&memory, &writer, 0);
        assert_eq!(memory.to_vec(Side::B), vec![0, 0]);
    }

    #[test]
    fn drive_rounds_reports_the_parity_side() {
        for len in [1usize, 2, 3, 4, 5, 8, 9] {
            let input: Vec<Element> = (1..=len as Element).collect();
            let mut memory = DoubleBuffer::from_slice(&input).unwrap();
            let blocks = compute_blocks(len, 2);
            let barrier = CountingBarrier::new(blocks.len(), BarrierMode::Ordered);
            let timer = Timer::new();

            let rounds = round_count(len);
            let outcome = drive_rounds(&mut memory, &blocks, rounds, &barrier, &timer).unwrap();

            let expected_side = if rounds % 2 == 0 { Side::A } else { Side::B };
            assert_eq!(outcome.result_side, expected_side);
            assert_eq!(barrier.counter(), rounds * blocks.len());

            let expected: Vec<Element> = (1..=len as Element).map(|k| k * (k + 1) / 2).collect();
            assert_eq!(memory.to_vec(outcome.result_side), expected);
        }
    }

    #[test]
    #[should_panic(expected = "partition has 2 blocks but the barrier expects 3 workers")]
    fn mismatched_barrier_is_rejected() {
        let mut memory = DoubleBuffer::from_slice(&[1, 2, 3]).unwrap();
        let blocks = compute_blocks(3, 2);
        let barrier = CountingBarrier::new(3, BarrierMode::Unordered);
        let _ = drive_rounds(&mut memory, &blocks, 2, &barrier, &Timer::new());
    }

    #[test]
    fn abandoned_barrier_fails_the_run() {
        let mut memory = DoubleBuffer::from_slice(&[1, 2, 3, 4]).unwrap();
        let blocks = compute_blocks(4, 2);
        let barrier = CountingBarrier::new(2, BarrierMode::Unordered);
        barrier.abandon();

        let err = drive_rounds(&mut memory, &blocks, 3, &barrier, &Timer::new()).unwrap_err();
        assert!(matches!(err, ScanError::BarrierAbandoned { round: 0, .. }));
    }

    #[test]
    fn panicking_worker_is_the_root_cause() {
        let mut memory = DoubleBuffer::from_slice(&[1, 2, 3, 4]).unwrap();
        // worker 1's block runs past the buffer, so it panics before its first round
        let blocks = [Block::new(0, 2), Block::new(2, 5)];
        let barrier = CountingBarrier::new(2, BarrierMode::Ordered);

        let err = drive_rounds(&mut memory, &blocks, 3, &barrier, &Timer::new()).unwrap_err();
        assert!(
            matches!(err, ScanError::WorkerPanicked { worker: 1 }),
            "unexpected error: {err}"
        );
        // worker 0 was released by the abandoned barrier instead of hanging
        assert!(barrier.is_abandoned());
        assert!(barrier.counter() < 2);
    }

    #[test]
    fn engine_keeps_its_config() {
        let config = ScanConfig::default()
            .with_workers(3)
            .with_barrier_mode(BarrierMode::Ordered);
        let engine = ScanEngine::new(config.clone());
        assert_eq!(engine.config(), &config);
    }
}
