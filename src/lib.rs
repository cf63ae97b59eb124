//! # SynchedScan - Barrier-Synchronized Parallel Prefix Sum
//!
//! Computes the inclusive prefix sum (running total) of an integer array with the Hillis–Steele
//! scan. A fixed pool of workers shares two array buffers and a single counting barrier; each
//! worker owns a contiguous block of indices and drives every round on its own.
//!
//! ## Key Features
//!
//! - **Logarithmic Rounds**: `floor(log2(N)) + 1` rounds, the combine offset doubling each round
//! - **Double Buffering**: Every round reads one buffer and writes the other, so no element is
//!   read after being overwritten in the same round
//! - **Counter Barrier**: Workers meet on one monotonically increasing atomic counter instead of
//!   an OS synchronization primitive
//! - **Lock-Free Writes**: Blocks never overlap, so buffer writes need no locking
//! - **Explicit Failures**: Bad input, allocation failures and barrier timeouts come back as
//!   [`ScanError`] values before any shared state is leaked
//!
//! ## Usage Pattern
//!
//! ```rust
//! use synched_scan::{ScanConfig, ScanEngine};
//!
//! let engine = ScanEngine::new(ScanConfig::default().with_workers(2));
//! let output = engine.run(&[1, 1, 1, 1]).unwrap();
//!
//! assert_eq!(output.values, vec![1, 2, 3, 4]);
//! assert_eq!(output.rounds, 3);
//! ```
//!
//! ## Round Structure
//!
//! ```text
//! round i:  compute block of next from current  ->  barrier(i)  ->  swap roles
//! ```
//!
//! The only suspension point of a worker is the barrier. A worker whose block is empty still
//! meets the others there every round.
//!
//! ## Failure Mode
//!
//! A worker that never reaches the barrier blocks everyone else. Without a
//! [`ScanConfig::barrier_timeout`] that is a permanent hang; with one, the scan fails with
//! [`ScanError::BarrierTimeout`].


pub mod barrier;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod memory;
pub mod partition;
pub mod timer;

mod sync;

pub use barrier::{BarrierMode, CountingBarrier};
pub use config::ScanConfig;
pub use engine::{ScanEngine, ScanOutput, round_count};
pub use error::{Result, ScanError};
pub use memory::Side;
pub use partition::{Block, compute_blocks};

/// Element type of the scanned arrays. Sums wrap on overflow.
pub type Element = i64;

/// Computes the inclusive prefix sum of `input` with `workers` workers and default settings.
///
/// # Examples
///
/// ```rust
/// let sums = synched_scan::prefix_sum(&[3, 1, 4, 1, 5], 2).unwrap();
/// assert_eq!(sums, vec![3, 4, 8, 9, 14]);
/// ```
pub fn prefix_sum(input: &[Element], workers: usize) -> Result<Vec<Element>> {
    let config = ScanConfig::default().with_workers(workers);
    ScanEngine::new(config).run(input).map(|output| output.values)
}

/// Single-threaded inclusive prefix sum with the same wrapping semantics as the parallel scan.
pub fn prefix_sum_sequential(input: &[Element]) -> Vec<Element> {
    input
        .iter()
        .scan(0 as Element, |sum, &value| {
            *sum = sum.wrapping_add(value);
            Some(*sum)
        })
        .collect()
}
