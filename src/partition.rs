//! Static assignment of array indices to workers.

use std::ops::Range;

/// A half-open range `[start, end)` of array indices owned by one worker.
///
/// A block may be empty (`start == end`); its worker still takes part in every round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub start: usize,
    pub end: usize,
}

impl Block {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "block [{start}, {end}) is inverted");
        Block { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Number of workers that actually run for an array of `len` elements.
///
/// Requests above `len` are clamped, since the extra workers would own nothing. A request of
/// zero stays zero so the caller can reject it.
#[inline]
pub fn effective_workers(len: usize, requested: usize) -> usize {
    requested.min(len)
}

/// Block size for `len` elements over `workers` workers: `len / workers` rounded to the
/// nearest integer, halves rounding up.
#[inline]
pub fn block_size(len: usize, workers: usize) -> usize {
    let remainder = len % workers;
    len / workers + usize::from(remainder >= workers - remainder)
}

/// Splits `[0, len)` into one contiguous block per worker, ordered by worker id.
///
/// Every worker but the last gets `block_size(len, workers)` indices; the last one always ends
/// at `len` and absorbs the rounding remainder. Any bound that rounding pushes past `len` is
/// pulled back to `len`, so late workers may receive the empty block `[len, len)`.
///
/// `workers` is clamped into `1..=len`. An empty array yields no blocks.
///
/// ```rust
/// use synched_scan::partition::{compute_blocks, Block};
///
/// let blocks = compute_blocks(8, 3);
/// assert_eq!(blocks, vec![Block::new(0, 3), Block::new(3, 6), Block::new(6, 8)]);
/// ```
pub fn compute_blocks(len: usize, workers: usize) -> Vec<Block> {
    if len == 0 {
        return Vec::new();
    }

    let workers = effective_workers(len, workers).max(1);
    let size = block_size(len, workers);

    (0..workers)
        .map(|worker| {
            let start = worker.saturating_mul(size).min(len);
            let end = if worker == workers - 1 {
                len
            } else {
                (worker + 1).saturating_mul(size).min(len)
            };
            Block::new(start, end)
        })
        .collect()
}
