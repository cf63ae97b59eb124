//! Double-buffered shared memory for the scan rounds.
//!
//! ## Memory Layout
//!
//! ```text
//! Side::A: [ worker 0 block | worker 1 block | ... | worker M-1 block ]
//! Side::B: [ worker 0 block | worker 1 block | ... | worker M-1 block ]
//! ```
//!
//! In round `i` one side is *current* (read by everyone) and the other is *next* (each worker
//! writes only its own block). The roles flip every round, so the input starts on `Side::A` and
//! the result of `r` rounds lands on `Side::A` when `r` is even and on `Side::B` when it is odd.

use std::cell::UnsafeCell;

use crate::{
    Element,
    error::{Result, ScanError},
    partition::Block,
};

/// One of the two physical buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The other buffer.
    #[inline]
    pub fn flip(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// The side read from during `round`.
    #[inline]
    pub fn current_for(round: usize) -> Side {
        if round % 2 == 0 { Side::A } else { Side::B }
    }

    /// The side written to during `round`.
    #[inline]
    pub fn next_for(round: usize) -> Side {
        Side::current_for(round).flip()
    }

    /// The side holding the final values once `rounds` rounds have completed.
    #[inline]
    pub fn result_after(rounds: usize) -> Side {
        Side::current_for(rounds)
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Two equally sized element buffers shared by every worker of a scan.
///
/// Reads are allowed anywhere on either side. Writes go through a [`BlockWriter`], which limits
/// a worker to the indices of its own block.
pub struct DoubleBuffer {
    sides: [Box<[UnsafeCell<Element>]>; 2],
}

// SAFETY: DoubleBuffer is shared between workers because:
// 1. Each worker writes only through its BlockWriter, and blocks never overlap
// 2. Within a round, reads target the current side while writes target the next side
// 3. The barrier's acquire/release ordering publishes a round's writes before the next round
unsafe impl Sync for DoubleBuffer {}

impl DoubleBuffer {
    /// Allocates both buffers, loading `input` into [`Side::A`] and zeroing [`Side::B`].
    ///
    /// Allocation failures are reported instead of aborting the process; a partially built
    /// buffer is released before returning.
    pub fn from_slice(input: &[Element]) -> Result<Self> {
        let a = allocate(input.len(), |index| input[index])?;
        let b = allocate(input.len(), |_| 0)?;
        Ok(DoubleBuffer { sides: [a, b] })
    }

    /// Number of elements on each side.
    #[inline]
    pub fn len(&self) -> usize {
        self.sides[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `index` from `side`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn read(&self, side: Side, index: usize) -> Element {
        // SAFETY: nobody writes the side being read until the next barrier has passed
        unsafe { *self.sides[side.index()][index].get() }
    }

    /// Copies a whole side out. Meant for the orchestrator once every worker is done.
    pub fn to_vec(&self, side: Side) -> Vec<Element> {
        (0..self.len()).map(|index| self.read(side, index)).collect()
    }

    /// Hands out write access to `block`.
    ///
    /// Callers must not create two writers for overlapping blocks; the engine only builds
    /// writers from a partition.
    ///
    /// # Panics
    ///
    /// Panics if the block extends past the end of the buffer.
    pub(crate) fn block_writer(&self, worker: usize, block: Block) -> BlockWriter<'_> {
        assert!(
            block.end <= self.len(),
            "Block [{}, {}) of worker {} out of bounds (len: {})",
            block.start,
            block.end,
            worker,
            self.len()
        );
        BlockWriter {
            memory: self,
            worker,
            block,
        }
    }
}

fn allocate(len: usize, init: impl Fn(usize) -> Element) -> Result<Box<[UnsafeCell<Element>]>> {
    let mut side = Vec::new();
    side.try_reserve_exact(len).map_err(|source| ScanError::Allocation {
        elements: len,
        source,
    })?;
    side.extend((0..len).map(|index| UnsafeCell::new(init(index))));
    Ok(side.into_boxed_slice())
}

/// A worker's exclusive write handle over its block, on either side.
pub(crate) struct BlockWriter<'a> {
    memory: &'a DoubleBuffer,
    worker: usize,
    block: Block,
}

impl BlockWriter<'_> {
    #[inline]
    pub(crate) fn worker(&self) -> usize {
        self.worker
    }

    #[inline]
    pub(crate) fn block(&self) -> Block {
        self.block
    }

    #[inline]
    pub(crate) fn write(&self, side: Side, index: usize, value: Element) {
        debug_assert!(
            self.block.contains(index),
            "worker {} wrote index {} outside its block {:?}",
            self.worker,
            index,
            self.block
        );
        // SAFETY: the index belongs to this worker's block and nobody reads `side` this round
        unsafe {
            *self.memory.sides[side.index()][index].get() = value;
        }
    }
}
