//! Data-parallel host backends (rayon)
//!
//! Same semantics as `scalar.rs`; the only difference is scheduling. Each
//! step partitions the index range into chunks, every chunk reads the
//! immutable `current` grid and writes its own disjoint slice of `next`, and
//! rayon's fork-join acts as the single barrier before the swap.

use rayon::prelude::*;

use crate::strategy::{ComputeStrategy, EngineError, Lifecycle};
use crate::workload;

/// Life over a double-buffered host grid, evaluated chunk-parallel.
pub struct ParallelGridEngine {
    width: usize,
    height: usize,
    seed: u64,
    chunk_size: usize,
    current: Vec<u32>,
    next: Vec<u32>,
    lifecycle: Lifecycle,
}

impl ParallelGridEngine {
    /// `chunk_size` is a performance tunable, not a correctness parameter;
    /// any value >= 1 produces results bit-identical to the scalar engine.
    pub fn new(width: usize, height: usize, seed: u64, chunk_size: usize) -> Self {
        Self {
            width,
            height,
            seed,
            chunk_size: chunk_size.max(1),
            current: Vec::new(),
            next: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn cells(&self) -> &[u32] {
        &self.current
    }
}

impl ComputeStrategy for ParallelGridEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin_initialize();
        self.current = workload::seed_cells(self.seed, self.width, self.height);
        self.next = vec![0; self.current.len()];
        self.lifecycle.ready();
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.lifecycle.expect_ready("step");
        let (width, height, chunk_size) = (self.width, self.height, self.chunk_size);
        let current = &self.current;
        // par_chunks_mut hands each worker a disjoint write slice; for_each
        // joins before we swap, so no step ever returns partially applied.
        self.next
            .par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(chunk_index, out)| {
                workload::step_slice(current, out, chunk_index * chunk_size, width, height);
            });
        std::mem::swap(&mut self.current, &mut self.next);
        Ok(())
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.current = Vec::new();
            self.next = Vec::new();
        }
    }
}

/// The timer workload, element-parallel and in place. Every element's update
/// is independent of every other element's value, so one buffer suffices.
pub struct ParallelTimerEngine {
    elements: usize,
    seed: u64,
    delta: f32,
    timers: Vec<f32>,
    lifecycle: Lifecycle,
}

impl ParallelTimerEngine {
    pub fn new(elements: usize, seed: u64, delta: f32) -> Self {
        Self {
            elements,
            seed,
            delta,
            timers: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.timers
    }
}

impl ComputeStrategy for ParallelTimerEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin_initialize();
        self.timers = workload::seed_timers(self.seed, self.elements);
        self.lifecycle.ready();
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.lifecycle.expect_ready("step");
        let delta = self.delta;
        self.timers.par_iter_mut().for_each(|timer| *timer += delta);
        Ok(())
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.timers = Vec::new();
        }
    }
}
