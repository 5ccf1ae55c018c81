//! Single-threaded reference backends
//!
//! `ScalarGridEngine` is the authoritative implementation of the Life update;
//! every other backend must match it bit-for-bit (see the equivalence tests
//! in `parallel.rs` and `device.rs`).

use crate::strategy::{ComputeStrategy, EngineError, Lifecycle};
use crate::workload;

/// Life over a double-buffered host grid, one thread, fully synchronous.
pub struct ScalarGridEngine {
    width: usize,
    height: usize,
    seed: u64,
    current: Vec<u32>,
    next: Vec<u32>,
    lifecycle: Lifecycle,
}

impl ScalarGridEngine {
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            current: Vec::new(),
            next: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Read-only view of the authoritative grid. Always denotes the latest
    /// generation; the swap exchanges buffer roles, never contents.
    pub fn cells(&self) -> &[u32] {
        &self.current
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl ComputeStrategy for ScalarGridEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin_initialize();
        self.current = workload::seed_cells(self.seed, self.width, self.height);
        self.next = vec![0; self.current.len()];
        self.lifecycle.ready();
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.lifecycle.expect_ready("step");
        workload::step_slice(&self.current, &mut self.next, 0, self.width, self.height);
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

/// The timer-accumulation workload, single thread, single buffer.
///
/// No neighbor dependency and no double buffer: every element is bumped by
/// the configured per-step delta, in place.
pub struct ScalarTimerEngine {
    elements: usize,
    seed: u64,
    delta: f32,
    timers: Vec<f32>,
    lifecycle: Lifecycle,
}

impl ScalarTimerEngine {
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

impl ComputeStrategy for ScalarTimerEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin_initialize();
        self.timers = workload::seed_timers(self.seed, self.elements);
        self.lifecycle.ready();
        Ok(())
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.lifecycle.expect_ready("step");
        for timer in &mut self.timers {
            *timer += self.delta;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if self.lifecycle.dispose() {
            self.timers = Vec::new();
        }
    }
}
