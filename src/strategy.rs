//! The compute-strategy contract shared by every backend
//!
//! The harness drives engines exclusively through [`ComputeStrategy`]:
//! `initialize` once, `step` N times, `dispose` once. Engines own their
//! buffers for exactly that span and never call each other.

use thiserror::Error;
use tracing::warn;

/// Errors an engine or the harness can surface.
///
/// Contract violations (stepping outside the Ready state) are not errors:
/// they are programming bugs and panic loudly instead of being masked.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No usable strategy was configured; fatal before any step runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Buffer or device-memory allocation failed during initialize.
    #[error("resource allocation failed: {0}")]
    ResourceExhaustion(String),

    /// No GPU adapter satisfies the device backend's requirements.
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,

    /// The adapter refused to hand out a device.
    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Lifecycle interface every engine implements.
///
/// `initialize` is not idempotent; callers must invoke it exactly once.
/// `step` advances the workload by one generation/tick and is the unit of
/// work the harness times. `dispose` releases everything `initialize`
/// allocated and never fails, even after a failed or absent `initialize`.
pub trait ComputeStrategy {
    fn initialize(&mut self) -> Result<(), EngineError>;
    fn step(&mut self) -> Result<(), EngineError>;
    fn dispose(&mut self);
}

/// Per-instance lifecycle state: Uninitialized -> Ready -> Disposed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Disposed,
}

impl Lifecycle {
    /// Guard for `initialize`. Panics on a second initialize or on
    /// initialize-after-dispose; the engine flips to Ready only after its
    /// allocations succeed (see `ready`).
    pub fn begin_initialize(&self) {
        assert_eq!(
            *self,
            Lifecycle::Uninitialized,
            "initialize() called in state {:?}; it is only legal once, before any other call",
            self
        );
    }

    pub fn ready(&mut self) {
        *self = Lifecycle::Ready;
    }

    /// Guard for `step`. Panics outside Ready.
    pub fn expect_ready(&self, operation: &str) {
        assert_eq!(
            *self,
            Lifecycle::Ready,
            "{operation}() called in state {:?}; engines must be initialized and not disposed",
            self
        );
    }

    /// Transition into Disposed. Returns true when resources should actually
    /// be released; a repeated dispose warns and no-ops.
    pub fn dispose(&mut self) -> bool {
        if *self == Lifecycle::Disposed {
            warn!("dispose() called twice; ignoring the second call");
            return false;
        }
        *self = Lifecycle::Disposed;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Uninitialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut state = Lifecycle::default();
        assert_eq!(state, Lifecycle::Uninitialized);
        state.begin_initialize();
        state.ready();
        state.expect_ready("step");
        assert!(state.dispose());
        assert!(!state.dispose(), "second dispose must be a no-op");
    }

    #[test]
    #[should_panic(expected = "step() called in state Uninitialized")]
    fn test_step_before_initialize_panics() {
        Lifecycle::Uninitialized.expect_ready("step");
    }

    #[test]
    #[should_panic(expected = "step() called in state Disposed")]
    fn test_step_after_dispose_panics() {
        let mut state = Lifecycle::Ready;
        state.dispose();
        state.expect_ready("step");
    }

    #[test]
    #[should_panic(expected = "initialize() called in state Ready")]
    fn test_double_initialize_panics() {
        let mut state = Lifecycle::Uninitialized;
        state.begin_initialize();
        state.ready();
        state.begin_initialize();
    }
}
