//! Benchmark harness
//!
//! Drives any [`ComputeStrategy`] through the fixed lifecycle and times only
//! the steady-state work: initialize runs before the clock starts, dispose
//! after it stops. Steps run strictly sequentially, each observing the
//! previous step's output.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::strategy::{ComputeStrategy, EngineError};

/// Result of one measured run.
#[derive(Clone, Debug)]
pub struct BenchmarkReport {
    pub label: String,
    pub iterations: usize,
    pub elapsed: Duration,
}

impl BenchmarkReport {
    /// Mean wall time per step, in milliseconds.
    pub fn ms_per_step(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / self.iterations as f64
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} steps in {:.3} ms ({:.4} ms/step)",
            self.label,
            self.iterations,
            self.elapsed.as_secs_f64() * 1000.0,
            self.ms_per_step()
        )
    }
}

/// Run one engine through initialize, `iterations` timed steps, dispose.
///
/// On any error the engine is disposed before the error propagates, so a
/// failed run never leaks buffers.
pub fn run(
    label: &str,
    engine: &mut dyn ComputeStrategy,
    iterations: usize,
) -> Result<BenchmarkReport, EngineError> {
    debug!(label, iterations, "initializing engine");
    if let Err(err) = engine.initialize() {
        engine.dispose();
        return Err(err);
    }

    let start = Instant::now();
    for _ in 0..iterations {
        if let Err(err) = engine.step() {
            engine.dispose();
            return Err(err);
        }
    }
    let elapsed = start.elapsed();

    engine.dispose();
    Ok(BenchmarkReport {
        label: label.to_string(),
        iterations,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scriptable engine for exercising the harness's call sequence.
    struct ProbeEngine {
        initialized: usize,
        steps: usize,
        disposed: usize,
        fail_initialize: bool,
        fail_on_step: Option<usize>,
        step_sleep: Option<Duration>,
    }

    impl ProbeEngine {
        fn new() -> Self {
            Self {
                initialized: 0,
                steps: 0,
                disposed: 0,
                fail_initialize: false,
                fail_on_step: None,
                step_sleep: None,
            }
        }
    }

    impl ComputeStrategy for ProbeEngine {
        fn initialize(&mut self) -> Result<(), EngineError> {
            self.initialized += 1;
            if self.fail_initialize {
                return Err(EngineError::ResourceExhaustion("probe".into()));
            }
            Ok(())
        }

        fn step(&mut self) -> Result<(), EngineError> {
            if self.fail_on_step == Some(self.steps) {
                return Err(EngineError::Configuration("probe step failure".into()));
            }
            self.steps += 1;
            if let Some(sleep) = self.step_sleep {
                std::thread::sleep(sleep);
            }
            Ok(())
        }

        fn dispose(&mut self) {
            self.disposed += 1;
        }
    }

    #[test]
    fn test_runs_exactly_n_steps_and_disposes_once() {
        let mut engine = ProbeEngine::new();
        let report = run("probe", &mut engine, 17).unwrap();
        assert_eq!(engine.initialized, 1);
        assert_eq!(engine.steps, 17);
        assert_eq!(engine.disposed, 1);
        assert_eq!(report.iterations, 17);
        assert_eq!(report.label, "probe");
    }

    #[test]
    fn test_zero_iterations_still_completes_the_lifecycle() {
        let mut engine = ProbeEngine::new();
        let report = run("probe", &mut engine, 0).unwrap();
        assert_eq!(engine.steps, 0);
        assert_eq!(engine.disposed, 1);
        assert_eq!(report.ms_per_step(), 0.0);
    }

    #[test]
    fn test_initialize_failure_disposes_and_propagates() {
        let mut engine = ProbeEngine::new();
        engine.fail_initialize = true;
        let err = run("probe", &mut engine, 5).unwrap_err();
        assert!(matches!(err, EngineError::ResourceExhaustion(_)));
        assert_eq!(engine.steps, 0, "no steps after a failed initialize");
        assert_eq!(engine.disposed, 1);
    }

    #[test]
    fn test_step_failure_disposes_and_propagates() {
        let mut engine = ProbeEngine::new();
        engine.fail_on_step = Some(3);
        let err = run("probe", &mut engine, 10).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert_eq!(engine.steps, 3);
        assert_eq!(engine.disposed, 1);
    }

    #[test]
    fn test_elapsed_covers_the_steps() {
        let mut engine = ProbeEngine::new();
        engine.step_sleep = Some(Duration::from_millis(2));
        let report = run("probe", &mut engine, 5).unwrap();
        assert!(report.elapsed >= Duration::from_millis(10));
        assert!(report.ms_per_step() >= 2.0);
    }

    #[test]
    fn test_report_display_format() {
        let report = BenchmarkReport {
            label: "scalar/life".into(),
            iterations: 4,
            elapsed: Duration::from_millis(8),
        };
        let text = report.to_string();
        assert!(text.starts_with("scalar/life: 4 steps in "));
        assert!(text.contains("ms/step"));
    }
}
