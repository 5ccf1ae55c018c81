mod device;
mod harness;
mod parallel;
mod scalar;
mod strategy;
mod workload;

use serde::{Deserialize, Serialize};
use std::env;

use device::{DeviceGridEngine, DeviceTimerEngine};
use parallel::{ParallelGridEngine, ParallelTimerEngine};
use scalar::{ScalarGridEngine, ScalarTimerEngine};
use strategy::{ComputeStrategy, EngineError};

/// Benchmark configuration (can be loaded from YAML)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compute backend: "scalar", "parallel", "device", or "all"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Workload: "life" or "timer"
    #[serde(default = "default_workload")]
    pub workload: String,
    /// Timed steps per run
    pub iterations: usize,
    /// Seed for the reproducible initial state
    pub seed: u64,
    /// Grid dimensions (life workload)
    pub grid: GridConfig,
    /// Timer workload settings
    pub timer: TimerConfig,
    /// Chunk size for the parallel backend (performance tunable only)
    pub chunk_size: usize,
}

fn default_backend() -> String {
    "scalar".to_string()
}

fn default_workload() -> String {
    "life".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Number of independent accumulators
    pub elements: usize,
    /// Per-step increment
    pub delta: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            elements: 250_000,
            delta: 1.0 / 60.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            workload: default_workload(),
            iterations: 100,
            seed: 256,
            grid: GridConfig::default(),
            timer: TimerConfig::default(),
            chunk_size: 4096,
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn from_yaml(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a YAML file
    pub fn to_yaml(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Generate a template config file
    pub fn write_template(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        config.to_yaml(path)
    }

    /// Validate configuration and return warnings.
    /// Returns Err if there are fatal configuration errors.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        match self.backend.as_str() {
            "scalar" | "parallel" | "device" | "all" => {}
            other => {
                return Err(format!(
                    "unknown backend '{}' (expected scalar, parallel, device, or all)",
                    other
                ));
            }
        }

        match self.workload.as_str() {
            "life" => {
                if self.grid.width == 0 || self.grid.height == 0 {
                    return Err("grid dimensions must be non-zero".to_string());
                }
            }
            "timer" => {
                if self.timer.elements == 0 {
                    return Err("timer.elements must be non-zero".to_string());
                }
                if !self.timer.delta.is_finite() {
                    return Err("timer.delta must be finite".to_string());
                }
            }
            other => {
                return Err(format!(
                    "unknown workload '{}' (expected life or timer)",
                    other
                ));
            }
        }

        if self.iterations == 0 {
            warnings
                .push("iterations is 0, runs will only exercise setup and teardown".to_string());
        }
        if self.chunk_size == 0 {
            warnings.push("chunk_size is 0, will be treated as 1".to_string());
        }

        Ok(warnings)
    }

    /// Backends this run covers, in execution order.
    pub fn backends(&self) -> Vec<&'static str> {
        match self.backend.as_str() {
            "all" => vec!["scalar", "parallel", "device"],
            "scalar" => vec!["scalar"],
            "parallel" => vec!["parallel"],
            "device" => vec!["device"],
            _ => Vec::new(),
        }
    }
}

/// Construct the engine for one backend/workload pair.
fn build_engine(backend: &str, config: &Config) -> Result<Box<dyn ComputeStrategy>, EngineError> {
    let (width, height, seed) = (config.grid.width, config.grid.height, config.seed);
    let (elements, delta) = (config.timer.elements, config.timer.delta);
    match (backend, config.workload.as_str()) {
        ("scalar", "life") => Ok(Box::new(ScalarGridEngine::new(width, height, seed))),
        ("scalar", "timer") => Ok(Box::new(ScalarTimerEngine::new(elements, seed, delta))),
        ("parallel", "life") => Ok(Box::new(ParallelGridEngine::new(
            width,
            height,
            seed,
            config.chunk_size,
        ))),
        ("parallel", "timer") => Ok(Box::new(ParallelTimerEngine::new(elements, seed, delta))),
        ("device", "life") => Ok(Box::new(DeviceGridEngine::new(width, height, seed))),
        ("device", "timer") => Ok(Box::new(DeviceTimerEngine::new(elements, seed, delta))),
        (backend, workload) => Err(EngineError::Configuration(format!(
            "no engine for backend '{}' with workload '{}'",
            backend, workload
        ))),
    }
}

fn parse_args() -> Config {
    let mut config = Config::default();
    let argv: Vec<String> = env::args().collect();

    // First pass: check for --config or --generate-config
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let config_path = &argv[i];
                match Config::from_yaml(config_path) {
                    Ok(loaded) => {
                        println!("Loaded config from: {}", config_path);
                        config = loaded;
                    }
                    Err(e) => {
                        eprintln!("Error loading config file '{}': {}", config_path, e);
                        std::process::exit(1);
                    }
                }
            }
            "--generate-config" => {
                i += 1;
                let output_path = if i < argv.len() && !argv[i].starts_with('-') {
                    argv[i].clone()
                } else {
                    "config.yaml".to_string()
                };
                match Config::write_template(&output_path) {
                    Ok(_) => {
                        println!("Generated config template: {}", output_path);
                        std::process::exit(0);
                    }
                    Err(e) => {
                        eprintln!("Error writing config template: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    // Second pass: CLI args override config file values
    i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" | "-c" => {
                i += 1; // skip, already processed
            }
            "--backend" | "-b" => {
                i += 1;
                config.backend = argv[i].clone();
            }
            "--workload" => {
                i += 1;
                config.workload = argv[i].clone();
            }
            "--iterations" | "-n" => {
                i += 1;
                config.iterations = argv[i].parse().expect("Invalid iterations");
            }
            "--grid-width" | "-w" => {
                i += 1;
                config.grid.width = argv[i].parse().expect("Invalid grid-width");
            }
            "--grid-height" | "-h" => {
                i += 1;
                config.grid.height = argv[i].parse().expect("Invalid grid-height");
            }
            "--seed" | "-s" => {
                i += 1;
                config.seed = argv[i].parse().expect("Invalid seed");
            }
            "--elements" => {
                i += 1;
                config.timer.elements = argv[i].parse().expect("Invalid elements");
            }
            "--delta" => {
                i += 1;
                config.timer.delta = argv[i].parse().expect("Invalid delta");
            }
            "--chunk-size" => {
                i += 1;
                config.chunk_size = argv[i].parse().expect("Invalid chunk-size");
            }
            "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_help() {
    println!("Cellbench - interchangeable-backend compute benchmark");
    println!();
    println!("USAGE:");
    println!("    cellbench [OPTIONS]");
    println!("    cellbench --config config.yaml");
    println!("    cellbench --generate-config [output.yaml]");
    println!();
    println!("CONFIG FILE:");
    println!("    -c, --config <FILE>       Load settings from YAML config file");
    println!("    --generate-config [FILE]  Generate template config (default: config.yaml)");
    println!();
    println!("OPTIONS (override config file values):");
    println!("    -b, --backend <NAME>      scalar, parallel, device, or all (default: scalar)");
    println!("    --workload <NAME>         life or timer (default: life)");
    println!("    -n, --iterations <N>      Timed steps per run (default: 100)");
    println!("    -s, --seed <N>            Seed for the initial state (default: 256)");
    println!("    -w, --grid-width <N>      Grid width (default: 512)");
    println!("    -h, --grid-height <N>     Grid height (default: 512)");
    println!("    --elements <N>            Timer accumulator count (default: 250000)");
    println!("    --delta <X>               Timer per-step increment (default: 1/60)");
    println!("    --chunk-size <N>          Parallel backend chunk size (default: 4096)");
    println!();
    println!("    --help                    Print this help message");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = parse_args();

    match config.validate() {
        Ok(warnings) => {
            for warning in warnings {
                eprintln!("Config warning: {}", warning);
            }
        }
        Err(e) => {
            eprintln!("Config validation error: {}", e);
            std::process::exit(1);
        }
    }

    println!("Cellbench");
    println!("=========\n");
    println!("Configuration:");
    println!("  Workload: {}", config.workload);
    match config.workload.as_str() {
        "life" => {
            println!(
                "  Grid: {}x{} ({} cells)",
                config.grid.width,
                config.grid.height,
                config.grid.width * config.grid.height
            );
        }
        _ => {
            println!("  Elements: {}", config.timer.elements);
            println!("  Delta: {}", config.timer.delta);
        }
    }
    println!("  Seed: {}", config.seed);
    println!("  Iterations: {}", config.iterations);
    println!();

    let run_all = config.backend == "all";
    let mut failures = 0usize;

    for backend in config.backends() {
        let label = format!("{}/{}", backend, config.workload);
        let mut engine = match build_engine(backend, &config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        match harness::run(&label, engine.as_mut(), config.iterations) {
            Ok(report) => println!("{}", report),
            Err(EngineError::AdapterUnavailable) if run_all => {
                // In "all" mode a missing GPU skips the device run instead of
                // aborting the host runs' results.
                tracing::warn!("no GPU adapter available, skipping the device backend");
            }
            Err(e) => {
                eprintln!("Error running {}: {}", label, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().unwrap().is_empty());
        assert_eq!(config.backend, "scalar");
        assert_eq!(config.workload, "life");
        assert_eq!(config.seed, 256);
        assert_eq!(config.timer.elements, 250_000);
    }

    #[test]
    fn test_yaml_round_trip_with_partial_file() {
        // Unlisted fields fall back to defaults
        let yaml = "backend: parallel\ngrid:\n  width: 64\n  height: 32\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend, "parallel");
        assert_eq!(config.grid.width, 64);
        assert_eq!(config.grid.height, 32);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let config = Config {
            backend: "quantum".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_workload() {
        let config = Config {
            workload: "raytrace".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let config = Config {
            grid: GridConfig {
                width: 0,
                height: 8,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_warns_on_zero_iterations() {
        let config = Config {
            iterations: 0,
            ..Config::default()
        };
        assert_eq!(config.validate().unwrap().len(), 1);
    }

    #[test]
    fn test_backend_all_expands_in_order() {
        let config = Config {
            backend: "all".to_string(),
            ..Config::default()
        };
        assert_eq!(config.backends(), ["scalar", "parallel", "device"]);
    }

    #[test]
    fn test_build_engine_covers_every_pair() {
        let config = Config::default();
        for backend in ["scalar", "parallel", "device"] {
            for workload in ["life", "timer"] {
                let config = Config {
                    workload: workload.to_string(),
                    ..config.clone()
                };
                assert!(
                    build_engine(backend, &config).is_ok(),
                    "{backend}/{workload}"
                );
            }
        }
    }

    #[test]
    fn test_build_engine_rejects_unknown_backend() {
        let config = Config::default();
        assert!(matches!(
            build_engine("quantum", &config),
            Err(EngineError::Configuration(_))
        ));
    }
}
