use std::fs;
use std::path::{Path, PathBuf};

use dmc_core::{DmcError, ErrorInfo};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Settings document, selected by its `calc_type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calc_type", rename_all = "kebab-case")]
pub enum Settings {
    /// One chain, summary printed to standard output.
    Single(SingleRunSettings),
    /// Grid over beta, H and GAMMA written to a CSV file.
    Sweep(SweepSettings),
    /// Log-spaced chain lengths at fixed physics, written to a CSV file.
    ConvergenceTest(ConvergenceSettings),
}

impl Settings {
    /// Parses a YAML (or JSON) settings document.
    ///
    /// The flat `settings.json` layout is accepted too: `CALC_TYPE` for the
    /// tag and `<key>_min`, `<key>_max`, `<key>_step` (or
    /// `<key>_points_per_decade`) for ranges.
    pub fn from_yaml_str(text: &str) -> Result<Self, DmcError> {
        let mut document: Value = serde_yaml::from_str(text).map_err(parse_error)?;
        upgrade_flat_layout(&mut document);
        serde_yaml::from_value(document).map_err(parse_error)
    }

    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> Result<Self, DmcError> {
        let text = fs::read_to_string(path).map_err(|err| {
            DmcError::Io(
                ErrorInfo::new("settings-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&text).map_err(|err| match err {
            DmcError::Config(info) => {
                DmcError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Output file named by the settings, if the calculation writes one.
    pub fn output_file(&self) -> Option<&Path> {
        match self {
            Settings::Single(_) => None,
            Settings::Sweep(settings) => Some(settings.output_file.as_path()),
            Settings::ConvergenceTest(settings) => Some(settings.output_file.as_path()),
        }
    }
}

/// Keys that may be spelled as flat `_min`/`_max`/spacing triples.
const RANGE_KEYS: [&str; 5] = ["beta", "H", "GAMMA", "N_total_steps", "N_thermalization_steps"];

fn parse_error(err: serde_yaml::Error) -> DmcError {
    DmcError::Config(
        ErrorInfo::new("settings-parse", err.to_string())
            .with_hint("calc_type must be one of single, sweep, convergence-test"),
    )
}

fn upgrade_flat_layout(document: &mut Value) {
    let Value::Mapping(map) = document else {
        return;
    };
    if !map.contains_key("calc_type") {
        if let Some(kind) = map.remove("CALC_TYPE") {
            map.insert(Value::from("calc_type"), kind);
        }
    }
    for name in RANGE_KEYS {
        let min_key = format!("{name}_min");
        let max_key = format!("{name}_max");
        if !(map.contains_key(min_key.as_str()) && map.contains_key(max_key.as_str())) {
            continue;
        }
        let Some(spacing) = ["step", "points_per_decade"]
            .into_iter()
            .find(|spacing| map.contains_key(format!("{name}_{spacing}").as_str()))
        else {
            continue;
        };
        let mut range = Mapping::new();
        for (field, key) in [
            ("min", min_key),
            ("max", max_key),
            (spacing, format!("{name}_{spacing}")),
        ] {
            if let Some(value) = map.remove(key.as_str()) {
                range.insert(Value::from(field), value);
            }
        }
        map.insert(Value::from(name), Value::Mapping(range));
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRunSettings {
    /// Inverse temperature.
    pub beta: f64,
    /// Longitudinal field.
    #[serde(alias = "H")]
    pub h: f64,
    /// Transverse field.
    #[serde(alias = "GAMMA")]
    pub gamma: f64,
    /// Chain length.
    #[serde(alias = "N_total_steps")]
    pub n_total_steps: u64,
    /// Steps excluded from the statistics.
    #[serde(default, alias = "N_thermalization_steps")]
    pub n_thermalization_steps: u64,
    /// Spin of the leading segment at the start.
    #[serde(default = "default_initial_s0")]
    pub initial_s0: i32,
    /// Seed of the update-kind stream; derived from the master seed if absent.
    #[serde(default)]
    pub update_choice_seed: Option<u64>,
    /// Seed of the diagram stream; derived from the master seed if absent.
    #[serde(default)]
    pub diagram_seed: Option<u64>,
}

/// Parameters of a beta x H x GAMMA sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Inverse temperatures.
    pub beta: ParamRange,
    /// Longitudinal fields.
    #[serde(alias = "H")]
    pub h: ParamRange,
    /// Transverse fields.
    #[serde(alias = "GAMMA")]
    pub gamma: ParamRange,
    /// Chain length of every run.
    #[serde(alias = "N_total_steps")]
    pub n_total_steps: u64,
    /// Steps excluded from the statistics of every run.
    #[serde(default, alias = "N_thermalization_steps")]
    pub n_thermalization_steps: u64,
    /// Spin of the leading segment at the start of every run.
    #[serde(default = "default_initial_s0")]
    pub initial_s0: i32,
    /// Independent repetitions per parameter combination.
    #[serde(default = "default_samples_per_point")]
    pub samples_per_point: usize,
    /// CSV destination.
    pub output_file: PathBuf,
}

/// Parameters of a convergence test over the chain length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSettings {
    /// Inverse temperature.
    pub beta: f64,
    /// Longitudinal field.
    #[serde(alias = "H")]
    pub h: f64,
    /// Transverse field.
    #[serde(alias = "GAMMA")]
    pub gamma: f64,
    /// Chain lengths to run.
    #[serde(alias = "N_total_steps")]
    pub n_total_steps: StepRange,
    /// Thermalization lengths to combine with every chain length.
    #[serde(default, alias = "N_thermalization_steps")]
    pub n_thermalization_steps: Option<StepRange>,
    /// Spin of the leading segment at the start.
    #[serde(default = "default_initial_s0")]
    pub initial_s0: i32,
    /// Seed of the update-kind stream shared by every run.
    #[serde(default)]
    pub update_choice_seed: Option<u64>,
    /// Seed of the diagram stream shared by every run.
    #[serde(default)]
    pub diagram_seed: Option<u64>,
    /// CSV destination.
    pub output_file: PathBuf,
}

fn default_initial_s0() -> i32 {
    1
}

fn default_samples_per_point() -> usize {
    1
}

/// A fixed value or an inclusive linear grid `min, min + step, ... <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamRange {
    /// Single value.
    Value(f64),
    /// Linear grid.
    Linear {
        /// First value.
        min: f64,
        /// Upper bound (included when hit by the grid).
        max: f64,
        /// Spacing, must be > 0.
        step: f64,
    },
}

impl ParamRange {
    /// Expands the range into its values.
    pub fn values(&self) -> Result<Vec<f64>, DmcError> {
        match *self {
            ParamRange::Value(value) => Ok(vec![value]),
            ParamRange::Linear { min, max, step } => {
                if !(step.is_finite() && step > 0.0) {
                    return Err(DmcError::Config(
                        ErrorInfo::new("range-step", "step must be a positive number")
                            .with_context("step", step.to_string()),
                    ));
                }
                if min > max {
                    return Err(range_bounds_error(min, max));
                }
                // Counting steps avoids drift from repeated addition.
                let count = ((max - min) / step + 1e-9).floor() as usize;
                Ok((0..=count).map(|n| min + n as f64 * step).collect())
            }
        }
    }
}

/// A fixed step count or an inclusive log10 grid with a given density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepRange {
    /// Single step count.
    Value(u64),
    /// Logarithmic grid, values rounded to integers.
    Log {
        /// Smallest count, must be > 0.
        min: f64,
        /// Largest count.
        max: f64,
        /// Grid points per factor of ten, must be > 0.
        points_per_decade: f64,
    },
}

impl StepRange {
    /// Expands the range into step counts.
    pub fn values(&self) -> Result<Vec<u64>, DmcError> {
        match *self {
            StepRange::Value(value) => Ok(vec![value]),
            StepRange::Log {
                min,
                max,
                points_per_decade,
            } => {
                if !(points_per_decade.is_finite() && points_per_decade > 0.0) {
                    return Err(DmcError::Config(
                        ErrorInfo::new("range-density", "points_per_decade must be positive")
                            .with_context("points_per_decade", points_per_decade.to_string()),
                    ));
                }
                if min.is_nan() || min <= 0.0 {
                    return Err(DmcError::Config(
                        ErrorInfo::new("range-log-bound", "logarithmic ranges need min > 0")
                            .with_context("min", min.to_string()),
                    ));
                }
                if min > max {
                    return Err(range_bounds_error(min, max));
                }
                let log_min = min.log10();
                let decades = max.log10() - log_min;
                let log_step = 1.0 / points_per_decade;
                let count = (decades / log_step + 1e-9).floor() as u64;
                Ok((0..=count)
                    .map(|n| 10f64.powf(log_min + n as f64 * log_step).round() as u64)
                    .collect())
            }
        }
    }
}

fn range_bounds_error(min: f64, max: f64) -> DmcError {
    DmcError::Config(
        ErrorInfo::new("range-bounds", "range min must not exceed max")
            .with_context("min", min.to_string())
            .with_context("max", max.to_string()),
    )
}
