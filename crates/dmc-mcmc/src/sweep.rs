use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use dmc_core::{DmcError, ErrorInfo};

use crate::config::{ConvergenceSettings, SingleRunSettings, SweepSettings};
use crate::determinism::{job_seeds, resolve_seeds};
use crate::kernel::{run_simulation, SimulationParams};
use crate::results::{csv_error, SimulationResult};

/// GAMMA substituted for a zero transverse field inside sweeps.
pub const GAMMA_FLOOR: f64 = 1e-10;

/// Destination for results produced by batch calculations.
pub trait ResultSink {
    /// Stores one completed run.
    fn accept(&mut self, result: &SimulationResult) -> Result<(), DmcError>;
}

impl ResultSink for Vec<SimulationResult> {
    fn accept(&mut self, result: &SimulationResult) -> Result<(), DmcError> {
        self.push(result.clone());
        Ok(())
    }
}

/// CSV writer emitting the header once and flushing after every record.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file, creating parent directories.
    pub fn create(path: &Path) -> Result<Self, DmcError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                DmcError::Io(
                    ErrorInfo::new("output-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let file = File::create(path).map_err(|err| {
            DmcError::Io(
                ErrorInfo::new("output-create", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps an arbitrary writer and writes the header row.
    pub fn from_writer(inner: W) -> Result<Self, DmcError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(SimulationResult::CSV_HEADER.split(','))
            .map_err(csv_error)?;
        writer.flush().map_err(flush_error)?;
        Ok(Self { writer })
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, DmcError> {
        self.writer
            .into_inner()
            .map_err(|err| DmcError::Io(ErrorInfo::new("csv-flush", err.to_string())))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn accept(&mut self, result: &SimulationResult) -> Result<(), DmcError> {
        self.writer.serialize(result).map_err(csv_error)?;
        self.writer.flush().map_err(flush_error)
    }
}

fn flush_error(err: std::io::Error) -> DmcError {
    DmcError::Io(ErrorInfo::new("csv-flush", err.to_string()))
}

/// Counts reported by batch calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Chains executed and handed to the sink.
    pub completed: usize,
    /// Parameter combinations skipped because they could not be measured.
    pub skipped: usize,
}

/// Runs one chain; missing seeds are derived from `master_seed`.
pub fn single_run(
    settings: &SingleRunSettings,
    master_seed: u64,
) -> Result<SimulationResult, DmcError> {
    let (update_choice_seed, diagram_seed) = resolve_seeds(
        master_seed,
        settings.update_choice_seed,
        settings.diagram_seed,
    );
    run_simulation(&SimulationParams {
        beta: settings.beta,
        initial_s0: settings.initial_s0,
        h: settings.h,
        gamma: settings.gamma,
        n_total_steps: settings.n_total_steps,
        n_thermalization_steps: settings.n_thermalization_steps,
        update_choice_seed,
        diagram_seed,
    })
}

/// Runs every beta x H x GAMMA combination `samples_per_point` times.
///
/// Jobs run sequentially; job `k` uses the seeds `job_seeds(master_seed, k)`.
/// Each result reaches the sink as soon as its chain finishes.
pub fn sweep(
    settings: &SweepSettings,
    master_seed: u64,
    sink: &mut dyn ResultSink,
) -> Result<BatchReport, DmcError> {
    let betas = settings.beta.values()?;
    let hs = settings.h.values()?;
    let gammas = settings.gamma.values()?;
    let total = betas.len() * hs.len() * gammas.len() * settings.samples_per_point;
    let mut report = BatchReport::default();

    log::info!("sweep: {total} runs, master seed {master_seed}");
    for &beta in &betas {
        for &h in &hs {
            for &gamma in &gammas {
                let gamma = if gamma.abs() < f64::EPSILON {
                    log::warn!("sweep: GAMMA={gamma} replaced by {GAMMA_FLOOR}");
                    GAMMA_FLOOR
                } else {
                    gamma
                };
                for _ in 0..settings.samples_per_point {
                    let (update_choice_seed, diagram_seed) =
                        job_seeds(master_seed, report.completed as u64);
                    let result = run_simulation(&SimulationParams {
                        beta,
                        initial_s0: settings.initial_s0,
                        h,
                        gamma,
                        n_total_steps: settings.n_total_steps,
                        n_thermalization_steps: settings.n_thermalization_steps,
                        update_choice_seed,
                        diagram_seed,
                    })?;
                    sink.accept(&result)?;
                    report.completed += 1;
                    log::info!("run {}/{total} done", report.completed);
                }
            }
        }
    }
    Ok(report)
}

/// Runs every (chain length, thermalization length) pair with shared seeds.
///
/// Pairs whose thermalization covers the whole chain are skipped with a
/// warning instead of aborting the test.
pub fn convergence_test(
    settings: &ConvergenceSettings,
    master_seed: u64,
    sink: &mut dyn ResultSink,
) -> Result<BatchReport, DmcError> {
    let totals = settings.n_total_steps.values()?;
    let thermalizations = match &settings.n_thermalization_steps {
        Some(range) => range.values()?,
        None => vec![0],
    };
    let (update_choice_seed, diagram_seed) = resolve_seeds(
        master_seed,
        settings.update_choice_seed,
        settings.diagram_seed,
    );
    let total = totals.len() * thermalizations.len();
    let mut report = BatchReport::default();

    log::info!("convergence test: {total} runs, seeds ({update_choice_seed}, {diagram_seed})");
    for &n_total_steps in &totals {
        for &n_thermalization_steps in &thermalizations {
            if n_thermalization_steps >= n_total_steps {
                log::warn!(
                    "convergence test: skipping N_total_steps={n_total_steps} with \
                     N_thermalization_steps={n_thermalization_steps}"
                );
                report.skipped += 1;
                continue;
            }
            let result = run_simulation(&SimulationParams {
                beta: settings.beta,
                initial_s0: settings.initial_s0,
                h: settings.h,
                gamma: settings.gamma,
                n_total_steps,
                n_thermalization_steps,
                update_choice_seed,
                diagram_seed,
            })?;
            sink.accept(&result)?;
            report.completed += 1;
            log::info!("run {}/{total} done", report.completed + report.skipped);
        }
    }
    Ok(report)
}
