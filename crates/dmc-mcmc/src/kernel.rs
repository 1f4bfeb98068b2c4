use std::time::Instant;

use dmc_core::{DmcError, ErrorInfo, RngHandle};
use serde::{Deserialize, Serialize};

use crate::diagram::Diagram;
use crate::results::SimulationResult;
use crate::sampler::DiagramSampler;

/// Probability of attempting a global spin flip in a step.
pub const FLIP_PROBABILITY: f64 = 1.0 / 3.0;
/// Probability of attempting a segment insertion in a step.
pub const ADD_PROBABILITY: f64 = (1.0 - FLIP_PROBABILITY) / 2.0;
/// Probability of attempting a segment removal in a step.
pub const REMOVE_PROBABILITY: f64 = ADD_PROBABILITY;

/// Kind of update attempted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
    /// Insert a segment (two vertices).
    AddSegment,
    /// Remove a segment (two adjacent vertices).
    RemoveSegment,
    /// Flip every segment spin.
    SpinFlip,
}

impl UpdateKind {
    /// Maps a uniform draw onto the add, remove, flip probability bands.
    pub fn select(draw: f64) -> Self {
        if draw < ADD_PROBABILITY {
            UpdateKind::AddSegment
        } else if draw < ADD_PROBABILITY + REMOVE_PROBABILITY {
            UpdateKind::RemoveSegment
        } else {
            UpdateKind::SpinFlip
        }
    }
}

/// Inputs of a single Markov chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Inverse temperature, must be > 0.
    pub beta: f64,
    /// Spin of the leading segment at the start, +1 or -1.
    pub initial_s0: i32,
    /// Longitudinal field.
    pub h: f64,
    /// Transverse field.
    pub gamma: f64,
    /// Number of chain steps.
    pub n_total_steps: u64,
    /// Leading steps excluded from the statistics.
    pub n_thermalization_steps: u64,
    /// Seed of the stream choosing which update to attempt.
    pub update_choice_seed: u64,
    /// Seed of the stream used inside the updates.
    pub diagram_seed: u64,
}

impl SimulationParams {
    /// Number of samples the run will collect.
    pub fn n_measures(&self) -> u64 {
        self.n_total_steps.saturating_sub(self.n_thermalization_steps)
    }
}

/// Running sums over the measured part of the chain.
#[derive(Debug, Clone, Default, PartialEq)]
struct Accumulator {
    measures: u64,
    order_sum: u64,
    max_order: u64,
    sigmaz_sum: f64,
}

impl Accumulator {
    fn record(&mut self, diagram: &Diagram) {
        let order = diagram.order() as u64;
        self.order_sum += order;
        self.max_order = self.max_order.max(order);
        self.sigmaz_sum += diagram.magnetization_z();
        self.measures += 1;
    }

    fn finish(&self, result: &mut SimulationResult) {
        let measures = self.measures as f64;
        result.n_measures = self.measures;
        result.measured_sigmax =
            -(self.order_sum as f64) / (measures * result.beta * result.gamma);
        result.measured_sigmaz = self.sigmaz_sum / measures;
        result.avg_diagram_order = self.order_sum / self.measures;
        result.max_diagram_order = self.max_order;
    }
}

/// Runs the Markov chain and returns its statistics.
///
/// Fails with `InvalidParameter` when the diagram parameters are invalid and
/// with `NoMeasurements` when the thermalization phase would cover the whole
/// chain, since the observables would then be undefined.
pub fn run_simulation(params: &SimulationParams) -> Result<SimulationResult, DmcError> {
    let diagram = Diagram::zero_order(params.beta, params.initial_s0, params.h, params.gamma)?;
    if params.n_measures() == 0 {
        return Err(DmcError::NoMeasurements(
            ErrorInfo::new(
                "no-measurements",
                "thermalization covers the whole chain, no samples would be collected",
            )
            .with_context("N_total_steps", params.n_total_steps.to_string())
            .with_context(
                "N_thermalization_steps",
                params.n_thermalization_steps.to_string(),
            )
            .with_hint("use N_thermalization_steps < N_total_steps"),
        ));
    }

    let mut sampler = DiagramSampler::new(diagram, params.diagram_seed);
    let mut update_choice = RngHandle::from_seed(params.update_choice_seed);
    let mut result = SimulationResult::from_params(params);
    let mut accumulator = Accumulator::default();

    log::debug!(
        "chain start: beta={} s0={} H={} GAMMA={} steps={} thermalization={} seeds=({}, {})",
        params.beta,
        params.initial_s0,
        params.h,
        params.gamma,
        params.n_total_steps,
        params.n_thermalization_steps,
        params.update_choice_seed,
        params.diagram_seed
    );

    let start = Instant::now();
    for step in 0..params.n_total_steps {
        match UpdateKind::select(update_choice.next_uniform()) {
            UpdateKind::AddSegment => {
                result.n_attempted_addsegment += 1;
                result.n_accepted_addsegment += u64::from(sampler.attempt_add_segment());
            }
            UpdateKind::RemoveSegment => {
                result.n_attempted_removesegment += 1;
                result.n_accepted_removesegment += u64::from(sampler.attempt_remove_segment());
            }
            UpdateKind::SpinFlip => {
                result.n_attempted_flips += 1;
                result.n_accepted_flips += u64::from(sampler.attempt_spin_flip());
            }
        }

        if step >= params.n_thermalization_steps {
            accumulator.record(sampler.diagram());
        }
    }
    result.run_time = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);

    accumulator.finish(&mut result);
    log::debug!(
        "chain done: sigma_x={} sigma_z={} max_order={} run_time={}ns",
        result.measured_sigmax,
        result.measured_sigmaz,
        result.max_diagram_order,
        result.run_time
    );
    Ok(result)
}
