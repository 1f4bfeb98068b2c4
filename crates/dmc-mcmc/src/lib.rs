#![deny(missing_docs)]

//! Continuous-time diagrammatic Monte Carlo sampler for a single spin in a
//! longitudinal field `H` and a transverse field `GAMMA`.
//!
//! A configuration is a [`Diagram`]: the sorted times in `[0, beta]` at which
//! the transverse field flips the spin. [`run_simulation`] drives the Markov
//! chain with segment insertions, segment removals and global spin flips, and
//! reports the magnetization estimates as a [`SimulationResult`].

/// Closed-form reference magnetizations.
pub mod analysis;
/// YAML settings schema for single runs, sweeps and convergence tests.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Diagram configuration, weights and Metropolis updates.
pub mod diagram;
/// Markov chain driver and update selection.
pub mod kernel;
/// Per-run statistics and their CSV/text reports.
pub mod results;
/// Diagram paired with its own random stream.
pub mod sampler;
/// Batch calculations and result sinks.
pub mod sweep;

pub use analysis::{exact_magnetizations, relative_error};
pub use config::{
    ConvergenceSettings, ParamRange, Settings, SingleRunSettings, StepRange, SweepSettings,
};
pub use diagram::{AddProposal, Diagram, RemoveProposal};
pub use kernel::{run_simulation, SimulationParams, UpdateKind};
pub use results::SimulationResult;
pub use sampler::DiagramSampler;
pub use sweep::{convergence_test, single_run, sweep, BatchReport, CsvSink, ResultSink};
