use std::error::Error;

use clap::Args;
use dmc_mcmc::{single_run, SingleRunSettings};

#[derive(Args, Debug)]
pub struct SingleArgs {
    /// Inverse temperature.
    #[arg(long)]
    pub beta: f64,
    /// Longitudinal field H.
    #[arg(long, allow_negative_numbers = true)]
    pub h: f64,
    /// Transverse field GAMMA.
    #[arg(long, allow_negative_numbers = true)]
    pub gamma: f64,
    /// Number of chain steps.
    #[arg(long)]
    pub steps: u64,
    /// Leading steps excluded from the statistics.
    #[arg(long, default_value_t = 0)]
    pub thermalization: u64,
    /// Spin of the leading segment at the start (+1 or -1).
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub initial_s0: i32,
    /// Seed of the update-kind stream.
    #[arg(long)]
    pub update_choice_seed: Option<u64>,
    /// Seed of the diagram stream.
    #[arg(long)]
    pub diagram_seed: Option<u64>,
    /// Master seed for whichever stream seed is missing.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &SingleArgs) -> Result<(), Box<dyn Error>> {
    let settings = SingleRunSettings {
        beta: args.beta,
        h: args.h,
        gamma: args.gamma,
        n_total_steps: args.steps,
        n_thermalization_steps: args.thermalization,
        initial_s0: args.initial_s0,
        update_choice_seed: args.update_choice_seed,
        diagram_seed: args.diagram_seed,
    };
    let master_seed = match (args.update_choice_seed, args.diagram_seed) {
        (Some(_), Some(_)) => 0,
        _ => crate::master_seed(args.seed),
    };
    let result = single_run(&settings, master_seed)?;
    println!("{result}");
    Ok(())
}
