use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use commands::{
    run::{self, RunArgs},
    single::{self, SingleArgs},
};
use dmc_mcmc::SimulationResult;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "dmc-sim", about = "Diagrammatic Monte Carlo sampler for a spin in a field")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute the calculation described by a settings file.
    Run(RunArgs),
    /// Run one chain from command line parameters and print its summary.
    Single(SingleArgs),
    /// Print the CSV header used by sweep and convergence outputs.
    Header,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Single(args) => single::run(&args),
        Command::Header => {
            println!("{}", SimulationResult::CSV_HEADER);
            Ok(())
        }
    }
}

/// Returns the given master seed, or one taken from the system clock.
fn master_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default();
            log::info!("no master seed given, using {seed} from the clock");
            seed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn single_accepts_negative_fields() {
        let cli = Cli::try_parse_from([
            "dmc-sim", "single", "--beta", "1", "--h", "-0.5", "--gamma", "0.1", "--steps", "10",
            "--initial-s0", "-1",
        ])
        .unwrap();
        let Command::Single(args) = cli.command else {
            panic!("expected single");
        };
        assert_eq!(args.h, -0.5);
        assert_eq!(args.initial_s0, -1);
        assert_eq!(args.thermalization, 0);
    }

    #[test]
    fn explicit_master_seed_is_kept() {
        assert_eq!(master_seed(Some(42)), 42);
    }
}
