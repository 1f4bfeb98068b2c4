use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use dmc_mcmc::{convergence_test, single_run, sweep, CsvSink, Settings};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML settings file; `calc_type` selects the calculation.
    #[arg(long)]
    pub settings: PathBuf,
    /// Master seed for the seeds the settings leave out.
    #[arg(long)]
    pub seed: Option<u64>,
    /// CSV destination overriding the settings' `output_file`.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(&args.settings)?;
    let master_seed = crate::master_seed(args.seed);
    let output = args
        .out
        .clone()
        .or_else(|| settings.output_file().map(Path::to_path_buf));

    match (&settings, output) {
        (Settings::Single(single), _) => {
            let result = single_run(single, master_seed)?;
            println!("{result}");
        }
        (Settings::Sweep(plan), Some(path)) => {
            let mut sink = CsvSink::create(&path)?;
            let report = sweep(plan, master_seed, &mut sink)?;
            log::info!(
                "sweep finished: {} runs written to {}",
                report.completed,
                path.display()
            );
        }
        (Settings::ConvergenceTest(plan), Some(path)) => {
            let mut sink = CsvSink::create(&path)?;
            let report = convergence_test(plan, master_seed, &mut sink)?;
            log::info!(
                "convergence test finished: {} runs written to {}, {} skipped",
                report.completed,
                path.display(),
                report.skipped
            );
        }
        (_, None) => return Err("the calculation needs an output file".into()),
    }
    Ok(())
}
