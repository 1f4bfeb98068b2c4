use std::fs;

use dmc_mcmc::determinism::job_seeds;
use dmc_mcmc::sweep::GAMMA_FLOOR;
use dmc_mcmc::{
    convergence_test, single_run, sweep, BatchReport, CsvSink, Settings, SimulationResult,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load(text: &str) -> Settings {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.yaml");
    fs::write(&path, text).unwrap();
    Settings::load(&path).unwrap()
}

const SWEEP: &str = "
calc_type: sweep
beta: { min: 1.0, max: 2.0, step: 1.0 }
H: -0.5
GAMMA: 0.0
N_total_steps: 2000
N_thermalization_steps: 100
samples_per_point: 2
output_file: sweep.csv
";

#[test]
fn sweep_runs_every_combination_with_job_seeds() {
    init_logging();
    let Settings::Sweep(settings) = load(SWEEP) else {
        panic!("expected sweep settings");
    };
    let mut results: Vec<SimulationResult> = Vec::new();
    let report = sweep(&settings, 9, &mut results).unwrap();

    assert_eq!(
        report,
        BatchReport {
            completed: 4,
            skipped: 0
        }
    );
    assert_eq!(results.len(), 4);
    for (job, result) in results.iter().enumerate() {
        assert_eq!(
            (result.update_choice_seed, result.diagram_seed),
            job_seeds(9, job as u64)
        );
        assert_eq!(result.gamma, GAMMA_FLOOR);
        assert_eq!(result.n_measures, 1_900);
        assert!(result.measured_sigmax.is_finite());
    }
    assert_eq!(results[0].beta, 1.0);
    assert_eq!(results[3].beta, 2.0);
}

#[test]
fn sweep_streams_rows_to_csv() {
    init_logging();
    let Settings::Sweep(mut settings) = load(SWEEP) else {
        panic!("expected sweep settings");
    };
    let dir = tempfile::tempdir().unwrap();
    settings.output_file = dir.path().join("nested").join("sweep.csv");

    let mut sink = CsvSink::create(&settings.output_file).unwrap();
    sweep(&settings, 9, &mut sink).unwrap();
    drop(sink);

    let text = fs::read_to_string(&settings.output_file).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(SimulationResult::CSV_HEADER));
    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("1.0,1,-0.5,"));
}

#[test]
fn convergence_test_skips_unmeasurable_pairs() {
    init_logging();
    let Settings::ConvergenceTest(settings) = load(
        "
calc_type: convergence-test
beta: 1.0
H: -0.5
GAMMA: 0.1
N_total_steps: { min: 100, max: 10000, points_per_decade: 1 }
N_thermalization_steps: 1000
update_choice_seed: 1111
diagram_seed: 2222
output_file: convergence.csv
",
    ) else {
        panic!("expected convergence settings");
    };
    let mut results: Vec<SimulationResult> = Vec::new();
    let report = convergence_test(&settings, 0, &mut results).unwrap();

    assert_eq!(
        report,
        BatchReport {
            completed: 1,
            skipped: 2
        }
    );
    assert_eq!(results[0].n_total_steps, 10_000);
    assert_eq!(results[0].n_measures, 9_000);
    assert_eq!(
        (results[0].update_choice_seed, results[0].diagram_seed),
        (1111, 2222)
    );
}

#[test]
fn single_run_derives_missing_seeds() {
    let Settings::Single(settings) = load(
        "
calc_type: single
beta: 1.0
H: -0.5
GAMMA: 0.1
N_total_steps: 1000
update_choice_seed: 3
",
    ) else {
        panic!("expected single settings");
    };
    let result = single_run(&settings, 77).unwrap();
    assert_eq!(result.update_choice_seed, 3);
    assert_eq!(result.diagram_seed, job_seeds(77, 0).1);
    assert_eq!(result.n_measures, 1_000);
}

#[test]
fn missing_settings_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.info().code, "settings-read");
}
