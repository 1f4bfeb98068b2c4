use dmc_core::DmcError;
use dmc_mcmc::{exact_magnetizations, run_simulation, SimulationParams};

fn reference_params(n_total_steps: u64, n_thermalization_steps: u64) -> SimulationParams {
    SimulationParams {
        beta: 1.0,
        initial_s0: 1,
        h: -0.5,
        gamma: 0.1,
        n_total_steps,
        n_thermalization_steps,
        update_choice_seed: 1111,
        diagram_seed: 2222,
    }
}

#[test]
fn short_chain_approaches_exact_magnetization() {
    let result = run_simulation(&reference_params(500_000, 10_000)).unwrap();
    let (mz, mx) = exact_magnetizations(1.0, -0.5, 0.1);
    assert!((result.measured_sigmaz - mz).abs() < 3e-2, "{result}");
    assert!((result.measured_sigmax - mx).abs() < 3e-2, "{result}");
    assert_eq!(result.n_measures, 490_000);
}

#[test]
#[ignore = "50M steps; run with --ignored"]
fn long_chain_matches_exact_magnetization() {
    let result = run_simulation(&reference_params(50_000_000, 0)).unwrap();
    assert!((result.measured_sigmaz - 0.46074).abs() < 1e-2, "{result}");
    assert!((result.measured_sigmax + 0.09215).abs() < 1e-2, "{result}");
}

#[test]
fn thermalization_covering_the_chain_is_rejected() {
    for thermalization in [1_000, 5_000] {
        match run_simulation(&reference_params(1_000, thermalization)) {
            Err(DmcError::NoMeasurements(info)) => assert_eq!(info.code, "no-measurements"),
            other => panic!("expected NoMeasurements, got {other:?}"),
        }
    }
}

#[test]
fn invalid_parameters_are_reported_before_running() {
    let mut params = reference_params(1_000, 0);
    params.initial_s0 = 2;
    match run_simulation(&params) {
        Err(DmcError::InvalidParameter(info)) => assert_eq!(info.code, "invalid-spin"),
        other => panic!("expected InvalidParameter, got {other:?}"),
    }

    let mut params = reference_params(1_000, 1_000);
    params.beta = -1.0;
    match run_simulation(&params) {
        Err(DmcError::InvalidParameter(info)) => assert_eq!(info.code, "non-positive-beta"),
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[test]
fn zero_transverse_field_is_rejected() {
    let mut params = reference_params(1_000, 0);
    params.gamma = 0.0;
    match run_simulation(&params) {
        Err(DmcError::InvalidParameter(info)) => assert_eq!(info.code, "zero-gamma"),
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}
