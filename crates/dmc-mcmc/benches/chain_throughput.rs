use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dmc_mcmc::{run_simulation, SimulationParams};

const STEPS: u64 = 100_000;

fn params(beta: f64, gamma: f64) -> SimulationParams {
    SimulationParams {
        beta,
        initial_s0: 1,
        h: -0.5,
        gamma,
        n_total_steps: STEPS,
        n_thermalization_steps: 0,
        update_choice_seed: 1111,
        diagram_seed: 2222,
    }
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_throughput");
    group.throughput(Throughput::Elements(STEPS));
    for (beta, gamma) in [(1.0, 0.1), (4.0, 1.0), (10.0, 2.0)] {
        let params = params(beta, gamma);
        group.bench_with_input(
            BenchmarkId::new("run_simulation", format!("beta={beta},gamma={gamma}")),
            &params,
            |b, params| b.iter(|| run_simulation(black_box(params)).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_chain);
criterion_main!(benches);
