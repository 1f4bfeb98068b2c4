use dmc_core::RngHandle;
use dmc_mcmc::{Diagram, DiagramSampler, UpdateKind};
use proptest::prelude::*;

fn check_invariants(diagram: &Diagram) {
    let vertices = diagram.vertices();
    assert_eq!(vertices.len() % 2, 0);
    assert!(vertices.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(vertices.iter().all(|&v| (0.0..=diagram.beta()).contains(&v)));
    assert!(diagram.s0() == 1 || diagram.s0() == -1);
    assert!(diagram.magnetization_z().abs() <= 1.0 + 1e-12);
}

fn relative_gap(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs().max(f64::MIN_POSITIVE)
}

fn evolve(sampler: &mut DiagramSampler, choice: &mut RngHandle, steps: usize) {
    for _ in 0..steps {
        match UpdateKind::select(choice.next_uniform()) {
            UpdateKind::AddSegment => sampler.attempt_add_segment(),
            UpdateKind::RemoveSegment => sampler.attempt_remove_segment(),
            UpdateKind::SpinFlip => sampler.attempt_spin_flip(),
        };
        check_invariants(sampler.diagram());
    }
}

fn spin() -> impl Strategy<Value = i32> {
    prop_oneof![Just(1), Just(-1)]
}

proptest! {
    #[test]
    fn random_chains_keep_diagram_valid(
        seed in any::<u64>(),
        beta in 0.1f64..8.0,
        s0 in spin(),
        h in -2.0f64..2.0,
        gamma in 0.05f64..3.0,
    ) {
        let mut sampler = DiagramSampler::with_parameters(beta, s0, h, gamma, vec![], seed).unwrap();
        let mut choice = RngHandle::from_seed(seed.wrapping_add(1));
        evolve(&mut sampler, &mut choice, 1_000);
    }

    #[test]
    fn update_ratios_follow_weight_ratios(
        seed in any::<u64>(),
        beta in 0.1f64..8.0,
        s0 in spin(),
        h in -2.0f64..2.0,
        gamma in 0.05f64..3.0,
        r1 in 0.0f64..1.0,
        r2 in 0.0f64..1.0,
    ) {
        let mut sampler = DiagramSampler::with_parameters(beta, s0, h, gamma, vec![], seed).unwrap();
        let mut choice = RngHandle::from_seed(seed.wrapping_add(1));
        evolve(&mut sampler, &mut choice, 200);
        let diagram = sampler.diagram().clone();
        let order = diagram.order();

        let add = diagram.propose_add(r1, r2);
        let mut grown = diagram.vertices().to_vec();
        grown.splice(add.index..add.index, [add.tau1, add.tau2]);
        let grown = Diagram::new(beta, diagram.s0(), h, gamma, grown).unwrap();
        let expected = grown.ratio(&diagram) * beta * (add.tau3 - add.tau1) / (order + 1) as f64;
        prop_assert!(relative_gap(diagram.acceptance_add(&add), expected) < 1e-9);

        if let Some(remove) = diagram.propose_remove(r1) {
            let mut shrunk = diagram.vertices().to_vec();
            shrunk.drain(remove.index..remove.index + 2);
            let shrunk = Diagram::new(beta, diagram.s0(), h, gamma, shrunk).unwrap();
            let expected = shrunk.ratio(&diagram) * (order - 1) as f64
                / (beta * (remove.tau3 - remove.tau1));
            prop_assert!(relative_gap(diagram.acceptance_remove(&remove), expected) < 1e-9);
        }

        let flipped = Diagram::new(beta, -diagram.s0(), h, gamma, diagram.vertices().to_vec()).unwrap();
        prop_assert!(relative_gap(diagram.acceptance_flip(), flipped.ratio(&diagram)) < 1e-9);
    }
}
