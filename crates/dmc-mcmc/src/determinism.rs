use dmc_core::derive_substream_seed;

/// Seeds `(update_choice_seed, diagram_seed)` for the `job_index`-th chain of
/// a batch. The two streams of a job never share a substream with any other
/// job derived from the same master seed.
pub fn job_seeds(master_seed: u64, job_index: u64) -> (u64, u64) {
    (
        derive_substream_seed(master_seed, 2 * job_index),
        derive_substream_seed(master_seed, 2 * job_index + 1),
    )
}

/// Fills in whichever of the two seeds was not given explicitly.
pub fn resolve_seeds(
    master_seed: u64,
    update_choice_seed: Option<u64>,
    diagram_seed: Option<u64>,
) -> (u64, u64) {
    let (derived_choice, derived_diagram) = job_seeds(master_seed, 0);
    (
        update_choice_seed.unwrap_or(derived_choice),
        diagram_seed.unwrap_or(derived_diagram),
    )
}
