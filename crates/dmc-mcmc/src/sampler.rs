use dmc_core::{DmcError, RngHandle};

use crate::diagram::Diagram;

/// A [`Diagram`] bundled with the random stream that feeds its updates.
///
/// Draw order per update is fixed: `r1, r2, racc` for insertion, `r1, racc`
/// for removal and `racc` for the spin flip. Replaying with the same seed
/// therefore reproduces the chain exactly.
#[derive(Debug, Clone)]
pub struct DiagramSampler {
    diagram: Diagram,
    rng: RngHandle,
}

impl DiagramSampler {
    /// Wraps an already validated diagram.
    pub fn new(diagram: Diagram, seed: u64) -> Self {
        Self {
            diagram,
            rng: RngHandle::from_seed(seed),
        }
    }

    /// Builds and validates a diagram, then binds it to a fresh stream.
    pub fn with_parameters(
        beta: f64,
        s0: i32,
        h: f64,
        gamma: f64,
        vertices: Vec<f64>,
        seed: u64,
    ) -> Result<Self, DmcError> {
        Ok(Self::new(Diagram::new(beta, s0, h, gamma, vertices)?, seed))
    }

    /// Read-only view of the current configuration.
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Seed the stream was last (re)started with.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Replaces the diagram and restarts the stream. Nothing changes on error.
    pub fn reset(
        &mut self,
        beta: f64,
        s0: i32,
        h: f64,
        gamma: f64,
        vertices: Vec<f64>,
        seed: u64,
    ) -> Result<(), DmcError> {
        self.diagram.reset(beta, s0, h, gamma, vertices)?;
        self.rng.reseed(seed);
        Ok(())
    }

    /// Segment insertion with freshly drawn proposal and acceptance numbers.
    pub fn attempt_add_segment(&mut self) -> bool {
        let r1 = self.rng.next_uniform();
        let r2 = self.rng.next_uniform();
        let racc = self.rng.next_uniform();
        self.diagram.attempt_add_segment(r1, r2, racc)
    }

    /// Segment removal with freshly drawn proposal and acceptance numbers.
    pub fn attempt_remove_segment(&mut self) -> bool {
        let r1 = self.rng.next_uniform();
        let racc = self.rng.next_uniform();
        self.diagram.attempt_remove_segment(r1, racc)
    }

    /// Global spin flip with a freshly drawn acceptance number.
    pub fn attempt_spin_flip(&mut self) -> bool {
        let racc = self.rng.next_uniform();
        self.diagram.attempt_spin_flip(racc)
    }
}
