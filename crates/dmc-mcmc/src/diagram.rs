use dmc_core::{DmcError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Continuous-time diagram of alternating-spin segments over `[0, beta]`.
///
/// Segment `k` spans `[v_{k-1}, v_k)` (with `v_{-1} = 0` and the last segment
/// closing at `beta`) and carries spin `s0 * (-1)^k`. All update methods take
/// their random draws as arguments, so every outcome is reproducible from
/// explicit inputs; [`crate::DiagramSampler`] supplies the draws in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    beta: f64,
    s0: i32,
    h: f64,
    gamma: f64,
    vertices: Vec<f64>,
}

/// Candidate segment insertion produced by [`Diagram::propose_add`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddProposal {
    /// Time of the first new vertex.
    pub tau1: f64,
    /// Time of the second new vertex, in `[tau1, tau3)`.
    pub tau2: f64,
    /// First existing vertex after `tau1`, or `beta`.
    pub tau3: f64,
    /// Position at which `tau1` is inserted.
    pub index: usize,
    /// Spin of the segment `[tau1, tau2)`.
    pub spin: i32,
}

/// Candidate segment removal produced by [`Diagram::propose_remove`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoveProposal {
    /// Left boundary of the segment to remove.
    pub tau1: f64,
    /// Right boundary of the segment to remove.
    pub tau2: f64,
    /// Vertex following `tau2`, or `beta`.
    pub tau3: f64,
    /// Position of `tau1` in the vertex list.
    pub index: usize,
    /// Spin of the segment `[tau1, tau2)`.
    pub spin: i32,
}

impl Diagram {
    /// Builds a diagram after checking every model invariant.
    pub fn new(
        beta: f64,
        s0: i32,
        h: f64,
        gamma: f64,
        vertices: Vec<f64>,
    ) -> Result<Self, DmcError> {
        validate(beta, s0, h, gamma, &vertices)?;
        Ok(Self {
            beta,
            s0,
            h,
            gamma,
            vertices,
        })
    }

    /// Zero-order diagram `[0 --- beta]` with a single segment of spin `s0`.
    pub fn zero_order(beta: f64, s0: i32, h: f64, gamma: f64) -> Result<Self, DmcError> {
        Self::new(beta, s0, h, gamma, Vec::new())
    }

    /// Replaces the full state. On error the current state is left untouched.
    pub fn reset(
        &mut self,
        beta: f64,
        s0: i32,
        h: f64,
        gamma: f64,
        vertices: Vec<f64>,
    ) -> Result<(), DmcError> {
        *self = Self::new(beta, s0, h, gamma, vertices)?;
        Ok(())
    }

    /// Inverse temperature (length of the diagram).
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Spin of the leading segment.
    pub fn s0(&self) -> i32 {
        self.s0
    }

    /// Longitudinal field.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Transverse field.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Vertex times in ascending order.
    pub fn vertices(&self) -> &[f64] {
        &self.vertices
    }

    /// Number of vertices; always even.
    pub fn order(&self) -> usize {
        self.vertices.len()
    }

    /// Spin of the `k`-th segment.
    pub fn segment_spin(&self, k: usize) -> i32 {
        if k % 2 == 0 {
            self.s0
        } else {
            -self.s0
        }
    }

    /// Alternating sum `-v0 + v1 - v2 + v3 ...`, i.e. the total length of the
    /// segments whose spin is opposite to `s0`.
    pub fn sum_deltatau(&self) -> f64 {
        self.vertices
            .chunks_exact(2)
            .map(|pair| pair[1] - pair[0])
            .sum()
    }

    /// Per-sample estimator of the longitudinal magnetization.
    pub fn magnetization_z(&self) -> f64 {
        (self.beta - 2.0 * self.sum_deltatau()) * f64::from(self.s0) / self.beta
    }

    /// Unnormalized Monte Carlo weight of the diagram.
    pub fn value(&self) -> f64 {
        let alternating = self.sum_deltatau();
        self.gamma.powi(self.order() as i32)
            * (self.h * f64::from(self.s0) * (-self.beta + 2.0 * alternating)).exp()
    }

    /// Weight ratio `value(self) / value(other)`. Not used in the hot loop.
    pub fn ratio(&self, other: &Diagram) -> f64 {
        self.value() / other.value()
    }

    /// Builds the insertion candidate for draws `r1, r2` in `[0, 1)`.
    pub fn propose_add(&self, r1: f64, r2: f64) -> AddProposal {
        let tau1 = r1 * self.beta;
        let index = self
            .vertices
            .iter()
            .position(|&vertex| vertex > tau1)
            .unwrap_or(self.vertices.len());
        let tau3 = self.vertices.get(index).copied().unwrap_or(self.beta);
        let tau2 = tau1 + r2 * (tau3 - tau1);
        AddProposal {
            tau1,
            tau2,
            tau3,
            index,
            spin: self.segment_spin(index + 1),
        }
    }

    /// Metropolis ratio for inserting the proposed segment.
    pub fn acceptance_add(&self, proposal: &AddProposal) -> f64 {
        let AddProposal {
            tau1, tau2, tau3, spin, ..
        } = *proposal;
        self.gamma
            * self.gamma
            * (-2.0 * self.h * f64::from(spin) * (tau2 - tau1)).exp()
            * self.beta
            * (tau3 - tau1)
            / (self.order() + 1) as f64
    }

    /// Attempts to insert a segment. Returns whether the move was accepted.
    pub fn attempt_add_segment(&mut self, r1: f64, r2: f64, racc: f64) -> bool {
        let proposal = self.propose_add(r1, r2);
        if racc < self.acceptance_add(&proposal) {
            self.vertices.splice(
                proposal.index..proposal.index,
                [proposal.tau1, proposal.tau2],
            );
            true
        } else {
            false
        }
    }

    /// Builds the removal candidate for draw `r1`, or `None` at order zero.
    pub fn propose_remove(&self, r1: f64) -> Option<RemoveProposal> {
        let order = self.order();
        if order == 0 {
            return None;
        }
        let index = ((r1 * (order - 1) as f64) as usize).min(order - 2);
        let tau1 = self.vertices[index];
        let tau2 = self.vertices[index + 1];
        let tau3 = self.vertices.get(index + 2).copied().unwrap_or(self.beta);
        Some(RemoveProposal {
            tau1,
            tau2,
            tau3,
            index,
            spin: self.segment_spin(index + 1),
        })
    }

    /// Metropolis ratio for removing the proposed segment.
    pub fn acceptance_remove(&self, proposal: &RemoveProposal) -> f64 {
        let RemoveProposal {
            tau1, tau2, tau3, spin, ..
        } = *proposal;
        (2.0 * self.h * f64::from(spin) * (tau2 - tau1)).exp()
            * self.order().saturating_sub(1) as f64
            / (self.gamma * self.gamma * self.beta * (tau3 - tau1))
    }

    /// Attempts to remove a segment. Always rejected at order zero.
    pub fn attempt_remove_segment(&mut self, r1: f64, racc: f64) -> bool {
        let Some(proposal) = self.propose_remove(r1) else {
            return false;
        };
        if racc < self.acceptance_remove(&proposal) {
            self.vertices.drain(proposal.index..proposal.index + 2);
            true
        } else {
            false
        }
    }

    /// Metropolis ratio for flipping every segment spin.
    pub fn acceptance_flip(&self) -> f64 {
        (2.0 * self.h * f64::from(self.s0) * (self.beta - 2.0 * self.sum_deltatau())).exp()
    }

    /// Attempts a global spin flip; vertices are left untouched.
    pub fn attempt_spin_flip(&mut self, racc: f64) -> bool {
        if racc < self.acceptance_flip() {
            self.s0 = -self.s0;
            true
        } else {
            false
        }
    }
}

fn validate(beta: f64, s0: i32, h: f64, gamma: f64, vertices: &[f64]) -> Result<(), DmcError> {
    for (name, value) in [("beta", beta), ("H", h), ("GAMMA", gamma)] {
        if !value.is_finite() {
            return Err(DmcError::InvalidParameter(
                ErrorInfo::new("non-finite-parameter", format!("{name} must be finite"))
                    .with_context(name, value.to_string()),
            ));
        }
    }
    if beta <= 0.0 {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("non-positive-beta", "beta must be > 0")
                .with_context("beta", beta.to_string()),
        ));
    }
    if s0 != 1 && s0 != -1 {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new(
                "invalid-spin",
                format!("the spin can either be +1 or -1, but {s0} was provided"),
            )
            .with_context("s0", s0.to_string()),
        ));
    }
    if h.abs() < f64::EPSILON && gamma.abs() < f64::EPSILON {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("degenerate-field", "H and GAMMA cannot both be 0")
                .with_context("H", h.to_string())
                .with_context("GAMMA", gamma.to_string()),
        ));
    }
    if gamma.abs() < f64::EPSILON {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("zero-gamma", "GAMMA must be nonzero")
                .with_context("GAMMA", gamma.to_string())
                .with_hint("use a small nonzero GAMMA such as 1e-10"),
        ));
    }
    if vertices.len() % 2 != 0 {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("odd-vertex-count", "the vertex list must have even length")
                .with_context("len", vertices.len().to_string()),
        ));
    }
    if let Some((idx, vertex)) = vertices
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0 || **v > beta)
    {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("vertex-out-of-range", "vertices must lie in [0, beta]")
                .with_context("index", idx.to_string())
                .with_context("vertex", vertex.to_string())
                .with_context("beta", beta.to_string()),
        ));
    }
    if let Some(idx) = vertices.windows(2).position(|pair| pair[0] > pair[1]) {
        return Err(DmcError::InvalidParameter(
            ErrorInfo::new("unsorted-vertices", "the vertex list is not sorted")
                .with_context("index", (idx + 1).to_string())
                .with_hint("pass vertex times in ascending order"),
        ));
    }
    Ok(())
}
