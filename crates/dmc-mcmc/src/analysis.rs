/// Closed-form thermal magnetizations `(m_z, m_x)` of a single spin in the
/// field `(GAMMA, H)` at inverse temperature `beta`.
///
/// With `E = sqrt(H^2 + GAMMA^2)` these are `-H/E * tanh(beta*E)` and
/// `-GAMMA/E * tanh(beta*E)`. Used as the reference for measured values.
pub fn exact_magnetizations(beta: f64, h: f64, gamma: f64) -> (f64, f64) {
    let energy = h.hypot(gamma);
    let thermal = (beta * energy).tanh();
    (-h / energy * thermal, -gamma / energy * thermal)
}

/// Relative deviation of a measured value from its reference.
pub fn relative_error(measured: f64, exact: f64) -> f64 {
    ((measured - exact) / exact).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_point_matches_known_values() {
        let (mz, mx) = exact_magnetizations(1.0, -0.5, 0.1);
        assert!((mz - 0.46074).abs() < 1e-4);
        assert!((mx + 0.09215).abs() < 1e-4);
    }

    #[test]
    fn magnetization_saturates_at_low_temperature() {
        let (mz, mx) = exact_magnetizations(200.0, 3.0, 4.0);
        assert!((mz + 0.6).abs() < 1e-12);
        assert!((mx + 0.8).abs() < 1e-12);
    }

    #[test]
    fn relative_error_is_symmetric_in_sign() {
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-12);
        assert!((relative_error(-1.1, -1.0) - 0.1).abs() < 1e-12);
    }
}
