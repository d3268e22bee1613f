//! Kepler's equation in the pericenter / eccentricity / mean anomaly form.
//!
//! The regime is picked from the eccentricity:
//!
//! * `e < 0.1`: fixed-point iteration of `E = M + e sin E`
//! * `0.1 <= e < 1`: Newton iteration from Danby's starting value
//! * `|e - 1| < NEAR_PARABOLIC`: Barker's equation, with `M` read as the
//!   parabolic mean anomaly
//! * `e > 1`: Newton iteration on `M = e sinh H - H`
//!
//! Iterative regimes stop after [`MAX_ITERATIONS`] steps and return their
//! best estimate with `converged == false`.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::OrbitError;

pub const MAX_ITERATIONS: u32 = 20;

/// Half-width of the eccentricity band solved as a parabola.
pub const NEAR_PARABOLIC: f64 = 1e-6;

/// Above this the fixed-point iteration contracts too slowly to reach
/// full precision within [`MAX_ITERATIONS`].
const LOW_ECCENTRICITY: f64 = 0.1;

/// Position in the orbit plane, pericenter on `+X`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    pub position: DVec2,
    pub iterations: u32,
    pub converged: bool,
}

/// Stopping tolerance on the anomaly; precision degrades as `e -> 1`.
fn tolerance(eccentricity: f64) -> f64 {
    let gap = (1.0 - eccentricity).abs().max(NEAR_PARABOLIC);
    4.0 * f64::EPSILON / gap
}

/// Solve for the in-plane position at `mean_anomaly` (radians).
pub fn solve(
    pericenter_distance: f64,
    eccentricity: f64,
    mean_anomaly: f64,
) -> Result<KeplerSolution, OrbitError> {
    if !eccentricity.is_finite() || eccentricity < 0.0 {
        return Err(OrbitError::InvalidEccentricity(eccentricity));
    }
    if !pericenter_distance.is_finite() || !mean_anomaly.is_finite() {
        return Err(OrbitError::NonFinite);
    }

    let solution = if (eccentricity - 1.0).abs() < NEAR_PARABOLIC {
        solve_parabolic(pericenter_distance, mean_anomaly)
    } else if eccentricity < 1.0 {
        solve_elliptic(pericenter_distance, eccentricity, mean_anomaly)
    } else {
        solve_hyperbolic(pericenter_distance, eccentricity, mean_anomaly)
    };

    if solution.position.is_finite() {
        Ok(solution)
    } else {
        Err(OrbitError::DegenerateConic(eccentricity))
    }
}

fn solve_elliptic(q: f64, e: f64, mean_anomaly: f64) -> KeplerSolution {
    let m = normalize_angle(mean_anomaly);
    let tol = tolerance(e);

    let (ecc_anomaly, iterations, converged) = if e < LOW_ECCENTRICITY {
        let mut ea = m;
        let mut result = (ea, MAX_ITERATIONS, false);
        for i in 1..=MAX_ITERATIONS {
            let next = m + e * ea.sin();
            let delta = (next - ea).abs();
            ea = next;
            if delta <= tol {
                result = (ea, i, true);
                break;
            }
            result = (ea, i, false);
        }
        result
    } else {
        let mut ea = m + 0.85 * e * m.sin().signum();
        let mut result = (ea, MAX_ITERATIONS, false);
        for i in 1..=MAX_ITERATIONS {
            let f = ea - e * ea.sin() - m;
            let df = 1.0 - e * ea.cos();
            let delta = f / df;
            ea -= delta;
            if delta.abs() <= tol {
                result = (ea, i, true);
                break;
            }
            result = (ea, i, false);
        }
        result
    };

    let a = q / (1.0 - e);
    let x = a * (ecc_anomaly.cos() - e);
    let y = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();
    KeplerSolution {
        position: DVec2::new(x, y),
        iterations,
        converged,
    }
}

/// Barker's equation `W = D + D³/3`, `D = tan(ν/2)`, solved in closed form.
fn solve_parabolic(q: f64, mean_anomaly: f64) -> KeplerSolution {
    let w = 1.5 * mean_anomaly;
    let y = (w + (w * w + 1.0).sqrt()).cbrt();
    let d = y - 1.0 / y;
    let true_anomaly = 2.0 * d.atan();
    let r = q * (1.0 + d * d);
    KeplerSolution {
        position: DVec2::new(r * true_anomaly.cos(), r * true_anomaly.sin()),
        iterations: 0,
        converged: true,
    }
}

fn solve_hyperbolic(q: f64, e: f64, mean_anomaly: f64) -> KeplerSolution {
    let m = mean_anomaly;
    let tol = tolerance(e);
    let mut h = if m.abs() > 1.0 {
        m.signum() * (2.0 * m.abs() / e + 1.8).ln()
    } else {
        (m / e).asinh()
    };

    let mut iterations = MAX_ITERATIONS;
    let mut converged = false;
    for i in 1..=MAX_ITERATIONS {
        let f = e * h.sinh() - h - m;
        let df = e * h.cosh() - 1.0;
        let delta = f / df;
        h -= delta;
        if delta.abs() <= tol * h.abs().max(1.0) {
            iterations = i;
            converged = true;
            break;
        }
    }

    let a = q / (e - 1.0);
    let x = a * (e - h.cosh());
    let y = a * (e * e - 1.0).sqrt() * h.sinh();
    KeplerSolution {
        position: DVec2::new(x, y),
        iterations,
        converged,
    }
}

/// Reduce an angle to `[-π, π)`.
fn normalize_angle(angle: f64) -> f64 {
    (angle + std::f64::consts::PI).rem_euclid(TAU) - std::f64::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Mean anomaly that corresponds to a given true anomaly on an ellipse.
    fn mean_from_true(e: f64, nu: f64) -> f64 {
        let ea = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
        ea - e * ea.sin()
    }

    #[test]
    fn test_circular_orbit_is_exact() {
        let s = solve(2.0, 0.0, FRAC_PI_2).unwrap();
        assert!(s.converged);
        assert!((s.position - DVec2::new(0.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn test_low_eccentricity_at_quarter_mean_anomaly() {
        let e = 0.1;
        let s = solve(1.0, e, FRAC_PI_2).unwrap();
        assert!(s.converged);
        // E satisfies E - e sin E = π/2.
        let a = 1.0 / (1.0 - e);
        let ea = (s.position.x / a + e).acos();
        assert!((ea - e * ea.sin() - FRAC_PI_2).abs() < 1e-12);
        assert!((s.position.y - 1.1).abs() < 1e-3, "y = {}", s.position.y);
    }

    #[test]
    fn test_low_eccentricity_at_right_true_anomaly() {
        let e = 0.1;
        let s = solve(1.0, e, mean_from_true(e, FRAC_PI_2)).unwrap();
        // Semi-latus rectum q (1 + e) at ν = 90°.
        assert!((s.position - DVec2::new(0.0, 1.1)).length() < 1e-9);
    }

    #[test]
    fn test_high_eccentricity_newton() {
        let e = 0.95;
        let nu = 2.0;
        let s = solve(0.5, e, mean_from_true(e, nu)).unwrap();
        assert!(s.converged);
        assert!(s.iterations <= MAX_ITERATIONS);
        let angle = s.position.y.atan2(s.position.x);
        assert!((angle - nu).abs() < 1e-9, "angle {angle}");
        let r = 0.5 * (1.0 + e) / (1.0 + e * nu.cos());
        assert!((s.position.length() - r).abs() < 1e-9);
    }

    #[test]
    fn test_pericenter_at_zero_anomaly() {
        for e in [0.0, 0.1, 0.5, 0.99, 1.0, 1.5] {
            let s = solve(3.0, e, 0.0).unwrap();
            assert!((s.position - DVec2::new(3.0, 0.0)).length() < 1e-9, "e = {e}");
        }
    }

    #[test]
    fn test_parabolic_matches_barker() {
        let d = 1.0_f64;
        let w = d + d * d * d / 3.0;
        let s = solve(1.0, 1.0, w).unwrap();
        assert!((s.position - DVec2::new(0.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn test_hyperbolic_satisfies_equation() {
        let (q, e, m) = (1.0, 1.8, 3.0);
        let s = solve(q, e, m).unwrap();
        assert!(s.converged);
        let a = q / (e - 1.0);
        let h = (s.position.y / (a * (e * e - 1.0).sqrt())).asinh();
        assert!((e * h.sinh() - h - m).abs() < 1e-9);
    }

    #[test]
    fn test_negative_eccentricity_is_rejected() {
        assert_eq!(
            solve(1.0, -0.1, 0.0),
            Err(OrbitError::InvalidEccentricity(-0.1))
        );
        assert_eq!(solve(1.0, 0.5, f64::NAN), Err(OrbitError::NonFinite));
    }

    #[test]
    fn test_moderate_eccentricity_converges_quickly() {
        for e in [0.05, 0.099, 0.1, 0.15, 0.199, 0.2] {
            for k in 0..16 {
                let m = -PI + f64::from(k) * TAU / 16.0;
                let s = solve(1.0, e, m).unwrap();
                assert!(s.converged && s.iterations < MAX_ITERATIONS, "e = {e}, M = {m}: {s:?}");
            }
        }
    }

    #[test]
    fn test_mean_anomaly_wraps() {
        let a = solve(1.0, 0.3, 1.0).unwrap();
        let b = solve(1.0, 0.3, 1.0 + 4.0 * PI).unwrap();
        assert!((a.position - b.position).length() < 1e-9);
    }
}
