//! Magnitude, luminosity and point radiance conversions.
//!
//! The magnitude scale is anchored on [`L0`]: a source of luminosity `L0`
//! has absolute magnitude 0, and seen from 10 parsecs its apparent magnitude
//! is 0 as well.

use std::f64::consts::PI;

use crate::units::{KM_PER_PARSEC, L0, METERS_PER_KM};

/// Radiance (W/m²) of a magnitude-0 source: `L0` seen from 10 parsecs.
fn zero_mag_radiance() -> f64 {
    let ten_pc_m = 10.0 * KM_PER_PARSEC * METERS_PER_KM;
    L0 / (4.0 * PI * ten_pc_m * ten_pc_m)
}

/// Apparent magnitude of a source of absolute magnitude `abs_mag` at `distance_km`.
///
/// `m = M + 5·log₁₀(d / 10pc)`
pub fn abs_to_app_mag(abs_mag: f64, distance_km: f64) -> f64 {
    abs_mag + 5.0 * (distance_km / (10.0 * KM_PER_PARSEC)).log10()
}

/// Absolute magnitude of a source seen at `app_mag` from `distance_km`.
pub fn app_to_abs_mag(app_mag: f64, distance_km: f64) -> f64 {
    app_mag - 5.0 * (distance_km / (10.0 * KM_PER_PARSEC)).log10()
}

/// Luminosity in watts for an absolute magnitude.
pub fn abs_mag_to_lum(abs_mag: f64) -> f64 {
    L0 * 10f64.powf(-0.4 * abs_mag)
}

/// Absolute magnitude for a luminosity in watts.
///
/// Non-positive luminosities map to `+inf` (invisible).
pub fn lum_to_abs_mag(luminosity: f64) -> f64 {
    if luminosity <= 0.0 {
        return f64::INFINITY;
    }
    -2.5 * (luminosity / L0).log10()
}

/// Point radiance `L / (4π·d²)` in W/m², with `distance_km` converted to meters.
pub fn point_radiance(luminosity: f64, distance_km: f64) -> f64 {
    let d = distance_km * METERS_PER_KM;
    luminosity / (4.0 * PI * d * d)
}

/// Radiance in W/m² corresponding to an apparent magnitude.
pub fn app_mag_to_radiance(app_mag: f64) -> f64 {
    zero_mag_radiance() * 10f64.powf(-0.4 * app_mag)
}

/// Apparent magnitude corresponding to a radiance in W/m².
pub fn radiance_to_app_mag(radiance: f64) -> f64 {
    if radiance <= 0.0 {
        return f64::INFINITY;
    }
    -2.5 * (radiance / zero_mag_radiance()).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_apparent_equals_absolute_at_ten_parsecs() {
        let m = abs_to_app_mag(4.83, 10.0 * KM_PER_PARSEC);
        assert!((m - 4.83).abs() < EPSILON, "m = {m}");
    }

    #[test]
    fn test_magnitude_roundtrip() {
        let d = 42.0 * KM_PER_PARSEC;
        let m = abs_to_app_mag(1.5, d);
        assert!((app_to_abs_mag(m, d) - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_l0_is_magnitude_zero() {
        assert!((abs_mag_to_lum(0.0) - L0).abs() / L0 < EPSILON);
        assert!(lum_to_abs_mag(L0).abs() < EPSILON);
    }

    #[test]
    fn test_five_magnitudes_is_factor_hundred() {
        let ratio = abs_mag_to_lum(0.0) / abs_mag_to_lum(5.0);
        assert!((ratio - 100.0).abs() < 1e-9, "ratio = {ratio}");
    }

    #[test]
    fn test_radiance_matches_apparent_magnitude() {
        // A star of absolute magnitude 2 at 25 pc must have the same radiance
        // whether computed from its luminosity or from its apparent magnitude.
        let d = 25.0 * KM_PER_PARSEC;
        let from_lum = point_radiance(abs_mag_to_lum(2.0), d);
        let from_mag = app_mag_to_radiance(abs_to_app_mag(2.0, d));
        assert!(
            (from_lum - from_mag).abs() / from_lum < 1e-9,
            "from_lum = {from_lum}, from_mag = {from_mag}"
        );
        assert!((radiance_to_app_mag(from_lum) - abs_to_app_mag(2.0, d)).abs() < 1e-9);
    }

    #[test]
    fn test_dark_source_is_infinitely_faint() {
        assert_eq!(lum_to_abs_mag(0.0), f64::INFINITY);
        assert_eq!(radiance_to_app_mag(0.0), f64::INFINITY);
    }
}
