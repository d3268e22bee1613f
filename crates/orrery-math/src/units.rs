//! Unit constants for the astronomical layer.
//!
//! Distances are kilometers, time is Julian days, luminosity is watts.

/// 1 kilometer = 1,000 meters.
pub const METERS_PER_KM: f64 = 1_000.0;

/// 1 Astronomical Unit in kilometers (IAU 2012 exact definition).
pub const KM_PER_AU: f64 = 149_597_870.7;

/// 1 light-year in kilometers (IAU: exactly 9,460,730,472,580.8 km).
pub const KM_PER_LIGHT_YEAR: f64 = 9_460_730_472_580.8;

/// 1 parsec in kilometers.
pub const KM_PER_PARSEC: f64 = 30_856_775_814_913.673;

/// Reference solar luminosity L₀ used for the absolute magnitude scale, in watts.
pub const L0: f64 = 3.0128e28;

/// Nominal solar luminosity in watts.
pub const SOLAR_LUMINOSITY: f64 = 3.828e26;

/// Julian date of the J2000.0 epoch.
pub const J2000: f64 = 2_451_545.0;

/// Days in a Julian century.
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Days in a Julian year.
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Convert astronomical units to kilometers.
pub fn au_to_km(au: f64) -> f64 {
    au * KM_PER_AU
}

/// Convert kilometers to astronomical units.
pub fn km_to_au(km: f64) -> f64 {
    km / KM_PER_AU
}

/// Convert light-years to kilometers.
pub fn light_years_to_km(ly: f64) -> f64 {
    ly * KM_PER_LIGHT_YEAR
}

/// Convert parsecs to kilometers.
pub fn parsecs_to_km(pc: f64) -> f64 {
    pc * KM_PER_PARSEC
}

/// Julian centuries elapsed since J2000 for the given Julian date.
pub fn julian_centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000) / DAYS_PER_JULIAN_CENTURY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsec_is_about_3_26_light_years() {
        let ratio = KM_PER_PARSEC / KM_PER_LIGHT_YEAR;
        assert!((ratio - 3.26156).abs() < 1e-4, "ratio = {ratio}");
    }

    #[test]
    fn test_au_roundtrip() {
        let km = au_to_km(1.5);
        assert!((km_to_au(km) - 1.5).abs() < 1e-15);
    }

    #[test]
    fn test_centuries_at_epoch_is_zero() {
        assert_eq!(julian_centuries_since_j2000(J2000), 0.0);
        assert!((julian_centuries_since_j2000(J2000 + DAYS_PER_JULIAN_CENTURY) - 1.0).abs() < 1e-15);
    }
}
