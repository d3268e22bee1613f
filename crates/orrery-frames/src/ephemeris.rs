//! Interfaces to external ephemeris and rotation-element libraries.
//!
//! The series themselves (VSOP87, ELP82, WGCCRE closed forms, ...) live outside
//! the core; only their results cross this boundary.

use std::fmt;

use glam::DVec3;

/// Position source for analytical ephemerides.
pub trait EphemerisProvider: fmt::Debug {
    /// Frame-local position in kilometers of `body` at Julian date `jd`,
    /// or `None` if the body is not implemented.
    fn position(&self, jd: f64, body: usize) -> Option<DVec3>;
}

/// Rotation elements of a body at a given date, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoleOrientation {
    /// Right ascension of the north pole (J2000 equatorial).
    pub right_ascension: f64,
    /// Declination of the north pole (J2000 equatorial).
    pub declination: f64,
    /// Prime meridian angle.
    pub meridian: f64,
}

/// Source of closed-form rotation elements for one body.
pub trait RotationProvider: fmt::Debug {
    fn pole(&self, jd: f64) -> Option<PoleOrientation>;
}
