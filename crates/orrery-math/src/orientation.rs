//! Quaternion helpers for astronomical orientations.
//!
//! Every orientation maps vectors expressed in a local basis into the
//! J2000 ecliptic basis (`q * v`). Composition is parent-first: the frame
//! applied last is written leftmost.

use std::f64::consts::FRAC_PI_2;

use glam::{DQuat, DVec3};

/// Obliquity of the ecliptic at J2000, in radians (23.4392911°).
pub const J2000_OBLIQUITY: f64 = 23.439_291_1 * std::f64::consts::PI / 180.0;

/// Rotation of `angle` radians about the X axis.
#[inline]
pub fn rotation_x(angle: f64) -> DQuat {
    DQuat::from_axis_angle(DVec3::X, angle)
}

/// Rotation of `angle` radians about the Z axis.
#[inline]
pub fn rotation_z(angle: f64) -> DQuat {
    DQuat::from_axis_angle(DVec3::Z, angle)
}

/// Orientation of the J2000 equatorial basis relative to the J2000 ecliptic.
#[inline]
pub fn equatorial_j2000_orientation() -> DQuat {
    rotation_x(-J2000_OBLIQUITY)
}

/// Orientation of a plane with the given inclination and ascending node longitude.
///
/// The plane's X axis points at the ascending node; its Z axis is the plane normal.
#[inline]
pub fn orientation_from_incl_an(inclination: f64, ascending_node: f64) -> DQuat {
    rotation_z(ascending_node) * rotation_x(inclination)
}

/// Orientation of a body's equator from the J2000 equatorial coordinates of its north pole.
///
/// The resulting basis has Z along the pole and X along the ascending node of the
/// body equator on the J2000 equator (right ascension `ra + 90°`).
pub fn pole_orientation(right_ascension: f64, declination: f64) -> DQuat {
    equatorial_j2000_orientation()
        * orientation_from_incl_an(FRAC_PI_2 - declination, right_ascension + FRAC_PI_2)
}
