//! Astronomical units, magnitude/luminosity conversions, bounding volumes and frustum geometry.
//!
//! Everything here is plain `f64` math on top of `glam`'s double-precision types.
//! Distances at this layer are kilometers unless a function says otherwise.

mod aabb;
mod frustum;
mod magnitude;
mod orientation;
pub mod units;

pub use aabb::BoundingBox;
pub use frustum::{Frustum, Intersection, Plane};
pub use magnitude::{
    abs_mag_to_lum, abs_to_app_mag, app_mag_to_radiance, app_to_abs_mag, lum_to_abs_mag,
    point_radiance, radiance_to_app_mag,
};
pub use orientation::{
    J2000_OBLIQUITY, equatorial_j2000_orientation, orientation_from_incl_an, pole_orientation,
    rotation_x, rotation_z,
};
