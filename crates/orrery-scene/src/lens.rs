//! Perspective lenses for scene and region cameras.

use std::f64::consts::FRAC_PI_2;

use glam::{DMat4, DQuat, DVec3, DVec4};
use orrery_math::rotation_x;

/// A perspective lens.
///
/// Projections follow `glam`'s right-handed view space (`-Z` forward, depth in
/// `[0, 1]`); [`Lens::view_projection`] adds the rotation from the observer's
/// `+Y`-forward, `+Z`-up frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    /// Vertical field of view, in radians.
    pub fov_y: f64,
    pub aspect_ratio: f64,
    pub near: f64,
    /// May be infinite.
    pub far: f64,
    /// Near maps to depth 1 and far to depth 0.
    pub inverse_z: bool,
    /// Depth kept free at the far end of an infinite projection.
    pub far_epsilon: f64,
}

impl Lens {
    /// Half of the diagonal field of view.
    pub fn half_diagonal_fov(&self) -> f64 {
        let half = (self.fov_y * 0.5).tan();
        (half * (1.0 + self.aspect_ratio * self.aspect_ratio).sqrt()).atan()
    }

    /// Same lens with near and far moved outwards by `margin` (relative).
    pub fn inflated(&self, margin: f64) -> Lens {
        Lens {
            near: self.near * (1.0 - margin),
            far: self.far * (1.0 + margin),
            ..*self
        }
    }

    pub fn projection(&self) -> DMat4 {
        if self.far.is_infinite() {
            return self.infinite_projection();
        }
        if self.inverse_z {
            DMat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
        } else {
            DMat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
        }
    }

    /// Infinite projection whose far end stops `far_epsilon` short of the
    /// depth limit, so points at infinity are not clipped.
    fn infinite_projection(&self) -> DMat4 {
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let eps = self.far_epsilon.clamp(0.0, 1.0);
        let (zz, wz) = if self.inverse_z {
            (-eps, self.near * (1.0 - eps))
        } else {
            (eps - 1.0, (eps - 1.0) * self.near)
        };
        DMat4::from_cols(
            DVec4::new(f / self.aspect_ratio, 0.0, 0.0, 0.0),
            DVec4::new(0.0, f, 0.0, 0.0),
            DVec4::new(0.0, 0.0, zz, -1.0),
            DVec4::new(0.0, 0.0, wz, 0.0),
        )
    }

    /// Projection times view for an observer at the origin with `orientation`.
    pub fn view_projection(&self, orientation: DQuat) -> DMat4 {
        // View space -Z is the observer's +Y, view +Y its +Z.
        let to_view = (orientation * rotation_x(FRAC_PI_2)).inverse();
        self.projection() * DMat4::from_quat(to_view)
    }

    /// Normalized depth of a point at `distance` straight ahead.
    pub fn depth_at(&self, distance: f64) -> f64 {
        self.projection()
            .project_point3(DVec3::new(0.0, 0.0, -distance))
            .z
    }
}
