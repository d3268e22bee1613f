//! View frustum planes in `f64` with sphere and box classification.
//!
//! Frustums are built either from a projection·view matrix (Gribb/Hartmann
//! plane extraction, `[0, 1]` clip depth as produced by `DMat4::perspective_rh`)
//! or analytically from a camera basis, which also supports an infinite far plane.
//!
//! The camera basis convention is the astronomical one: `+Y` forward, `+Z` up,
//! `+X` right.

use glam::{DMat4, DQuat, DVec3, DVec4};

use crate::BoundingBox;

/// Result of testing a volume against the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// The volume is entirely inside the frustum.
    Inside,
    /// The volume is entirely outside the frustum.
    Outside,
    /// The volume straddles one or more planes.
    Intersecting,
}

/// A plane `normal · p + d = 0`; the positive half-space is "inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    /// A plane that every finite point is inside of. Used for an infinite far plane.
    pub const UNBOUNDED: Self = Self {
        normal: DVec3::ZERO,
        d: f64::MAX,
    };

    pub fn new(normal: DVec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Plane through `point` with inward `normal` (normalized here).
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        let n = normal.normalize();
        Self {
            normal: n,
            d: -n.dot(point),
        }
    }

    fn from_vec4(v: DVec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 1e-12 {
            Self {
                normal: normal / len,
                d: v.w / len,
            }
        } else {
            Self {
                normal,
                d: v.w,
            }
        }
    }

    /// Signed distance of `p` to the plane; positive inside.
    #[inline]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }

    /// The same plane moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Plane {
        if self.normal == DVec3::ZERO {
            return *self;
        }
        Plane {
            normal: self.normal,
            d: self.d - self.normal.dot(offset),
        }
    }
}

/// Six inward-facing planes, ordered left, right, bottom, top, near, far.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a projection·view matrix with `[0, 1]` clip depth.
    pub fn from_view_proj(vp: &DMat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        Self {
            planes: [
                Plane::from_vec4(row3 + row0), // left
                Plane::from_vec4(row3 - row0), // right
                Plane::from_vec4(row3 + row1), // bottom
                Plane::from_vec4(row3 - row1), // top
                Plane::from_vec4(row2),        // near
                Plane::from_vec4(row3 - row2), // far
            ],
        }
    }

    /// Build a perspective frustum from a camera basis.
    ///
    /// - `position`: apex of the frustum.
    /// - `orientation`: rotation from camera space (`+Y` forward, `+Z` up) to the target space.
    /// - `fov_y`: full vertical field of view in radians.
    /// - `aspect`: width / height.
    /// - `far`: may be `f64::INFINITY`.
    pub fn from_perspective(
        position: DVec3,
        orientation: DQuat,
        fov_y: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let forward = orientation * DVec3::Y;
        let up = orientation * DVec3::Z;
        let right = orientation * DVec3::X;
        let tan_y = (fov_y * 0.5).tan();
        let tan_x = tan_y * aspect;

        let far_plane = if far.is_finite() {
            Plane::from_point_normal(position + forward * far, -forward)
        } else {
            Plane::UNBOUNDED
        };

        Self {
            planes: [
                Plane::from_point_normal(position, right + forward * tan_x),
                Plane::from_point_normal(position, -right + forward * tan_x),
                Plane::from_point_normal(position, up + forward * tan_y),
                Plane::from_point_normal(position, -up + forward * tan_y),
                Plane::from_point_normal(position + forward * near, forward),
                far_plane,
            ],
        }
    }

    /// The same frustum moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Frustum {
        Frustum {
            planes: self.planes.map(|p| p.translated(offset)),
        }
    }

    /// Replace the far plane, keeping the other five.
    pub fn with_far_plane(mut self, plane: Plane) -> Frustum {
        self.planes[Self::FAR] = plane;
        self
    }

    /// Test whether a point is inside all six planes.
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(p) >= 0.0)
    }

    /// Conservative sphere test: true unless the sphere is entirely outside a plane.
    pub fn is_sphere_in(&self, center: DVec3, radius: f64) -> bool {
        self.test_sphere(center, radius) != Intersection::Outside
    }

    pub fn test_sphere(&self, center: DVec3, radius: f64) -> Intersection {
        let mut all_inside = true;
        for plane in &self.planes {
            let dist = plane.signed_distance(center);
            if dist < -radius {
                return Intersection::Outside;
            }
            if dist < radius {
                all_inside = false;
            }
        }
        if all_inside {
            Intersection::Inside
        } else {
            Intersection::Intersecting
        }
    }

    /// Test an AABB given as center + half-extents.
    pub fn test_aabb(&self, center: DVec3, half_extents: DVec3) -> Intersection {
        let mut all_inside = true;

        for plane in &self.planes {
            let n = plane.normal;
            // Projection of the half-extents onto the plane normal.
            let effective_radius =
                half_extents.x * n.x.abs() + half_extents.y * n.y.abs() + half_extents.z * n.z.abs();
            let signed_dist = plane.signed_distance(center);

            if signed_dist < -effective_radius {
                return Intersection::Outside;
            }
            if signed_dist < effective_radius {
                all_inside = false;
            }
        }

        if all_inside {
            Intersection::Inside
        } else {
            Intersection::Intersecting
        }
    }

    pub fn test_box(&self, bounds: &BoundingBox) -> Intersection {
        if bounds.is_empty() {
            return Intersection::Outside;
        }
        self.test_aabb(bounds.center(), bounds.half_extents())
    }
}
