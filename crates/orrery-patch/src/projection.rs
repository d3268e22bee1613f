//! Cube-to-sphere projections.
//!
//! - **QCS**: normalizes the cube point. Cheap, but cells near the face
//!   corners shrink to about a fifth of the area of cells at the center.
//! - **Improved QCS**: the analytic mapping
//!
//! ```text
//! sx = x * sqrt(1 - y²/2 - z²/2 + y²z²/3)
//! sy = y * sqrt(1 - x²/2 - z²/2 + x²z²/3)
//! sz = z * sqrt(1 - x²/2 - y²/2 + x²y²/3)
//! ```
//!
//! which keeps edge curvature close to a great circle and cell areas within
//! a factor of 1.5 of each other.

use glam::DVec3;

use crate::CubeFace;

/// Which cube-to-sphere mapping a cube-sphere body uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    Qcs,
    #[default]
    ImprovedQcs,
}

impl Projection {
    /// Unit sphere direction for the cube point `p`.
    #[inline]
    pub fn apply(self, p: DVec3) -> DVec3 {
        match self {
            Projection::Qcs => qcs(p),
            Projection::ImprovedQcs => improved_qcs(p),
        }
    }

    /// Unit sphere direction at face coordinates `u, v` in `[0, 1]`.
    pub fn face_point(self, face: CubeFace, u: f64, v: f64) -> DVec3 {
        self.apply(face.cube_point(2.0 * u - 1.0, 2.0 * v - 1.0))
    }
}

#[inline]
#[must_use]
pub fn qcs(cube_point: DVec3) -> DVec3 {
    cube_point.normalize()
}

#[inline]
#[must_use]
pub fn improved_qcs(cube_point: DVec3) -> DVec3 {
    let x2 = cube_point.x * cube_point.x;
    let y2 = cube_point.y * cube_point.y;
    let z2 = cube_point.z * cube_point.z;

    DVec3::new(
        cube_point.x * (1.0 - y2 / 2.0 - z2 / 2.0 + y2 * z2 / 3.0).max(0.0).sqrt(),
        cube_point.y * (1.0 - x2 / 2.0 - z2 / 2.0 + x2 * z2 / 3.0).max(0.0).sqrt(),
        cube_point.z * (1.0 - x2 / 2.0 - y2 / 2.0 + x2 * y2 / 3.0).max(0.0).sqrt(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn cell_area(projection: Projection, face: CubeFace, u: f64, v: f64, h: f64) -> f64 {
        let p00 = projection.face_point(face, u, v);
        let p10 = projection.face_point(face, u + h, v);
        let p01 = projection.face_point(face, u, v + h);
        (p10 - p00).cross(p01 - p00).length()
    }

    #[test]
    fn test_face_center_maps_to_normal() {
        for projection in [Projection::Qcs, Projection::ImprovedQcs] {
            for face in CubeFace::ALL {
                let p = projection.face_point(face, 0.5, 0.5);
                assert!((p - face.normal()).length() < EPSILON);
            }
        }
    }

    #[test]
    fn test_improved_qcs_lands_on_unit_sphere() {
        for face in CubeFace::ALL {
            for i in 0..=8 {
                for j in 0..=8 {
                    let p = Projection::ImprovedQcs.face_point(face, i as f64 / 8.0, j as f64 / 8.0);
                    assert!(
                        (p.length() - 1.0).abs() < 1e-12,
                        "{face:?} ({i}, {j}) has length {}",
                        p.length()
                    );
                }
            }
        }
    }

    #[test]
    fn test_shared_edges_agree_between_faces() {
        // +X at u = 0 and -Y at u = 1 both lie on the cube edge x = 1, y = -1.
        for projection in [Projection::Qcs, Projection::ImprovedQcs] {
            for j in 0..=4 {
                let v = j as f64 / 4.0;
                let a = projection.face_point(CubeFace::PosX, 0.0, v);
                let b = projection.face_point(CubeFace::NegY, 1.0, v);
                assert!((a - b).length() < EPSILON, "{projection:?} edge mismatch at v = {v}");
            }
        }
    }

    #[test]
    fn test_improved_qcs_is_more_uniform() {
        let h = 1.0 / 64.0;
        let ratio = |projection| {
            let center = cell_area(projection, CubeFace::PosZ, 0.5, 0.5, h);
            let corner = cell_area(projection, CubeFace::PosZ, 0.0, 0.0, h);
            center / corner
        };
        assert!(ratio(Projection::ImprovedQcs) < 1.6);
        assert!(ratio(Projection::Qcs) > 4.0);
    }
}
