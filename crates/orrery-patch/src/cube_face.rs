//! The six faces of the unit cube a cube-sphere body is tessellated from.

use glam::DVec3;

/// One face of the cube, named after the axis its outward normal follows.
///
/// Every face carries a right-handed basis `(tangent, bitangent, normal)`:
/// patch `u` runs along the tangent, patch `v` along the bitangent, and
/// `tangent × bitangent == normal` so counter-clockwise triangles in `(u, v)`
/// face outwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn from_index(index: usize) -> Option<CubeFace> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::PosX => CubeFace::NegX,
            CubeFace::NegX => CubeFace::PosX,
            CubeFace::PosY => CubeFace::NegY,
            CubeFace::NegY => CubeFace::PosY,
            CubeFace::PosZ => CubeFace::NegZ,
            CubeFace::NegZ => CubeFace::PosZ,
        }
    }

    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// Direction of increasing patch `u`.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::NEG_Y,
            CubeFace::PosY => DVec3::NEG_X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::X,
        }
    }

    /// Direction of increasing patch `v`.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::NEG_Y,
        }
    }

    /// Point on the cube surface for face coordinates `x, y` in `[-1, 1]`.
    #[inline]
    pub fn cube_point(self, x: f64, y: f64) -> DVec3 {
        self.normal() + x * self.tangent() + y * self.bitangent()
    }

    /// Face whose normal is closest to `direction`.
    pub fn from_direction(direction: DVec3) -> CubeFace {
        let a = direction.abs();
        if a.x >= a.y && a.x >= a.z {
            if direction.x >= 0.0 { CubeFace::PosX } else { CubeFace::NegX }
        } else if a.y >= a.z {
            if direction.y >= 0.0 { CubeFace::PosY } else { CubeFace::NegY }
        } else if direction.z >= 0.0 {
            CubeFace::PosZ
        } else {
            CubeFace::NegZ
        }
    }

    /// Face coordinates `(x, y)` in `[-1, 1]` of the cube point hit by `direction`.
    ///
    /// `direction` must point into this face's pyramid.
    pub fn face_coordinates(self, direction: DVec3) -> (f64, f64) {
        let depth = direction.dot(self.normal());
        if depth <= 0.0 {
            return (0.0, 0.0);
        }
        let p = direction / depth;
        (p.dot(self.tangent()), p.dot(self.bitangent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_is_right_handed_and_orthonormal() {
        for face in CubeFace::ALL {
            let (t, b, n) = (face.tangent(), face.bitangent(), face.normal());
            assert!((t.cross(b) - n).length() < 1e-12, "tangent x bitangent != normal for {face:?}");
            assert!(t.dot(n).abs() < 1e-12 && b.dot(n).abs() < 1e-12);
        }
    }

    #[test]
    fn test_opposite_normals_cancel() {
        for face in CubeFace::ALL {
            assert!((face.normal() + face.opposite().normal()).length() < 1e-12);
            assert_eq!(face.opposite().opposite(), face);
        }
    }

    #[test]
    fn test_index_round_trip() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(CubeFace::from_index(i), Some(*face));
        }
        assert_eq!(CubeFace::from_index(6), None);
    }

    #[test]
    fn test_direction_lookup_finds_face_and_coordinates() {
        for face in CubeFace::ALL {
            let p = face.cube_point(0.25, -0.5);
            assert_eq!(CubeFace::from_direction(p * 3.0), face);
            let (x, y) = face.face_coordinates(p * 3.0);
            assert!((x - 0.25).abs() < 1e-12 && (y + 0.5).abs() < 1e-12);
        }
    }
}
