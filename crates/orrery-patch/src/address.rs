//! Patch addressing on a quad-tree face.
//!
//! A face at LOD `n` is split into a `2ⁿ × 2ⁿ` grid; `(x, y)` index that grid
//! with `x` along the face `u` axis and `y` along `v`.

use crate::CubeFace;

/// One side of a patch. The discriminant indexes [`EdgeRatios`](crate::EdgeRatios).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatchEdge {
    /// `v == 1`
    North = 0,
    /// `u == 1`
    East = 1,
    /// `v == 0`
    South = 2,
    /// `u == 0`
    West = 3,
}

impl PatchEdge {
    pub const ALL: [PatchEdge; 4] = [
        PatchEdge::North,
        PatchEdge::East,
        PatchEdge::South,
        PatchEdge::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> PatchEdge {
        match self {
            PatchEdge::North => PatchEdge::South,
            PatchEdge::East => PatchEdge::West,
            PatchEdge::South => PatchEdge::North,
            PatchEdge::West => PatchEdge::East,
        }
    }
}

/// Parameter rectangle `(x0, y0) .. (x1, y1)` on a unit square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PatchRect {
    pub const UNIT: PatchRect = PatchRect {
        x0: 0.0,
        y0: 0.0,
        x1: 1.0,
        y1: 1.0,
    };

    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Point at patch-local `(u, v)` in `[0, 1]`.
    #[inline]
    pub fn lerp(&self, u: f64, v: f64) -> (f64, f64) {
        (self.x0 + u * self.width(), self.y0 + v * self.height())
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Location of a patch in a face quad-tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchAddress {
    pub face: CubeFace,
    pub lod: u8,
    pub x: u32,
    pub y: u32,
}

impl PatchAddress {
    /// Deepest supported level; keeps `2^lod` within `u32`.
    pub const MAX_LOD: u8 = 30;

    pub fn root(face: CubeFace) -> Self {
        Self {
            face,
            lod: 0,
            x: 0,
            y: 0,
        }
    }

    pub fn new(face: CubeFace, lod: u8, x: u32, y: u32) -> Option<Self> {
        if lod > Self::MAX_LOD {
            return None;
        }
        let side = 1u32 << lod;
        (x < side && y < side).then_some(Self { face, lod, x, y })
    }

    /// Patches per side at this level.
    pub fn side(&self) -> u32 {
        1 << self.lod
    }

    /// The four children ordered south-west, south-east, north-west, north-east.
    pub fn children(&self) -> Option<[PatchAddress; 4]> {
        if self.lod >= Self::MAX_LOD {
            return None;
        }
        let (x, y, lod) = (self.x * 2, self.y * 2, self.lod + 1);
        let child = |dx, dy| PatchAddress {
            face: self.face,
            lod,
            x: x + dx,
            y: y + dy,
        };
        Some([child(0, 0), child(1, 0), child(0, 1), child(1, 1)])
    }

    pub fn parent(&self) -> Option<PatchAddress> {
        (self.lod > 0).then(|| PatchAddress {
            face: self.face,
            lod: self.lod - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Neighbour across `edge` on the same face, at the same level.
    ///
    /// Returns `None` when `edge` lies on the face border.
    pub fn neighbour(&self, edge: PatchEdge) -> Option<PatchAddress> {
        let last = self.side() - 1;
        let (x, y) = match edge {
            PatchEdge::North if self.y < last => (self.x, self.y + 1),
            PatchEdge::East if self.x < last => (self.x + 1, self.y),
            PatchEdge::South if self.y > 0 => (self.x, self.y - 1),
            PatchEdge::West if self.x > 0 => (self.x - 1, self.y),
            _ => return None,
        };
        Some(PatchAddress { x, y, ..*self })
    }

    /// Ancestor at `lod`, or `None` when `lod` is deeper than this patch.
    pub fn ancestor(&self, lod: u8) -> Option<PatchAddress> {
        let shift = self.lod.checked_sub(lod)?;
        Some(PatchAddress {
            face: self.face,
            lod,
            x: self.x >> shift,
            y: self.y >> shift,
        })
    }

    /// Covered square of the face in `[0, 1]²`.
    pub fn rect(&self) -> PatchRect {
        let size = 1.0 / f64::from(self.side());
        let x0 = f64::from(self.x) * size;
        let y0 = f64::from(self.y) * size;
        PatchRect::new(x0, y0, x0 + size, y0 + size)
    }
}
