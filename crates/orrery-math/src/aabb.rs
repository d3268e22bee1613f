use glam::DVec3;

/// Axis-aligned bounding box in `f64` space.
///
/// An empty box has `min > max` on every axis; extending it with a point
/// makes it a degenerate box around that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    /// A box containing nothing.
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a box from two corners, sorting components so that `min <= max`.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from its center and half-extents.
    pub fn from_center_half_extents(center: DVec3, half: DVec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Smallest box enclosing all `points`.
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Returns true if the box contains no point.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to include `p`.
    pub fn extend(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow the box to include `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// The same box moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns true if `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Radius of the sphere centered on the box center that encloses the box.
    pub fn bounding_radius(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.half_extents().length()
    }
}
