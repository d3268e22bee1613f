//! Depth regions: bands of the view volume rendered with their own lens and
//! depth range.

use crate::Lens;

/// Viewport and depth slice a region renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRegion {
    /// `[left, right, bottom, top]` in normalized window coordinates.
    pub rect: [f64; 4],
    /// Normalized depth slice, `(min, max)`.
    pub depth_range: (f64, f64),
    /// Draw order; higher sorts are drawn later.
    pub sort: i32,
}

impl DisplayRegion {
    pub const FULL_WINDOW: [f64; 4] = [0.0, 1.0, 0.0, 1.0];
}

/// One depth band `[near, far)` in scene units.
///
/// `bodies`, `points` and `background` index into the scene anchors of the
/// frame the region was built for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneRegion {
    pub near: f64,
    pub far: f64,
    pub bodies: Vec<usize>,
    pub points: Vec<usize>,
    pub background: Vec<usize>,
    pub lens: Option<Lens>,
    pub display: Option<DisplayRegion>,
}

impl SceneRegion {
    pub fn new(near: f64, far: f64) -> Self {
        Self {
            near,
            far,
            ..Default::default()
        }
    }

    pub fn overlaps(&self, other: &SceneRegion) -> bool {
        self.near < other.far && other.near < self.far
    }

    /// Widen to cover `other` and take over its contents.
    pub fn merge(&mut self, other: &mut SceneRegion) {
        self.near = self.near.min(other.near);
        self.far = self.far.max(other.far);
        self.bodies.append(&mut other.bodies);
        self.points.append(&mut other.points);
        self.background.append(&mut other.background);
    }

    pub fn contains_depth(&self, depth: f64) -> bool {
        depth >= self.near && depth <= self.far
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.points.is_empty() && self.background.is_empty()
    }

    fn reset(&mut self, near: f64, far: f64) {
        self.near = near;
        self.far = far;
        self.bodies.clear();
        self.points.clear();
        self.background.clear();
        self.lens = None;
        self.display = None;
    }
}

/// Recycles regions between frames so their lists keep their capacity.
#[derive(Debug, Default)]
pub struct RegionPool {
    free: Vec<SceneRegion>,
    /// Regions handed out since creation.
    acquired: u64,
    /// Of those, regions served from the free list.
    reused: u64,
}

impl RegionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, near: f64, far: f64) -> SceneRegion {
        self.acquired += 1;
        match self.free.pop() {
            Some(mut region) => {
                self.reused += 1;
                region.reset(near, far);
                region
            }
            None => SceneRegion::new(near, far),
        }
    }

    pub fn release(&mut self, region: SceneRegion) {
        self.free.push(region);
    }

    pub fn release_all(&mut self, regions: &mut Vec<SceneRegion>) {
        self.free.append(regions);
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.acquired, self.reused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = SceneRegion::new(1.0, 5.0);
        assert!(a.overlaps(&SceneRegion::new(4.0, 8.0)));
        assert!(!a.overlaps(&SceneRegion::new(5.0, 8.0)));
        assert!(a.overlaps(&SceneRegion::new(0.0, f64::INFINITY)));
    }

    #[test]
    fn test_merge_takes_union() {
        let mut a = SceneRegion::new(9.0, 11.0);
        a.bodies.push(0);
        let mut b = SceneRegion::new(9.0, 13.0);
        b.bodies.push(1);
        a.merge(&mut b);
        assert_eq!((a.near, a.far), (9.0, 13.0));
        assert_eq!(a.bodies, vec![0, 1]);
        assert!(b.bodies.is_empty());
    }

    #[test]
    fn test_pool_reuses_and_clears() {
        let mut pool = RegionPool::new();
        let mut region = pool.acquire(1.0, 2.0);
        region.bodies.extend([1, 2, 3]);
        region.display = Some(DisplayRegion {
            rect: DisplayRegion::FULL_WINDOW,
            depth_range: (0.0, 1.0),
            sort: 0,
        });
        pool.release(region);
        assert_eq!(pool.free_count(), 1);

        let again = pool.acquire(5.0, 6.0);
        assert_eq!((again.near, again.far), (5.0, 6.0));
        assert!(again.is_empty());
        assert!(again.display.is_none());
        assert!(again.bodies.capacity() >= 3);
        assert_eq!(pool.stats(), (2, 1));
    }
}
