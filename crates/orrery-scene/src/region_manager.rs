//! Multi-region scene manager.
//!
//! A single `f32` depth buffer cannot resolve a scene spanning a cockpit and
//! a galaxy. The region manager slices the view volume into depth bands
//! around the resolved bodies, gives each band its own lens and a slice of
//! the depth buffer, and renders them back to front.
//!
//! Per frame:
//!
//! 1. every resolved body yields a `[near, far]` band around its bounding
//!    sphere,
//! 2. overlapping bands are coalesced,
//! 3. the gaps, the span in front of the first band and the span behind the
//!    last one are filled so the bands tile `[min_near, ∞)`,
//! 4. point sources are binned by depth,
//! 5. each band gets a lens, a depth slice and a sort index.

use glam::DQuat;
use orrery_anchor::CameraAnchor;
use orrery_config::RenderSettings;

use crate::manager::lens_for;
use crate::{DisplayRegion, RegionPool, SceneAnchor, SceneManager, SceneRegion};

#[derive(Debug, Default)]
pub struct RegionSceneManager {
    anchors: Vec<SceneAnchor>,
    regions: Vec<SceneRegion>,
    pool: RegionPool,
    orientation: DQuat,
}

/// Depth band of a resolved body, in scene units. The band is never empty,
/// even for a body without extent.
pub fn classify(anchor: &SceneAnchor, min_near: f64, cos_fov_half: f64) -> (f64, f64) {
    let factor = anchor.scene_scale_factor;
    let radius = anchor.bounding_radius * factor;
    let (near, far) = if anchor.observer_inside() {
        (min_near, min_near + 2.0 * radius)
    } else {
        let distance = anchor.distance_to_obs * factor;
        let cos_angle = anchor.cos_angle();
        let near = min_near.max((distance - radius) * cos_angle * cos_fov_half);
        let far = (distance + radius) * cos_angle;
        // Bodies seen at a grazing angle keep at least their own depth extent.
        (near, far.max(near + 2.0 * radius))
    };
    (near, far.max(near + near.abs().max(1.0) * f64::EPSILON))
}

impl RegionSceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &RegionPool {
        &self.pool
    }

    /// Sort by near plane and merge overlapping neighbours.
    fn coalesce(&mut self, mut regions: Vec<SceneRegion>) -> Vec<SceneRegion> {
        regions.sort_by(|a, b| a.near.total_cmp(&b.near));
        let mut merged: Vec<SceneRegion> = Vec::with_capacity(regions.len());
        for mut region in regions {
            let overlaps = merged.last().is_some_and(|current| region.near < current.far);
            if !overlaps {
                merged.push(region);
                continue;
            }
            if let Some(current) = merged.last_mut() {
                current.merge(&mut region);
            }
            self.pool.release(region);
        }
        merged
    }

    /// Tile `[min_near, ∞)` with `bodies` plus filler regions.
    fn fill(&mut self, bodies: Vec<SceneRegion>, min_near: f64, max_near_region: f64) -> Vec<SceneRegion> {
        let mut out = Vec::with_capacity(bodies.len() * 2 + 3);
        let first_near = bodies.first().map_or(f64::INFINITY, |r| r.near);
        if first_near > min_near {
            if first_near.is_finite() && first_near - min_near > max_near_region {
                let split = min_near + max_near_region;
                out.push(self.pool.acquire(min_near, split));
                out.push(self.pool.acquire(split, first_near));
            } else {
                out.push(self.pool.acquire(min_near, first_near));
            }
        }
        for region in bodies {
            if let Some(last) = out.last()
                && region.near > last.far
            {
                let gap = self.pool.acquire(last.far, region.near);
                out.push(gap);
            }
            out.push(region);
        }
        if let Some(last) = out.last()
            && last.far.is_finite()
        {
            let farthest = self.pool.acquire(last.far, f64::INFINITY);
            out.push(farthest);
        }
        out
    }
}

impl SceneManager for RegionSceneManager {
    fn build_scene(&mut self, anchors: Vec<SceneAnchor>, camera: &CameraAnchor, settings: &RenderSettings) {
        let mut previous = std::mem::take(&mut self.regions);
        self.pool.release_all(&mut previous);

        let min_near = settings.min_near;
        let cos_fov_half = lens_for(camera, min_near, f64::INFINITY, settings)
            .half_diagonal_fov()
            .cos();

        let mut bodies = Vec::new();
        let mut points = Vec::new();
        let mut background = Vec::new();
        for (index, anchor) in anchors.iter().enumerate() {
            if !anchor.visible {
                continue;
            }
            if anchor.is_background {
                background.push(index);
            } else if anchor.resolved {
                if anchor.has_instance && !anchor.is_virtual {
                    let (near, far) = classify(anchor, min_near, cos_fov_half);
                    let mut region = self.pool.acquire(near, far);
                    region.bodies.push(index);
                    bodies.push(region);
                }
            } else {
                points.push(index);
            }
        }

        let coalesced = self.coalesce(bodies);
        let mut regions = self.fill(coalesced, min_near, settings.max_near_region);

        for index in points {
            let anchor = &anchors[index];
            let depth = anchor.z_distance * anchor.scene_scale_factor;
            let slot = regions
                .iter()
                .position(|r| r.far >= depth)
                .unwrap_or(regions.len() - 1);
            regions[slot].points.push(index);
        }
        if let Some(farthest) = regions.last_mut() {
            farthest.background = background;
        }

        let count = regions.len();
        let slice = 1.0 / count as f64;
        for (i, region) in regions.iter_mut().enumerate() {
            let (front, back) = (i as f64 * slice, (i + 1) as f64 * slice);
            let depth_range = if settings.inverse_z {
                (1.0 - back, 1.0 - front)
            } else {
                (front, back)
            };
            region.lens = Some(lens_for(camera, region.near, region.far, settings).inflated(settings.region_margin));
            region.display = Some(DisplayRegion {
                rect: DisplayRegion::FULL_WINDOW,
                depth_range,
                sort: (count - i) as i32,
            });
        }

        tracing::debug!(
            regions = count,
            bodies = regions.iter().map(|r| r.bodies.len()).sum::<usize>(),
            points = regions.iter().map(|r| r.points.len()).sum::<usize>(),
            "Scene regions built"
        );

        self.regions = regions;
        self.anchors = anchors;
        self.orientation = camera.orientation();
    }

    fn anchors(&self) -> &[SceneAnchor] {
        &self.anchors
    }

    fn regions(&self) -> &[SceneRegion] {
        &self.regions
    }

    fn camera_orientation(&self) -> DQuat {
        self.orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::tests::{body, point};
    use crate::manager::tests::camera;
    use glam::DVec2;

    /// Nearly parallel lens so the field-of-view factor is 1.
    const NARROW: f64 = 1e-6;

    fn settings() -> RenderSettings {
        RenderSettings {
            min_near: 1.0,
            max_near_region: 1e5,
            region_margin: 0.01,
            ..Default::default()
        }
    }

    fn assert_tiles(regions: &[SceneRegion], min_near: f64) {
        assert_eq!(regions[0].near, min_near);
        for pair in regions.windows(2) {
            assert_eq!(pair[0].far, pair[1].near, "regions must be contiguous");
            assert!(pair[0].near < pair[0].far);
        }
        assert!(regions.last().unwrap().far.is_infinite());
    }

    fn body_regions(manager: &RegionSceneManager) -> Vec<&SceneRegion> {
        manager.regions().iter().filter(|r| !r.bodies.is_empty()).collect()
    }

    #[test]
    fn test_overlapping_bodies_coalesce() {
        let mut manager = RegionSceneManager::new();
        let anchors = vec![body(1, 10.0, 1.0), body(2, 11.0, 2.0)];
        manager.build_scene(anchors, &camera(NARROW), &settings());

        let with_bodies = body_regions(&manager);
        assert_eq!(with_bodies.len(), 1);
        let region = with_bodies[0];
        assert!((region.near - 9.0).abs() < 1e-9);
        assert!((region.far - 13.0).abs() < 1e-9);
        assert_eq!(region.bodies.len(), 2);
        let lens = region.lens.unwrap();
        assert!((lens.near - 9.0 * 0.99).abs() < 1e-6);
        assert!((lens.far - 13.0 * 1.01).abs() < 1e-6);
        assert_tiles(manager.regions(), 1.0);
        assert_eq!(manager.regions().len(), 3);
    }

    #[test]
    fn test_gaps_are_filled() {
        let mut manager = RegionSceneManager::new();
        let anchors = vec![body(1, 100.0, 1.0), body(2, 10.0, 1.0)];
        manager.build_scene(anchors, &camera(NARROW), &settings());
        let regions = manager.regions();
        assert_tiles(regions, 1.0);
        let bounds: Vec<(f64, f64)> = regions.iter().map(|r| (r.near, r.far)).collect();
        assert_eq!(bounds.len(), 5);
        assert!((bounds[1].0 - 9.0).abs() < 1e-9 && (bounds[1].1 - 11.0).abs() < 1e-9);
        assert!((bounds[3].0 - 99.0).abs() < 1e-9 && (bounds[3].1 - 101.0).abs() < 1e-9);
        assert_eq!(regions[1].bodies, vec![1]);
        assert_eq!(regions[3].bodies, vec![0]);
    }

    #[test]
    fn test_long_front_span_is_split() {
        let mut manager = RegionSceneManager::new();
        manager.build_scene(vec![body(1, 1e7, 10.0)], &camera(NARROW), &settings());
        let regions = manager.regions();
        assert_tiles(regions, 1.0);
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].far, 1.0 + 1e5);
        assert!(regions[2].bodies == vec![0]);
    }

    #[test]
    fn test_observer_inside_body() {
        let mut manager = RegionSceneManager::new();
        manager.build_scene(vec![body(1, 5.0, 10.0)], &camera(NARROW), &settings());
        let regions = manager.regions();
        assert_eq!((regions[0].near, regions[0].far), (1.0, 21.0));
        assert_eq!(regions[0].bodies, vec![0]);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_empty_scene_has_one_infinite_region() {
        let mut manager = RegionSceneManager::new();
        manager.build_scene(vec![point(1, 1e12, 2.0)], &camera(0.8), &settings());
        let regions = manager.regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].near, 1.0);
        assert!(regions[0].far.is_infinite());
        assert_eq!(regions[0].points, vec![0]);
    }

    #[test]
    fn test_points_binned_by_depth_and_background_last() {
        let mut manager = RegionSceneManager::new();
        let mut sky = body(9, 1e15, 1e10);
        sky.is_background = true;
        let anchors = vec![
            body(1, 100.0, 1.0),
            point(2, 50.0, 1.0),
            point(3, 100.5, 1.0),
            point(4, 1e9, 1.0),
            sky,
        ];
        manager.build_scene(anchors, &camera(NARROW), &settings());
        let regions = manager.regions();
        let holding = |index: usize| regions.iter().position(|r| r.points.contains(&index));
        assert_eq!(holding(1), Some(0));
        assert_eq!(holding(2), Some(1));
        assert_eq!(holding(3), Some(regions.len() - 1));
        assert_eq!(regions.last().unwrap().background, vec![4]);
        assert!(regions.iter().all(|r| !r.bodies.contains(&4)));
    }

    #[test]
    fn test_every_body_in_exactly_one_region() {
        let mut manager = RegionSceneManager::new();
        let anchors: Vec<SceneAnchor> = [3.0, 5.0, 40.0, 41.0, 1e4, 2e6, 2.1e6]
            .iter()
            .enumerate()
            .map(|(i, &d)| body(i as u32, d, d * 0.05))
            .collect();
        manager.build_scene(anchors.clone(), &camera(0.6), &settings());
        assert_tiles(manager.regions(), 1.0);
        for (index, anchor) in anchors.iter().enumerate() {
            let holders: Vec<&SceneRegion> = manager
                .regions()
                .iter()
                .filter(|r| r.bodies.contains(&index))
                .collect();
            assert_eq!(holders.len(), 1, "body {index} must be in one region");
            assert!(holders[0].contains_depth(anchor.z_distance * anchor.scene_scale_factor));
        }
    }

    #[test]
    fn test_point_like_body_gets_a_band() {
        let dot = body(1, 10.0, 0.0);
        let (near, far) = classify(&dot, 1.0, 1.0);
        assert!(far > near, "[{near}, {far}]");
        assert!((near - 10.0).abs() < 1e-9);
        let (near, far) = classify(&body(2, 0.0, 0.0), 1.0, 1.0);
        assert!(far > near && near == 1.0);

        let mut manager = RegionSceneManager::new();
        let anchors = vec![body(1, 10.0, 0.0), body(2, 10.0, 1.0)];
        manager.build_scene(anchors, &camera(NARROW), &settings());
        assert_tiles(manager.regions(), 1.0);
        assert!(manager.regions().iter().all(|r| r.near < r.far));
        for index in 0..2 {
            let holders = manager.regions().iter().filter(|r| r.bodies.contains(&index)).count();
            assert_eq!(holders, 1, "body {index}");
        }
    }

    #[test]
    fn test_depth_slices_and_sort_order() {
        let mut manager = RegionSceneManager::new();
        let inverse = RenderSettings {
            inverse_z: true,
            ..settings()
        };
        manager.build_scene(vec![body(1, 100.0, 1.0)], &camera(NARROW), &inverse);
        let displays: Vec<DisplayRegion> = manager.regions().iter().map(|r| r.display.unwrap()).collect();
        assert_eq!(displays.len(), 3);
        assert_eq!(displays[0].depth_range, (1.0 - 1.0 / 3.0, 1.0));
        assert!(displays[2].depth_range.0.abs() < 1e-12);
        let sorts: Vec<i32> = displays.iter().map(|d| d.sort).collect();
        assert_eq!(sorts, vec![3, 2, 1]);
        assert!(manager.regions()[2].lens.unwrap().far.is_infinite());
    }

    #[test]
    fn test_regions_are_recycled() {
        let mut manager = RegionSceneManager::new();
        let anchors = vec![body(1, 10.0, 1.0), body(2, 100.0, 1.0)];
        manager.build_scene(anchors.clone(), &camera(NARROW), &settings());
        manager.build_scene(anchors, &camera(NARROW), &settings());
        let (acquired, reused) = manager.pool().stats();
        assert!(reused > 0 && reused <= acquired);
    }

    #[test]
    fn test_pick_across_regions() {
        let mut manager = RegionSceneManager::new();
        let anchors = vec![body(1, 1e6, 10.0), body(2, 10.0, 1.0)];
        manager.build_scene(anchors, &camera(0.8), &settings());
        let hits = manager.pick_scene(DVec2::ZERO, 1);
        assert_eq!(hits.iter().map(|h| h.oid).collect::<Vec<_>>(), vec![2, 1]);
        assert!(hits[0].region < hits[1].region);
    }
}
