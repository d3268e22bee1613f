//! Scene managers: turn the frame's scene anchors into render regions.

use glam::{DQuat, DVec2};
use orrery_anchor::CameraAnchor;
use orrery_config::RenderSettings;

use crate::picking::pick_bodies;
use crate::{CollisionRay, DisplayRegion, Lens, PickHit, SceneAnchor, SceneRegion};

pub trait SceneManager {
    /// Rebuild the regions for this frame. Regions of the previous frame are
    /// dropped.
    fn build_scene(&mut self, anchors: Vec<SceneAnchor>, camera: &CameraAnchor, settings: &RenderSettings);

    /// Scene anchors of the current frame; regions index into this slice.
    fn anchors(&self) -> &[SceneAnchor];

    /// Regions of the current frame, nearest first.
    fn regions(&self) -> &[SceneRegion];

    /// Orientation shared by every region camera.
    fn camera_orientation(&self) -> DQuat;

    /// Bodies under `mouse_ndc` whose collision mask shares a bit with `mask`,
    /// nearest first.
    fn pick_scene(&self, mouse_ndc: DVec2, mask: u32) -> Vec<PickHit> {
        let mut hits = Vec::new();
        for (index, region) in self.regions().iter().enumerate() {
            let Some(lens) = region.lens else {
                continue;
            };
            let ray = CollisionRay::from_lens(&lens, self.camera_orientation(), mouse_ndc);
            pick_bodies(&ray, self.anchors(), &region.bodies, mask, index, &mut hits);
            pick_bodies(&ray, self.anchors(), &region.background, mask, index, &mut hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Lens of the camera clamped to `[near, far]`.
pub(crate) fn lens_for(camera: &CameraAnchor, near: f64, far: f64, settings: &RenderSettings) -> Lens {
    let far = if far.is_infinite() && !settings.auto_infinite_plane {
        settings.infinite_plane
    } else {
        far
    };
    Lens {
        fov_y: camera.fov_y(),
        aspect_ratio: camera.aspect_ratio(),
        near,
        far,
        inverse_z: settings.inverse_z,
        far_epsilon: settings.lens_far_limit,
    }
}

/// Single depth range for renderers without region support.
#[derive(Debug, Default)]
pub struct StaticSceneManager {
    anchors: Vec<SceneAnchor>,
    regions: Vec<SceneRegion>,
    orientation: DQuat,
}

impl StaticSceneManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneManager for StaticSceneManager {
    fn build_scene(&mut self, anchors: Vec<SceneAnchor>, camera: &CameraAnchor, settings: &RenderSettings) {
        let near = settings.default_near_plane;
        let far = settings.default_far_plane;
        let mut region = self.regions.pop().unwrap_or_default();
        region.near = near;
        region.far = far;
        region.bodies.clear();
        region.points.clear();
        region.background.clear();

        for (index, anchor) in anchors.iter().enumerate() {
            if !anchor.visible {
                continue;
            }
            if anchor.is_background {
                region.background.push(index);
            } else if anchor.resolved {
                if anchor.has_instance && !anchor.is_virtual {
                    region.bodies.push(index);
                }
            } else {
                region.points.push(index);
            }
        }

        region.lens = Some(lens_for(camera, near, far, settings));
        region.display = Some(DisplayRegion {
            rect: DisplayRegion::FULL_WINDOW,
            depth_range: (0.0, 1.0),
            sort: 0,
        });
        tracing::trace!(
            bodies = region.bodies.len(),
            points = region.points.len(),
            "Static scene built"
        );

        self.regions.clear();
        self.regions.push(region);
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
