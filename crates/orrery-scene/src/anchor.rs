//! Render-side view of an anchor for one frame.

use glam::{DQuat, DVec3};
use orrery_anchor::{Anchor, AnchorId, CameraAnchor};
use orrery_config::RenderSettings;

use crate::depth::scale_distance;

/// Per-frame scene placement of one anchor.
///
/// Distances are kept in km next to the scene values so the region manager
/// can work in either unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAnchor {
    pub anchor: AnchorId,
    pub oid: u32,
    /// Position in scene units, relative to the scene origin.
    pub scene_position: DVec3,
    pub scene_orientation: DQuat,
    /// Scene units per km for this anchor.
    pub scene_scale_factor: f64,
    /// Offset from the scene position to the body center, in scene units.
    pub body_center_offset: DVec3,
    pub distance_to_obs: f64,
    pub z_distance: f64,
    pub bounding_radius: f64,
    pub app_magnitude: f64,
    pub visible: bool,
    pub resolved: bool,
    /// Drawn behind everything else, in the farthest region.
    pub is_background: bool,
    /// Takes part in the scene without geometry of its own.
    pub is_virtual: bool,
    /// The body has geometry to draw this frame.
    pub has_instance: bool,
    pub collision_mask: u32,
}

impl SceneAnchor {
    /// Scene placement of `anchor`, which must have been updated for the
    /// current frame against `camera`.
    pub fn new(anchor: &Anchor, camera: &CameraAnchor, settings: &RenderSettings) -> Self {
        let observer = anchor.observer();
        let mut scene = Self {
            anchor: anchor.id(),
            oid: anchor.oid(),
            scene_position: DVec3::ZERO,
            scene_orientation: anchor.state().orientation,
            scene_scale_factor: settings.scene_scale,
            body_center_offset: DVec3::ZERO,
            distance_to_obs: observer.distance_to_obs,
            z_distance: observer.z_distance,
            bounding_radius: anchor.bounding_radius(),
            app_magnitude: observer.app_magnitude,
            visible: observer.visible,
            resolved: observer.resolved,
            is_background: false,
            is_virtual: anchor.is_system(),
            has_instance: observer.resolved && !anchor.is_system(),
            collision_mask: 0,
        };
        scene.place(observer.rel_position, camera, settings);
        scene
    }

    pub fn with_background(mut self, is_background: bool) -> Self {
        self.is_background = is_background;
        self
    }

    pub fn with_collision_mask(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    fn place(&mut self, rel_position: DVec3, camera: &CameraAnchor, settings: &RenderSettings) {
        let (scene_distance, factor) = scale_distance(self.distance_to_obs, settings);
        self.scene_scale_factor = factor;

        let mut position = if self.distance_to_obs > 0.0 {
            rel_position.normalize() * scene_distance
        } else {
            DVec3::ZERO
        };

        if settings.offset_body_center
            && self.resolved
            && self.distance_to_obs > self.bounding_radius
        {
            // Render around the surface point nearest to the observer.
            let to_surface = -rel_position.normalize() * self.bounding_radius * factor;
            position += to_surface;
            self.body_center_offset = -to_surface;
        }

        if !settings.camera_at_origin {
            position += camera.local_position() * factor;
        }
        self.scene_position = position;
    }

    /// Bounding radius in scene units.
    pub fn scene_radius(&self) -> f64 {
        self.bounding_radius * self.scene_scale_factor
    }

    /// Body center in scene units.
    pub fn scene_center(&self) -> DVec3 {
        self.scene_position + self.body_center_offset
    }

    /// Cosine of the angle between the line of sight and the view axis.
    pub fn cos_angle(&self) -> f64 {
        if self.distance_to_obs > 0.0 {
            (self.z_distance / self.distance_to_obs).clamp(-1.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn observer_inside(&self) -> bool {
        self.distance_to_obs <= self.bounding_radius
    }
}
