//! The observer.

use std::sync::Arc;

use glam::{DQuat, DVec3};
use orrery_frames::{FrameResolver, ReferenceFrame};
use orrery_math::Frustum;

/// Observer position, orientation and lens.
///
/// Like anchors, the camera splits its position into a global reference point
/// and a local offset. Camera space is `+Y` forward, `+Z` up, `+X` right.
#[derive(Clone, Debug)]
pub struct CameraAnchor {
    frame: Arc<ReferenceFrame>,
    frame_position: DVec3,
    frame_orientation: DQuat,

    global_position: DVec3,
    local_position: DVec3,
    orientation: DQuat,

    fov_y: f64,
    aspect_ratio: f64,
    near: f64,
    far: f64,
    height_px: u32,

    relative_frustum: Frustum,
    frustum: Frustum,
}

impl CameraAnchor {
    /// `fov_y` in radians, `height_px` the viewport height used for pixel sizes.
    pub fn new(frame: Arc<ReferenceFrame>, fov_y: f64, aspect_ratio: f64, height_px: u32) -> Self {
        let relative_frustum =
            Frustum::from_perspective(DVec3::ZERO, DQuat::IDENTITY, fov_y, aspect_ratio, 1.0, f64::INFINITY);
        Self {
            frame,
            frame_position: DVec3::ZERO,
            frame_orientation: DQuat::IDENTITY,
            global_position: DVec3::ZERO,
            local_position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            fov_y,
            aspect_ratio,
            near: 1.0,
            far: f64::INFINITY,
            height_px: height_px.max(1),
            frustum: relative_frustum.clone(),
            relative_frustum,
        }
    }

    pub fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    pub fn set_frame_position(&mut self, position: DVec3) {
        self.frame_position = position;
    }

    pub fn set_frame_orientation(&mut self, orientation: DQuat) {
        self.frame_orientation = orientation;
    }

    pub fn set_lens(&mut self, fov_y: f64, aspect_ratio: f64, near: f64, far: f64) {
        self.fov_y = fov_y;
        self.aspect_ratio = aspect_ratio;
        self.near = near;
        self.far = far;
    }

    pub fn set_viewport_height(&mut self, height_px: u32) {
        self.height_px = height_px.max(1);
    }

    /// Recompute absolute position, orientation and frustums from the frame.
    pub fn update(&mut self, resolver: &dyn FrameResolver) {
        self.global_position = self.frame.absolute_reference_point(resolver);
        self.local_position = self
            .frame
            .local_from_frame_position(self.frame_position, resolver);
        self.orientation = self
            .frame
            .absolute_from_frame_orientation(self.frame_orientation, resolver);
        if self.frame.anchor().is_none() {
            self.global_position = self.local_position;
            self.local_position = DVec3::ZERO;
        }

        self.relative_frustum = Frustum::from_perspective(
            DVec3::ZERO,
            self.orientation,
            self.fov_y,
            self.aspect_ratio,
            self.near,
            self.far,
        );
        self.frustum = self.relative_frustum.translated(self.local_position);
    }

    pub fn global_position(&self) -> DVec3 {
        self.global_position
    }

    pub fn local_position(&self) -> DVec3 {
        self.local_position
    }

    pub fn absolute_position(&self) -> DVec3 {
        self.global_position + self.local_position
    }

    pub fn orientation(&self) -> DQuat {
        self.orientation
    }

    pub fn forward(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    pub fn fov_y(&self) -> f64 {
        self.fov_y
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    /// Angular size of one pixel, in radians.
    pub fn pixel_size(&self) -> f64 {
        self.fov_y / self.height_px as f64
    }

    /// Frustum with its apex at the observer.
    pub fn relative_frustum(&self) -> &Frustum {
        &self.relative_frustum
    }

    /// Frustum in the local coordinates of the camera's reference point.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Position of a point given as global + local, relative to the observer.
    pub fn relative_position(&self, global: DVec3, local: DVec3) -> DVec3 {
        (global - self.global_position) + (local - self.local_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_frames::{AnchorId, FrameAnchorState, StaticResolver};

    #[test]
    fn test_barycentric_camera_position_is_global() {
        let mut camera = CameraAnchor::new(Arc::new(ReferenceFrame::ecliptic_j2000()), 0.7, 1.5, 1000);
        camera.set_frame_position(DVec3::new(1e12, 0.0, 0.0));
        camera.update(&());
        assert_eq!(camera.global_position(), DVec3::new(1e12, 0.0, 0.0));
        assert_eq!(camera.local_position(), DVec3::ZERO);
        assert!((camera.pixel_size() - 0.0007).abs() < 1e-15);
    }

    #[test]
    fn test_anchored_camera_splits_position() {
        let mut resolver = StaticResolver::new();
        resolver.insert(
            AnchorId(3),
            FrameAnchorState {
                global_position: DVec3::new(1e12, 0.0, 0.0),
                local_position: DVec3::new(0.0, 1e8, 0.0),
                ..Default::default()
            },
        );
        let mut camera = CameraAnchor::new(Arc::new(ReferenceFrame::anchored_ecliptic(AnchorId(3))), 0.7, 1.0, 800);
        camera.set_frame_position(DVec3::new(0.0, -7000.0, 0.0));
        camera.update(&resolver);
        assert_eq!(camera.global_position(), DVec3::new(1e12, 0.0, 0.0));
        assert_eq!(camera.local_position(), DVec3::new(0.0, 1e8 - 7000.0, 0.0));
        let rel = camera.relative_position(DVec3::new(1e12, 0.0, 0.0), DVec3::new(0.0, 1e8, 0.0));
        assert_eq!(rel, DVec3::new(0.0, 7000.0, 0.0));
        assert!(camera.relative_frustum().contains_point(rel));
        assert!(camera.frustum().contains_point(DVec3::new(0.0, 1e8, 0.0)));
    }

    #[test]
    fn test_forward_follows_orientation() {
        let mut camera = CameraAnchor::new(Arc::new(ReferenceFrame::ecliptic_j2000()), 0.7, 1.0, 800);
        camera.set_frame_orientation(DQuat::from_axis_angle(DVec3::Z, std::f64::consts::FRAC_PI_2));
        camera.update(&());
        assert!((camera.forward() - DVec3::NEG_X).length() < 1e-12);
    }
}
