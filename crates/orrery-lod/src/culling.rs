//! View-frustum tests for surface patches.

use glam::{DMat4, DVec3};
use orrery_math::{BoundingBox, Frustum, Intersection, Plane};

use crate::QuadTreeNode;

/// Decides whether a patch can be seen this frame.
pub trait PatchCulling {
    fn is_patch_in_view(&self, node: &QuadTreeNode) -> bool;
}

/// Frustum in scaled body model space.
///
/// Patch bounds are moved by the patch origin and `body_offset`, then scaled
/// by `scale`, before being tested.
#[derive(Debug, Clone)]
pub struct CullingFrustum {
    frustum: Frustum,
    body_offset: DVec3,
    scale: f64,
}

impl CullingFrustum {
    pub fn new(view_proj: &DMat4, body_offset: DVec3, scale: f64) -> Self {
        Self::from_frustum(Frustum::from_view_proj(view_proj), body_offset, scale)
    }

    pub fn from_frustum(frustum: Frustum, body_offset: DVec3, scale: f64) -> Self {
        Self {
            frustum,
            body_offset,
            scale,
        }
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_bounds_in_view(&self, local_bounds: &BoundingBox, origin: DVec3) -> bool {
        let moved = local_bounds.translated(origin + self.body_offset);
        let scaled = BoundingBox::new(moved.min * self.scale, moved.max * self.scale);
        self.frustum.test_box(&scaled) != Intersection::Outside
    }
}

impl PatchCulling for CullingFrustum {
    fn is_patch_in_view(&self, node: &QuadTreeNode) -> bool {
        self.is_bounds_in_view(node.local_bounds(), node.origin())
    }
}

/// Inputs of the horizon far-plane limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonParams {
    pub min_radius: f64,
    pub altitude: f64,
    /// Deepest LOD level reached by the previous check.
    pub max_lod: u8,
    pub cull_far_patches_threshold: u8,
}

impl HorizonParams {
    /// Horizon multiplier: 2, halved for every two levels beyond the threshold.
    pub fn factor(&self) -> f64 {
        let excess = self.max_lod.saturating_sub(self.cull_far_patches_threshold) / 2;
        2.0 / 2f64.powi(i32::from(excess))
    }

    /// Distance from the observer to the far-plane horizon, unscaled.
    pub fn limit(&self) -> f64 {
        let reach = self.factor() * self.min_radius + self.altitude;
        (reach * reach - self.min_radius * self.min_radius).max(0.0).sqrt()
    }
}

/// A [`CullingFrustum`] whose far plane is pulled in to the horizon.
#[derive(Debug, Clone)]
pub struct HorizonCullingFrustum {
    culling: CullingFrustum,
    far: f64,
}

impl HorizonCullingFrustum {
    /// `camera` is the observer position in the frustum's (scaled) space.
    pub fn new(
        view_proj: &DMat4,
        body_offset: DVec3,
        scale: f64,
        camera: DVec3,
        horizon: HorizonParams,
    ) -> Self {
        Self::from_frustum(Frustum::from_view_proj(view_proj), body_offset, scale, camera, horizon)
    }

    pub fn from_frustum(
        frustum: Frustum,
        body_offset: DVec3,
        scale: f64,
        camera: DVec3,
        horizon: HorizonParams,
    ) -> Self {
        let far = horizon.limit() * scale;
        let forward = frustum.planes[Frustum::NEAR].normal;
        let frustum = if forward.length_squared() > 0.0 {
            frustum.with_far_plane(Plane::from_point_normal(camera + forward * far, -forward))
        } else {
            frustum
        };
        Self {
            culling: CullingFrustum::from_frustum(frustum, body_offset, scale),
            far,
        }
    }

    /// Far-plane distance, in frustum units.
    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn culling(&self) -> &CullingFrustum {
        &self.culling
    }
}

impl PatchCulling for HorizonCullingFrustum {
    fn is_patch_in_view(&self, node: &QuadTreeNode) -> bool {
        self.culling.is_patch_in_view(node)
    }
}
