use orrery_config::VisibilitySettings;
use orrery_frames::AnchorId;
use orrery_math::{app_mag_to_radiance, point_radiance};

use crate::{AnchorGraph, AnchorTraverser, CameraAnchor, OctreeNode};

/// Per-frame update of everything the observer could see.
///
/// Every reached anchor gets `update_all`; visible anchors, and anchors with a
/// visibility override, are collected. Systems are only entered when resolved
/// (or forced), octree nodes only when their brightest leaf could still be
/// brighter than `lowest_radiance` and their bounding sphere is in the frustum.
pub struct UpdateTraverser<'a> {
    time: f64,
    camera: &'a CameraAnchor,
    lowest_radiance: f64,
    min_body_size: f64,
    update_id: u64,
    failures: usize,
    pub collected: Vec<AnchorId>,
}

impl<'a> UpdateTraverser<'a> {
    pub fn new(
        time: f64,
        camera: &'a CameraAnchor,
        lowest_radiance: f64,
        min_body_size: f64,
        update_id: u64,
    ) -> Self {
        Self {
            time,
            camera,
            lowest_radiance,
            min_body_size,
            update_id,
            failures: 0,
            collected: Vec::new(),
        }
    }

    /// Thresholds taken from the visibility settings.
    pub fn from_settings(
        time: f64,
        camera: &'a CameraAnchor,
        settings: &VisibilitySettings,
        update_id: u64,
    ) -> Self {
        Self::new(
            time,
            camera,
            app_mag_to_radiance(settings.lowest_app_magnitude),
            settings.min_body_size,
            update_id,
        )
    }

    pub fn lowest_radiance(&self) -> f64 {
        self.lowest_radiance
    }

    /// Anchors whose update failed during this traversal.
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn update(&mut self, graph: &mut AnchorGraph, id: AnchorId) -> bool {
        match graph.update_all(id, self.time, self.camera, self.update_id, self.min_body_size) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%id, error = %err, "Anchor update failed, keeping previous state");
                self.failures += 1;
                false
            }
        }
    }

    fn too_faint(&self, luminosity: f64, distance: f64) -> bool {
        distance > 0.0 && point_radiance(luminosity, distance) < self.lowest_radiance
    }
}

impl AnchorTraverser for UpdateTraverser<'_> {
    fn traverse_anchor(&mut self, graph: &mut AnchorGraph, anchor: AnchorId) {
        if !self.update(graph, anchor) {
            return;
        }
        if let Some(a) = graph.get(anchor)
            && (a.is_visible() || a.visibility_override())
        {
            self.collected.push(anchor);
        }
    }

    fn enter_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) -> bool {
        if !self.update(graph, system) {
            return false;
        }
        let Some(a) = graph.get(system) else {
            return false;
        };
        // Unresolved systems are drawn as a single point.
        if (a.is_visible() && !a.is_resolved()) || a.visibility_override() {
            self.collected.push(system);
        }
        (a.is_visible() && a.is_resolved()) || a.force_update()
    }

    fn enter_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) -> bool {
        if node.level() == 0 {
            self.update(graph, owner);
        }
        let rel = graph.octree_point_relative_to(owner, node.center(), self.camera);
        let distance = rel.length() - node.radius();
        if self.too_faint(node.max_luminosity(), distance) {
            return false;
        }
        self.camera.relative_frustum().is_sphere_in(rel, node.radius())
    }

    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) {
        for leaf in node.leaves() {
            let rel = graph.octree_point_relative_to(owner, leaf.position, self.camera);
            let distance = rel.length();
            if distance > leaf.bounding_radius && self.too_faint(leaf.luminosity, distance) {
                continue;
            }
            graph.traverse(leaf.anchor, self);
        }
    }
}
