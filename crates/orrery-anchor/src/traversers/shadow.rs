use glam::DVec3;
use orrery_frames::AnchorId;
use rustc_hash::FxHashSet;

use crate::{AnchorError, AnchorGraph, AnchorTraverser, OctreeNode};

/// Smallest shadow worth rendering, as occluder-to-light apparent area ratio.
const MIN_SHADOW_AREA_RATIO: f64 = 1.0 / 255.0;

/// Collects the anchors that can cast a visible shadow on `target` from a
/// light source.
pub struct FindShadowCastersTraverser {
    target: AnchorId,
    target_position: DVec3,
    target_radius: f64,
    light_position: DVec3,
    light_radius: f64,
    parents: FxHashSet<AnchorId>,
    pub collected: Vec<AnchorId>,
}

impl FindShadowCastersTraverser {
    /// `light_position` is absolute; `target` must have been updated.
    pub fn new(
        graph: &AnchorGraph,
        target: AnchorId,
        light_position: DVec3,
        light_radius: f64,
    ) -> Result<Self, AnchorError> {
        let anchor = graph.anchor(target)?;
        Ok(Self {
            target,
            target_position: anchor.state().position,
            target_radius: anchor.bounding_radius(),
            light_position,
            light_radius,
            parents: graph.ancestors(target).into_iter().collect(),
            collected: Vec::new(),
        })
    }

    /// Whether a sphere at `position` can shadow the target.
    pub fn casts_shadow(&self, position: DVec3, radius: f64) -> bool {
        let to_light = self.light_position - self.target_position;
        let distance_to_light = to_light.length();
        if distance_to_light <= 0.0 || radius <= 0.0 {
            return false;
        }
        let direction = to_light / distance_to_light;
        let to_occluder = position - self.target_position;
        let projection = to_occluder.dot(direction);
        if projection <= 0.0 || projection >= distance_to_light {
            return false;
        }

        let light_angular_radius = self.light_radius / distance_to_light;
        let occluder_angular_radius = radius / projection;
        if light_angular_radius > 0.0 {
            let ratio = occluder_angular_radius / light_angular_radius;
            if ratio * ratio < MIN_SHADOW_AREA_RATIO {
                return false;
            }
        }

        let penumbra_radius =
            radius + projection * (self.light_radius + radius) / (distance_to_light - projection);
        let axis_offset = (to_occluder - direction * projection).length();
        axis_offset < penumbra_radius + self.target_radius
    }
}

impl AnchorTraverser for FindShadowCastersTraverser {
    fn traverse_anchor(&mut self, graph: &mut AnchorGraph, anchor: AnchorId) {
        if anchor == self.target {
            return;
        }
        if let Some(a) = graph.get(anchor)
            && self.casts_shadow(a.state().position, a.bounding_radius())
        {
            self.collected.push(anchor);
        }
    }

    fn enter_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) -> bool {
        if self.parents.contains(&system) {
            return true;
        }
        graph
            .get(system)
            .is_some_and(|a| self.casts_shadow(a.state().position, a.bounding_radius()))
    }

    fn enter_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) -> bool {
        if !self.parents.contains(&owner) {
            return false;
        }
        let center = graph.octree_point_absolute(owner, node.center());
        center.distance(self.target_position) <= node.radius()
    }

    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, _owner: AnchorId, node: &OctreeNode) {
        for leaf in node.leaves() {
            if self.parents.contains(&leaf.anchor) {
                graph.traverse(leaf.anchor, self);
            }
        }
    }
}
