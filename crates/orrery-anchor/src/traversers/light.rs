use glam::DVec3;
use orrery_frames::AnchorId;
use orrery_math::point_radiance;

use crate::{AnchorContent, AnchorGraph, AnchorTraverser, OctreeNode};

/// Collects emissive anchors brighter than `lowest_radiance` at `position`.
pub struct FindLightSourceTraverser {
    lowest_radiance: f64,
    position: DVec3,
    pub collected: Vec<AnchorId>,
}

impl FindLightSourceTraverser {
    /// `position` is absolute.
    pub fn new(lowest_radiance: f64, position: DVec3) -> Self {
        Self {
            lowest_radiance,
            position,
            collected: Vec::new(),
        }
    }

    fn bright_enough(&self, luminosity: f64, distance: f64) -> bool {
        distance <= 0.0 || point_radiance(luminosity, distance) >= self.lowest_radiance
    }
}

impl AnchorTraverser for FindLightSourceTraverser {
    fn traverse_anchor(&mut self, graph: &mut AnchorGraph, anchor: AnchorId) {
        let Some(a) = graph.get(anchor) else {
            return;
        };
        if !a.content().contains(AnchorContent::EMISSIVE) {
            return;
        }
        let distance = a.state().position.distance(self.position);
        if point_radiance(a.intrinsic_luminosity(), distance) > self.lowest_radiance {
            self.collected.push(anchor);
        }
    }

    fn enter_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) -> bool {
        let Some(a) = graph.get(system) else {
            return false;
        };
        if !a.content().contains(AnchorContent::EMISSIVE) {
            return false;
        }
        let distance = a.state().position.distance(self.position) - a.bounding_radius();
        self.bright_enough(a.intrinsic_luminosity(), distance)
    }

    fn enter_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) -> bool {
        let center = graph.octree_point_absolute(owner, node.center());
        let distance = center.distance(self.position) - node.radius();
        self.bright_enough(node.max_luminosity(), distance)
    }

    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) {
        for leaf in node.leaves() {
            let position = graph.octree_point_absolute(owner, leaf.position);
            let distance = position.distance(self.position) - leaf.bounding_radius;
            if self.bright_enough(leaf.luminosity, distance) {
                graph.traverse(leaf.anchor, self);
            }
        }
    }
}
