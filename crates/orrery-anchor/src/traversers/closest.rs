use glam::DVec3;
use orrery_frames::AnchorId;

use crate::{AnchorContent, AnchorGraph, AnchorTraverser, OctreeNode};

/// Finds the system nearest to a position, looking through octrees.
///
/// Anything that is not an octree system is a candidate; octree nodes farther
/// than the current best are skipped.
pub struct FindClosestSystemTraverser {
    position: DVec3,
    pub closest: Option<AnchorId>,
    pub distance: f64,
}

impl FindClosestSystemTraverser {
    /// `position` is absolute.
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            closest: None,
            distance: f64::INFINITY,
        }
    }

    fn consider(&mut self, graph: &AnchorGraph, id: AnchorId) {
        let Some(anchor) = graph.get(id) else {
            return;
        };
        if anchor.content().contains(AnchorContent::OCTREE_SYSTEM) {
            return;
        }
        let distance = anchor.state().position.distance(self.position);
        if distance < self.distance {
            self.distance = distance;
            self.closest = Some(id);
        }
    }
}

impl AnchorTraverser for FindClosestSystemTraverser {
    fn traverse_anchor(&mut self, graph: &mut AnchorGraph, anchor: AnchorId) {
        self.consider(graph, anchor);
    }

    fn enter_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) -> bool {
        let is_octree = graph
            .get(system)
            .is_some_and(|a| a.content().contains(AnchorContent::OCTREE_SYSTEM));
        if !is_octree {
            self.consider(graph, system);
        }
        is_octree
    }

    fn enter_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) -> bool {
        let center = graph.octree_point_absolute(owner, node.center());
        center.distance(self.position) - node.radius() <= self.distance
    }

    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) {
        for leaf in node.leaves() {
            let position = graph.octree_point_absolute(owner, leaf.position);
            if position.distance(self.position) - leaf.bounding_radius < self.distance {
                graph.traverse(leaf.anchor, self);
            }
        }
    }
}
