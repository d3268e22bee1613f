use orrery_frames::AnchorId;

use crate::{AnchorGraph, OctreeNode};

/// Visitor over the anchor graph.
///
/// [`AnchorGraph::traverse`] dispatches on the anchor kind: leaves reach
/// `traverse_anchor`, systems reach `enter_system` and then `traverse_system`
/// if entered, and octree systems reach `enter_octree_node` for the root and
/// for every child whose parent was traversed.
pub trait AnchorTraverser {
    fn traverse_anchor(&mut self, graph: &mut AnchorGraph, anchor: AnchorId);

    /// Whether to descend into `system`.
    fn enter_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) -> bool;

    fn traverse_system(&mut self, graph: &mut AnchorGraph, system: AnchorId) {
        graph.traverse_children(system, self);
    }

    /// Whether to descend into `node` of the octree owned by `owner`.
    fn enter_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode) -> bool;

    /// Visit the leaves of an entered node.
    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, owner: AnchorId, node: &OctreeNode);
}
