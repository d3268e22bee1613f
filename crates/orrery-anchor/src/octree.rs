//! Luminosity-keyed octree of stellar anchors.
//!
//! Each node keeps the leaves brighter than its threshold (or too close to its
//! center to be routed to an octant) and hands fainter ones down. Thresholds
//! shrink by `child_factor` per level, so bright objects stay near the root
//! and a traversal can stop as soon as a node's brightest descendant falls
//! below the visibility threshold.
//!
//! Nodes live in an arena owned by the [`Octree`]; children are indices.

use glam::DVec3;
use orrery_frames::AnchorId;

/// A stellar anchor as recorded in the octree.
///
/// Position is in the coordinates of the owning octree anchor and is fixed at
/// insertion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctreeLeaf {
    pub anchor: AnchorId,
    pub position: DVec3,
    pub luminosity: f64,
    pub bounding_radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OctreeNodeId(pub u32);

impl OctreeNodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Split and threshold parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctreeParams {
    pub max_level: u32,
    pub max_leaves: usize,
    pub child_factor: f64,
}

impl Default for OctreeParams {
    fn default() -> Self {
        Self {
            max_level: 200,
            max_leaves: 75,
            child_factor: 0.25,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OctreeNode {
    level: u32,
    center: DVec3,
    width: f64,
    radius: f64,
    threshold: f64,
    max_luminosity: f64,
    leaves: Vec<OctreeLeaf>,
    children: [Option<OctreeNodeId>; 8],
    has_children: bool,
}

impl OctreeNode {
    fn new(level: u32, center: DVec3, width: f64, threshold: f64) -> Self {
        Self {
            level,
            center,
            width,
            // Half-width times √3.
            radius: width * 0.5 * 3.0_f64.sqrt(),
            threshold,
            max_luminosity: 0.0,
            leaves: Vec::new(),
            children: [None; 8],
            has_children: false,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Full edge length of the node cube.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Radius of the sphere enclosing the node cube.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Luminosity of the brightest leaf in this subtree.
    pub fn max_luminosity(&self) -> f64 {
        self.max_luminosity
    }

    pub fn leaves(&self) -> &[OctreeLeaf] {
        &self.leaves
    }

    pub fn children(&self) -> &[Option<OctreeNodeId>; 8] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        self.has_children
    }

    /// Octant index of `position`: bit 0 for x, bit 1 for y, bit 2 for z,
    /// set when the coordinate is at or above the center.
    pub fn octant_of(&self, position: DVec3) -> usize {
        let mut octant = 0;
        if position.x >= self.center.x {
            octant |= 1;
        }
        if position.y >= self.center.y {
            octant |= 2;
        }
        if position.z >= self.center.z {
            octant |= 4;
        }
        octant
    }

    fn keeps(&self, leaf: &OctreeLeaf) -> bool {
        leaf.luminosity > self.threshold
            || self.center.distance(leaf.position) < leaf.bounding_radius
    }
}

/// Shape statistics, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: u32,
    pub largest_leaf_list: usize,
}

#[derive(Clone, Debug)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    params: OctreeParams,
    rebuild_needed: bool,
}

impl Octree {
    /// An empty octree covering the cube of edge `width` around `center`.
    pub fn new(center: DVec3, width: f64, threshold: f64) -> Self {
        Self::with_params(center, width, threshold, OctreeParams::default())
    }

    pub fn with_params(center: DVec3, width: f64, threshold: f64, params: OctreeParams) -> Self {
        Self {
            nodes: vec![OctreeNode::new(0, center, width, threshold)],
            params,
            rebuild_needed: false,
        }
    }

    pub fn root(&self) -> OctreeNodeId {
        OctreeNodeId(0)
    }

    pub fn root_node(&self) -> &OctreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: OctreeNodeId) -> Option<&OctreeNode> {
        self.nodes.get(id.index())
    }

    pub fn params(&self) -> &OctreeParams {
        &self.params
    }

    pub fn rebuild_needed(&self) -> bool {
        self.rebuild_needed
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().map(|n| n.leaves.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every leaf in the tree, in node order.
    pub fn leaves(&self) -> impl Iterator<Item = &OctreeLeaf> {
        self.nodes.iter().flat_map(|n| n.leaves.iter())
    }

    pub fn add(&mut self, leaf: OctreeLeaf) {
        self.add_at(self.root(), leaf);
    }

    fn add_at(&mut self, start: OctreeNodeId, leaf: OctreeLeaf) {
        let mut id = start;
        loop {
            let node = &mut self.nodes[id.index()];
            node.max_luminosity = node.max_luminosity.max(leaf.luminosity);
            if !node.has_children || node.keeps(&leaf) {
                node.leaves.push(leaf);
                if node.leaves.len() > self.params.max_leaves && node.level < self.params.max_level
                {
                    self.split(id);
                }
                return;
            }
            let octant = node.octant_of(leaf.position);
            id = self.child_or_create(id, octant);
        }
    }

    /// Move the leaves that no longer belong here into child octants.
    fn split(&mut self, id: OctreeNodeId) {
        let leaves = std::mem::take(&mut self.nodes[id.index()].leaves);
        self.nodes[id.index()].has_children = true;
        tracing::trace!(level = self.nodes[id.index()].level, count = leaves.len(), "Splitting octree node");
        for leaf in leaves {
            let node = &self.nodes[id.index()];
            if node.keeps(&leaf) {
                self.nodes[id.index()].leaves.push(leaf);
            } else {
                let octant = node.octant_of(leaf.position);
                let child = self.child_or_create(id, octant);
                self.add_at(child, leaf);
            }
        }
    }

    fn child_or_create(&mut self, parent: OctreeNodeId, octant: usize) -> OctreeNodeId {
        if let Some(child) = self.nodes[parent.index()].children[octant] {
            return child;
        }
        let p = &self.nodes[parent.index()];
        let quarter = p.width * 0.25;
        let offset = DVec3::new(
            if octant & 1 != 0 { quarter } else { -quarter },
            if octant & 2 != 0 { quarter } else { -quarter },
            if octant & 4 != 0 { quarter } else { -quarter },
        );
        let child = OctreeNode::new(
            p.level + 1,
            p.center + offset,
            p.width * 0.5,
            p.threshold * self.params.child_factor,
        );
        let id = OctreeNodeId(self.nodes.len() as u32);
        self.nodes.push(child);
        self.nodes[parent.index()].children[octant] = Some(id);
        id
    }

    /// Refresh the luminosity and radius recorded for `anchor`.
    ///
    /// Returns false when the anchor is not in the tree.
    pub fn update_leaf(&mut self, anchor: AnchorId, luminosity: f64, bounding_radius: f64) -> bool {
        for node in &mut self.nodes {
            if let Some(leaf) = node.leaves.iter_mut().find(|l| l.anchor == anchor) {
                leaf.luminosity = luminosity;
                leaf.bounding_radius = bounding_radius;
                self.rebuild_needed = true;
                return true;
            }
        }
        false
    }

    /// Refresh every leaf record from `lookup`, which returns the current
    /// luminosity and bounding radius of an anchor.
    pub fn refresh_leaves(&mut self, mut lookup: impl FnMut(AnchorId) -> Option<(f64, f64)>) {
        for leaf in self.nodes.iter_mut().flat_map(|n| n.leaves.iter_mut()) {
            if let Some((luminosity, bounding_radius)) = lookup(leaf.anchor) {
                leaf.luminosity = luminosity;
                leaf.bounding_radius = bounding_radius;
            }
        }
        self.rebuild_needed = true;
    }

    pub fn set_rebuild_needed(&mut self) {
        self.rebuild_needed = true;
    }

    /// Recompute `max_luminosity` bottom-up and clear the rebuild flag.
    pub fn rebuild(&mut self) {
        // Children are always pushed after their parent, so reverse index
        // order visits every child before its parent.
        for i in (0..self.nodes.len()).rev() {
            let own = self.nodes[i]
                .leaves
                .iter()
                .map(|l| l.luminosity)
                .fold(0.0_f64, f64::max);
            let from_children = self.nodes[i]
                .children
                .iter()
                .flatten()
                .filter_map(|c| self.nodes.get(c.index()))
                .map(|c| c.max_luminosity)
                .fold(0.0_f64, f64::max);
            self.nodes[i].max_luminosity = own.max(from_children);
        }
        self.rebuild_needed = false;
    }

    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            nodes: self.nodes.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            stats.leaves += node.leaves.len();
            stats.max_depth = stats.max_depth.max(node.level);
            stats.largest_leaf_list = stats.largest_leaf_list.max(node.leaves.len());
        }
        stats
    }

    /// Radius of the sphere enclosing the root cube.
    pub fn bounding_radius(&self) -> f64 {
        self.root_node().radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn leaf(id: u32, position: DVec3, luminosity: f64) -> OctreeLeaf {
        OctreeLeaf {
            anchor: AnchorId(id),
            position,
            luminosity,
            bounding_radius: 0.0,
        }
    }

    /// Node ids in the subtree rooted at `id`, `id` included.
    fn subtree(octree: &Octree, id: OctreeNodeId) -> Vec<OctreeNodeId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            let node = octree.node(out[i]).unwrap();
            out.extend(node.children().iter().flatten().copied());
            i += 1;
        }
        out
    }

    #[test]
    fn test_split_sinks_faint_leaves_into_one_child() {
        let params = OctreeParams {
            max_level: 2,
            ..Default::default()
        };
        let mut octree = Octree::with_params(DVec3::ZERO, 100.0, 10.0, params);
        for i in 0..80 {
            octree.add(leaf(i, DVec3::ZERO, 1.0));
        }

        let root = octree.root_node();
        assert!(root.has_children());
        assert!(root.leaves().is_empty());
        assert_eq!(root.max_luminosity(), 1.0);

        let populated: Vec<_> = root
            .children()
            .iter()
            .flatten()
            .filter(|c| {
                subtree(&octree, **c)
                    .iter()
                    .map(|n| octree.node(*n).unwrap().leaves().len())
                    .sum::<usize>()
                    > 0
            })
            .collect();
        assert_eq!(populated.len(), 1);
        let held: usize = subtree(&octree, *populated[0])
            .iter()
            .map(|n| octree.node(*n).unwrap().leaves().len())
            .sum();
        assert_eq!(held, 80);
        assert_eq!(octree.len(), 80);
    }

    #[test]
    fn test_bright_leaves_stay_at_root() {
        let params = OctreeParams {
            max_leaves: 4,
            ..Default::default()
        };
        let mut octree = Octree::with_params(DVec3::ZERO, 100.0, 10.0, params);
        for i in 0..5 {
            octree.add(leaf(i, DVec3::splat(10.0 + i as f64), 1.0));
        }
        octree.add(leaf(99, DVec3::splat(-20.0), 1e3));
        let root = octree.root_node();
        assert!(root.has_children());
        assert_eq!(root.leaves().len(), 1);
        assert_eq!(root.leaves()[0].anchor, AnchorId(99));
        assert_eq!(root.max_luminosity(), 1e3);
    }

    #[test]
    fn test_octant_bits() {
        let node = OctreeNode::new(0, DVec3::ZERO, 2.0, 1.0);
        assert_eq!(node.octant_of(DVec3::new(-1.0, -1.0, -1.0)), 0);
        assert_eq!(node.octant_of(DVec3::new(1.0, -1.0, -1.0)), 1);
        assert_eq!(node.octant_of(DVec3::new(-1.0, 1.0, -1.0)), 2);
        assert_eq!(node.octant_of(DVec3::new(-1.0, -1.0, 1.0)), 4);
        assert_eq!(node.octant_of(DVec3::ZERO), 7);
        assert!((node.radius() - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_leaf_placement_invariant_holds_for_random_field() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut octree = Octree::new(DVec3::ZERO, 2000.0, 100.0);
        for i in 0..3000 {
            let position = DVec3::new(
                rng.random_range(-1000.0..1000.0),
                rng.random_range(-1000.0..1000.0),
                rng.random_range(-1000.0..1000.0),
            );
            let luminosity = 10f64.powf(rng.random_range(-2.0..3.0));
            octree.add(OctreeLeaf {
                anchor: AnchorId(i),
                position,
                luminosity,
                bounding_radius: rng.random_range(0.0..5.0),
            });
        }
        assert_eq!(octree.len(), 3000);
        for id in subtree(&octree, octree.root()) {
            let node = octree.node(id).unwrap();
            if node.has_children() {
                for l in node.leaves() {
                    assert!(
                        l.luminosity > node.threshold()
                            || node.center().distance(l.position) < l.bounding_radius
                    );
                }
            }
            for child in node.children().iter().flatten() {
                let child = octree.node(*child).unwrap();
                assert_eq!(child.level(), node.level() + 1);
                assert!(child.max_luminosity() <= node.max_luminosity());
            }
        }
        let stats = octree.stats();
        assert_eq!(stats.leaves, 3000);
        assert!(stats.max_depth >= 1);
    }

    #[test]
    fn test_rebuild_refreshes_max_luminosity() {
        let mut octree = Octree::new(DVec3::ZERO, 10.0, 1.0);
        octree.add(leaf(1, DVec3::ONE, 50.0));
        octree.add(leaf(2, -DVec3::ONE, 5.0));
        assert!(octree.update_leaf(AnchorId(1), 2.0, 0.0));
        assert!(octree.rebuild_needed());
        octree.rebuild();
        assert!(!octree.rebuild_needed());
        assert_eq!(octree.root_node().max_luminosity(), 5.0);
        assert!(!octree.update_leaf(AnchorId(42), 1.0, 0.0));
    }
}
