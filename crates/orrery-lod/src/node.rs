//! Quad-tree nodes and the per-frame LOD check.

use std::f64::consts::FRAC_1_SQRT_2;

use glam::DVec3;
use orrery_math::BoundingBox;
use orrery_patch::{EdgeRatios, PatchAddress, PatchMesh};

use crate::{LodControl, PatchCulling, SurfaceShape};

/// One LOD change, keyed by the patch it applies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodEntry {
    pub address: PatchAddress,
    pub distance: f64,
}

/// Deltas collected by a LOD check, applied after the traversal.
#[derive(Debug, Clone, Default)]
pub struct LodResult {
    pub to_split: Vec<LodEntry>,
    pub to_merge: Vec<LodEntry>,
    pub to_show: Vec<LodEntry>,
    pub to_remove: Vec<LodEntry>,
    /// Deepest level visited.
    pub max_lod: u8,
}

impl LodResult {
    pub fn is_empty(&self) -> bool {
        self.to_split.is_empty()
            && self.to_merge.is_empty()
            && self.to_show.is_empty()
            && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_split.len() + self.to_merge.len() + self.to_show.len() + self.to_remove.len()
    }

    /// Order every collection nearest first.
    pub fn sort(&mut self) {
        for list in [
            &mut self.to_split,
            &mut self.to_merge,
            &mut self.to_show,
            &mut self.to_remove,
        ] {
            list.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        }
    }

    fn entry(node: &QuadTreeNode) -> LodEntry {
        LodEntry {
            address: node.address,
            distance: node.distance,
        }
    }
}

/// Per-frame inputs of [`QuadTreeNode::check_lod`].
pub struct LodContext<'a> {
    pub shape: &'a dyn SurfaceShape,
    pub culling: &'a dyn PatchCulling,
    pub control: &'a LodControl,
    /// Observer position in body model space.
    pub camera: DVec3,
    pub altitude: f64,
    /// Angular size of one pixel, in radians.
    pub pixel_size: f64,
}

/// A patch of a body surface and, when split, its four children.
#[derive(Debug)]
pub struct QuadTreeNode {
    address: PatchAddress,
    center: DVec3,
    normal: DVec3,
    length: f64,
    /// Translation applied to the patch geometry.
    origin: DVec3,
    /// Patch bounds relative to `origin`.
    local_bounds: BoundingBox,
    children: Option<Box<[QuadTreeNode; 4]>>,
    pub distance: f64,
    pub apparent_size: f64,
    pub in_patch: bool,
    pub patch_in_view: bool,
    pub visible: bool,
    shown: bool,
    pub(crate) edge_ratios: EdgeRatios,
    pub(crate) mesh: Option<PatchMesh>,
}

impl QuadTreeNode {
    /// Node for `address`, with its geometry translated by `offset` along the
    /// patch normal when given.
    pub fn new(shape: &dyn SurfaceShape, address: PatchAddress, offset: Option<f64>) -> Self {
        let normal = shape.patch_normal(&address);
        let origin = offset.map_or(DVec3::ZERO, |o| normal * o);
        Self {
            address,
            center: shape.patch_center(&address),
            normal,
            length: shape.patch_length(&address),
            origin,
            local_bounds: shape.patch_bounds(&address).translated(-origin),
            children: None,
            distance: f64::INFINITY,
            apparent_size: 0.0,
            in_patch: false,
            patch_in_view: false,
            visible: false,
            shown: false,
            edge_ratios: [1; 4],
            mesh: None,
        }
    }

    pub fn address(&self) -> &PatchAddress {
        &self.address
    }

    pub fn lod(&self) -> u8 {
        self.address.lod
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn local_bounds(&self) -> &BoundingBox {
        &self.local_bounds
    }

    /// Model-space bounds.
    pub fn bounds(&self) -> BoundingBox {
        self.local_bounds.translated(self.origin)
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> Option<&[QuadTreeNode; 4]> {
        self.children.as_deref()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut [QuadTreeNode; 4]> {
        self.children.as_deref_mut()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn edge_ratios(&self) -> EdgeRatios {
        self.edge_ratios
    }

    pub fn mesh(&self) -> Option<&PatchMesh> {
        self.mesh.as_ref()
    }

    pub(crate) fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
        if !shown {
            self.mesh = None;
        }
    }

    /// Create the four children. No-op when already split or at the deepest level.
    pub(crate) fn split(&mut self, shape: &dyn SurfaceShape, offset: Option<f64>) -> bool {
        if self.children.is_some() {
            return false;
        }
        let Some(addresses) = self.address.children() else {
            return false;
        };
        self.children = Some(Box::new(addresses.map(|a| QuadTreeNode::new(shape, a, offset))));
        true
    }

    /// Drop the children. No-op on a leaf.
    pub(crate) fn merge(&mut self) -> bool {
        self.children.take().is_some()
    }

    /// Update `in_patch`, `patch_in_view` and `visible` for this frame.
    pub fn check_visibility(&mut self, ctx: &LodContext<'_>) {
        self.in_patch = ctx.shape.contains_point(&self.address, ctx.camera);
        self.patch_in_view = ctx.culling.is_patch_in_view(self);
        self.visible = self.in_patch || self.patch_in_view;
    }

    /// Evaluate this subtree and record the split, merge, show and remove
    /// decisions in `result`.
    pub fn check_lod(&mut self, ctx: &LodContext<'_>, result: &mut LodResult) {
        let to_center = (self.center - ctx.camera).length() - self.length * FRAC_1_SQRT_2;
        self.distance = ctx.altitude.max(to_center);
        self.check_visibility(ctx);
        self.apparent_size = if self.distance > 0.0 && ctx.pixel_size > 0.0 {
            self.length / (self.distance * ctx.pixel_size)
        } else {
            f64::INFINITY
        };
        result.max_lod = result.max_lod.max(self.lod());

        let (apparent_size, distance) = (self.apparent_size, self.distance);
        let leaves_below = self
            .children
            .as_ref()
            .map(|c| c.iter().all(|child| !child.has_children()));

        match leaves_below {
            Some(true) if ctx.control.should_merge(self, apparent_size, distance) => {
                result.to_merge.push(LodResult::entry(self));
            }
            Some(_) => {
                if let Some(children) = self.children.as_deref_mut() {
                    for child in children {
                        child.check_lod(ctx, result);
                    }
                }
            }
            None => {
                if ctx.control.should_split(self, apparent_size, distance) {
                    result.to_split.push(LodResult::entry(self));
                } else if self.shown && ctx.control.should_remove(self, apparent_size, distance) {
                    result.to_remove.push(LodResult::entry(self));
                } else if !self.shown && ctx.control.should_instantiate(self, apparent_size, distance) {
                    result.to_show.push(LodResult::entry(self));
                }
            }
        }
    }

    /// Node at `address` in this subtree.
    pub fn find(&self, address: &PatchAddress) -> Option<&QuadTreeNode> {
        let mut node = self;
        loop {
            if node.address == *address {
                return Some(node);
            }
            let step = address.ancestor(node.lod() + 1)?;
            node = node.children()?.iter().find(|c| c.address == step)?;
        }
    }

    pub(crate) fn find_mut(&mut self, address: &PatchAddress) -> Option<&mut QuadTreeNode> {
        if self.address == *address {
            return Some(self);
        }
        let step = address.ancestor(self.lod() + 1)?;
        self.children_mut()?
            .iter_mut()
            .find(|c| c.address == step)?
            .find_mut(address)
    }

    /// Deepest node on the way to `address`: the leaf covering it, or the
    /// node itself when the tree reaches that deep.
    pub fn deepest_toward(&self, address: &PatchAddress) -> &QuadTreeNode {
        let mut node = self;
        while node.address != *address {
            let Some(next) = address
                .ancestor(node.lod() + 1)
                .and_then(|step| node.children()?.iter().find(|c| c.address == step))
            else {
                break;
            };
            node = next;
        }
        node
    }

    /// Leaves of this subtree, depth first.
    pub fn leaves(&self) -> Vec<&QuadTreeNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a QuadTreeNode>) {
        match self.children() {
            Some(children) => children.iter().for_each(|c| c.collect_leaves(out)),
            None => out.push(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CubeSphereShape, FlatShape, VertexSizeLod};
    use orrery_patch::{CubeFace, Projection};

    struct AllVisible;
    impl PatchCulling for AllVisible {
        fn is_patch_in_view(&self, _node: &QuadTreeNode) -> bool {
            true
        }
    }

    struct NoneVisible;
    impl PatchCulling for NoneVisible {
        fn is_patch_in_view(&self, _node: &QuadTreeNode) -> bool {
            false
        }
    }

    fn control() -> LodControl {
        LodControl::VertexSize(VertexSizeLod {
            max_vertex_size: 8.0,
            density: 16,
            max_lod: 6,
        })
    }

    #[test]
    fn test_distant_leaf_is_shown_not_split() {
        let shape = CubeSphereShape::new(1000.0, Projection::ImprovedQcs);
        let mut node = QuadTreeNode::new(&shape, PatchAddress::root(CubeFace::PosZ), None);
        let control = control();
        let camera = DVec3::new(0.0, 0.0, 1e7);
        let ctx = LodContext {
            shape: &shape,
            culling: &AllVisible,
            control: &control,
            camera,
            altitude: shape.altitude(camera),
            pixel_size: 1e-3,
        };
        let mut result = LodResult::default();
        node.check_lod(&ctx, &mut result);
        assert!(node.visible);
        assert!(result.to_split.is_empty());
        assert_eq!(result.to_show.len(), 1);
        assert_eq!(result.to_show[0].address, *node.address());
    }

    #[test]
    fn test_close_leaf_splits_and_children_tile_parent() {
        let shape = CubeSphereShape::new(1000.0, Projection::ImprovedQcs);
        let mut node = QuadTreeNode::new(&shape, PatchAddress::root(CubeFace::PosZ), None);
        let control = control();
        let camera = DVec3::new(0.0, 0.0, 1010.0);
        let ctx = LodContext {
            shape: &shape,
            culling: &AllVisible,
            control: &control,
            camera,
            altitude: 10.0,
            pixel_size: 1e-3,
        };
        let mut result = LodResult::default();
        node.check_lod(&ctx, &mut result);
        assert_eq!(result.to_split.len(), 1);

        assert!(node.split(&shape, None));
        let parent_area = node.address().rect().width() * node.address().rect().height();
        let children = node.children().unwrap();
        let area: f64 = children
            .iter()
            .map(|c| c.address().rect().width() * c.address().rect().height())
            .sum();
        assert!((area - parent_area).abs() < 1e-15);
        assert!(children.iter().all(|c| c.lod() == node.lod() + 1));
        assert!(!node.split(&shape, None), "second split is a no-op");
    }

    #[test]
    fn test_invisible_children_merge() {
        let shape = FlatShape::new(100.0);
        let mut node = QuadTreeNode::new(&shape, PatchAddress::root(CubeFace::PosZ), None);
        node.split(&shape, None);
        let control = control();
        let camera = DVec3::new(500.0, 500.0, 10.0);
        let ctx = LodContext {
            shape: &shape,
            culling: &NoneVisible,
            control: &control,
            camera,
            altitude: 10.0,
            pixel_size: 1e-3,
        };
        let mut result = LodResult::default();
        node.check_lod(&ctx, &mut result);
        assert!(!node.visible && !node.in_patch);
        assert_eq!(result.to_merge.len(), 1);
        assert!(node.merge());
        assert!(!node.merge(), "merging a leaf is a no-op");
    }

    #[test]
    fn test_in_patch_keeps_patch_visible() {
        let shape = FlatShape::new(100.0);
        let mut node = QuadTreeNode::new(&shape, PatchAddress::root(CubeFace::PosZ), None);
        let control = control();
        let camera = DVec3::new(50.0, 50.0, 1.0);
        let ctx = LodContext {
            shape: &shape,
            culling: &NoneVisible,
            control: &control,
            camera,
            altitude: 1.0,
            pixel_size: 1e-3,
        };
        node.check_visibility(&ctx);
        assert!(node.in_patch && !node.patch_in_view && node.visible);
    }

    #[test]
    fn test_find_and_deepest() {
        let shape = FlatShape::new(100.0);
        let mut root = QuadTreeNode::new(&shape, PatchAddress::root(CubeFace::PosZ), None);
        root.split(&shape, None);
        let target = PatchAddress::new(CubeFace::PosZ, 1, 1, 1).unwrap();
        root.find_mut(&target).unwrap().split(&shape, None);

        let deep = PatchAddress::new(CubeFace::PosZ, 2, 3, 2).unwrap();
        assert_eq!(root.find(&deep).map(|n| *n.address()), Some(deep));
        let deeper = PatchAddress::new(CubeFace::PosZ, 4, 1, 1).unwrap();
        assert!(root.find(&deeper).is_none());
        assert_eq!(root.deepest_toward(&deeper).lod(), 1);
        assert_eq!(root.leaves().len(), 3 + 4);
    }

    #[test]
    fn test_result_sorts_nearest_first() {
        let a = PatchAddress::root(CubeFace::PosX);
        let mut result = LodResult::default();
        for d in [30.0, 10.0, 20.0] {
            result.to_show.push(LodEntry {
                address: a,
                distance: d,
            });
        }
        result.sort();
        let order: Vec<f64> = result.to_show.iter().map(|e| e.distance).collect();
        assert_eq!(order, vec![10.0, 20.0, 30.0]);
        assert_eq!(result.len(), 3);
    }
}
