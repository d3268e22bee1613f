//! A body surface made of quad-tree patches.

use glam::DVec3;
use orrery_patch::{EdgeRatios, PatchAddress, PatchEdge, PatchOptions, Primitives};

use crate::{HorizonParams, LodContext, LodControl, LodResult, PatchCulling, QuadTreeNode, SurfaceShape};

/// Counts of the changes made by [`PatchedSurface::apply_lod`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LodChanges {
    pub split: usize,
    pub merged: usize,
    pub shown: usize,
    pub removed: usize,
    /// Shown patches rebuilt because a neighbour changed level.
    pub restitched: usize,
}

impl LodChanges {
    pub fn total(&self) -> usize {
        self.split + self.merged + self.shown + self.removed
    }
}

pub struct PatchedSurface {
    shape: Box<dyn SurfaceShape>,
    roots: Vec<QuadTreeNode>,
    control: LodControl,
    options: PatchOptions,
    /// Stitch borders to coarser neighbours with adapted primitives.
    adapt_edges: bool,
    max_lod: u8,
}

impl PatchedSurface {
    pub fn new(
        shape: Box<dyn SurfaceShape>,
        control: LodControl,
        options: PatchOptions,
        adapt_edges: bool,
    ) -> Self {
        let roots = shape
            .root_patches()
            .into_iter()
            .map(|address| QuadTreeNode::new(shape.as_ref(), address, options.offset))
            .collect();
        Self {
            shape,
            roots,
            control,
            options,
            adapt_edges,
            max_lod: 0,
        }
    }

    pub fn shape(&self) -> &dyn SurfaceShape {
        self.shape.as_ref()
    }

    pub fn roots(&self) -> &[QuadTreeNode] {
        &self.roots
    }

    pub fn control(&self) -> &LodControl {
        &self.control
    }

    /// Deepest level reached by the last check.
    pub fn max_lod(&self) -> u8 {
        self.max_lod
    }

    /// Horizon parameters for an observer at `camera` (model space).
    pub fn horizon_params(&self, camera: DVec3, cull_far_patches_threshold: u8) -> HorizonParams {
        HorizonParams {
            min_radius: self.shape.min_radius(),
            altitude: self.shape.altitude(camera),
            max_lod: self.max_lod,
            cull_far_patches_threshold,
        }
    }

    fn root_for(&self, address: &PatchAddress) -> Option<&QuadTreeNode> {
        self.roots.iter().find(|r| r.address().face == address.face)
    }

    pub fn find(&self, address: &PatchAddress) -> Option<&QuadTreeNode> {
        self.root_for(address)?.find(address)
    }

    fn find_mut(&mut self, address: &PatchAddress) -> Option<&mut QuadTreeNode> {
        self.roots
            .iter_mut()
            .find(|r| r.address().face == address.face)?
            .find_mut(address)
    }

    /// Leaves whose geometry is currently shown.
    pub fn shown_patches(&self) -> Vec<&QuadTreeNode> {
        self.roots
            .iter()
            .flat_map(|r| r.leaves())
            .filter(|n| n.is_shown())
            .collect()
    }

    /// LOD ratio towards each same-face neighbour: `2^(lod - neighbour lod)`
    /// when the leaf across the edge is coarser, `1` otherwise.
    pub fn edge_ratios(&self, address: &PatchAddress) -> EdgeRatios {
        let mut ratios = [1; 4];
        let Some(root) = self.root_for(address) else {
            return ratios;
        };
        for edge in PatchEdge::ALL {
            if let Some(neighbour) = address.neighbour(edge) {
                let covering = root.deepest_toward(&neighbour).lod();
                if covering < address.lod {
                    ratios[edge.index()] = 1 << (address.lod - covering).min(16);
                }
            }
        }
        ratios
    }

    /// Run the LOD check over every root, without changing the tree.
    pub fn check_lod(
        &mut self,
        camera: DVec3,
        culling: &dyn PatchCulling,
        pixel_size: f64,
    ) -> LodResult {
        let ctx = LodContext {
            shape: self.shape.as_ref(),
            culling,
            control: &self.control,
            camera,
            altitude: self.shape.altitude(camera),
            pixel_size,
        };
        let mut result = LodResult::default();
        for root in &mut self.roots {
            root.check_lod(&ctx, &mut result);
        }
        result.sort();
        self.max_lod = result.max_lod;
        tracing::trace!(
            split = result.to_split.len(),
            merge = result.to_merge.len(),
            show = result.to_show.len(),
            remove = result.to_remove.len(),
            max_lod = result.max_lod,
            "LOD check"
        );
        result
    }

    /// Apply the deltas of `result`, nearest first, then restitch borders.
    ///
    /// New children are shown only when they pass the visibility test for an
    /// observer at `camera` (model space).
    pub fn apply_lod(&mut self, result: &LodResult, camera: DVec3, culling: &dyn PatchCulling) -> LodChanges {
        let mut changes = LodChanges::default();
        let offset = self.options.offset;
        let ctx = LodContext {
            shape: self.shape.as_ref(),
            culling,
            control: &self.control,
            camera,
            altitude: self.shape.altitude(camera),
            pixel_size: 0.0,
        };

        for entry in &result.to_split {
            let Some(node) = self
                .roots
                .iter_mut()
                .find(|r| r.address().face == entry.address.face)
                .and_then(|r| r.find_mut(&entry.address))
            else {
                tracing::debug!(address = ?entry.address, "Split target vanished");
                continue;
            };
            if node.split(ctx.shape, offset) {
                node.set_shown(false);
                if let Some(children) = node.children_mut() {
                    for child in children {
                        child.check_visibility(&ctx);
                        let visible = child.visible;
                        child.set_shown(visible);
                    }
                }
                changes.split += 1;
            }
        }

        for entry in &result.to_merge {
            let Some(node) = self.find_mut(&entry.address) else {
                continue;
            };
            if node.merge() {
                let visible = node.visible;
                node.set_shown(visible);
                changes.merged += 1;
            }
        }

        for entry in &result.to_show {
            if let Some(node) = self.find_mut(&entry.address)
                && !node.has_children()
                && !node.is_shown()
            {
                node.set_shown(true);
                changes.shown += 1;
            }
        }

        for entry in &result.to_remove {
            if let Some(node) = self.find_mut(&entry.address)
                && node.is_shown()
            {
                node.set_shown(false);
                changes.removed += 1;
            }
        }

        changes.restitched = self.refresh_meshes();
        if changes.total() > 0 {
            tracing::debug!(?changes, "LOD applied");
        }
        changes
    }

    /// Check and apply in one step.
    pub fn update_lod(
        &mut self,
        camera: DVec3,
        culling: &dyn PatchCulling,
        pixel_size: f64,
    ) -> (LodResult, LodChanges) {
        let result = self.check_lod(camera, culling, pixel_size);
        let changes = self.apply_lod(&result, camera, culling);
        (result, changes)
    }

    /// Build meshes for shown leaves that lack one, and rebuild those whose
    /// neighbour ratios changed. Returns the number of rebuilt meshes.
    fn refresh_meshes(&mut self) -> usize {
        let mut pending = Vec::new();
        for root in &self.roots {
            for leaf in root.leaves() {
                if !leaf.is_shown() {
                    continue;
                }
                let ratios = self.edge_ratios(leaf.address());
                if leaf.mesh.is_none() || leaf.edge_ratios != ratios {
                    pending.push((*leaf.address(), ratios, leaf.mesh.is_some()));
                }
            }
        }

        let mut restitched = 0;
        for (address, ratios, rebuilt) in pending {
            let primitives = if self.adapt_edges {
                Primitives::Adapted(ratios)
            } else {
                Primitives::Plain
            };
            let density = self.control.density(address.lod);
            let mesh = self.shape.make_patch(&address, density, primitives, &self.options);
            if let Some(node) = self.find_mut(&address) {
                node.edge_ratios = ratios;
                node.mesh = Some(mesh);
                restitched += usize::from(rebuilt);
            }
        }
        restitched
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

    /// Sees only patches whose bounds start left of `x = 50`.
    struct WestHalf;
    impl PatchCulling for WestHalf {
        fn is_patch_in_view(&self, node: &QuadTreeNode) -> bool {
            node.bounds().min.x < 50.0
        }
    }

    fn control(max_lod: u8) -> LodControl {
        LodControl::VertexSize(VertexSizeLod {
            max_vertex_size: 8.0,
            density: 8,
            max_lod,
        })
    }

    fn earth(max_lod: u8) -> PatchedSurface {
        PatchedSurface::new(
            Box::new(CubeSphereShape::new(6378.0, Projection::ImprovedQcs)),
            control(max_lod),
            PatchOptions::default(),
            true,
        )
    }

    #[test]
    fn test_distant_surface_shows_six_roots() {
        let mut surface = earth(8);
        let (result, changes) = surface.update_lod(DVec3::new(0.0, 0.0, 1e9), &AllVisible, 1e-3);
        assert_eq!(result.to_show.len(), 6);
        assert_eq!(changes.shown, 6);
        let shown = surface.shown_patches();
        assert_eq!(shown.len(), 6);
        assert!(shown.iter().all(|n| n.mesh().is_some()));
        // Converged: the next frame changes nothing.
        let (again, _) = surface.update_lod(DVec3::new(0.0, 0.0, 1e9), &AllVisible, 1e-3);
        assert!(again.is_empty());
    }

    #[test]
    fn test_approach_refines_under_the_observer() {
        let mut surface = earth(5);
        let camera = DVec3::new(0.0, 0.0, 6378.0 + 10.0);
        for _ in 0..12 {
            let (result, _) = surface.update_lod(camera, &AllVisible, 1e-3);
            if result.to_split.is_empty() && result.to_merge.is_empty() {
                break;
            }
        }
        let under = PatchAddress::new(CubeFace::PosZ, 5, 16, 16).unwrap();
        let below = surface.find(&under).unwrap();
        assert!(below.is_shown());
        assert_eq!(surface.max_lod(), 5);
        let far_side = surface
            .roots()
            .iter()
            .find(|r| r.address().face == CubeFace::NegZ)
            .unwrap();
        let antipode = PatchAddress::new(CubeFace::NegZ, 5, 16, 16).unwrap();
        assert!(far_side.deepest_toward(&antipode).lod() < 5);

        // Every shown leaf has a mesh and every split node is hidden.
        for root in surface.roots() {
            for leaf in root.leaves() {
                assert_eq!(leaf.is_shown(), leaf.mesh().is_some());
            }
        }
    }

    #[test]
    fn test_leaving_merges_back() {
        let mut surface = earth(4);
        let near = DVec3::new(0.0, 0.0, 6378.0 + 10.0);
        for _ in 0..8 {
            surface.update_lod(near, &AllVisible, 1e-3);
        }
        assert!(surface.roots().iter().any(|r| r.has_children()));
        let far = DVec3::new(0.0, 0.0, 1e9);
        for _ in 0..8 {
            surface.update_lod(far, &AllVisible, 1e-3);
        }
        assert!(surface.roots().iter().all(|r| !r.has_children()));
        assert_eq!(surface.shown_patches().len(), 6);
    }

    #[test]
    fn test_edge_ratios_follow_coarser_neighbours() {
        let mut surface = PatchedSurface::new(
            Box::new(FlatShape::new(100.0)),
            control(6),
            PatchOptions::default(),
            true,
        );
        let root = PatchAddress::root(CubeFace::PosZ);
        let mut result = LodResult::default();
        result.to_split.push(crate::LodEntry {
            address: root,
            distance: 0.0,
        });
        let camera = DVec3::new(50.0, 50.0, 10.0);
        surface.apply_lod(&result, camera, &AllVisible);
        let south_west = PatchAddress::new(CubeFace::PosZ, 1, 0, 0).unwrap();
        result.to_split[0].address = south_west;
        let changes = surface.apply_lod(&result, camera, &AllVisible);
        assert_eq!(changes.split, 1);

        // Lod-2 patch in the north-east corner of the south-west quadrant.
        let inner = PatchAddress::new(CubeFace::PosZ, 2, 1, 1).unwrap();
        assert_eq!(surface.edge_ratios(&inner), [2, 2, 1, 1]);
        let node = surface.find(&inner).unwrap();
        assert!(node.is_shown());
        assert_eq!(node.edge_ratios(), [2, 2, 1, 1]);
        let corner = PatchAddress::new(CubeFace::PosZ, 2, 0, 0).unwrap();
        assert_eq!(surface.edge_ratios(&corner), [1, 1, 1, 1]);
    }

    #[test]
    fn test_split_shows_only_visible_children() {
        let mut surface = PatchedSurface::new(
            Box::new(FlatShape::new(100.0)),
            control(6),
            PatchOptions::default(),
            true,
        );
        let mut result = LodResult::default();
        result.to_split.push(crate::LodEntry {
            address: PatchAddress::root(CubeFace::PosZ),
            distance: 0.0,
        });
        // Beside the ground, so no patch lies under the observer.
        let camera = DVec3::new(-50.0, 50.0, 10.0);
        let changes = surface.apply_lod(&result, camera, &WestHalf);
        assert_eq!(changes.split, 1);

        let shown: Vec<PatchAddress> = surface.shown_patches().iter().map(|n| *n.address()).collect();
        assert_eq!(
            shown,
            vec![
                PatchAddress::new(CubeFace::PosZ, 1, 0, 0).unwrap(),
                PatchAddress::new(CubeFace::PosZ, 1, 0, 1).unwrap(),
            ]
        );
        assert!(surface.shown_patches().iter().all(|n| n.mesh().is_some()));
        let east = surface.find(&PatchAddress::new(CubeFace::PosZ, 1, 1, 0).unwrap()).unwrap();
        assert!(!east.visible && east.mesh().is_none());
    }

    #[test]
    fn test_merge_of_leaf_is_noop() {
        let mut surface = earth(4);
        let mut result = LodResult::default();
        result.to_merge.push(crate::LodEntry {
            address: PatchAddress::root(CubeFace::NegX),
            distance: 0.0,
        });
        assert_eq!(surface.apply_lod(&result, DVec3::new(0.0, 0.0, 1e9), &AllVisible).merged, 0);
    }
}
