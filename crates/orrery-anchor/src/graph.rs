//! Arena-backed anchor graph.
//!
//! Anchors refer to each other by [`AnchorId`]. The graph is also the
//! [`FrameResolver`] for every frame that follows an anchor, so updates read
//! the cached state of other anchors straight from the arena.

use glam::{DQuat, DVec3};
use orrery_frames::{AnchorId, FrameAnchorState, FrameResolver, Orbit, ReferenceFrame, Rotation};
use orrery_math::{point_radiance, radiance_to_app_mag, units::J2000};

use crate::{
    Anchor, AnchorContent, AnchorError, AnchorKind, AnchorState, AnchorTraverser, CameraAnchor,
    Octree, OctreeLeaf, OctreeNodeId, reflected_luminosity,
};

/// Deepest chain of frame dependencies followed during an update.
const MAX_FRAME_DEPTH: usize = 32;

#[derive(Debug, Default)]
pub struct AnchorGraph {
    anchors: Vec<Anchor>,
    roots: Vec<AnchorId>,
}

impl AnchorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(id.index())
    }

    pub fn anchor(&self, id: AnchorId) -> Result<&Anchor, AnchorError> {
        self.anchors.get(id.index()).ok_or(AnchorError::UnknownAnchor(id))
    }

    fn anchor_mut(&mut self, id: AnchorId) -> Result<&mut Anchor, AnchorError> {
        self.anchors
            .get_mut(id.index())
            .ok_or(AnchorError::UnknownAnchor(id))
    }

    /// Anchors without a parent.
    pub fn roots(&self) -> &[AnchorId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    pub fn find(&self, name: &str) -> Option<AnchorId> {
        self.anchors.iter().find(|a| a.name == name).map(|a| a.id)
    }

    /// Parent, grandparent, ... of `id`, nearest first.
    pub fn ancestors(&self, id: AnchorId) -> Vec<AnchorId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|a| a.parent);
        while let Some(parent) = current {
            if out.contains(&parent) {
                break;
            }
            out.push(parent);
            current = self.get(parent).and_then(|a| a.parent);
        }
        out
    }

    fn push(&mut self, mut anchor: Anchor, parent: Option<AnchorId>) -> AnchorId {
        let id = AnchorId(self.anchors.len() as u32);
        anchor.id = id;
        anchor.parent = parent;
        self.anchors.push(anchor);
        id
    }

    /// Add `anchor` under `parent`, or as a root.
    pub fn insert(&mut self, anchor: Anchor, parent: Option<AnchorId>) -> Result<AnchorId, AnchorError> {
        if let Some(parent) = parent {
            let p = self.anchor(parent)?;
            if !matches!(p.kind, AnchorKind::System { .. }) {
                return Err(AnchorError::NotASystem(parent));
            }
        }
        let id = self.push(anchor, parent);
        match parent {
            Some(parent) => {
                if let AnchorKind::System { children, .. } = &mut self.anchors[parent.index()].kind {
                    children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.set_rebuild_needed(id);
        Ok(id)
    }

    /// Add a stellar anchor to the octree of `owner`.
    ///
    /// The leaf is placed at its position at J2000, relative to the owner.
    pub fn add_to_octree(&mut self, owner: AnchorId, anchor: Anchor) -> Result<AnchorId, AnchorError> {
        if !matches!(self.anchor(owner)?.kind, AnchorKind::Octree { .. }) {
            return Err(AnchorError::NotAnOctree(owner));
        }
        let owner_state = self.compute_state(owner, J2000)?;
        let id = self.push(anchor, Some(owner));
        let state = self.compute_state(id, J2000)?;

        let leaf = {
            let a = &mut self.anchors[id.index()];
            a.state = state;
            OctreeLeaf {
                anchor: id,
                position: state.position - owner_state.position,
                luminosity: a.luminosity(),
                bounding_radius: a.bounding_radius,
            }
        };
        if let AnchorKind::Octree { octree: Some(octree) } = &mut self.anchors[owner.index()].kind {
            octree.add(leaf);
        }
        self.set_rebuild_needed(id);
        Ok(id)
    }

    pub fn set_primary(&mut self, system: AnchorId, child: AnchorId) -> Result<(), AnchorError> {
        let anchor = self.anchor_mut(system)?;
        match &mut anchor.kind {
            AnchorKind::System { children, primary } => {
                if !children.contains(&child) {
                    return Err(AnchorError::NotAChild { system, child });
                }
                *primary = Some(child);
            }
            _ => return Err(AnchorError::NotASystem(system)),
        }
        self.set_rebuild_needed(system);
        Ok(())
    }

    pub fn set_orbit(&mut self, id: AnchorId, orbit: Box<dyn Orbit>) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.orbit = Some(orbit);
        self.invalidate(id);
        Ok(())
    }

    pub fn set_rotation(&mut self, id: AnchorId, rotation: Box<dyn Rotation>) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.rotation = Some(rotation);
        self.invalidate(id);
        Ok(())
    }

    /// Move a cartesian anchor. Ignored for other kinds.
    pub fn set_cartesian_position(&mut self, id: AnchorId, new_position: DVec3) -> Result<(), AnchorError> {
        if let AnchorKind::Cartesian { position, .. } = &mut self.anchor_mut(id)?.kind {
            *position = new_position;
        }
        self.invalidate(id);
        Ok(())
    }

    /// Turn a cartesian anchor. Ignored for other kinds.
    pub fn set_cartesian_orientation(&mut self, id: AnchorId, new_orientation: DQuat) -> Result<(), AnchorError> {
        if let AnchorKind::Cartesian { orientation, .. } = &mut self.anchor_mut(id)?.kind {
            *orientation = new_orientation;
        }
        self.invalidate(id);
        Ok(())
    }

    pub fn set_bounding_radius(&mut self, id: AnchorId, radius: f64) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.bounding_radius = radius;
        self.set_rebuild_needed(id);
        Ok(())
    }

    pub fn set_intrinsic_luminosity(&mut self, id: AnchorId, luminosity: f64) -> Result<(), AnchorError> {
        let anchor = self.anchor_mut(id)?;
        anchor.intrinsic_luminosity = luminosity;
        anchor.content.set(AnchorContent::EMISSIVE, luminosity > 0.0);
        self.set_rebuild_needed(id);
        Ok(())
    }

    pub fn set_albedo(&mut self, id: AnchorId, albedo: f64) -> Result<(), AnchorError> {
        let anchor = self.anchor_mut(id)?;
        anchor.albedo = albedo;
        anchor.content.set(AnchorContent::REFLECTIVE, albedo > 0.0);
        self.set_rebuild_needed(id);
        Ok(())
    }

    pub fn set_visibility_override(&mut self, id: AnchorId, value: bool) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.visibility_override = value;
        Ok(())
    }

    pub fn set_force_update(&mut self, id: AnchorId, value: bool) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.force_update = value;
        Ok(())
    }

    pub fn set_oid(&mut self, id: AnchorId, oid: u32) -> Result<(), AnchorError> {
        self.anchor_mut(id)?.oid = oid;
        Ok(())
    }

    /// Drop the cached update so the next tick recomputes the anchor.
    fn invalidate(&mut self, id: AnchorId) {
        if let Some(anchor) = self.anchors.get_mut(id.index()) {
            anchor.update_id = None;
            anchor.observer_update_id = None;
        }
        self.set_rebuild_needed(id);
    }

    /// Flag `id` and every ancestor for rebuild.
    pub fn set_rebuild_needed(&mut self, id: AnchorId) {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(id) = current {
            let Some(anchor) = self.anchors.get_mut(id.index()) else {
                break;
            };
            anchor.rebuild_needed = true;
            if let AnchorKind::Octree { octree: Some(octree) } = &mut anchor.kind {
                octree.set_rebuild_needed();
            }
            current = anchor.parent;
            steps += 1;
            if steps > self.anchors.len() {
                tracing::warn!(%id, "Parent chain does not terminate");
                break;
            }
        }
    }

    /// Recompute aggregate content, bounds and luminosity of `id` and of any
    /// descendant flagged for rebuild.
    pub fn rebuild(&mut self, id: AnchorId) -> Result<(), AnchorError> {
        let kind_is_octree = match &self.anchor(id)?.kind {
            AnchorKind::System { .. } => false,
            AnchorKind::Octree { .. } => true,
            _ => {
                self.anchors[id.index()].rebuild_needed = false;
                return Ok(());
            }
        };
        if kind_is_octree {
            self.rebuild_octree(id)
        } else {
            self.rebuild_system(id)
        }
    }

    fn rebuild_system(&mut self, id: AnchorId) -> Result<(), AnchorError> {
        let (children, primary) = match &self.anchors[id.index()].kind {
            AnchorKind::System { children, primary } => (children.clone(), *primary),
            _ => return Err(AnchorError::NotASystem(id)),
        };
        for child in &children {
            if self.anchor(*child)?.rebuild_needed {
                self.rebuild(*child)?;
            }
        }

        let mut content = AnchorContent::SYSTEM;
        let mut bounding_radius = 0.0_f64;
        let mut luminosity = 0.0;
        for child in &children {
            let child = &self.anchors[child.index()];
            content |= child.content;
            bounding_radius =
                bounding_radius.max(child.bounding_radius + child.position_bounding_radius());
            if child.content.contains(AnchorContent::EMISSIVE) {
                luminosity += child.intrinsic_luminosity;
            }
        }
        if let Some(primary) = primary {
            luminosity = self.anchor(primary)?.intrinsic_luminosity;
        }

        let anchor = &mut self.anchors[id.index()];
        anchor.content = content;
        anchor.bounding_radius = bounding_radius;
        anchor.intrinsic_luminosity = luminosity;
        anchor.rebuild_needed = false;
        Ok(())
    }

    fn rebuild_octree(&mut self, id: AnchorId) -> Result<(), AnchorError> {
        let Some(mut octree) = self.take_octree(id) else {
            return Ok(());
        };
        let leaf_ids: Vec<AnchorId> = octree.leaves().map(|l| l.anchor).collect();
        let mut result = Ok(());
        for leaf in &leaf_ids {
            if self.anchors[leaf.index()].rebuild_needed
                && let Err(err) = self.rebuild(*leaf)
            {
                result = Err(err);
            }
        }

        octree.refresh_leaves(|leaf| {
            self.anchors
                .get(leaf.index())
                .map(|a| (a.luminosity(), a.bounding_radius))
        });
        octree.rebuild();

        let mut content = AnchorContent::SYSTEM | AnchorContent::OCTREE_SYSTEM;
        let mut luminosity = 0.0;
        for leaf in &leaf_ids {
            let leaf = &self.anchors[leaf.index()];
            content |= leaf.content;
            if leaf.content.contains(AnchorContent::EMISSIVE) {
                luminosity += leaf.intrinsic_luminosity;
            }
        }

        let anchor = &mut self.anchors[id.index()];
        anchor.content = content;
        anchor.bounding_radius = octree.bounding_radius();
        anchor.intrinsic_luminosity = luminosity;
        anchor.rebuild_needed = false;
        self.restore_octree(id, octree);
        result
    }

    /// Rebuild every root flagged for rebuild.
    pub fn rebuild_all(&mut self) {
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            if self.anchors[root.index()].rebuild_needed
                && let Err(err) = self.rebuild(root)
            {
                tracing::warn!(error = %err, "Anchor rebuild failed");
            }
        }
    }

    fn take_octree(&mut self, id: AnchorId) -> Option<Box<Octree>> {
        match &mut self.anchors.get_mut(id.index())?.kind {
            AnchorKind::Octree { octree } => octree.take(),
            _ => None,
        }
    }

    fn restore_octree(&mut self, id: AnchorId, restored: Box<Octree>) {
        if let Some(Anchor {
            kind: AnchorKind::Octree { octree },
            ..
        }) = self.anchors.get_mut(id.index())
        {
            *octree = Some(restored);
        }
    }

    /// Split a frame-relative position into global and local parts.
    ///
    /// Frames not tied to an anchor hold absolute positions, which go in the
    /// global part; anchored frames contribute their reference point.
    fn split_position(&self, frame: &ReferenceFrame, local: DVec3) -> (DVec3, DVec3) {
        if frame.anchor().is_none() {
            (local, DVec3::ZERO)
        } else {
            (frame.absolute_reference_point(self), local)
        }
    }

    fn compute_state(&self, id: AnchorId, time: f64) -> Result<AnchorState, AnchorError> {
        let anchor = self.anchor(id)?;

        let (global_position, local_position, orbit_orientation) = match &anchor.kind {
            AnchorKind::Cartesian { frame, position, .. } => {
                let local = frame.local_from_frame_position(*position, self);
                let (g, l) = self.split_position(frame, local);
                (g, l, frame.orientation(self))
            }
            _ => match &anchor.orbit {
                Some(orbit) => {
                    let local = orbit.local_position_at(time, self);
                    let (g, l) = self.split_position(orbit.frame(), local);
                    (g, l, orbit.plane_orientation(self))
                }
                None => (DVec3::ZERO, DVec3::ZERO, DQuat::IDENTITY),
            },
        };

        let (orientation, equatorial_orientation) = match (&anchor.kind, &anchor.rotation) {
            (AnchorKind::Cartesian { frame, orientation, .. }, _) => {
                let q = frame.absolute_from_frame_orientation(*orientation, self);
                (q, q)
            }
            (_, Some(rotation)) => (
                rotation.rotation_at(time, self),
                rotation.equatorial_orientation_at(time, self),
            ),
            _ => (DQuat::IDENTITY, DQuat::IDENTITY),
        };

        let state = AnchorState {
            global_position,
            local_position,
            position: global_position + local_position,
            orientation,
            equatorial_orientation,
            orbit_orientation,
        };
        if state.position.is_finite() && orientation.is_finite() && equatorial_orientation.is_finite() {
            Ok(state)
        } else {
            Err(AnchorError::NonFiniteState(id))
        }
    }

    /// Compute the cached state of `id` at `time`.
    ///
    /// Returns `Ok(false)` without doing anything when the anchor was already
    /// updated with `update_id`. Anchors its frames depend on are updated
    /// first. On error the anchor keeps its previous state and update id.
    pub fn update(&mut self, id: AnchorId, time: f64, update_id: u64) -> Result<bool, AnchorError> {
        self.update_at_depth(id, time, update_id, 0)
    }

    fn update_at_depth(
        &mut self,
        id: AnchorId,
        time: f64,
        update_id: u64,
        depth: usize,
    ) -> Result<bool, AnchorError> {
        if depth > MAX_FRAME_DEPTH {
            return Err(AnchorError::FrameCycle(id));
        }
        let anchor = self.anchor(id)?;
        if anchor.update_id == Some(update_id) {
            return Ok(false);
        }
        let dependencies: Vec<AnchorId> = anchor.frame_dependencies().collect();
        for dependency in dependencies {
            self.update_at_depth(dependency, time, update_id, depth + 1)?;
        }

        let state = self.compute_state(id, time)?;
        let anchor = &mut self.anchors[id.index()];
        anchor.state = state;
        anchor.update_id = Some(update_id);
        anchor.update_time = time;
        Ok(true)
    }

    /// Compute observer-relative quantities of `id` for `camera`.
    pub fn update_observer(
        &mut self,
        id: AnchorId,
        camera: &CameraAnchor,
        update_id: u64,
    ) -> Result<(), AnchorError> {
        let anchor = self.anchor_mut(id)?;
        if anchor.observer_update_id == Some(update_id) {
            return Ok(());
        }
        let rel_position =
            camera.relative_position(anchor.state.global_position, anchor.state.local_position);
        let mut distance = rel_position.length();
        let vector_to_obs = if distance > 0.0 {
            -rel_position / distance
        } else {
            DVec3::ZERO
        };
        let mut z_distance = rel_position.dot(camera.forward());
        let mut visible_size = if distance > 0.0 {
            anchor.bounding_radius / (distance * camera.pixel_size())
        } else {
            f64::INFINITY
        };
        if let AnchorKind::FlatSurface = anchor.kind {
            let normal = anchor.state.orientation * DVec3::Z;
            distance = rel_position.dot(normal).abs();
            z_distance = distance;
            visible_size = f64::INFINITY;
        }
        let radiance = point_radiance(anchor.luminosity(), distance);

        let observer = &mut anchor.observer;
        observer.rel_position = rel_position;
        observer.distance_to_obs = distance;
        observer.vector_to_obs = vector_to_obs;
        observer.visible_size = visible_size;
        observer.z_distance = z_distance;
        observer.radiance = radiance;
        observer.app_magnitude = radiance_to_app_mag(radiance);
        anchor.observer_update_id = Some(update_id);
        Ok(())
    }

    /// Recompute the visibility flags of `id`, keeping the previous ones.
    pub fn update_state(
        &mut self,
        id: AnchorId,
        camera: &CameraAnchor,
        min_body_size: f64,
    ) -> Result<(), AnchorError> {
        let anchor = self.anchor_mut(id)?;
        let radius = anchor.bounding_radius;
        let flat = matches!(anchor.kind, AnchorKind::FlatSurface);
        let observer = &mut anchor.observer;
        observer.was_visible = observer.visible;
        observer.was_resolved = observer.resolved;
        if flat || observer.rel_position.length() < radius {
            observer.visible = true;
            observer.resolved = true;
        } else {
            observer.visible = camera
                .relative_frustum()
                .is_sphere_in(observer.rel_position, radius);
            observer.resolved = observer.visible_size > min_body_size;
        }
        Ok(())
    }

    /// `update`, `update_observer` and `update_state` in sequence.
    pub fn update_all(
        &mut self,
        id: AnchorId,
        time: f64,
        camera: &CameraAnchor,
        update_id: u64,
        min_body_size: f64,
    ) -> Result<(), AnchorError> {
        let fresh = self.update(id, time, update_id)?;
        let observed = self.anchor(id)?.observer_update_id == Some(update_id);
        if fresh || !observed {
            self.update_observer(id, camera, update_id)?;
            self.update_state(id, camera, min_body_size)?;
        }
        Ok(())
    }

    /// Recompute the light `body` reflects from `light_source`, using the
    /// current cached positions. Returns the new reflected luminosity.
    pub fn update_reflected_luminosity(
        &mut self,
        body: AnchorId,
        light_source: AnchorId,
    ) -> Result<f64, AnchorError> {
        let light = self.anchor(light_source)?;
        let (star_luminosity, star_position) = (light.intrinsic_luminosity, light.state.position);
        let anchor = self.anchor_mut(body)?;
        let distance = anchor.state.position.distance(star_position);
        let luminosity =
            reflected_luminosity(star_luminosity, anchor.albedo, anchor.bounding_radius, distance);
        anchor.reflected_luminosity = luminosity;
        Ok(luminosity)
    }

    /// Position of a point given in the coordinates of octree `owner`,
    /// relative to `camera`.
    pub fn octree_point_relative_to(&self, owner: AnchorId, point: DVec3, camera: &CameraAnchor) -> DVec3 {
        match self.get(owner) {
            Some(a) => camera.relative_position(a.state.global_position, a.state.local_position + point),
            None => point - camera.absolute_position(),
        }
    }

    /// Anchors stored in the octree of `owner`, in depth-first node order.
    pub fn octree_leaves(&self, owner: AnchorId) -> Result<Vec<AnchorId>, AnchorError> {
        let octree = self.anchor(owner)?.octree().ok_or(AnchorError::NotAnOctree(owner))?;
        Ok(octree.leaves().map(|leaf| leaf.anchor).collect())
    }

    /// Absolute position of a point given in the coordinates of octree `owner`.
    pub fn octree_point_absolute(&self, owner: AnchorId, point: DVec3) -> DVec3 {
        self.get(owner).map_or(point, |a| a.state.position + point)
    }

    /// Visit `id` with `visitor`.
    ///
    /// Leaves go to `traverse_anchor`; systems to `enter_system` and, when it
    /// agrees, `traverse_system`; octree systems to `enter_octree_node` on the
    /// root and recursively on accepted children.
    pub fn traverse<T: AnchorTraverser + ?Sized>(&mut self, id: AnchorId, visitor: &mut T) {
        let Some(anchor) = self.anchors.get(id.index()) else {
            tracing::warn!(%id, "Traversal reached an unknown anchor");
            return;
        };
        let is_system = matches!(anchor.kind, AnchorKind::System { .. });
        let is_octree = matches!(anchor.kind, AnchorKind::Octree { .. });
        if is_system {
            if visitor.enter_system(self, id) {
                visitor.traverse_system(self, id);
            }
        } else if is_octree {
            self.traverse_octree(id, visitor);
        } else {
            visitor.traverse_anchor(self, id);
        }
    }

    /// Visit every root.
    pub fn traverse_roots<T: AnchorTraverser + ?Sized>(&mut self, visitor: &mut T) {
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.traverse(root, visitor);
        }
    }

    /// Visit the children of `system` in insertion order.
    pub fn traverse_children<T: AnchorTraverser + ?Sized>(&mut self, system: AnchorId, visitor: &mut T) {
        let count = self.get(system).map_or(0, |a| a.children().len());
        for i in 0..count {
            let Some(child) = self.get(system).and_then(|a| a.children().get(i).copied()) else {
                break;
            };
            self.traverse(child, visitor);
        }
    }

    fn traverse_octree<T: AnchorTraverser + ?Sized>(&mut self, owner: AnchorId, visitor: &mut T) {
        let Some(octree) = self.take_octree(owner) else {
            tracing::debug!(%owner, "Octree already under traversal, skipping");
            return;
        };
        if visitor.enter_octree_node(self, owner, octree.root_node()) {
            self.traverse_octree_node(owner, &octree, octree.root(), visitor);
        }
        self.restore_octree(owner, octree);
    }

    fn traverse_octree_node<T: AnchorTraverser + ?Sized>(
        &mut self,
        owner: AnchorId,
        octree: &Octree,
        id: OctreeNodeId,
        visitor: &mut T,
    ) {
        let Some(node) = octree.node(id) else {
            return;
        };
        visitor.traverse_octree_node(self, owner, node);
        for child in node.children().iter().flatten() {
            let Some(child_node) = octree.node(*child) else {
                tracing::warn!(%owner, "Octree child slot points nowhere, skipping");
                continue;
            };
            if visitor.enter_octree_node(self, owner, child_node) {
                self.traverse_octree_node(owner, octree, *child, visitor);
            }
        }
    }
}

impl FrameResolver for AnchorGraph {
    fn frame_anchor(&self, id: AnchorId) -> Option<FrameAnchorState> {
        self.get(id).map(|a| FrameAnchorState {
            global_position: a.state.global_position,
            local_position: a.state.local_position,
            orientation: a.state.orientation,
            equatorial_orientation: a.state.equatorial_orientation,
            orbit_orientation: a.state.orbit_orientation,
        })
    }
}
