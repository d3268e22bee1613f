//! Anchors: the nodes of the anchor graph.

use std::sync::Arc;

use glam::{DQuat, DVec3};
use orrery_frames::{AnchorId, Orbit, ReferenceFrame, Rotation};
use orrery_math::units::METERS_PER_KM;

use crate::{AnchorContent, Octree};

/// Variant-specific part of an anchor.
#[derive(Debug)]
pub enum AnchorKind {
    /// A body moved by its orbit and rotation.
    Stellar,
    /// A body placed directly by position and orientation in a frame.
    Cartesian {
        frame: Arc<ReferenceFrame>,
        position: DVec3,
        orientation: DQuat,
    },
    /// An unbounded plane; the body's local `+Z` is the surface normal.
    FlatSurface,
    /// A group of anchors, optionally dominated by a primary.
    System {
        children: Vec<AnchorId>,
        primary: Option<AnchorId>,
    },
    /// A group of stellar anchors indexed by a luminosity octree.
    Octree { octree: Option<Box<Octree>> },
}

/// State written by [`AnchorGraph::update`](crate::AnchorGraph::update).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorState {
    pub global_position: DVec3,
    pub local_position: DVec3,
    /// Always `global_position + local_position`.
    pub position: DVec3,
    pub orientation: DQuat,
    pub equatorial_orientation: DQuat,
    pub orbit_orientation: DQuat,
}

impl Default for AnchorState {
    fn default() -> Self {
        Self {
            global_position: DVec3::ZERO,
            local_position: DVec3::ZERO,
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            equatorial_orientation: DQuat::IDENTITY,
            orbit_orientation: DQuat::IDENTITY,
        }
    }
}

/// Observer-relative state written by `update_observer` and `update_state`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverState {
    /// Anchor position minus observer position.
    pub rel_position: DVec3,
    pub distance_to_obs: f64,
    /// Unit vector from the anchor towards the observer.
    pub vector_to_obs: DVec3,
    /// Apparent radius in pixels.
    pub visible_size: f64,
    /// Depth along the camera forward axis.
    pub z_distance: f64,
    /// Point radiance at the observer, W/m².
    pub radiance: f64,
    pub app_magnitude: f64,
    pub visible: bool,
    pub resolved: bool,
    pub was_visible: bool,
    pub was_resolved: bool,
}

impl Default for ObserverState {
    fn default() -> Self {
        Self {
            rel_position: DVec3::ZERO,
            distance_to_obs: 0.0,
            vector_to_obs: DVec3::ZERO,
            visible_size: 0.0,
            z_distance: 0.0,
            radiance: 0.0,
            app_magnitude: f64::INFINITY,
            visible: false,
            resolved: false,
            was_visible: false,
            was_resolved: false,
        }
    }
}

/// A node of the anchor graph.
///
/// Physical parameters are set through the graph so that changes mark the
/// parent chain for rebuild.
#[derive(Debug)]
pub struct Anchor {
    pub name: String,
    pub(crate) id: AnchorId,
    pub(crate) parent: Option<AnchorId>,
    pub(crate) kind: AnchorKind,
    pub(crate) orbit: Option<Box<dyn Orbit>>,
    pub(crate) rotation: Option<Box<dyn Rotation>>,

    pub(crate) content: AnchorContent,
    pub(crate) bounding_radius: f64,
    pub(crate) intrinsic_luminosity: f64,
    pub(crate) reflected_luminosity: f64,
    pub(crate) albedo: f64,
    pub(crate) oid: u32,
    pub(crate) visibility_override: bool,
    pub(crate) force_update: bool,
    pub(crate) rebuild_needed: bool,

    pub(crate) state: AnchorState,
    pub(crate) observer: ObserverState,
    pub(crate) update_id: Option<u64>,
    pub(crate) observer_update_id: Option<u64>,
    pub(crate) update_time: f64,
}

impl Anchor {
    fn with_kind(
        name: impl Into<String>,
        kind: AnchorKind,
        orbit: Option<Box<dyn Orbit>>,
        rotation: Option<Box<dyn Rotation>>,
        content: AnchorContent,
    ) -> Self {
        Self {
            name: name.into(),
            id: AnchorId(u32::MAX),
            parent: None,
            kind,
            orbit,
            rotation,
            content,
            bounding_radius: 0.0,
            intrinsic_luminosity: 0.0,
            reflected_luminosity: 0.0,
            albedo: 0.0,
            oid: 0,
            visibility_override: false,
            force_update: false,
            rebuild_needed: true,
            state: AnchorState::default(),
            observer: ObserverState::default(),
            update_id: None,
            observer_update_id: None,
            update_time: f64::NAN,
        }
    }

    /// A body moved by `orbit` and `rotation`.
    pub fn stellar(name: impl Into<String>, orbit: Box<dyn Orbit>, rotation: Box<dyn Rotation>) -> Self {
        Self::with_kind(name, AnchorKind::Stellar, Some(orbit), Some(rotation), AnchorContent::empty())
    }

    pub fn cartesian(name: impl Into<String>, frame: Arc<ReferenceFrame>, position: DVec3, orientation: DQuat) -> Self {
        Self::with_kind(
            name,
            AnchorKind::Cartesian {
                frame,
                position,
                orientation,
            },
            None,
            None,
            AnchorContent::empty(),
        )
    }

    pub fn flat_surface(name: impl Into<String>, orbit: Box<dyn Orbit>, rotation: Box<dyn Rotation>) -> Self {
        Self::with_kind(name, AnchorKind::FlatSurface, Some(orbit), Some(rotation), AnchorContent::REFLECTIVE)
    }

    pub fn system(name: impl Into<String>, orbit: Box<dyn Orbit>, rotation: Box<dyn Rotation>) -> Self {
        Self::with_kind(
            name,
            AnchorKind::System {
                children: Vec::new(),
                primary: None,
            },
            Some(orbit),
            Some(rotation),
            AnchorContent::SYSTEM,
        )
    }

    pub fn octree_system(
        name: impl Into<String>,
        orbit: Box<dyn Orbit>,
        rotation: Box<dyn Rotation>,
        octree: Octree,
    ) -> Self {
        Self::with_kind(
            name,
            AnchorKind::Octree {
                octree: Some(Box::new(octree)),
            },
            Some(orbit),
            Some(rotation),
            AnchorContent::SYSTEM | AnchorContent::OCTREE_SYSTEM,
        )
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.bounding_radius = radius;
        self
    }

    /// Emitted power in watts; a positive value makes the anchor emissive.
    pub fn with_luminosity(mut self, luminosity: f64) -> Self {
        self.intrinsic_luminosity = luminosity;
        self.content.set(AnchorContent::EMISSIVE, luminosity > 0.0);
        self
    }

    /// Bond albedo; a positive value makes the anchor reflective.
    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self.content.set(AnchorContent::REFLECTIVE, albedo > 0.0);
        self
    }

    pub fn with_oid(mut self, oid: u32) -> Self {
        self.oid = oid;
        self
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn parent(&self) -> Option<AnchorId> {
        self.parent
    }

    pub fn kind(&self) -> &AnchorKind {
        &self.kind
    }

    pub fn orbit(&self) -> Option<&dyn Orbit> {
        self.orbit.as_deref()
    }

    pub fn rotation(&self) -> Option<&dyn Rotation> {
        self.rotation.as_deref()
    }

    pub fn content(&self) -> AnchorContent {
        self.content
    }

    pub fn is_system(&self) -> bool {
        matches!(self.kind, AnchorKind::System { .. } | AnchorKind::Octree { .. })
    }

    pub fn children(&self) -> &[AnchorId] {
        match &self.kind {
            AnchorKind::System { children, .. } => children,
            _ => &[],
        }
    }

    pub fn primary(&self) -> Option<AnchorId> {
        match &self.kind {
            AnchorKind::System { primary, .. } => *primary,
            _ => None,
        }
    }

    pub fn octree(&self) -> Option<&Octree> {
        match &self.kind {
            AnchorKind::Octree { octree } => octree.as_deref(),
            _ => None,
        }
    }

    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Largest distance the anchor can move away from its frame center.
    pub fn position_bounding_radius(&self) -> f64 {
        match (&self.kind, &self.orbit) {
            (AnchorKind::Cartesian { position, .. }, _) => position.length(),
            (_, Some(orbit)) => orbit.bounding_radius(),
            _ => 0.0,
        }
    }

    pub fn intrinsic_luminosity(&self) -> f64 {
        self.intrinsic_luminosity
    }

    pub fn reflected_luminosity(&self) -> f64 {
        self.reflected_luminosity
    }

    /// Intrinsic plus reflected luminosity, in watts.
    pub fn luminosity(&self) -> f64 {
        self.intrinsic_luminosity + self.reflected_luminosity
    }

    pub fn albedo(&self) -> f64 {
        self.albedo
    }

    pub fn oid(&self) -> u32 {
        self.oid
    }

    pub fn visibility_override(&self) -> bool {
        self.visibility_override
    }

    pub fn force_update(&self) -> bool {
        self.force_update
    }

    pub fn rebuild_needed(&self) -> bool {
        self.rebuild_needed
    }

    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    pub fn observer(&self) -> &ObserverState {
        &self.observer
    }

    pub fn update_id(&self) -> Option<u64> {
        self.update_id
    }

    pub fn is_visible(&self) -> bool {
        self.observer.visible
    }

    pub fn is_resolved(&self) -> bool {
        self.observer.resolved
    }

    /// Anchors the frames of this anchor read state from.
    pub(crate) fn frame_dependencies(&self) -> impl Iterator<Item = AnchorId> + '_ {
        let cartesian = match &self.kind {
            AnchorKind::Cartesian { frame, .. } => frame.anchor(),
            _ => None,
        };
        self.orbit
            .as_ref()
            .and_then(|o| o.frame().anchor())
            .into_iter()
            .chain(self.rotation.as_ref().and_then(|r| r.frame().anchor()))
            .chain(cartesian)
            .filter(move |id| *id != self.id)
    }
}

/// Luminosity reflected by a sphere of `radius` km and bond `albedo` at
/// `distance` km from a star of luminosity `star_luminosity` W.
///
/// The sphere intercepts `L R² / (4 d²)` of the star's power.
pub fn reflected_luminosity(star_luminosity: f64, albedo: f64, radius: f64, distance: f64) -> f64 {
    if distance <= 0.0 {
        return 0.0;
    }
    let r = radius * METERS_PER_KM;
    let d = distance * METERS_PER_KM;
    star_luminosity * albedo * r * r / (4.0 * d * d)
}
