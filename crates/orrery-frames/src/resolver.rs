use glam::{DQuat, DVec3};
use rustc_hash::FxHashMap;

use crate::AnchorId;

/// Cached state of an anchor that frames attached to it read from.
///
/// Values are those written by the anchor's last update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameAnchorState {
    /// Absolute reference point of the anchor's frame chain.
    pub global_position: DVec3,
    /// Position relative to `global_position`.
    pub local_position: DVec3,
    /// Full orientation, including spin.
    pub orientation: DQuat,
    /// Orientation of the body's equator, without spin.
    pub equatorial_orientation: DQuat,
    /// Orientation of the orbit plane of the anchor.
    pub orbit_orientation: DQuat,
}

impl Default for FrameAnchorState {
    fn default() -> Self {
        Self {
            global_position: DVec3::ZERO,
            local_position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            equatorial_orientation: DQuat::IDENTITY,
            orbit_orientation: DQuat::IDENTITY,
        }
    }
}

/// Lookup of anchor state for frames that follow an anchor.
pub trait FrameResolver {
    fn frame_anchor(&self, id: AnchorId) -> Option<FrameAnchorState>;
}

/// Resolver that knows no anchors; only barycentric frames resolve through it.
impl FrameResolver for () {
    fn frame_anchor(&self, _id: AnchorId) -> Option<FrameAnchorState> {
        None
    }
}

/// Fixed table of anchor states.
///
/// Useful when evaluating orbits outside an anchor graph.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    states: FxHashMap<AnchorId, FrameAnchorState>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AnchorId, state: FrameAnchorState) {
        self.states.insert(id, state);
    }
}

impl FrameResolver for StaticResolver {
    fn frame_anchor(&self, id: AnchorId) -> Option<FrameAnchorState> {
        self.states.get(&id).copied()
    }
}
