//! The anchor graph: celestial bodies, their systems and the luminosity octree,
//! plus the traversals run over them every frame.
//!
//! Anchors live in an arena ([`AnchorGraph`]) and cache their state per
//! update id. Traversals implement [`AnchorTraverser`] and are driven by
//! [`AnchorGraph::traverse`].

mod anchor;
mod camera;
mod content;
mod error;
mod graph;
mod octree;
mod traverser;
mod traversers;

pub use anchor::{Anchor, AnchorKind, AnchorState, ObserverState, reflected_luminosity};
pub use camera::CameraAnchor;
pub use content::AnchorContent;
pub use error::AnchorError;
pub use graph::AnchorGraph;
pub use octree::{Octree, OctreeLeaf, OctreeNode, OctreeNodeId, OctreeParams, OctreeStats};
pub use orrery_frames::AnchorId;
pub use traverser::AnchorTraverser;
pub use traversers::{
    FindClosestSystemTraverser, FindLightSourceTraverser, FindShadowCastersTraverser,
    UpdateTraverser,
};
