//! Scene construction: placing updated anchors in scene space and slicing the
//! result into depth regions.
//!
//! [`SceneAnchor`] carries the per-frame placement of an anchor. A
//! [`SceneManager`] turns the frame's scene anchors into [`SceneRegion`]s, each
//! with its own [`Lens`] and depth slice. Unresolved anchors become point
//! sprites through [`PointsSetShape`] and [`HaloPointsSetShape`].

mod anchor;
pub mod depth;
mod lens;
mod manager;
mod picking;
mod points;
mod region;
mod region_manager;

pub use anchor::SceneAnchor;
pub use lens::Lens;
pub use manager::{SceneManager, StaticSceneManager};
pub use picking::{CollisionRay, PickHit};
pub use points::{
    HaloPointsSetShape, PointVertex, PointsSetShape, blackbody_to_rgb, oid_to_color,
    point_size_alpha,
};
pub use region::{DisplayRegion, RegionPool, SceneRegion};
pub use region_manager::{RegionSceneManager, classify};
