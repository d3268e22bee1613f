//! Quad-tree level of detail for body surfaces.
//!
//! A [`PatchedSurface`] owns one quad-tree per root patch of its
//! [`SurfaceShape`]. Each frame [`PatchedSurface::check_lod`] walks the trees
//! against a [`PatchCulling`] and a [`LodControl`] and returns the split,
//! merge, show and remove deltas, which [`PatchedSurface::apply_lod`] then
//! applies nearest first.

mod control;
mod culling;
mod node;
mod shape;
mod surface;

pub use control::{LodControl, TextureLod, VertexSizeLod};
pub use culling::{CullingFrustum, HorizonCullingFrustum, HorizonParams, PatchCulling};
pub use node::{LodContext, LodEntry, LodResult, QuadTreeNode};
pub use shape::{CubeSphereShape, FlatShape, SurfaceShape, UvSphereShape};
pub use surface::{LodChanges, PatchedSurface};
