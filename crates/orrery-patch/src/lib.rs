//! Surface patch geometry: cube faces, patch addressing, cube-to-sphere
//! projections and the mesh generators used by the quad-tree LOD.

mod address;
mod cube_face;
mod generators;
mod indices;
mod mesh;
pub mod projection;

pub use address::{PatchAddress, PatchEdge, PatchRect};
pub use cube_face::CubeFace;
pub use generators::{
    PatchOptions, Primitives, Winding, improved_qcs_patch, qcs_patch, tile_patch, uv_sphere_patch,
};
pub use indices::{EdgeRatios, adapted_indices, perimeter, plain_indices};
pub use mesh::{PatchMesh, PatchVertex};
pub use projection::Projection;
