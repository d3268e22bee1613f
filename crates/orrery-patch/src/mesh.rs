use glam::{DVec3, Vec3};
use orrery_math::BoundingBox;

/// One vertex of a patch mesh, laid out for direct GPU upload.
///
/// Layout (56 bytes):
///   - `position` `[f32; 3]`, relative to [`PatchMesh::origin`]
///   - `uv` `[f32; 2]`
///   - `normal`, `tangent`, `binormal` `[f32; 3]` each
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PatchVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
}

static_assertions::assert_eq_size!(PatchVertex, [u8; 56]);

impl PatchVertex {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// An indexed triangle list for one patch.
#[derive(Clone, Debug, Default)]
pub struct PatchMesh {
    pub vertices: Vec<PatchVertex>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Model-space translation of every vertex position.
    pub origin: DVec3,
    /// Vertices of the main grid; skirt vertices follow them.
    pub grid_vertex_count: usize,
}

impl PatchMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_skirt(&self) -> bool {
        self.vertices.len() > self.grid_vertex_count
    }

    /// Model-space position of vertex `index`.
    pub fn model_position(&self, index: usize) -> Option<DVec3> {
        self.vertices
            .get(index)
            .map(|v| self.origin + v.position().as_dvec3())
    }

    /// Model-space bounds of the grid vertices (skirts excluded).
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(
            self.vertices[..self.grid_vertex_count]
                .iter()
                .map(|v| self.origin + v.position().as_dvec3()),
        )
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
