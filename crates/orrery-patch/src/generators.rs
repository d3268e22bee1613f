//! Patch mesh generators.
//!
//! Every generator samples a surface over a `(u, v)` grid and hands the
//! samples to `build_patch`, which applies the shared options: texture
//! coordinate flips, winding, the normal offset and skirts.

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::indices::{EdgeRatios, adapted_indices, perimeter, plain_indices};
use crate::projection::Projection;
use crate::{CubeFace, PatchMesh, PatchRect, PatchVertex};

/// UV inset applied to skirt vertices, towards the patch center.
const SKIRT_UV_INSET: f64 = 1e-3;

/// Triangle orientation as seen from outside the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Winding {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// How the grid cells are turned into triangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Primitives {
    #[default]
    Plain,
    /// Border stitched to neighbours `ratio` times coarser, per edge.
    Adapted(EdgeRatios),
}

impl Primitives {
    fn ratios(self) -> EdgeRatios {
        match self {
            Primitives::Plain => [1; 4],
            Primitives::Adapted(ratios) => ratios,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PatchOptions {
    pub inv_u: bool,
    pub inv_v: bool,
    pub swap_uv: bool,
    pub winding: Winding,
    /// Shift the mesh origin this far along the normal at the patch center.
    pub offset: Option<f64>,
    /// Skirt depth, as a fraction of the longest patch edge.
    pub skirt: Option<f64>,
}

impl PatchOptions {
    fn uv(&self, u: f64, v: f64) -> [f32; 2] {
        let u = if self.inv_u { 1.0 - u } else { u };
        let v = if self.inv_v { 1.0 - v } else { v };
        if self.swap_uv {
            [v as f32, u as f32]
        } else {
            [u as f32, v as f32]
        }
    }
}

/// Surface frame at one grid vertex.
struct Sample {
    position: DVec3,
    normal: DVec3,
    tangent: DVec3,
}

fn build_patch(
    cols: u32,
    rows: u32,
    primitives: Primitives,
    options: &PatchOptions,
    sample: impl Fn(f64, f64) -> Sample,
) -> PatchMesh {
    let origin = match options.offset {
        Some(offset) => sample(0.5, 0.5).normal * offset,
        None => DVec3::ZERO,
    };

    let mut positions = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
    let mut vertices = Vec::with_capacity(positions.capacity());
    for y in 0..=rows {
        for x in 0..=cols {
            let u = f64::from(x) / f64::from(cols);
            let v = f64::from(y) / f64::from(rows);
            let s = sample(u, v);
            let binormal = s.normal.cross(s.tangent).normalize_or_zero();
            positions.push(s.position);
            vertices.push(PatchVertex {
                position: (s.position - origin).as_vec3().to_array(),
                uv: options.uv(u, v),
                normal: s.normal.as_vec3().to_array(),
                tangent: s.tangent.as_vec3().to_array(),
                binormal: binormal.as_vec3().to_array(),
            });
        }
    }

    let mut indices = match primitives {
        Primitives::Adapted(ratios) if cols == rows => adapted_indices(cols, ratios),
        Primitives::Adapted(_) => {
            tracing::warn!(cols, rows, "Adapted primitives need a square grid, using plain");
            plain_indices(cols, rows)
        }
        Primitives::Plain => plain_indices(cols, rows),
    };
    let grid_vertex_count = vertices.len();

    if let Some(skirt) = options.skirt {
        let corner = |x: u32, y: u32| positions[(y * (cols + 1) + x) as usize];
        let max_edge = [
            corner(0, 0).distance(corner(cols, 0)),
            corner(cols, 0).distance(corner(cols, rows)),
            corner(cols, rows).distance(corner(0, rows)),
            corner(0, rows).distance(corner(0, 0)),
        ]
        .into_iter()
        .fold(0.0, f64::max);
        let depth = max_edge * skirt;

        let ring = perimeter(cols, rows, primitives.ratios());
        let base = vertices.len() as u32;
        for &index in &ring {
            let top = vertices[index as usize];
            let normal = top.normal().as_dvec3();
            let position = positions[index as usize] - normal * depth;
            let [u, v] = top.uv;
            let inset = |c: f32| c + ((0.5 - c) as f64 * SKIRT_UV_INSET * 2.0) as f32;
            vertices.push(PatchVertex {
                position: (position - origin).as_vec3().to_array(),
                uv: [inset(u), inset(v)],
                ..top
            });
        }
        let n = ring.len() as u32;
        for k in 0..n {
            let next = (k + 1) % n;
            let (p0, p1) = (ring[k as usize], ring[next as usize]);
            let (s0, s1) = (base + k, base + next);
            indices.extend_from_slice(&[p0, s0, s1, p0, s1, p1]);
        }
    }

    if options.winding == Winding::Clockwise {
        for triangle in indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
    }

    PatchMesh {
        vertices,
        indices,
        origin,
        grid_vertex_count,
    }
}

/// Patch of an ellipsoid over a longitude/latitude rectangle.
///
/// `rect` spans the unit square: `x` maps to longitude `[0, 2π]`, `y` to
/// latitude `[-π/2, π/2]`. `axes` are the ellipsoid semi-axes.
pub fn uv_sphere_patch(
    rect: PatchRect,
    rings: u32,
    sectors: u32,
    axes: DVec3,
    options: &PatchOptions,
) -> PatchMesh {
    let rings = rings.max(1);
    let sectors = sectors.max(1);
    let normal_scale = DVec3::new(axes.y * axes.z, axes.x * axes.z, axes.x * axes.y);
    build_patch(sectors, rings, Primitives::Plain, options, |u, v| {
        let (x, y) = rect.lerp(u, v);
        let lon = x * TAU;
        let lat = y * PI - PI / 2.0;
        let dir = DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
        Sample {
            position: dir * axes,
            normal: (dir * normal_scale).normalize_or_zero(),
            tangent: DVec3::new(-lon.sin(), lon.cos(), 0.0),
        }
    })
}

fn cube_patch(
    projection: Projection,
    face: CubeFace,
    rect: PatchRect,
    density: u32,
    radius: f64,
    primitives: Primitives,
    options: &PatchOptions,
) -> PatchMesh {
    let density = density.max(1);
    let face_tangent = face.tangent();
    build_patch(density, density, primitives, options, |u, v| {
        let (x, y) = rect.lerp(u, v);
        let normal = projection.face_point(face, x, y);
        let tangent = (face_tangent - normal * normal.dot(face_tangent)).normalize_or_zero();
        Sample {
            position: normal * radius,
            normal,
            tangent,
        }
    })
}

/// Quadrilateralized cube-sphere patch: the cube point is normalized.
pub fn qcs_patch(
    face: CubeFace,
    rect: PatchRect,
    density: u32,
    radius: f64,
    primitives: Primitives,
    options: &PatchOptions,
) -> PatchMesh {
    cube_patch(Projection::Qcs, face, rect, density, radius, primitives, options)
}

/// Cube-sphere patch using the improved, near equal-area projection.
pub fn improved_qcs_patch(
    face: CubeFace,
    rect: PatchRect,
    density: u32,
    radius: f64,
    primitives: Primitives,
    options: &PatchOptions,
) -> PatchMesh {
    cube_patch(Projection::ImprovedQcs, face, rect, density, radius, primitives, options)
}

/// Flat square in the `z = 0` plane, `size` units per unit of `rect`.
pub fn tile_patch(
    rect: PatchRect,
    density: u32,
    size: f64,
    primitives: Primitives,
    options: &PatchOptions,
) -> PatchMesh {
    let density = density.max(1);
    build_patch(density, density, primitives, options, |u, v| {
        let (x, y) = rect.lerp(u, v);
        Sample {
            position: DVec3::new(x * size, y * size, 0.0),
            normal: DVec3::Z,
            tangent: DVec3::X,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatchAddress;
    use glam::Vec3;

    fn face_normal_of(mesh: &PatchMesh, triangle: usize) -> DVec3 {
        let t = &mesh.indices[triangle * 3..triangle * 3 + 3];
        let p = |i: u32| mesh.model_position(i as usize).unwrap_or_default();
        (p(t[1]) - p(t[0])).cross(p(t[2]) - p(t[0]))
    }

    #[test]
    fn test_cube_patch_vertices_lie_on_sphere() {
        let address = PatchAddress::new(CubeFace::NegZ, 2, 1, 3).unwrap();
        let mesh = improved_qcs_patch(
            address.face,
            address.rect(),
            8,
            6378.0,
            Primitives::Plain,
            &PatchOptions::default(),
        );
        assert_eq!(mesh.vertices.len(), 81);
        assert_eq!(mesh.triangle_count(), 128);
        for i in 0..mesh.vertices.len() {
            let p = mesh.model_position(i).unwrap();
            assert!((p.length() - 6378.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_triangles_face_outwards() {
        for face in CubeFace::ALL {
            let mesh = qcs_patch(face, PatchRect::UNIT, 4, 1.0, Primitives::Plain, &PatchOptions::default());
            for t in 0..mesh.triangle_count() {
                let n = face_normal_of(&mesh, t);
                let center = mesh.model_position(mesh.indices[t * 3] as usize).unwrap();
                assert!(n.dot(center) > 0.0, "{face:?} triangle {t} faces inwards");
            }
        }
    }

    #[test]
    fn test_clockwise_winding_flips_triangles() {
        let options = PatchOptions {
            winding: Winding::Clockwise,
            ..Default::default()
        };
        let mesh = qcs_patch(CubeFace::PosX, PatchRect::UNIT, 2, 1.0, Primitives::Plain, &options);
        for t in 0..mesh.triangle_count() {
            let center = mesh.model_position(mesh.indices[t * 3] as usize).unwrap();
            assert!(face_normal_of(&mesh, t).dot(center) < 0.0);
        }
    }

    #[test]
    fn test_normal_offset_recenters_positions() {
        let options = PatchOptions {
            offset: Some(6378.0),
            ..Default::default()
        };
        let rect = PatchAddress::new(CubeFace::PosZ, 4, 8, 8).unwrap().rect();
        let mesh = qcs_patch(CubeFace::PosZ, rect, 4, 6378.0, Primitives::Plain, &options);
        let center = mesh.origin;
        assert!((center.length() - 6378.0).abs() < 1e-6);
        for v in &mesh.vertices {
            assert!(v.position().length() < 1000.0);
        }
    }

    #[test]
    fn test_uv_flags() {
        let plain = tile_patch(PatchRect::UNIT, 2, 1.0, Primitives::Plain, &PatchOptions::default());
        let flipped = tile_patch(
            PatchRect::UNIT,
            2,
            1.0,
            Primitives::Plain,
            &PatchOptions {
                inv_u: true,
                swap_uv: true,
                ..Default::default()
            },
        );
        // Vertex (x = 2, y = 0): uv (1, 0) becomes (0, 0) after inversion, swapped.
        assert_eq!(plain.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(flipped.vertices[2].uv, [0.0, 0.0]);
        // Vertex (x = 0, y = 1): uv (0, 0.5) becomes (1, 0.5), swapped to (0.5, 1).
        assert_eq!(flipped.vertices[3].uv, [0.5, 1.0]);
    }

    #[test]
    fn test_skirt_hangs_below_the_border() {
        let options = PatchOptions {
            skirt: Some(0.1),
            ..Default::default()
        };
        let mesh = tile_patch(PatchRect::UNIT, 4, 10.0, Primitives::Plain, &options);
        assert_eq!(mesh.grid_vertex_count, 25);
        assert_eq!(mesh.vertices.len(), 25 + 16);
        assert_eq!(mesh.triangle_count(), 32 + 2 * 16);
        for v in &mesh.vertices[25..] {
            assert!((v.position[2] + 1.0).abs() < 1e-6, "skirt depth is 10% of the edge");
        }
        // Skirt walls face away from the tile center.
        for t in 32..mesh.triangle_count() {
            let n = face_normal_of(&mesh, t);
            let a = mesh.model_position(mesh.indices[t * 3] as usize).unwrap();
            let outwards = DVec3::new(a.x - 5.0, a.y - 5.0, 0.0);
            assert!(n.dot(outwards) > 0.0, "skirt triangle {t} faces inwards");
        }
    }

    #[test]
    fn test_adapted_skirt_follows_coarse_edge() {
        let options = PatchOptions {
            skirt: Some(0.05),
            ..Default::default()
        };
        let mesh = improved_qcs_patch(
            CubeFace::PosY,
            PatchRect::UNIT,
            8,
            1.0,
            Primitives::Adapted([2, 1, 1, 1]),
            &options,
        );
        assert_eq!(mesh.vertices.len() - mesh.grid_vertex_count, 4 + 8 + 8 + 8);
    }

    #[test]
    fn test_uv_sphere_follows_ellipsoid() {
        let axes = DVec3::new(6378.0, 6378.0, 6357.0);
        let mesh = uv_sphere_patch(PatchRect::UNIT, 8, 16, axes, &PatchOptions::default());
        assert_eq!(mesh.vertices.len(), 17 * 9);
        let north = mesh.model_position(mesh.vertices.len() - 1).unwrap();
        assert!((north.z - 6357.0).abs() < 1e-6);
        let equator = mesh.model_position(4 * 17).unwrap();
        assert!((equator.x - 6378.0).abs() < 1e-6);
        // On the equator the ellipsoid normal is radial.
        let n = mesh.vertices[4 * 17].normal();
        assert!((n - Vec3::X).length() < 1e-6);
    }
}
