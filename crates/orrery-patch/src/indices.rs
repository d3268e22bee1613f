//! Triangle index builders for a `(cols + 1) × (rows + 1)` vertex grid.
//!
//! Vertex `(x, y)` lives at index `y * (cols + 1) + x`, `x` along patch `u`
//! and `y` along `v`. All builders emit counter-clockwise triangles in the
//! `(u, v)` plane.
//!
//! Adapted primitives keep the interior cells of the plain grid and rebuild
//! the outer ring of cells: each side becomes a trapezoid between the border
//! row, sampled every `ratio` vertices, and the first inner row. The border
//! then only uses vertices the coarser neighbour also has, which removes the
//! T-junctions along that edge.

use crate::PatchEdge;

/// Per-edge LOD ratio, indexed by [`PatchEdge`]. `1` means same level.
pub type EdgeRatios = [u32; 4];

#[inline]
fn vertex(cols: u32, x: u32, y: u32) -> u32 {
    y * (cols + 1) + x
}

#[inline]
fn grid_coords(cols: u32, index: u32) -> (i64, i64) {
    (i64::from(index % (cols + 1)), i64::from(index / (cols + 1)))
}

/// Twice the signed area of the triangle in grid coordinates.
fn signed_area(cols: u32, a: u32, b: u32, c: u32) -> i64 {
    let (ax, ay) = grid_coords(cols, a);
    let (bx, by) = grid_coords(cols, b);
    let (cx, cy) = grid_coords(cols, c);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Push `a, b, c` counter-clockwise; degenerate triangles are dropped.
fn push_ccw(indices: &mut Vec<u32>, cols: u32, a: u32, b: u32, c: u32) {
    match signed_area(cols, a, b, c) {
        0 => {}
        area if area > 0 => indices.extend_from_slice(&[a, b, c]),
        _ => indices.extend_from_slice(&[a, c, b]),
    }
}

/// Every cell split into two triangles.
pub fn plain_indices(cols: u32, rows: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((cols * rows * 6) as usize);
    for y in 0..rows {
        for x in 0..cols {
            let v00 = vertex(cols, x, y);
            let v10 = vertex(cols, x + 1, y);
            let v01 = vertex(cols, x, y + 1);
            let v11 = vertex(cols, x + 1, y + 1);
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }
    indices
}

/// Border parameters `0, r, 2r, ..., n`, always ending on `n`.
fn border_params(n: u32, ratio: u32) -> Vec<u32> {
    let step = ratio.clamp(1, n.max(1));
    let mut params: Vec<u32> = (0..=n).step_by(step as usize).collect();
    if params.last() != Some(&n) {
        params.push(n);
    }
    params
}

/// Square grid with the outer ring rebuilt for coarser neighbours.
///
/// Falls back to [`plain_indices`] when `density < 2`, where there is no
/// inner row to stitch against.
pub fn adapted_indices(density: u32, ratios: EdgeRatios) -> Vec<u32> {
    if density < 2 {
        return plain_indices(density, density);
    }
    if ratios.iter().all(|&r| r <= 1) {
        return plain_indices(density, density);
    }
    let d = density;
    let mut indices = Vec::with_capacity((d * d * 6) as usize);

    for y in 1..d - 1 {
        for x in 1..d - 1 {
            let v00 = vertex(d, x, y);
            let v10 = vertex(d, x + 1, y);
            let v01 = vertex(d, x, y + 1);
            let v11 = vertex(d, x + 1, y + 1);
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }

    for edge in PatchEdge::ALL {
        let to_outer = |t: u32| match edge {
            PatchEdge::South => vertex(d, t, 0),
            PatchEdge::East => vertex(d, d, t),
            PatchEdge::North => vertex(d, t, d),
            PatchEdge::West => vertex(d, 0, t),
        };
        let to_inner = |t: u32| match edge {
            PatchEdge::South => vertex(d, t, 1),
            PatchEdge::East => vertex(d, d - 1, t),
            PatchEdge::North => vertex(d, t, d - 1),
            PatchEdge::West => vertex(d, 1, t),
        };
        let outer = border_params(d, ratios[edge.index()]);
        let inner: Vec<u32> = (1..d).collect();
        zip_strip(&mut indices, d, &outer, &inner, to_outer, to_inner);
    }
    indices
}

/// Triangulate the band between two monotone rows, advancing whichever row
/// has the nearer next vertex.
fn zip_strip(
    indices: &mut Vec<u32>,
    cols: u32,
    outer: &[u32],
    inner: &[u32],
    to_outer: impl Fn(u32) -> u32,
    to_inner: impl Fn(u32) -> u32,
) {
    let (mut a, mut b) = (0, 0);
    while a + 1 < outer.len() || b + 1 < inner.len() {
        let advance_outer =
            b + 1 >= inner.len() || (a + 1 < outer.len() && outer[a + 1] <= inner[b + 1]);
        if advance_outer {
            push_ccw(indices, cols, to_outer(outer[a]), to_outer(outer[a + 1]), to_inner(inner[b]));
            a += 1;
        } else {
            push_ccw(indices, cols, to_outer(outer[a]), to_inner(inner[b + 1]), to_inner(inner[b]));
            b += 1;
        }
    }
}

/// Border vertices of a `cols × rows` grid, counter-clockwise from `(0, 0)`,
/// keeping only every `ratio`-th vertex on each edge.
pub fn perimeter(cols: u32, rows: u32, ratios: EdgeRatios) -> Vec<u32> {
    let mut out = Vec::new();
    let south = border_params(cols, ratios[PatchEdge::South.index()]);
    let east = border_params(rows, ratios[PatchEdge::East.index()]);
    let north = border_params(cols, ratios[PatchEdge::North.index()]);
    let west = border_params(rows, ratios[PatchEdge::West.index()]);

    out.extend(south[..south.len() - 1].iter().map(|&x| vertex(cols, x, 0)));
    out.extend(east[..east.len() - 1].iter().map(|&y| vertex(cols, cols, y)));
    out.extend(north[1..].iter().rev().map(|&x| vertex(cols, x, rows)));
    out.extend(west[1..].iter().rev().map(|&y| vertex(cols, 0, y)));
    out
}
