//! Surface shapes a patched body can be tessellated as.
//!
//! All geometry is in body model space (km), centered on the body.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec3;
use orrery_math::BoundingBox;
use orrery_patch::{
    CubeFace, PatchAddress, PatchMesh, PatchOptions, PatchRect, Primitives, Projection,
    improved_qcs_patch, qcs_patch, tile_patch, uv_sphere_patch,
};

/// Samples per patch side used to bound curved patches.
const BOUND_SAMPLES: u32 = 4;

pub trait SurfaceShape {
    /// Level-0 patches covering the whole surface.
    fn root_patches(&self) -> Vec<PatchAddress>;

    fn patch_center(&self, address: &PatchAddress) -> DVec3;

    /// Outward surface normal at the patch center.
    fn patch_normal(&self, address: &PatchAddress) -> DVec3;

    /// Edge length of the patch, in km.
    fn patch_length(&self, address: &PatchAddress) -> f64;

    fn patch_bounds(&self, address: &PatchAddress) -> BoundingBox;

    /// Radius of the largest sphere inside the surface; 0 for flat shapes.
    fn min_radius(&self) -> f64;

    /// Height of `point` above the surface.
    fn altitude(&self, point: DVec3) -> f64;

    /// Whether `point` lies above the footprint of the patch.
    ///
    /// Shapes that can tell override this; the default reports `false`, so
    /// visibility falls back to the frustum test alone.
    fn contains_point(&self, _address: &PatchAddress, _point: DVec3) -> bool {
        false
    }

    fn make_patch(
        &self,
        address: &PatchAddress,
        density: u32,
        primitives: Primitives,
        options: &PatchOptions,
    ) -> PatchMesh;
}

/// Bounds of the samples of `f` over a `BOUND_SAMPLES²` grid, grown by `sag`.
fn sampled_bounds(rect: PatchRect, sag: f64, f: impl Fn(f64, f64) -> DVec3) -> BoundingBox {
    let mut bounds = BoundingBox::EMPTY;
    for j in 0..=BOUND_SAMPLES {
        for i in 0..=BOUND_SAMPLES {
            let (x, y) = rect.lerp(
                f64::from(i) / f64::from(BOUND_SAMPLES),
                f64::from(j) / f64::from(BOUND_SAMPLES),
            );
            bounds.extend(f(x, y));
        }
    }
    BoundingBox::new(bounds.min - DVec3::splat(sag), bounds.max + DVec3::splat(sag))
}

/// Sphere tessellated from the six faces of a cube.
#[derive(Debug, Clone, Copy)]
pub struct CubeSphereShape {
    pub radius: f64,
    pub projection: Projection,
}

impl CubeSphereShape {
    pub fn new(radius: f64, projection: Projection) -> Self {
        Self { radius, projection }
    }

    fn point(&self, face: CubeFace, x: f64, y: f64) -> DVec3 {
        self.projection.face_point(face, x, y) * self.radius
    }
}

impl SurfaceShape for CubeSphereShape {
    fn root_patches(&self) -> Vec<PatchAddress> {
        CubeFace::ALL.into_iter().map(PatchAddress::root).collect()
    }

    fn patch_center(&self, address: &PatchAddress) -> DVec3 {
        let rect = address.rect();
        let (x, y) = rect.lerp(0.5, 0.5);
        self.point(address.face, x, y)
    }

    fn patch_normal(&self, address: &PatchAddress) -> DVec3 {
        self.patch_center(address).normalize_or_zero()
    }

    fn patch_length(&self, address: &PatchAddress) -> f64 {
        self.radius * FRAC_PI_2 / f64::from(address.side())
    }

    fn patch_bounds(&self, address: &PatchAddress) -> BoundingBox {
        // Curvature missed between samples, bounded by the sagitta of one step.
        let step = FRAC_PI_2 / f64::from(address.side()) / f64::from(BOUND_SAMPLES);
        let sag = self.radius * (1.0 - step.cos());
        sampled_bounds(address.rect(), sag, |x, y| self.point(address.face, x, y))
    }

    fn min_radius(&self) -> f64 {
        self.radius
    }

    fn altitude(&self, point: DVec3) -> f64 {
        point.length() - self.radius
    }

    fn contains_point(&self, address: &PatchAddress, point: DVec3) -> bool {
        if CubeFace::from_direction(point) != address.face {
            return false;
        }
        // Patch edges stay close to straight lines in gnomonic face
        // coordinates, so the footprint is the box of the projected corners.
        let rect = address.rect();
        let (x0, y0) = (2.0 * rect.x0 - 1.0, 2.0 * rect.y0 - 1.0);
        let (x1, y1) = (2.0 * rect.x1 - 1.0, 2.0 * rect.y1 - 1.0);
        let corner = |x: f64, y: f64| {
            address
                .face
                .face_coordinates(self.projection.apply(address.face.cube_point(x, y)))
        };
        let (lo_x, lo_y) = corner(x0, y0);
        let (hi_x, hi_y) = corner(x1, y1);
        let (px, py) = address.face.face_coordinates(point);
        px >= lo_x.min(hi_x) && px <= lo_x.max(hi_x) && py >= lo_y.min(hi_y) && py <= lo_y.max(hi_y)
    }

    fn make_patch(
        &self,
        address: &PatchAddress,
        density: u32,
        primitives: Primitives,
        options: &PatchOptions,
    ) -> PatchMesh {
        match self.projection {
            Projection::Qcs => {
                qcs_patch(address.face, address.rect(), density, self.radius, primitives, options)
            }
            Projection::ImprovedQcs => improved_qcs_patch(
                address.face,
                address.rect(),
                density,
                self.radius,
                primitives,
                options,
            ),
        }
    }
}

/// Ellipsoid tessellated along longitude and latitude.
///
/// Addresses use the `PosZ` face as a longitude/latitude square.
#[derive(Debug, Clone, Copy)]
pub struct UvSphereShape {
    pub axes: DVec3,
}

impl UvSphereShape {
    pub fn new(axes: DVec3) -> Self {
        Self { axes }
    }

    fn point(&self, x: f64, y: f64) -> DVec3 {
        let lon = x * TAU;
        let lat = y * PI - PI / 2.0;
        DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()) * self.axes
    }
}

impl SurfaceShape for UvSphereShape {
    fn root_patches(&self) -> Vec<PatchAddress> {
        vec![PatchAddress::root(CubeFace::PosZ)]
    }

    fn patch_center(&self, address: &PatchAddress) -> DVec3 {
        let (x, y) = address.rect().lerp(0.5, 0.5);
        self.point(x, y)
    }

    fn patch_normal(&self, address: &PatchAddress) -> DVec3 {
        let p = self.patch_center(address);
        (p / (self.axes * self.axes)).normalize_or_zero()
    }

    fn patch_length(&self, address: &PatchAddress) -> f64 {
        self.axes.max_element() * TAU / f64::from(address.side())
    }

    fn patch_bounds(&self, address: &PatchAddress) -> BoundingBox {
        let step = TAU / f64::from(address.side()) / f64::from(BOUND_SAMPLES);
        let sag = self.axes.max_element() * (1.0 - step.cos());
        sampled_bounds(address.rect(), sag, |x, y| self.point(x, y))
    }

    fn min_radius(&self) -> f64 {
        self.axes.min_element()
    }

    fn altitude(&self, point: DVec3) -> f64 {
        let dir = point.normalize_or_zero();
        let surface = 1.0 / (dir / self.axes).length();
        point.length() - surface
    }

    fn make_patch(
        &self,
        address: &PatchAddress,
        density: u32,
        _primitives: Primitives,
        options: &PatchOptions,
    ) -> PatchMesh {
        uv_sphere_patch(address.rect(), density, density * 2, self.axes, options)
    }
}

/// Flat square ground of side `size`, in the `z = 0` plane.
#[derive(Debug, Clone, Copy)]
pub struct FlatShape {
    pub size: f64,
}

impl FlatShape {
    pub fn new(size: f64) -> Self {
        Self { size }
    }
}

impl SurfaceShape for FlatShape {
    fn root_patches(&self) -> Vec<PatchAddress> {
        vec![PatchAddress::root(CubeFace::PosZ)]
    }

    fn patch_center(&self, address: &PatchAddress) -> DVec3 {
        let (x, y) = address.rect().lerp(0.5, 0.5);
        DVec3::new(x * self.size, y * self.size, 0.0)
    }

    fn patch_normal(&self, _address: &PatchAddress) -> DVec3 {
        DVec3::Z
    }

    fn patch_length(&self, address: &PatchAddress) -> f64 {
        self.size / f64::from(address.side())
    }

    fn patch_bounds(&self, address: &PatchAddress) -> BoundingBox {
        let r = address.rect();
        BoundingBox::new(
            DVec3::new(r.x0 * self.size, r.y0 * self.size, 0.0),
            DVec3::new(r.x1 * self.size, r.y1 * self.size, 0.0),
        )
    }

    fn min_radius(&self) -> f64 {
        0.0
    }

    fn altitude(&self, point: DVec3) -> f64 {
        point.z
    }

    fn contains_point(&self, address: &PatchAddress, point: DVec3) -> bool {
        address.rect().contains(point.x / self.size, point.y / self.size)
    }

    fn make_patch(
        &self,
        address: &PatchAddress,
        density: u32,
        primitives: Primitives,
        options: &PatchOptions,
    ) -> PatchMesh {
        tile_patch(address.rect(), density, self.size, primitives, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_sphere_bounds_contain_mesh() {
        let shape = CubeSphereShape::new(6378.0, Projection::ImprovedQcs);
        for address in [
            PatchAddress::root(CubeFace::PosX),
            PatchAddress::new(CubeFace::NegZ, 3, 2, 5).unwrap(),
        ] {
            let bounds = shape.patch_bounds(&address);
            let mesh = shape.make_patch(&address, 16, Primitives::Plain, &PatchOptions::default());
            for i in 0..mesh.vertices.len() {
                let p = mesh.model_position(i).unwrap();
                let inflated = BoundingBox::new(bounds.min - DVec3::splat(1e-2), bounds.max + DVec3::splat(1e-2));
                assert!(inflated.contains_point(p), "{address:?} vertex {i} outside bounds");
            }
        }
    }

    #[test]
    fn test_cube_sphere_patch_metrics() {
        let shape = CubeSphereShape::new(1000.0, Projection::Qcs);
        let root = PatchAddress::root(CubeFace::PosZ);
        assert!((shape.patch_center(&root) - DVec3::new(0.0, 0.0, 1000.0)).length() < 1e-9);
        assert!((shape.patch_normal(&root) - DVec3::Z).length() < 1e-12);
        let child = root.children().unwrap()[0];
        assert!((shape.patch_length(&child) * 2.0 - shape.patch_length(&root)).abs() < 1e-9);
        assert!((shape.altitude(DVec3::new(0.0, 0.0, 1100.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cube_sphere_contains_point() {
        let shape = CubeSphereShape::new(1000.0, Projection::ImprovedQcs);
        let root = PatchAddress::root(CubeFace::PosZ);
        let [sw, se, _, ne] = root.children().unwrap();
        let above_sw = shape.patch_center(&sw) * 1.1;
        assert!(shape.contains_point(&root, above_sw));
        assert!(shape.contains_point(&sw, above_sw));
        assert!(!shape.contains_point(&se, above_sw));
        assert!(!shape.contains_point(&ne, above_sw));
        assert!(!shape.contains_point(&PatchAddress::root(CubeFace::NegZ), above_sw));
    }

    #[test]
    fn test_uv_sphere_altitude_on_ellipsoid() {
        let shape = UvSphereShape::new(DVec3::new(10.0, 10.0, 5.0));
        assert!((shape.altitude(DVec3::new(0.0, 0.0, 7.0)) - 2.0).abs() < 1e-12);
        assert!((shape.altitude(DVec3::new(12.0, 0.0, 0.0)) - 2.0).abs() < 1e-12);
        assert_eq!(shape.min_radius(), 5.0);
    }

    #[test]
    fn test_flat_shape_footprint() {
        let shape = FlatShape::new(100.0);
        let root = PatchAddress::root(CubeFace::PosZ);
        assert!(shape.contains_point(&root, DVec3::new(50.0, 20.0, 3.0)));
        assert!(!shape.contains_point(&root, DVec3::new(150.0, 20.0, 3.0)));
        assert_eq!(shape.altitude(DVec3::new(1.0, 1.0, 3.0)), 3.0);
        assert_eq!(shape.patch_center(&root), DVec3::new(50.0, 50.0, 0.0));
    }
}
