//! Mouse picking against scene bodies.

use glam::{DQuat, DVec2, DVec3};

use crate::{Lens, SceneAnchor};

/// A ray in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRay {
    pub origin: DVec3,
    /// Unit direction.
    pub direction: DVec3,
}

impl CollisionRay {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from an observer at the origin through `mouse_ndc` (`[-1, 1]²`,
    /// `+y` up) of `lens`.
    pub fn from_lens(lens: &Lens, orientation: DQuat, mouse_ndc: DVec2) -> Self {
        let tan_half = (lens.fov_y * 0.5).tan();
        let local = DVec3::new(
            mouse_ndc.x * tan_half * lens.aspect_ratio,
            1.0,
            mouse_ndc.y * tan_half,
        );
        Self::new(DVec3::ZERO, orientation * local)
    }

    /// Distance along the ray to the first hit of a sphere, if any.
    ///
    /// A ray starting inside the sphere hits its far side.
    pub fn intersect_sphere(&self, center: DVec3, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let (t0, t1) = (-b - root, -b + root);
        if t0 >= 0.0 {
            Some(t0)
        } else if t1 >= 0.0 {
            Some(t1)
        } else {
            None
        }
    }
}

/// One picked body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Index into the frame's scene anchors.
    pub index: usize,
    pub oid: u32,
    /// Distance along the ray, in scene units.
    pub distance: f64,
    /// Region the body was found in, nearest first.
    pub region: usize,
}

/// Test `bodies` of one region and append the hits.
pub(crate) fn pick_bodies(
    ray: &CollisionRay,
    anchors: &[SceneAnchor],
    bodies: &[usize],
    mask: u32,
    region: usize,
    hits: &mut Vec<PickHit>,
) {
    for &index in bodies {
        let Some(anchor) = anchors.get(index) else {
            continue;
        };
        if anchor.collision_mask & mask == 0 {
            continue;
        }
        if let Some(distance) = ray.intersect_sphere(anchor.scene_center(), anchor.scene_radius()) {
            hits.push(PickHit {
                index,
                oid: anchor.oid,
                distance,
                region,
            });
        }
    }
}
