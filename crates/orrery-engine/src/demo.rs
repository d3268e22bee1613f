//! A small seeded universe: the Sun, Earth and the Moon inside a galaxy of
//! random stars.

use std::sync::Arc;

use glam::DVec3;
use orrery_anchor::{Anchor, AnchorError, AnchorGraph, AnchorId, CameraAnchor, Octree};
use orrery_config::RenderSettings;
use orrery_frames::{
    EllipticalElements, EllipticalOrbit, FixedOrbit, FixedRotation, Orbit, ReferenceFrame, Rotation,
    UniformRotation,
};
use orrery_math::units::{J2000, KM_PER_AU, KM_PER_LIGHT_YEAR, SOLAR_LUMINOSITY};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const EARTH_RADIUS: f64 = 6378.137;
pub const MOON_RADIUS: f64 = 1737.4;
pub const SUN_RADIUS: f64 = 695_700.0;

const GALAXY_WIDTH: f64 = 2000.0 * KM_PER_LIGHT_YEAR;
/// Octree nodes keep leaves brighter than this (W) and push the rest down.
const GALAXY_THRESHOLD: f64 = 1e30;
/// Half edge of the cube random stars are scattered in.
const STAR_FIELD_HALF_WIDTH: f64 = 200.0 * KM_PER_LIGHT_YEAR;
const STAR_OID_BASE: u32 = 100;

pub struct DemoUniverse {
    pub graph: AnchorGraph,
    pub galaxy: AnchorId,
    pub sol: AnchorId,
    pub sun: AnchorId,
    pub earth: AnchorId,
    pub moon: AnchorId,
    /// Random stars and their surface temperature in Kelvin.
    pub stars: Vec<(AnchorId, f32)>,
}

fn fixed(frame: &Arc<ReferenceFrame>, position: DVec3) -> (Box<dyn Orbit>, Box<dyn Rotation>) {
    (
        Box::new(FixedOrbit::new(frame.clone(), position)),
        Box::new(FixedRotation::identity(frame.clone())),
    )
}

/// Build the demo universe. The same `seed` always yields the same stars.
pub fn demo_universe(seed: u64, star_count: usize) -> Result<DemoUniverse, AnchorError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = AnchorGraph::new();
    let barycentric = Arc::new(ReferenceFrame::ecliptic_j2000());

    let (o, r) = fixed(&barycentric, DVec3::ZERO);
    let galaxy = graph.insert(
        Anchor::octree_system("Galaxy", o, r, Octree::new(DVec3::ZERO, GALAXY_WIDTH, GALAXY_THRESHOLD)),
        None,
    )?;

    let (o, r) = fixed(&barycentric, DVec3::ZERO);
    let sol = graph.add_to_octree(galaxy, Anchor::system("Sol", o, r))?;
    let sol_frame = Arc::new(ReferenceFrame::anchored_ecliptic(sol));

    let (o, r) = fixed(&sol_frame, DVec3::ZERO);
    let sun = graph.insert(
        Anchor::stellar("Sun", o, r)
            .with_radius(SUN_RADIUS)
            .with_luminosity(SOLAR_LUMINOSITY)
            .with_oid(1),
        Some(sol),
    )?;

    let orbit = EllipticalOrbit::new(
        sol_frame.clone(),
        EllipticalElements::from_semi_major_axis(KM_PER_AU, 0.0167, 365.256),
    );
    let rotation = UniformRotation::new(sol_frame.clone(), 0.997_27, 23.44f64.to_radians(), 0.0, 0.0, J2000);
    let earth = graph.insert(
        Anchor::stellar("Earth", Box::new(orbit), Box::new(rotation))
            .with_radius(EARTH_RADIUS)
            .with_albedo(0.3)
            .with_oid(2),
        Some(sol),
    )?;

    let earth_frame = Arc::new(ReferenceFrame::anchored_ecliptic(earth));
    let orbit = EllipticalOrbit::new(
        earth_frame.clone(),
        EllipticalElements::from_semi_major_axis(384_400.0, 0.0549, 27.321_66),
    );
    let rotation = UniformRotation::new(earth_frame, 27.321_66, 6.68f64.to_radians(), 0.0, 0.0, J2000);
    let moon = graph.insert(
        Anchor::stellar("Moon", Box::new(orbit), Box::new(rotation))
            .with_radius(MOON_RADIUS)
            .with_albedo(0.12)
            .with_oid(3),
        Some(sol),
    )?;

    let mut stars = Vec::with_capacity(star_count);
    for i in 0..star_count {
        let position = DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        ) * STAR_FIELD_HALF_WIDTH;
        let luminosity = SOLAR_LUMINOSITY * 10f64.powf(rng.random_range(-1.0..3.0));
        let temperature: f32 = rng.random_range(3000.0..30_000.0);
        let (o, r) = fixed(&barycentric, position);
        let star = graph.add_to_octree(
            galaxy,
            Anchor::stellar(format!("Star {i}"), o, r)
                .with_radius(SUN_RADIUS)
                .with_luminosity(luminosity)
                .with_oid(STAR_OID_BASE + i as u32),
        )?;
        stars.push((star, temperature));
    }

    tracing::info!(anchors = graph.len(), stars = stars.len(), "Demo universe built");
    Ok(DemoUniverse {
        graph,
        galaxy,
        sol,
        sun,
        earth,
        moon,
        stars,
    })
}

/// Observer `altitude` km above Earth on its `-Y` side, looking at its center.
pub fn camera_above_earth(earth: AnchorId, altitude: f64, settings: &RenderSettings, height_px: u32) -> CameraAnchor {
    let mut camera = CameraAnchor::new(
        Arc::new(ReferenceFrame::anchored_ecliptic(earth)),
        settings.fov_radians(),
        settings.aspect_ratio,
        height_px,
    );
    camera.set_frame_position(DVec3::new(0.0, -(EARTH_RADIUS + altitude), 0.0));
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stars() {
        let a = demo_universe(42, 50).unwrap();
        let b = demo_universe(42, 50).unwrap();
        assert_eq!(a.stars.len(), 50);
        for ((sa, ta), (sb, tb)) in a.stars.iter().zip(&b.stars) {
            assert_eq!(ta, tb);
            let pa = a.graph.anchor(*sa).unwrap().intrinsic_luminosity();
            let pb = b.graph.anchor(*sb).unwrap().intrinsic_luminosity();
            assert_eq!(pa, pb);
        }
        let c = demo_universe(43, 50).unwrap();
        assert_ne!(a.stars[0].1, c.stars[0].1);
    }

    #[test]
    fn test_bodies_hang_under_sol() {
        let demo = demo_universe(1, 0).unwrap();
        let sol = demo.graph.anchor(demo.sol).unwrap();
        assert!(sol.is_system());
        for body in [demo.sun, demo.earth, demo.moon] {
            assert_eq!(demo.graph.anchor(body).unwrap().parent(), Some(demo.sol));
        }
        assert_eq!(demo.graph.octree_leaves(demo.galaxy).unwrap(), vec![demo.sol]);
    }
}
