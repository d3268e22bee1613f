use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glam::{DQuat, DVec3};
use orrery_anchor::{
    Anchor, AnchorGraph, AnchorId, AnchorTraverser, CameraAnchor, FindClosestSystemTraverser,
    FindLightSourceTraverser, FindShadowCastersTraverser, Octree, OctreeNode, UpdateTraverser,
};
use orrery_frames::{FixedOrbit, FixedRotation, Orbit, ReferenceFrame, Rotation};
use orrery_math::{
    app_mag_to_radiance,
    units::{J2000, KM_PER_AU, KM_PER_LIGHT_YEAR, L0, METERS_PER_KM, SOLAR_LUMINOSITY},
};

fn barycentric() -> Arc<ReferenceFrame> {
    Arc::new(ReferenceFrame::ecliptic_j2000())
}

fn fixed(frame: Arc<ReferenceFrame>, position: DVec3) -> (Box<dyn Orbit>, Box<dyn Rotation>) {
    (
        Box::new(FixedOrbit::new(frame.clone(), position)),
        Box::new(FixedRotation::identity(frame)),
    )
}

struct Universe {
    graph: AnchorGraph,
    galaxy: AnchorId,
    sol: AnchorId,
    sun: AnchorId,
    earth: AnchorId,
    moon: AnchorId,
    alpha: AnchorId,
    alpha_star: AnchorId,
    faint: AnchorId,
}

fn add_star_system(
    graph: &mut AnchorGraph,
    galaxy: AnchorId,
    name: &str,
    position: DVec3,
    luminosity: f64,
) -> (AnchorId, AnchorId) {
    let (o, r) = fixed(barycentric(), position);
    let system = graph.add_to_octree(galaxy, Anchor::system(name, o, r)).unwrap();
    let (o, r) = fixed(Arc::new(ReferenceFrame::anchored_ecliptic(system)), DVec3::ZERO);
    let star = graph
        .insert(
            Anchor::stellar(format!("{name} A"), o, r)
                .with_radius(695_700.0)
                .with_luminosity(luminosity),
            Some(system),
        )
        .unwrap();
    (system, star)
}

fn universe() -> Universe {
    let mut graph = AnchorGraph::new();
    let (o, r) = fixed(barycentric(), DVec3::ZERO);
    let galaxy = graph
        .insert(
            Anchor::octree_system(
                "galaxy",
                o,
                r,
                Octree::new(DVec3::ZERO, 2000.0 * KM_PER_LIGHT_YEAR, 1e30),
            ),
            None,
        )
        .unwrap();

    let (sol, sun) = add_star_system(&mut graph, galaxy, "Sol", DVec3::ZERO, SOLAR_LUMINOSITY);
    let sol_frame = Arc::new(ReferenceFrame::anchored_ecliptic(sol));
    let (o, r) = fixed(sol_frame.clone(), DVec3::new(KM_PER_AU, 0.0, 0.0));
    let earth = graph
        .insert(
            Anchor::stellar("Earth", o, r).with_radius(6378.0).with_albedo(0.3),
            Some(sol),
        )
        .unwrap();
    let (o, r) = fixed(sol_frame, DVec3::new(KM_PER_AU - 384_400.0, 0.0, 0.0));
    let moon = graph
        .insert(
            Anchor::stellar("Moon", o, r).with_radius(1737.0).with_albedo(0.12),
            Some(sol),
        )
        .unwrap();

    let (alpha, alpha_star) = add_star_system(
        &mut graph,
        galaxy,
        "Alpha",
        DVec3::new(4.3 * KM_PER_LIGHT_YEAR, 0.0, 0.0),
        1.5 * SOLAR_LUMINOSITY,
    );
    let (faint, _) = add_star_system(
        &mut graph,
        galaxy,
        "Faint",
        DVec3::new(1000.0 * KM_PER_LIGHT_YEAR, 0.0, 0.0),
        SOLAR_LUMINOSITY,
    );

    graph.rebuild_all();
    Universe {
        graph,
        galaxy,
        sol,
        sun,
        earth,
        moon,
        alpha,
        alpha_star,
        faint,
    }
}

fn update_everything(graph: &mut AnchorGraph, update_id: u64) {
    for i in 0..graph.len() {
        graph.update(AnchorId(i as u32), J2000, update_id).unwrap();
    }
}

/// Camera 20 000 km beyond Earth on the anti-solar side, looking at the Sun.
fn camera_near_earth(graph: &mut AnchorGraph, earth: AnchorId) -> CameraAnchor {
    graph.update(earth, J2000, 1).unwrap();
    let mut camera = CameraAnchor::new(
        Arc::new(ReferenceFrame::anchored_ecliptic(earth)),
        40f64.to_radians(),
        16.0 / 9.0,
        1080,
    );
    camera.set_frame_position(DVec3::new(20_000.0, 0.0, 0.0));
    camera.set_frame_orientation(DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2));
    camera.update(graph);
    camera
}

#[test]
fn test_update_traverser_collects_visible_bodies() {
    let mut u = universe();
    let camera = camera_near_earth(&mut u.graph, u.earth);
    let mut traverser =
        UpdateTraverser::new(J2000, &camera, app_mag_to_radiance(6.0), 2.0, 1);
    u.graph.traverse(u.galaxy, &mut traverser);

    assert_eq!(traverser.failures(), 0);
    let collected = traverser.collected.clone();
    assert!(collected.contains(&u.sun), "{collected:?}");
    assert!(collected.contains(&u.earth));
    assert!(collected.contains(&u.moon));
    assert!(!collected.contains(&u.alpha_star));

    // Alpha is behind the camera; it was updated but not entered.
    assert_eq!(u.graph.anchor(u.alpha).unwrap().update_id(), Some(1));
    assert!(!u.graph.anchor(u.alpha).unwrap().is_visible());
    assert_eq!(u.graph.anchor(u.alpha_star).unwrap().update_id(), None);
    // The faint system was pruned by radiance.
    assert_eq!(u.graph.anchor(u.faint).unwrap().update_id(), None);

    for id in &collected {
        let s = u.graph.anchor(*id).unwrap().state();
        assert_eq!(s.position, s.global_position + s.local_position);
    }
    assert!(u.graph.anchor(u.sol).unwrap().is_resolved());
}

#[test]
fn test_octree_node_skipped_below_radiance_threshold() {
    let mut graph = AnchorGraph::new();
    let (o, r) = fixed(barycentric(), DVec3::ZERO);
    let owner = graph
        .insert(
            Anchor::octree_system("cluster", o, r, Octree::new(DVec3::ZERO, 1e-3, 1e40)),
            None,
        )
        .unwrap();
    let (o, r) = fixed(barycentric(), DVec3::ZERO);
    graph
        .add_to_octree(owner, Anchor::stellar("star", o, r).with_luminosity(L0))
        .unwrap();
    graph.rebuild_all();
    graph.update(owner, J2000, 1).unwrap();

    let mut camera = CameraAnchor::new(barycentric(), 0.7, 1.0, 1000);
    camera.set_frame_position(DVec3::new(10.0 * KM_PER_LIGHT_YEAR, 0.0, 0.0));
    camera.set_frame_orientation(DQuat::from_axis_angle(DVec3::Z, FRAC_PI_2));
    camera.update(&graph);

    let root: OctreeNode = graph.anchor(owner).unwrap().octree().unwrap().root_node().clone();
    assert_eq!(root.max_luminosity(), L0);

    let d = 10.0 * KM_PER_LIGHT_YEAR * METERS_PER_KM;
    let reference = L0 / (4.0 * PI * d * d);

    let mut strict = UpdateTraverser::new(J2000, &camera, reference * 1.01, 2.0, 2);
    assert!(!strict.enter_octree_node(&mut graph, owner, &root));

    let mut lenient = UpdateTraverser::new(J2000, &camera, reference * 0.99, 2.0, 3);
    assert!(lenient.enter_octree_node(&mut graph, owner, &root));
}

#[test]
fn test_light_sources_seen_from_earth() {
    let mut u = universe();
    update_everything(&mut u.graph, 1);
    let earth_position = u.graph.anchor(u.earth).unwrap().state().position;
    let mut traverser = FindLightSourceTraverser::new(app_mag_to_radiance(6.0), earth_position);
    u.graph.traverse(u.galaxy, &mut traverser);
    assert_eq!(traverser.collected, vec![u.sun, u.alpha_star]);
}

#[test]
fn test_moon_shadows_earth() {
    let mut u = universe();
    update_everything(&mut u.graph, 1);
    let sun_position = u.graph.anchor(u.sun).unwrap().state().position;
    let mut traverser =
        FindShadowCastersTraverser::new(&u.graph, u.earth, sun_position, 695_700.0).unwrap();
    u.graph.traverse(u.galaxy, &mut traverser);
    assert_eq!(traverser.collected, vec![u.moon]);
}

#[test]
fn test_closest_system_to_observer() {
    let mut u = universe();
    update_everything(&mut u.graph, 1);
    let near_alpha = DVec3::new(4.2 * KM_PER_LIGHT_YEAR, 0.0, 0.0);
    let mut traverser = FindClosestSystemTraverser::new(near_alpha);
    u.graph.traverse(u.galaxy, &mut traverser);
    assert_eq!(traverser.closest, Some(u.alpha));
    assert!((traverser.distance - 0.1 * KM_PER_LIGHT_YEAR).abs() < 1.0);

    let earth_position = u.graph.anchor(u.earth).unwrap().state().position;
    let mut traverser = FindClosestSystemTraverser::new(earth_position);
    u.graph.traverse(u.galaxy, &mut traverser);
    assert_eq!(traverser.closest, Some(u.sol));
}

#[derive(Default)]
struct Recorder {
    enter_system: Vec<AnchorId>,
    leaves: Vec<AnchorId>,
    descend: bool,
}

impl AnchorTraverser for Recorder {
    fn traverse_anchor(&mut self, _graph: &mut AnchorGraph, anchor: AnchorId) {
        self.leaves.push(anchor);
    }

    fn enter_system(&mut self, _graph: &mut AnchorGraph, system: AnchorId) -> bool {
        self.enter_system.push(system);
        self.descend
    }

    fn enter_octree_node(&mut self, _graph: &mut AnchorGraph, _owner: AnchorId, _node: &OctreeNode) -> bool {
        true
    }

    fn traverse_octree_node(&mut self, graph: &mut AnchorGraph, _owner: AnchorId, node: &OctreeNode) {
        for leaf in node.leaves() {
            graph.traverse(leaf.anchor, self);
        }
    }
}

#[test]
fn test_enter_system_gates_children() {
    let mut u = universe();
    let mut closed = Recorder::default();
    u.graph.traverse(u.sol, &mut closed);
    assert_eq!(closed.enter_system, vec![u.sol]);
    assert!(closed.leaves.is_empty());

    let mut open = Recorder {
        descend: true,
        ..Default::default()
    };
    u.graph.traverse(u.galaxy, &mut open);
    assert_eq!(open.enter_system, vec![u.sol, u.alpha, u.faint]);
    assert_eq!(open.leaves.len(), 5);
    assert_eq!(&open.leaves[..3], &[u.sun, u.earth, u.moon]);
}
