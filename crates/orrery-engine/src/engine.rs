//! The per-frame driver.

use glam::{DVec2, DVec3};
use orrery_anchor::{
    AnchorContent, AnchorGraph, AnchorId, CameraAnchor, FindClosestSystemTraverser,
    FindLightSourceTraverser, FindShadowCastersTraverser, UpdateTraverser,
};
use orrery_config::Settings;
use orrery_lod::{CullingFrustum, HorizonCullingFrustum, LodControl, PatchedSurface, SurfaceShape};
use orrery_math::{Frustum, app_mag_to_radiance, point_radiance};
use orrery_patch::PatchOptions;
use orrery_scene::{
    HaloPointsSetShape, PickHit, PointsSetShape, RegionSceneManager, SceneAnchor, SceneManager,
    blackbody_to_rgb,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{EngineError, FrameReport};

const WHITE: [f32; 3] = [1.0; 3];

/// Point sprites of one scene region.
#[derive(Debug, Default)]
pub struct RegionPoints {
    pub points: PointsSetShape,
    pub halos: HaloPointsSetShape,
}

/// Owns the anchor graph, the observer and the per-frame products.
///
/// Each [`tick`](Self::tick) runs the frame pipeline in order: update
/// traversal, lighting, surface LOD, scene build and point batching. Settings
/// are read-only for the duration of a tick.
pub struct Engine {
    graph: AnchorGraph,
    camera: CameraAnchor,
    settings: Settings,
    scene: Box<dyn SceneManager>,
    surfaces: FxHashMap<AnchorId, PatchedSurface>,
    point_colors: FxHashMap<AnchorId, [f32; 3]>,
    backgrounds: FxHashSet<AnchorId>,
    batches: Vec<RegionPoints>,
    update_id: u64,
    time: f64,
}

impl Engine {
    /// Engine with a [`RegionSceneManager`].
    pub fn new(graph: AnchorGraph, camera: CameraAnchor, settings: Settings) -> Self {
        Self {
            graph,
            camera,
            settings,
            scene: Box::new(RegionSceneManager::new()),
            surfaces: FxHashMap::default(),
            point_colors: FxHashMap::default(),
            backgrounds: FxHashSet::default(),
            batches: Vec::new(),
            update_id: 0,
            time: 0.0,
        }
    }

    pub fn with_scene_manager(mut self, scene: Box<dyn SceneManager>) -> Self {
        self.scene = scene;
        self
    }

    pub fn graph(&self) -> &AnchorGraph {
        &self.graph
    }

    /// Mutable graph access, for world edits between ticks. Flagged systems
    /// are rebuilt at the start of the next [`tick`](Self::tick).
    pub fn graph_mut(&mut self) -> &mut AnchorGraph {
        &mut self.graph
    }

    pub fn camera(&self) -> &CameraAnchor {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraAnchor {
        &mut self.camera
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings. Surfaces already attached keep their LOD control.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn scene(&self) -> &dyn SceneManager {
        self.scene.as_ref()
    }

    /// Point batches of the last frame, one per scene region.
    pub fn point_batches(&self) -> &[RegionPoints] {
        &self.batches
    }

    pub fn surface(&self, id: AnchorId) -> Option<&PatchedSurface> {
        self.surfaces.get(&id)
    }

    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Give `id` a patched surface, refined while the anchor is resolved.
    pub fn attach_surface(&mut self, id: AnchorId, shape: Box<dyn SurfaceShape>) -> Result<(), EngineError> {
        self.graph.anchor(id)?;
        let lod = &self.settings.lod;
        let options = PatchOptions {
            skirt: (lod.skirt_size > 0.0).then_some(lod.skirt_size),
            ..PatchOptions::default()
        };
        let surface = PatchedSurface::new(shape, LodControl::from_settings(lod), options, true);
        self.surfaces.insert(id, surface);
        Ok(())
    }

    pub fn set_point_color(&mut self, id: AnchorId, color: [f32; 3]) {
        self.point_colors.insert(id, color);
    }

    /// Color the point of `id` from its blackbody temperature in Kelvin.
    pub fn set_star_temperature(&mut self, id: AnchorId, temperature_k: f32) {
        self.set_point_color(id, blackbody_to_rgb(temperature_k));
    }

    /// Background anchors are drawn behind everything, in the farthest region.
    pub fn set_background(&mut self, id: AnchorId, background: bool) {
        if background {
            self.backgrounds.insert(id);
        } else {
            self.backgrounds.remove(&id);
        }
    }

    /// Evaluate the world at Julian date `time` and rebuild the scene.
    pub fn tick(&mut self, time: f64) -> FrameReport {
        self.update_id += 1;
        self.time = time;
        let update_id = self.update_id;

        // Aggregates of systems edited since the last tick.
        self.graph.rebuild_all();

        if let Some(id) = self.camera.frame().anchor()
            && let Err(err) = self.graph.update(id, time, update_id)
        {
            tracing::warn!(%id, error = %err, "Camera anchor update failed");
        }
        self.camera.update(&self.graph);

        let mut traverser =
            UpdateTraverser::from_settings(time, &self.camera, &self.settings.visibility, update_id);
        self.graph.traverse_roots(&mut traverser);
        let failures = traverser.failures();
        let collected = std::mem::take(&mut traverser.collected);

        let mut report = FrameReport {
            update_id,
            time,
            failures,
            ..FrameReport::default()
        };

        self.update_lighting(&collected);
        self.update_surfaces(&collected, &mut report);
        self.build_scene(&collected);
        self.build_points();

        let anchors = self.scene.anchors();
        report.visible = anchors.iter().filter(|a| a.visible).count();
        report.resolved = anchors.iter().filter(|a| a.visible && a.resolved).count();
        report.regions = self.scene.regions().len();
        report.points = self.batches.iter().map(|b| b.points.len()).sum();
        report.halos = self.batches.iter().map(|b| b.halos.len()).sum();

        tracing::debug!(
            update_id,
            visible = report.visible,
            resolved = report.resolved,
            regions = report.regions,
            points = report.points,
            lod_changes = report.lod.total(),
            max_lod = report.max_lod,
            "Frame built"
        );
        report
    }

    /// Reflected light of visible bodies, from their brightest source.
    ///
    /// The new luminosity feeds the next frame's magnitudes.
    fn update_lighting(&mut self, collected: &[AnchorId]) {
        let lowest_radiance = app_mag_to_radiance(self.settings.visibility.lowest_app_magnitude);
        for &body in collected {
            let Some(anchor) = self.graph.get(body) else {
                continue;
            };
            if !anchor.is_visible() || !anchor.content().contains(AnchorContent::REFLECTIVE) {
                continue;
            }
            let position = anchor.state().position;
            let mut lights = FindLightSourceTraverser::new(lowest_radiance, position);
            self.graph.traverse_roots(&mut lights);

            let brightest = lights
                .collected
                .iter()
                .filter(|&&light| light != body)
                .filter_map(|&light| {
                    let a = self.graph.get(light)?;
                    let distance = a.state().position.distance(position);
                    Some((light, point_radiance(a.intrinsic_luminosity(), distance)))
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((light, _)) = brightest else {
                continue;
            };
            let result = self
                .graph
                .update(light, self.time, self.update_id)
                .and_then(|_| self.graph.update_reflected_luminosity(body, light));
            if let Err(err) = result {
                tracing::warn!(%body, %light, error = %err, "Reflected light update failed");
            }
        }
    }

    fn update_surfaces(&mut self, collected: &[AnchorId], report: &mut FrameReport) {
        let lod = &self.settings.lod;
        let threshold = if lod.cull_far_patches {
            u8::try_from(lod.cull_far_patches_threshold).unwrap_or(u8::MAX)
        } else {
            u8::MAX
        };
        let pixel_size = self.camera.pixel_size();

        for &id in collected {
            let Some(surface) = self.surfaces.get_mut(&id) else {
                continue;
            };
            let Some(anchor) = self.graph.get(id) else {
                continue;
            };
            if !anchor.is_resolved() {
                continue;
            }
            // Observer and view in the body's model space.
            let to_model = anchor.state().orientation.inverse();
            let camera_model = to_model * -anchor.observer().rel_position;
            let frustum = Frustum::from_perspective(
                camera_model,
                to_model * self.camera.orientation(),
                self.camera.fov_y(),
                self.camera.aspect_ratio(),
                self.camera.near(),
                self.camera.far(),
            );
            let horizon = surface.horizon_params(camera_model, threshold);
            let (_, changes) = if horizon.min_radius > 0.0 {
                let culling =
                    HorizonCullingFrustum::from_frustum(frustum, DVec3::ZERO, 1.0, camera_model, horizon);
                surface.update_lod(camera_model, &culling, pixel_size)
            } else {
                let culling = CullingFrustum::from_frustum(frustum, DVec3::ZERO, 1.0);
                surface.update_lod(camera_model, &culling, pixel_size)
            };
            report.add_lod(&changes);
        }

        for surface in self.surfaces.values() {
            report.max_lod = report.max_lod.max(surface.max_lod());
            report.patches_shown += surface.shown_patches().len();
        }
    }

    fn build_scene(&mut self, collected: &[AnchorId]) {
        let mask = self.settings.picking.mouse_click_mask();
        let anchors: Vec<SceneAnchor> = collected
            .iter()
            .filter_map(|&id| self.graph.get(id))
            .map(|anchor| {
                SceneAnchor::new(anchor, &self.camera, &self.settings.render)
                    .with_background(self.backgrounds.contains(&anchor.id()))
                    .with_collision_mask(mask)
            })
            .collect();
        self.scene.build_scene(anchors, &self.camera, &self.settings.render);
    }

    fn build_points(&mut self) {
        let regions = self.scene.regions();
        let anchors = self.scene.anchors();
        let visibility = &self.settings.visibility;
        let colors = &self.point_colors;
        let color = |a: &SceneAnchor| colors.get(&a.anchor).copied().unwrap_or(WHITE);

        self.batches.resize_with(regions.len(), RegionPoints::default);
        for (batch, region) in self.batches.iter_mut().zip(regions) {
            batch.points.clear();
            batch.halos.clear();
            batch.points.add_points(anchors, &region.points, visibility, &color);
            batch.halos.add_points(anchors, &region.points, visibility, &color);
        }
    }

    /// Bodies under `mouse_ndc` carrying the picking bit, nearest first.
    pub fn pick(&self, mouse_ndc: DVec2) -> Vec<PickHit> {
        self.scene
            .pick_scene(mouse_ndc, self.settings.picking.mouse_click_mask())
    }

    /// Nearest picked anchor.
    pub fn pick_anchor(&self, mouse_ndc: DVec2) -> Option<AnchorId> {
        let hits = self.pick(mouse_ndc);
        let hit = hits.first()?;
        self.scene.anchors().get(hit.index).map(|a| a.anchor)
    }

    /// System nearest to the observer and its distance in km.
    pub fn closest_system(&mut self) -> Option<(AnchorId, f64)> {
        let mut traverser = FindClosestSystemTraverser::new(self.camera.absolute_position());
        self.graph.traverse_roots(&mut traverser);
        traverser.closest.map(|id| (id, traverser.distance))
    }

    /// Anchors that can shadow `target` from `light`, at their last update.
    pub fn shadow_casters(&mut self, target: AnchorId, light: AnchorId) -> Result<Vec<AnchorId>, EngineError> {
        let source = self.graph.anchor(light)?;
        let (light_position, light_radius) = (source.state().position, source.bounding_radius());
        let mut traverser = FindShadowCastersTraverser::new(&self.graph, target, light_position, light_radius)?;
        self.graph.traverse_roots(&mut traverser);
        Ok(traverser.collected)
    }
}
