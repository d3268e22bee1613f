//! Batched point sprites for unresolved anchors: star points and glare halos.

use bytemuck::{Pod, Zeroable};
use orrery_config::VisibilitySettings;
use static_assertions::assert_eq_size;

use crate::SceneAnchor;

/// One point sprite as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    /// Scene position relative to the scene origin.
    pub position: [f32; 3],
    /// Sprite size in pixels.
    pub size: f32,
    /// Linear RGB plus alpha.
    pub color: [f32; 4],
    /// Object id encoded as a color, for picking passes.
    pub oid_color: [f32; 4],
}

assert_eq_size!(PointVertex, [u8; 48]);

/// Encode an object id into RGBA, one byte per channel (red is the lowest byte).
pub fn oid_to_color(oid: u32) -> [f32; 4] {
    let [r, g, b, a] = oid.to_le_bytes();
    [r, g, b, a].map(|c| f32::from(c) / 255.0)
}

/// Convert a blackbody temperature in Kelvin to an approximate sRGB color.
///
/// Uses a simplified Planckian locus approximation (Tanner Helland algorithm).
pub fn blackbody_to_rgb(temperature_k: f32) -> [f32; 3] {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        1.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76) / 255.0).clamp(0.0, 1.0)
    };
    let g = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0) / 255.0
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85) / 255.0).clamp(0.0, 1.0)
    };
    let b = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0) / 255.0
    };
    [r, g, b]
}

/// Point size and opacity of a source of apparent magnitude `app_magnitude`.
///
/// Sizes grow by `mag_pixel_scale` pixels per magnitude above the faintest
/// visible one, saturating at `max_app_magnitude`. Sources within
/// `1 / min_mag_scale` magnitudes of the limit fade in.
pub fn point_size_alpha(app_magnitude: f64, settings: &VisibilitySettings) -> (f32, f32) {
    let magnitude = app_magnitude.max(settings.max_app_magnitude);
    let above_limit = (settings.lowest_app_magnitude - magnitude).max(0.0);
    let size = settings.min_point_size + above_limit * settings.mag_pixel_scale;
    let alpha = (above_limit * settings.min_mag_scale).clamp(0.0, 1.0);
    (size as f32, alpha as f32)
}

/// Star points of one batch.
#[derive(Debug, Default)]
pub struct PointsSetShape {
    vertices: Vec<PointVertex>,
}

impl PointsSetShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Add a sprite for each of `indices`. Sources fainter than the visibility
    /// limit are skipped.
    pub fn add_points(
        &mut self,
        anchors: &[SceneAnchor],
        indices: &[usize],
        settings: &VisibilitySettings,
        color: impl Fn(&SceneAnchor) -> [f32; 3],
    ) {
        self.vertices.reserve(indices.len());
        for anchor in indices.iter().filter_map(|&i| anchors.get(i)) {
            let (size, alpha) = point_size_alpha(anchor.app_magnitude, settings);
            if alpha <= 0.0 {
                continue;
            }
            let [r, g, b] = color(anchor);
            self.vertices.push(PointVertex {
                position: anchor.scene_position.as_vec3().to_array(),
                size,
                color: [r, g, b, alpha],
                oid_color: oid_to_color(anchor.oid),
            });
        }
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Glare halos around sources brighter than `smallest_glare_mag`.
#[derive(Debug, Default)]
pub struct HaloPointsSetShape {
    vertices: Vec<PointVertex>,
}

/// Halo size per magnitude above the glare threshold, relative to the point size.
const HALO_GROWTH: f64 = 1.0;

impl HaloPointsSetShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn add_points(
        &mut self,
        anchors: &[SceneAnchor],
        indices: &[usize],
        settings: &VisibilitySettings,
        color: impl Fn(&SceneAnchor) -> [f32; 3],
    ) {
        let span = (settings.smallest_glare_mag - settings.max_app_magnitude).max(f64::EPSILON);
        for anchor in indices.iter().filter_map(|&i| anchors.get(i)) {
            let magnitude = anchor.app_magnitude.max(settings.max_app_magnitude);
            let excess = settings.smallest_glare_mag - magnitude;
            if excess <= 0.0 {
                continue;
            }
            let (point_size, _) = point_size_alpha(anchor.app_magnitude, settings);
            let size = f64::from(point_size) * (1.0 + HALO_GROWTH * excess);
            let alpha = (excess / span).clamp(0.0, 1.0);
            let [r, g, b] = color(anchor);
            self.vertices.push(PointVertex {
                position: anchor.scene_position.as_vec3().to_array(),
                size: size as f32,
                color: [r, g, b, alpha as f32],
                oid_color: oid_to_color(anchor.oid),
            });
        }
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
