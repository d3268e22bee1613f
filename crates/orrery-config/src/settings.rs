//! Settings structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const SETTINGS_FILE: &str = "settings.ron";

/// Top-level renderer core settings.
///
/// Written at startup or on user preference changes, read-only during a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Camera, depth buffer and scene-region settings.
    pub render: RenderSettings,
    /// Screen-space and magnitude thresholds.
    pub visibility: VisibilitySettings,
    /// Surface level-of-detail settings.
    pub lod: LodSettings,
    /// Picking settings.
    pub picking: PickingSettings,
    /// Debug/development settings.
    pub debug: DebugSettings,
}

/// Depth remapping applied to scene positions beyond the mid plane.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DepthScaling {
    /// Positions are only multiplied by the scene scale.
    #[default]
    None,
    /// Positions beyond the mid plane are pulled in by `mid_plane / distance`.
    Inv,
    /// Positions beyond the mid plane are remapped logarithmically.
    Log,
}

/// Camera, depth buffer and scene-region configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Render positions relative to the observer.
    pub camera_at_origin: bool,
    /// Shift the rendering origin of a body to its surface point closest to the observer.
    pub offset_body_center: bool,
    /// Depth remapping mode.
    pub use_depth_scaling: DepthScaling,
    /// Distance (scene units) beyond which depth scaling applies.
    pub mid_plane: f64,
    /// Scene units per kilometer.
    pub scene_scale: f64,
    /// Near plane of the single-range scene manager.
    pub default_near_plane: f64,
    /// Far plane of the single-range scene manager.
    pub default_far_plane: f64,
    /// Epsilon used when building an infinite far plane projection.
    pub lens_far_limit: f64,
    /// Far plane used when the far plane is infinite but a finite value is required.
    pub infinite_plane: f64,
    /// Use an infinite far plane for the last depth region.
    pub auto_infinite_plane: bool,
    /// Reverse depth buffer (near = 1, far = 0).
    pub inverse_z: bool,
    /// Smallest near plane a depth region may use.
    pub min_near: f64,
    /// Largest span of the region in front of the first body before it is split in two.
    pub max_near_region: f64,
    /// Relative inflation applied to each region lens near/far.
    pub region_margin: f64,
    /// Vertical field of view of the default lens, in degrees.
    pub fov_degrees: f64,
    /// Default lens aspect ratio (width / height).
    pub aspect_ratio: f64,
}

/// Screen-space and magnitude thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisibilitySettings {
    /// Minimum apparent size in pixels for a body to be resolved.
    pub min_body_size: f64,
    /// Size in pixels of the faintest point sprite.
    pub min_point_size: f64,
    /// Opacity gained per magnitude above the faintest visible one.
    pub min_mag_scale: f64,
    /// Extra pixels per magnitude above the faintest visible one.
    pub mag_pixel_scale: f64,
    /// Faintest apparent magnitude that is still rendered.
    pub lowest_app_magnitude: f64,
    /// Brightest magnitude used for point size; brighter sources are clamped.
    pub max_app_magnitude: f64,
    /// Sources brighter than this magnitude get a glare halo.
    pub smallest_glare_mag: f64,
}

/// Surface level-of-detail configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodSettings {
    /// Shrink the horizon culling far plane at deep LOD levels.
    pub cull_far_patches: bool,
    /// LOD level above which far patches are culled more aggressively.
    pub cull_far_patches_threshold: u32,
    /// Maximum apparent vertex spacing in pixels before a patch splits.
    pub max_vertex_size: f64,
    /// Vertices per patch edge at LOD 0.
    pub patch_density: u32,
    /// Minimum vertices per patch edge.
    pub min_patch_density: u32,
    /// Deepest LOD level.
    pub max_lod: u32,
    /// Skirt depth relative to the patch longest edge; 0 disables skirts.
    pub skirt_size: f64,
}

/// Picking configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickingSettings {
    /// Bit of the collision mask used for mouse-click picking.
    pub mouse_click_collision_bit: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugSettings {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            camera_at_origin: true,
            offset_body_center: true,
            use_depth_scaling: DepthScaling::None,
            mid_plane: 1e6,
            scene_scale: 1.0,
            default_near_plane: 1.0,
            default_far_plane: 1e9,
            lens_far_limit: 1e-7,
            infinite_plane: 1e11,
            auto_infinite_plane: true,
            inverse_z: false,
            min_near: 1.0,
            max_near_region: 1e5,
            region_margin: 0.01,
            fov_degrees: 40.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            min_body_size: 2.0,
            min_point_size: 2.0,
            min_mag_scale: 0.6,
            mag_pixel_scale: 1.0,
            lowest_app_magnitude: 6.0,
            max_app_magnitude: -1.0,
            smallest_glare_mag: 1.0,
        }
    }
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            cull_far_patches: true,
            cull_far_patches_threshold: 6,
            max_vertex_size: 64.0,
            patch_density: 32,
            min_patch_density: 4,
            max_lod: 20,
            skirt_size: 0.1,
        }
    }
}

impl Default for PickingSettings {
    fn default() -> Self {
        Self {
            mouse_click_collision_bit: 0,
        }
    }
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl PickingSettings {
    /// The collision mask with only the picking bit set.
    pub fn mouse_click_mask(&self) -> u32 {
        1u32.checked_shl(self.mouse_click_collision_bit).unwrap_or(0)
    }
}

impl RenderSettings {
    /// Vertical field of view of the default lens, in radians.
    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }
}

/// Platform configuration directory for Orrery settings, if one exists.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orrery"))
}

fn require(ok: bool, section: &'static str, key: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            section,
            key,
            reason: reason.to_string(),
        })
    }
}

// --- Validation ---

impl Settings {
    /// Reject values the renderer cannot work with, naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Every check is phrased so that NaN fails it.
        let r = &self.render;
        require(r.min_near > 0.0, "render", "min_near", "must be positive")?;
        require(r.default_near_plane > 0.0, "render", "default_near_plane", "must be positive")?;
        require(
            r.default_far_plane > r.default_near_plane,
            "render",
            "default_far_plane",
            "must be beyond default_near_plane",
        )?;
        require(r.scene_scale > 0.0, "render", "scene_scale", "must be positive")?;
        require(r.mid_plane > 0.0, "render", "mid_plane", "must be positive")?;
        require(
            r.fov_degrees > 0.0 && r.fov_degrees < 180.0,
            "render",
            "fov_degrees",
            "must lie in (0, 180)",
        )?;
        require(r.aspect_ratio > 0.0, "render", "aspect_ratio", "must be positive")?;
        require(
            (0.0..1.0).contains(&r.region_margin),
            "render",
            "region_margin",
            "must lie in [0, 1)",
        )?;
        require(
            (0.0..1.0).contains(&r.lens_far_limit),
            "render",
            "lens_far_limit",
            "must lie in [0, 1)",
        )?;

        let v = &self.visibility;
        require(
            v.max_app_magnitude <= v.lowest_app_magnitude,
            "visibility",
            "max_app_magnitude",
            "must not be fainter than lowest_app_magnitude",
        )?;

        let l = &self.lod;
        require(l.patch_density >= 1, "lod", "patch_density", "must be at least 1")?;
        require(
            l.min_patch_density <= l.patch_density,
            "lod",
            "min_patch_density",
            "must not exceed patch_density",
        )?;
        require(l.max_lod <= 30, "lod", "max_lod", "must not exceed 30")?;
        require(l.max_vertex_size > 0.0, "lod", "max_vertex_size", "must be positive")?;
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Settings {
    /// Load settings from the given directory, or create a default settings file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(SETTINGS_FILE);

        if path.exists() {
            let settings = Self::read(&path)?;
            log::info!("Loaded settings from {}", path.display());
            Ok(settings)
        } else {
            let settings = Settings::default();
            settings.save(config_dir)?;
            log::info!("Created default settings at {}", path.display());
            Ok(settings)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the given directory as `settings.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Write { path, source }
        };
        std::fs::create_dir_all(config_dir).map_err(write_error(config_dir))?;

        let path = config_dir.join(SETTINGS_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&path, serialized).map_err(write_error(&path))?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_settings)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_settings = Self::read(&config_dir.join(SETTINGS_FILE))?;

        if &new_settings != self {
            log::info!("Settings reloaded with changes");
            Ok(Some(new_settings))
        } else {
            Ok(None)
        }
    }
}
