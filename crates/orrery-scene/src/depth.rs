//! Depth scaling: remapping of far positions so the scene fits a finite
//! depth range.
//!
//! Beyond `mid_plane` (scene units) positions are pulled towards the observer
//! along their line of sight. The remapping is monotonic, so depth order is
//! preserved, and objects keep their apparent size because the returned scale
//! factor shrinks them by the same ratio.

use orrery_config::{DepthScaling, RenderSettings};

/// Scene distance and scale factor of an object at `distance` km.
///
/// The scale factor converts km into scene units for that object: the scene
/// position is `rel_position * factor`.
pub fn scale_distance(distance: f64, settings: &RenderSettings) -> (f64, f64) {
    let scaled = distance * settings.scene_scale;
    let mid = settings.mid_plane;
    let remapped = match settings.use_depth_scaling {
        DepthScaling::None => scaled,
        _ if scaled <= mid || mid <= 0.0 => scaled,
        // Everything beyond the mid plane lands in [mid, 2 * mid).
        DepthScaling::Inv => mid + mid * (1.0 - mid / scaled),
        DepthScaling::Log => mid * (1.0 + (scaled / mid).ln()),
    };
    let factor = if distance > 0.0 {
        remapped / distance
    } else {
        settings.scene_scale
    };
    (remapped, factor)
}
