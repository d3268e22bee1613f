//! Command-line argument parsing for hosts embedding the Orrery core.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::{DepthScaling, Settings};

/// Depth scaling mode as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DepthScalingArg {
    None,
    Inv,
    Log,
}

impl From<DepthScalingArg> for DepthScaling {
    fn from(arg: DepthScalingArg) -> Self {
        match arg {
            DepthScalingArg::None => DepthScaling::None,
            DepthScalingArg::Inv => DepthScaling::Inv,
            DepthScalingArg::Log => DepthScaling::Log,
        }
    }
}

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `settings.ron`.
#[derive(Parser, Debug)]
#[command(name = "orrery", about = "Orrery renderer core")]
pub struct CliArgs {
    /// Near plane of the single-range scene manager.
    #[arg(long)]
    pub near_plane: Option<f64>,

    /// Far plane of the single-range scene manager.
    #[arg(long)]
    pub far_plane: Option<f64>,

    /// Reverse the depth buffer.
    #[arg(long)]
    pub inverse_z: Option<bool>,

    /// Depth scaling mode beyond the mid plane.
    #[arg(long, value_enum)]
    pub depth_scaling: Option<DepthScalingArg>,

    /// Faintest apparent magnitude to render.
    #[arg(long)]
    pub lowest_magnitude: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to settings directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Settings {
    /// Apply CLI overrides to loaded settings.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(near) = args.near_plane {
            self.render.default_near_plane = near;
        }
        if let Some(far) = args.far_plane {
            self.render.default_far_plane = far;
        }
        if let Some(inverse_z) = args.inverse_z {
            self.render.inverse_z = inverse_z;
        }
        if let Some(mode) = args.depth_scaling {
            self.render.use_depth_scaling = mode.into();
        }
        if let Some(mag) = args.lowest_magnitude {
            self.visibility.lowest_app_magnitude = mag;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
