//! Renderer settings for the Orrery core.
//!
//! Provides the [`Settings`] record read by every per-frame stage, persisted to
//! disk as RON. Supports CLI overrides via clap, hot-reload detection, and
//! forward/backward compatible serialization.

mod cli;
mod error;
mod settings;

pub use cli::{CliArgs, DepthScalingArg};
pub use error::ConfigError;
pub use settings::{
    DebugSettings, DepthScaling, LodSettings, PickingSettings, RenderSettings, Settings,
    VisibilitySettings, default_config_dir,
};
