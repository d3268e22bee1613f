use orrery_anchor::AnchorError;
use orrery_config::ConfigError;

/// Errors surfaced by the engine's setup and query APIs.
///
/// Per-frame work never fails; `tick` logs and carries on.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
