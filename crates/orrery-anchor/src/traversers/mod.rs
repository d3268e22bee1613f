//! The stock traversals.

mod closest;
mod light;
mod shadow;
mod update;

pub use closest::FindClosestSystemTraverser;
pub use light::FindLightSourceTraverser;
pub use shadow::FindShadowCastersTraverser;
pub use update::UpdateTraverser;
