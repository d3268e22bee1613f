//! The Orrery frame pipeline.
//!
//! [`Engine::tick`] evaluates the anchor graph for the observer, refines the
//! surfaces of resolved bodies, rebuilds the depth-sliced scene and batches the
//! point sprites of unresolved anchors. [`demo`] builds a seeded universe for
//! the `orrery` binary and the end-to-end tests.

pub mod demo;
mod engine;
mod error;
mod report;

pub use engine::{Engine, RegionPoints};
pub use error::EngineError;
pub use report::FrameReport;
