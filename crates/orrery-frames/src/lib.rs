//! Reference frames, orbits and rotations of celestial bodies.
//!
//! A [`ReferenceFrame`] is a local basis, usually attached to another body;
//! an [`Orbit`] maps time to a position in its frame and a [`Rotation`] maps
//! time to an orientation. Frames that follow a body read that body's cached
//! state through a [`FrameResolver`], so this crate never owns the anchor graph.
//!
//! Evaluation never fails: numerical problems are logged once per object and
//! replaced by a sentinel (zero position, identity orientation).

mod ephemeris;
mod error;
mod frame;
mod id;
pub mod kepler;
mod latch;
mod orbit;
mod resolver;
mod rotation;

pub use ephemeris::{EphemerisProvider, PoleOrientation, RotationProvider};
pub use error::{OrbitError, RotationError};
pub use frame::{FrameKind, ReferenceFrame};
pub use id::AnchorId;
pub use latch::WarnLatch;
pub use orbit::{EllipticalElements, EllipticalOrbit, FixedOrbit, FunctionOrbit, Orbit};
pub use resolver::{FrameAnchorState, FrameResolver, StaticResolver};
pub use rotation::{
    CachedRotation, FixedRotation, Rotation, SynchronousRotation, UniformRotation,
    WgccreComplexRotation, WgccreSimpleRotation,
};
