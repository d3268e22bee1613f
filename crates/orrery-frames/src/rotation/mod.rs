//! Time-parameterized orientations.

mod cached;
mod fixed;
mod synchronous;
mod uniform;
mod wgccre;

use std::fmt;
use std::sync::Arc;

use glam::DQuat;

use crate::{FrameResolver, ReferenceFrame};

pub use cached::CachedRotation;
pub use fixed::FixedRotation;
pub use synchronous::SynchronousRotation;
pub use uniform::UniformRotation;
pub use wgccre::{WgccreComplexRotation, WgccreSimpleRotation};

/// Orientation of a body over time, expressed in a [`ReferenceFrame`].
pub trait Rotation: fmt::Debug {
    fn frame(&self) -> &Arc<ReferenceFrame>;

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>);

    /// Orientation of the equator in frame coordinates, without spin.
    fn frame_equatorial_orientation_at(&self, time: f64) -> DQuat;

    /// Full orientation in frame coordinates, spin included.
    fn frame_rotation_at(&self, time: f64) -> DQuat;

    /// Retrograde rotators report `true`.
    fn is_flipped(&self) -> bool {
        false
    }

    fn is_dynamic(&self) -> bool;

    /// Sidereal period in days; infinite when the body does not spin.
    fn period(&self) -> f64;

    fn make_copy(&self) -> Box<dyn Rotation>;

    fn equatorial_orientation_at(&self, time: f64, resolver: &dyn FrameResolver) -> DQuat {
        self.frame()
            .absolute_from_frame_orientation(self.frame_equatorial_orientation_at(time), resolver)
    }

    fn rotation_at(&self, time: f64, resolver: &dyn FrameResolver) -> DQuat {
        self.frame()
            .absolute_from_frame_orientation(self.frame_rotation_at(time), resolver)
    }
}
