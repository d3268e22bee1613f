//! Time-parameterized positions.

mod elliptical;
mod fixed;
mod function;

use std::fmt;
use std::sync::Arc;

use glam::{DQuat, DVec3};

use crate::{FrameResolver, ReferenceFrame};

pub use elliptical::{EllipticalElements, EllipticalOrbit};
pub use fixed::FixedOrbit;
pub use function::FunctionOrbit;

/// Position of a body over time, expressed in a [`ReferenceFrame`].
///
/// Times are Julian dates (TDB), distances kilometers.
pub trait Orbit: fmt::Debug {
    fn frame(&self) -> &Arc<ReferenceFrame>;

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>);

    /// Position in frame coordinates.
    fn frame_position_at(&self, time: f64) -> DVec3;

    /// Orientation of the orbit plane in frame coordinates.
    fn frame_plane_orientation(&self) -> DQuat {
        DQuat::IDENTITY
    }

    fn is_periodic(&self) -> bool;

    fn is_closed(&self) -> bool;

    /// Dynamic orbits change position with time.
    fn is_dynamic(&self) -> bool;

    /// Period in days; infinite for non-periodic orbits.
    fn period(&self) -> f64;

    /// Mean motion in radians per day.
    fn mean_motion(&self) -> f64 {
        let period = self.period();
        if period.is_finite() && period > 0.0 {
            std::f64::consts::TAU / period
        } else {
            0.0
        }
    }

    /// Largest distance from the frame center the body can reach.
    fn bounding_radius(&self) -> f64;

    /// Independent copy, for copy-on-modify.
    fn make_copy(&self) -> Box<dyn Orbit>;

    fn absolute_reference_point(&self, resolver: &dyn FrameResolver) -> DVec3 {
        self.frame().absolute_reference_point(resolver)
    }

    /// Position relative to the absolute reference point.
    fn local_position_at(&self, time: f64, resolver: &dyn FrameResolver) -> DVec3 {
        self.frame()
            .local_from_frame_position(self.frame_position_at(time), resolver)
    }

    /// Orientation of the orbit plane relative to J2000 ecliptic axes.
    fn plane_orientation(&self, resolver: &dyn FrameResolver) -> DQuat {
        self.frame()
            .absolute_from_frame_orientation(self.frame_plane_orientation(), resolver)
    }
}
