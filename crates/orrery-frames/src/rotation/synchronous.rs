use std::sync::Arc;

use glam::DQuat;
use orrery_math::rotation_z;

use crate::{Orbit, ReferenceFrame, Rotation};

/// Spin locked to the orbital mean motion of the body.
#[derive(Clone, Debug)]
pub struct SynchronousRotation {
    frame: Arc<ReferenceFrame>,
    epoch: f64,
    mean_motion: f64,
    meridian_angle: f64,
    equator: DQuat,
}

impl SynchronousRotation {
    /// The spin rate is taken from `orbit` when the rotation is built.
    pub fn new(
        frame: Arc<ReferenceFrame>,
        orbit: &dyn Orbit,
        equator: DQuat,
        meridian_angle: f64,
        epoch: f64,
    ) -> Self {
        Self {
            frame,
            epoch,
            mean_motion: orbit.mean_motion(),
            meridian_angle,
            equator,
        }
    }

    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }
}

impl Rotation for SynchronousRotation {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_equatorial_orientation_at(&self, _time: f64) -> DQuat {
        self.equator
    }

    fn frame_rotation_at(&self, time: f64) -> DQuat {
        let angle = (time - self.epoch) * self.mean_motion + self.meridian_angle;
        self.equator * rotation_z(angle)
    }

    fn is_dynamic(&self) -> bool {
        self.mean_motion != 0.0
    }

    fn period(&self) -> f64 {
        if self.mean_motion != 0.0 {
            std::f64::consts::TAU / self.mean_motion.abs()
        } else {
            f64::INFINITY
        }
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(self.clone())
    }
}
