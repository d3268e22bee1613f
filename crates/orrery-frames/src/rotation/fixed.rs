use std::sync::Arc;

use glam::DQuat;

use crate::{ReferenceFrame, Rotation};

/// Constant orientation in its frame.
#[derive(Clone, Debug)]
pub struct FixedRotation {
    frame: Arc<ReferenceFrame>,
    orientation: DQuat,
}

impl FixedRotation {
    pub fn new(frame: Arc<ReferenceFrame>, orientation: DQuat) -> Self {
        Self { frame, orientation }
    }

    pub fn identity(frame: Arc<ReferenceFrame>) -> Self {
        Self::new(frame, DQuat::IDENTITY)
    }
}

impl Rotation for FixedRotation {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_equatorial_orientation_at(&self, _time: f64) -> DQuat {
        self.orientation
    }

    fn frame_rotation_at(&self, _time: f64) -> DQuat {
        self.orientation
    }

    fn is_dynamic(&self) -> bool {
        false
    }

    fn period(&self) -> f64 {
        f64::INFINITY
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(self.clone())
    }
}
