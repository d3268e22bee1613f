use std::f64::consts::TAU;
use std::sync::Arc;

use glam::DQuat;
use orrery_math::{orientation_from_incl_an, rotation_z};

use crate::{ReferenceFrame, Rotation};

/// Constant-rate spin about a fixed pole.
///
/// `angle(t) = (t - epoch) * mean_motion + meridian_angle`, negated for
/// retrograde rotators.
#[derive(Clone, Debug)]
pub struct UniformRotation {
    frame: Arc<ReferenceFrame>,
    epoch: f64,
    period: f64,
    mean_motion: f64,
    meridian_angle: f64,
    equator: DQuat,
    flipped: bool,
}

impl UniformRotation {
    /// A negative `period` (days) denotes retrograde rotation.
    pub fn new(
        frame: Arc<ReferenceFrame>,
        period: f64,
        inclination: f64,
        ascending_node: f64,
        meridian_angle: f64,
        epoch: f64,
    ) -> Self {
        let flipped = period < 0.0;
        let period = period.abs();
        let mean_motion = if period > 0.0 { TAU / period } else { 0.0 };
        Self {
            frame,
            epoch,
            period,
            mean_motion,
            meridian_angle,
            equator: orientation_from_incl_an(inclination, ascending_node),
            flipped,
        }
    }

    pub fn angle_at(&self, time: f64) -> f64 {
        let angle = (time - self.epoch) * self.mean_motion + self.meridian_angle;
        if self.flipped { -angle } else { angle }
    }
}

impl Rotation for UniformRotation {
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
        self.equator * rotation_z(self.angle_at(time))
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn is_dynamic(&self) -> bool {
        self.mean_motion != 0.0
    }

    fn period(&self) -> f64 {
        if self.mean_motion != 0.0 {
            self.period
        } else {
            f64::INFINITY
        }
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::f64::consts::FRAC_PI_2;

    fn frame() -> Arc<ReferenceFrame> {
        Arc::new(ReferenceFrame::ecliptic_j2000())
    }

    #[test]
    fn test_quarter_period_turns_quarter() {
        let r = UniformRotation::new(frame(), 1.0, 0.0, 0.0, 0.0, 0.0);
        let x = r.frame_rotation_at(0.25) * DVec3::X;
        assert!((x - DVec3::Y).length() < 1e-12);
        assert!(!r.is_flipped());
    }

    #[test]
    fn test_retrograde_negates_angle() {
        let prograde = UniformRotation::new(frame(), 10.0, 0.0, 0.0, 0.5, 0.0);
        let retrograde = UniformRotation::new(frame(), -10.0, 0.0, 0.0, 0.5, 0.0);
        assert!(retrograde.is_flipped());
        assert!((retrograde.angle_at(3.0) + prograde.angle_at(3.0)).abs() < 1e-15);
        assert_eq!(retrograde.period(), 10.0);
    }

    #[test]
    fn test_equator_tilt_is_independent_of_time() {
        let r = UniformRotation::new(frame(), 1.0, FRAC_PI_2, 0.0, 0.0, 0.0);
        let pole = r.frame_equatorial_orientation_at(123.0) * DVec3::Z;
        assert!((pole - DVec3::NEG_Y).length() < 1e-12);
        let spun_pole = r.frame_rotation_at(0.37) * DVec3::Z;
        assert!((spun_pole - pole).length() < 1e-12);
    }
}
