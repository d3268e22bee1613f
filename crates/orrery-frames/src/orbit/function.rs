use std::sync::Arc;

use glam::DVec3;

use crate::{EphemerisProvider, Orbit, OrbitError, ReferenceFrame, WarnLatch};

/// Orbit whose positions come from an external ephemeris.
///
/// Only the average period, semi-major axis and eccentricity are known here,
/// and they are used for bounding.
#[derive(Clone, Debug)]
pub struct FunctionOrbit {
    frame: Arc<ReferenceFrame>,
    provider: Arc<dyn EphemerisProvider>,
    body: usize,
    average_period: f64,
    semi_major_axis: f64,
    eccentricity: f64,
    missing: WarnLatch,
}

impl FunctionOrbit {
    pub fn new(
        frame: Arc<ReferenceFrame>,
        provider: Arc<dyn EphemerisProvider>,
        body: usize,
        average_period: f64,
        semi_major_axis: f64,
        eccentricity: f64,
    ) -> Self {
        Self {
            frame,
            provider,
            body,
            average_period,
            semi_major_axis,
            eccentricity,
            missing: WarnLatch::new(),
        }
    }

    pub fn body(&self) -> usize {
        self.body
    }

    /// Whether the provider ever failed to produce a position for this body.
    pub fn is_unknown(&self) -> bool {
        self.missing.is_triggered()
    }
}

impl Orbit for FunctionOrbit {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_position_at(&self, time: f64) -> DVec3 {
        match self.provider.position(time, self.body) {
            Some(position) if position.is_finite() => position,
            _ => {
                if self.missing.first() {
                    let err = OrbitError::MissingEphemeris {
                        body: self.body,
                        jd: time,
                    };
                    tracing::warn!(error = %err, "Ephemeris unavailable, body placed at frame center");
                }
                DVec3::ZERO
            }
        }
    }

    fn is_periodic(&self) -> bool {
        self.average_period.is_finite() && self.average_period > 0.0
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn period(&self) -> f64 {
        if self.is_periodic() {
            self.average_period
        } else {
            f64::INFINITY
        }
    }

    fn bounding_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    fn make_copy(&self) -> Box<dyn Orbit> {
        Box::new(self.clone())
    }
}
