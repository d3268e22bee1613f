use std::f64::consts::TAU;
use std::sync::Arc;

use glam::{DQuat, DVec3};
use orrery_math::{rotation_x, rotation_z, units::J2000};

use crate::{Orbit, ReferenceFrame, WarnLatch, kepler};

/// Classical elements, angles in radians and times in days.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipticalElements {
    pub epoch: f64,
    pub pericenter_distance: f64,
    pub eccentricity: f64,
    /// Radians per day. For near-parabolic orbits this is the parabolic rate.
    pub mean_motion: f64,
    pub mean_anomaly: f64,
    pub argument_of_periapsis: f64,
    pub inclination: f64,
    pub ascending_node: f64,
}

impl Default for EllipticalElements {
    fn default() -> Self {
        Self {
            epoch: J2000,
            pericenter_distance: 1.0,
            eccentricity: 0.0,
            mean_motion: 0.0,
            mean_anomaly: 0.0,
            argument_of_periapsis: 0.0,
            inclination: 0.0,
            ascending_node: 0.0,
        }
    }
}

impl EllipticalElements {
    /// Elements of a closed orbit from its semi-major axis and period in days.
    pub fn from_semi_major_axis(semi_major_axis: f64, eccentricity: f64, period: f64) -> Self {
        Self {
            pericenter_distance: semi_major_axis * (1.0 - eccentricity),
            eccentricity,
            mean_motion: TAU / period,
            ..Self::default()
        }
    }
}

/// Keplerian orbit.
///
/// The plane rotation `Rz(Ω) · Rx(i) · Rz(ω)` is composed once at construction.
#[derive(Clone, Debug)]
pub struct EllipticalOrbit {
    frame: Arc<ReferenceFrame>,
    elements: EllipticalElements,
    plane: DQuat,
    solver_fault: WarnLatch,
}

impl EllipticalOrbit {
    pub fn new(frame: Arc<ReferenceFrame>, elements: EllipticalElements) -> Self {
        let plane = rotation_z(elements.ascending_node)
            * rotation_x(elements.inclination)
            * rotation_z(elements.argument_of_periapsis);
        Self {
            frame,
            elements,
            plane,
            solver_fault: WarnLatch::new(),
        }
    }

    pub fn elements(&self) -> &EllipticalElements {
        &self.elements
    }

    pub fn mean_anomaly_at(&self, time: f64) -> f64 {
        self.elements.mean_anomaly + self.elements.mean_motion * (time - self.elements.epoch)
    }

    pub fn semi_major_axis(&self) -> f64 {
        let e = &self.elements;
        e.pericenter_distance / (1.0 - e.eccentricity)
    }
}

impl Orbit for EllipticalOrbit {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_position_at(&self, time: f64) -> DVec3 {
        let e = &self.elements;
        match kepler::solve(e.pericenter_distance, e.eccentricity, self.mean_anomaly_at(time)) {
            Ok(solution) => {
                if !solution.converged && self.solver_fault.first() {
                    tracing::warn!(
                        eccentricity = e.eccentricity,
                        iterations = solution.iterations,
                        "Kepler solver did not converge, using best estimate"
                    );
                }
                self.plane * solution.position.extend(0.0)
            }
            Err(err) => {
                if self.solver_fault.first() {
                    tracing::warn!(error = %err, "Elliptical orbit evaluation failed");
                }
                DVec3::ZERO
            }
        }
    }

    fn frame_plane_orientation(&self) -> DQuat {
        self.plane
    }

    fn is_periodic(&self) -> bool {
        self.elements.eccentricity < 1.0
    }

    fn is_closed(&self) -> bool {
        self.elements.eccentricity < 1.0
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn period(&self) -> f64 {
        if self.is_periodic() && self.elements.mean_motion != 0.0 {
            TAU / self.elements.mean_motion.abs()
        } else {
            f64::INFINITY
        }
    }

    fn mean_motion(&self) -> f64 {
        self.elements.mean_motion
    }

    fn bounding_radius(&self) -> f64 {
        let e = &self.elements;
        if e.eccentricity < 1.0 {
            e.pericenter_distance * (1.0 + e.eccentricity) / (1.0 - e.eccentricity)
        } else {
            f64::INFINITY
        }
    }

    fn make_copy(&self) -> Box<dyn Orbit> {
        Box::new(self.clone())
    }
}
