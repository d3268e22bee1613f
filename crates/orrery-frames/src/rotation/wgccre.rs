//! IAU WGCCRE rotation models.
//!
//! Pole right ascension and declination are given in J2000 equatorial
//! coordinates; the frame of these rotations is normally the barycentric
//! J2000 ecliptic.

use std::sync::Arc;

use glam::DQuat;
use orrery_math::{
    pole_orientation, rotation_z,
    units::{DAYS_PER_JULIAN_CENTURY, J2000},
};

use crate::{PoleOrientation, ReferenceFrame, Rotation, RotationError, RotationProvider, WarnLatch};

/// Validity half-window of the closed-form series, ±10 000 years.
pub const VALIDITY_DAYS: f64 = 10_000.0 * 365.25;

/// Linear WGCCRE model, angles in degrees.
///
/// `α = α₀ + α₁T`, `δ = δ₀ + δ₁T`, `W = W₀ + W₁d` where `T` is Julian
/// centuries and `d` days since J2000.
#[derive(Clone, Debug)]
pub struct WgccreSimpleRotation {
    frame: Arc<ReferenceFrame>,
    a0: f64,
    a1: f64,
    d0: f64,
    d1: f64,
    w0: f64,
    w1: f64,
}

impl WgccreSimpleRotation {
    pub fn new(frame: Arc<ReferenceFrame>, a0: f64, a1: f64, d0: f64, d1: f64, w0: f64, w1: f64) -> Self {
        Self {
            frame,
            a0,
            a1,
            d0,
            d1,
            w0,
            w1,
        }
    }

    pub fn elements_at(&self, time: f64) -> PoleOrientation {
        let d = time - J2000;
        let t = d / DAYS_PER_JULIAN_CENTURY;
        PoleOrientation {
            right_ascension: (self.a0 + self.a1 * t).to_radians(),
            declination: (self.d0 + self.d1 * t).to_radians(),
            meridian: (self.w0 + self.w1 * d).to_radians(),
        }
    }
}

impl Rotation for WgccreSimpleRotation {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_equatorial_orientation_at(&self, time: f64) -> DQuat {
        let e = self.elements_at(time);
        pole_orientation(e.right_ascension, e.declination)
    }

    fn frame_rotation_at(&self, time: f64) -> DQuat {
        let e = self.elements_at(time);
        pole_orientation(e.right_ascension, e.declination) * rotation_z(e.meridian)
    }

    fn is_flipped(&self) -> bool {
        self.w1 < 0.0
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn period(&self) -> f64 {
        if self.w1 != 0.0 {
            360.0 / self.w1.abs()
        } else {
            f64::INFINITY
        }
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(self.clone())
    }
}

/// Series-based WGCCRE model evaluated by an external provider.
///
/// Dates outside the validity window are clamped to its ends.
#[derive(Clone, Debug)]
pub struct WgccreComplexRotation {
    frame: Arc<ReferenceFrame>,
    provider: Arc<dyn RotationProvider>,
    period: f64,
    flipped: bool,
    out_of_range: WarnLatch,
    failed: WarnLatch,
}

impl WgccreComplexRotation {
    /// `period` is the nominal sidereal period in days, negative when retrograde.
    pub fn new(frame: Arc<ReferenceFrame>, provider: Arc<dyn RotationProvider>, period: f64) -> Self {
        Self {
            frame,
            provider,
            period: period.abs(),
            flipped: period < 0.0,
            out_of_range: WarnLatch::new(),
            failed: WarnLatch::new(),
        }
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let clamped = time.clamp(J2000 - VALIDITY_DAYS, J2000 + VALIDITY_DAYS);
        if clamped != time && self.out_of_range.first() {
            tracing::warn!(jd = time, "Rotation requested outside its validity window, clamping");
        }
        clamped
    }

    fn elements_at(&self, time: f64) -> Result<PoleOrientation, RotationError> {
        let jd = self.clamp_time(time);
        let elements = self
            .provider
            .pole(jd)
            .ok_or(RotationError::MissingPole(jd))?;
        if elements.right_ascension.is_finite()
            && elements.declination.is_finite()
            && elements.meridian.is_finite()
        {
            Ok(elements)
        } else {
            Err(RotationError::NonFinite(jd))
        }
    }

    fn report(&self, err: RotationError) {
        if self.failed.first() {
            tracing::warn!(error = %err, "Rotation model failed, using identity orientation");
        }
    }

    /// Whether the provider ever failed to produce rotation elements.
    pub fn is_unknown(&self) -> bool {
        self.failed.is_triggered()
    }
}

impl Rotation for WgccreComplexRotation {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_equatorial_orientation_at(&self, time: f64) -> DQuat {
        match self.elements_at(time) {
            Ok(e) => pole_orientation(e.right_ascension, e.declination),
            Err(err) => {
                self.report(err);
                DQuat::IDENTITY
            }
        }
    }

    fn frame_rotation_at(&self, time: f64) -> DQuat {
        match self.elements_at(time) {
            Ok(e) => pole_orientation(e.right_ascension, e.declination) * rotation_z(e.meridian),
            Err(err) => {
                self.report(err);
                DQuat::IDENTITY
            }
        }
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn period(&self) -> f64 {
        self.period
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(self.clone())
    }
}
