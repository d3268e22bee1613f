//! Reference frames.
//!
//! Conversions between a frame and the local space of its absolute reference
//! point:
//!
//! ```text
//! local_from_frame(p)    = center + orientation * p
//! frame_from_local(p)    = orientation⁻¹ * (p - center)
//! absolute_from_frame(q) = orientation * q
//! frame_from_absolute(q) = orientation⁻¹ * q
//! ```

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{DQuat, DVec3};
use orrery_math::{equatorial_j2000_orientation, orientation_from_incl_an};

use crate::{AnchorId, FrameAnchorState, FrameResolver, WarnLatch};

/// The closed set of frame kinds.
#[derive(Clone, Debug)]
pub enum FrameKind {
    /// J2000 ecliptic axes centered on the solar system barycenter.
    EclipticJ2000Barycentric,
    /// J2000 equatorial axes centered on the solar system barycenter.
    EquatorialJ2000Barycentric,
    /// J2000 ecliptic axes centered on an anchor.
    EclipticJ2000 { anchor: AnchorId },
    /// J2000 equatorial axes centered on an anchor.
    EquatorialJ2000 { anchor: AnchorId },
    /// Axes given by a pole in J2000 equatorial coordinates and a node longitude.
    Celestial {
        anchor: Option<AnchorId>,
        right_ascension: f64,
        declination: f64,
        longitude_at_node: f64,
        orientation: DQuat,
    },
    /// Axes of the orbit plane of an anchor.
    OrbitPlane { anchor: AnchorId },
    /// Axes of the equator of an anchor, without spin.
    EquatorialPlane { anchor: AnchorId },
    /// Axes rotating with an anchor.
    Synchronous { anchor: AnchorId },
    /// Fixed offset from another frame.
    Relative {
        base: Arc<ReferenceFrame>,
        position: DVec3,
        orientation: DQuat,
    },
}

/// A local coordinate basis, shared between the orbit, rotation and anchor
/// that use it.
#[derive(Clone, Debug)]
pub struct ReferenceFrame {
    kind: FrameKind,
    missing_anchor: WarnLatch,
}

impl ReferenceFrame {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            missing_anchor: WarnLatch::new(),
        }
    }

    pub fn ecliptic_j2000() -> Self {
        Self::new(FrameKind::EclipticJ2000Barycentric)
    }

    pub fn equatorial_j2000() -> Self {
        Self::new(FrameKind::EquatorialJ2000Barycentric)
    }

    pub fn anchored_ecliptic(anchor: AnchorId) -> Self {
        Self::new(FrameKind::EclipticJ2000 { anchor })
    }

    pub fn anchored_equatorial(anchor: AnchorId) -> Self {
        Self::new(FrameKind::EquatorialJ2000 { anchor })
    }

    /// Celestial frame from the pole coordinates and node longitude, in radians.
    pub fn celestial(
        anchor: Option<AnchorId>,
        right_ascension: f64,
        declination: f64,
        longitude_at_node: f64,
    ) -> Self {
        let orientation = equatorial_j2000_orientation()
            * orientation_from_incl_an(FRAC_PI_2 - declination, right_ascension + FRAC_PI_2)
            * DQuat::from_axis_angle(DVec3::Z, longitude_at_node);
        Self::new(FrameKind::Celestial {
            anchor,
            right_ascension,
            declination,
            longitude_at_node,
            orientation,
        })
    }

    pub fn orbit_plane(anchor: AnchorId) -> Self {
        Self::new(FrameKind::OrbitPlane { anchor })
    }

    pub fn equatorial_plane(anchor: AnchorId) -> Self {
        Self::new(FrameKind::EquatorialPlane { anchor })
    }

    pub fn synchronous(anchor: AnchorId) -> Self {
        Self::new(FrameKind::Synchronous { anchor })
    }

    pub fn relative(base: Arc<ReferenceFrame>, position: DVec3, orientation: DQuat) -> Self {
        Self::new(FrameKind::Relative {
            base,
            position,
            orientation,
        })
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    /// The anchor this frame follows, if any.
    pub fn anchor(&self) -> Option<AnchorId> {
        match &self.kind {
            FrameKind::EclipticJ2000Barycentric | FrameKind::EquatorialJ2000Barycentric => None,
            FrameKind::EclipticJ2000 { anchor }
            | FrameKind::EquatorialJ2000 { anchor }
            | FrameKind::OrbitPlane { anchor }
            | FrameKind::EquatorialPlane { anchor }
            | FrameKind::Synchronous { anchor } => Some(*anchor),
            FrameKind::Celestial { anchor, .. } => *anchor,
            FrameKind::Relative { base, .. } => base.anchor(),
        }
    }

    /// Frames whose orientation depends on the anchor's motion need the anchor
    /// updated before they are evaluated.
    pub fn is_dynamic(&self) -> bool {
        match &self.kind {
            FrameKind::OrbitPlane { .. }
            | FrameKind::EquatorialPlane { .. }
            | FrameKind::Synchronous { .. } => true,
            FrameKind::Relative { base, .. } => base.is_dynamic(),
            _ => false,
        }
    }

    fn anchor_state(&self, anchor: AnchorId, resolver: &dyn FrameResolver) -> FrameAnchorState {
        match resolver.frame_anchor(anchor) {
            Some(state) => state,
            None => {
                if self.missing_anchor.first() {
                    tracing::warn!(%anchor, "Reference frame anchor is not resolvable");
                }
                FrameAnchorState::default()
            }
        }
    }

    /// Origin of the frame relative to its absolute reference point.
    pub fn center(&self, resolver: &dyn FrameResolver) -> DVec3 {
        match &self.kind {
            FrameKind::Relative { base, position, .. } => {
                base.local_from_frame_position(*position, resolver)
            }
            _ => match self.anchor() {
                Some(anchor) => self.anchor_state(anchor, resolver).local_position,
                None => DVec3::ZERO,
            },
        }
    }

    /// Rotation from frame axes to J2000 ecliptic axes.
    pub fn orientation(&self, resolver: &dyn FrameResolver) -> DQuat {
        match &self.kind {
            FrameKind::EclipticJ2000Barycentric | FrameKind::EclipticJ2000 { .. } => {
                DQuat::IDENTITY
            }
            FrameKind::EquatorialJ2000Barycentric | FrameKind::EquatorialJ2000 { .. } => {
                equatorial_j2000_orientation()
            }
            FrameKind::Celestial { orientation, .. } => *orientation,
            FrameKind::OrbitPlane { anchor } => {
                self.anchor_state(*anchor, resolver).orbit_orientation
            }
            FrameKind::EquatorialPlane { anchor } => {
                self.anchor_state(*anchor, resolver).equatorial_orientation
            }
            FrameKind::Synchronous { anchor } => self.anchor_state(*anchor, resolver).orientation,
            FrameKind::Relative {
                base, orientation, ..
            } => base.orientation(resolver) * *orientation,
        }
    }

    /// Absolute position positions in this frame are relative to.
    pub fn absolute_reference_point(&self, resolver: &dyn FrameResolver) -> DVec3 {
        match &self.kind {
            FrameKind::Relative { base, .. } => base.absolute_reference_point(resolver),
            _ => match self.anchor() {
                Some(anchor) => self.anchor_state(anchor, resolver).global_position,
                None => DVec3::ZERO,
            },
        }
    }

    pub fn local_from_frame_position(&self, p: DVec3, resolver: &dyn FrameResolver) -> DVec3 {
        self.center(resolver) + self.orientation(resolver) * p
    }

    pub fn frame_from_local_position(&self, p: DVec3, resolver: &dyn FrameResolver) -> DVec3 {
        self.orientation(resolver).inverse() * (p - self.center(resolver))
    }

    pub fn absolute_from_frame_orientation(&self, q: DQuat, resolver: &dyn FrameResolver) -> DQuat {
        self.orientation(resolver) * q
    }

    pub fn frame_from_absolute_orientation(&self, q: DQuat, resolver: &dyn FrameResolver) -> DQuat {
        self.orientation(resolver).inverse() * q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticResolver;

    const EPSILON: f64 = 1e-12;

    fn resolver() -> StaticResolver {
        let mut resolver = StaticResolver::new();
        resolver.insert(
            AnchorId(1),
            FrameAnchorState {
                global_position: DVec3::new(1e8, 0.0, 0.0),
                local_position: DVec3::new(10.0, -20.0, 30.0),
                orientation: DQuat::from_axis_angle(DVec3::Z, 0.4),
                equatorial_orientation: DQuat::from_axis_angle(DVec3::X, 0.2),
                orbit_orientation: DQuat::from_axis_angle(DVec3::Y, 0.1),
            },
        );
        resolver
    }

    fn all_frames() -> Vec<ReferenceFrame> {
        let anchor = AnchorId(1);
        vec![
            ReferenceFrame::ecliptic_j2000(),
            ReferenceFrame::equatorial_j2000(),
            ReferenceFrame::anchored_ecliptic(anchor),
            ReferenceFrame::anchored_equatorial(anchor),
            ReferenceFrame::celestial(Some(anchor), 1.1, 0.3, 0.5),
            ReferenceFrame::orbit_plane(anchor),
            ReferenceFrame::equatorial_plane(anchor),
            ReferenceFrame::synchronous(anchor),
            ReferenceFrame::relative(
                Arc::new(ReferenceFrame::synchronous(anchor)),
                DVec3::new(5.0, 5.0, 0.0),
                DQuat::from_axis_angle(DVec3::X, 1.0),
            ),
        ]
    }

    #[test]
    fn test_position_round_trip_for_every_frame() {
        let resolver = resolver();
        let p = DVec3::new(1234.5, -0.25, 42.0);
        for frame in all_frames() {
            let local = frame.local_from_frame_position(p, &resolver);
            let back = frame.frame_from_local_position(local, &resolver);
            assert!(
                (back - p).length() < EPSILON * p.length().max(1.0) * 10.0,
                "{:?}: {back:?} != {p:?}",
                frame.kind()
            );
        }
    }

    #[test]
    fn test_orientation_round_trip() {
        let resolver = resolver();
        let q = DQuat::from_axis_angle(DVec3::new(1.0, 1.0, 0.0).normalize(), 0.7);
        for frame in all_frames() {
            let abs = frame.absolute_from_frame_orientation(q, &resolver);
            let back = frame.frame_from_absolute_orientation(abs, &resolver);
            assert!(back.abs_diff_eq(q, EPSILON) || back.abs_diff_eq(-q, EPSILON));
        }
    }

    #[test]
    fn test_anchored_frame_uses_anchor_state() {
        let resolver = resolver();
        let frame = ReferenceFrame::anchored_ecliptic(AnchorId(1));
        assert_eq!(frame.center(&resolver), DVec3::new(10.0, -20.0, 30.0));
        assert_eq!(
            frame.absolute_reference_point(&resolver),
            DVec3::new(1e8, 0.0, 0.0)
        );
        assert_eq!(frame.orientation(&resolver), DQuat::IDENTITY);
    }

    #[test]
    fn test_missing_anchor_falls_back_to_identity() {
        let frame = ReferenceFrame::synchronous(AnchorId(99));
        assert_eq!(frame.center(&()), DVec3::ZERO);
        assert_eq!(frame.orientation(&()), DQuat::IDENTITY);
    }

    #[test]
    fn test_relative_frame_composes_offset() {
        let resolver = resolver();
        let base = Arc::new(ReferenceFrame::anchored_ecliptic(AnchorId(1)));
        let frame = ReferenceFrame::relative(base, DVec3::X, DQuat::IDENTITY);
        assert_eq!(frame.center(&resolver), DVec3::new(11.0, -20.0, 30.0));
        assert_eq!(frame.anchor(), Some(AnchorId(1)));
    }

    #[test]
    fn test_celestial_pole_direction() {
        let (ra, dec) = (0.7_f64, 0.3_f64);
        let frame = ReferenceFrame::celestial(None, ra, dec, 0.0);
        let pole = frame.orientation(&()) * DVec3::Z;
        let expected = equatorial_j2000_orientation()
            * DVec3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
        assert!((pole - expected).length() < EPSILON);
    }
}
