//! Orbit and rotation error types.
//!
//! These never escape an evaluation call: orbits and rotations convert them
//! into sentinel values after logging.

/// Errors raised while evaluating an orbit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrbitError {
    /// Eccentricity is negative or not finite.
    #[error("invalid eccentricity {0}")]
    InvalidEccentricity(f64),

    /// Mean anomaly or pericenter distance is not finite.
    #[error("non-finite orbit parameter")]
    NonFinite,

    /// The conic solution degenerated (division by zero or overflow).
    #[error("degenerate conic solution for e = {0}")]
    DegenerateConic(f64),

    /// The ephemeris provider has no data for the body.
    #[error("no ephemeris for body {body} at jd {jd}")]
    MissingEphemeris { body: usize, jd: f64 },
}

/// Errors raised while evaluating a rotation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RotationError {
    /// The rotation provider returned nothing for the requested date.
    #[error("no rotation elements at jd {0}")]
    MissingPole(f64),

    /// The computed orientation is not finite.
    #[error("non-finite rotation elements at jd {0}")]
    NonFinite(f64),
}
