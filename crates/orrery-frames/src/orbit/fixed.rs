use std::sync::Arc;

use glam::DVec3;

use crate::{Orbit, ReferenceFrame};

/// A body at rest in its frame.
#[derive(Clone, Debug)]
pub struct FixedOrbit {
    frame: Arc<ReferenceFrame>,
    position: DVec3,
}

impl FixedOrbit {
    pub fn new(frame: Arc<ReferenceFrame>, position: DVec3) -> Self {
        Self { frame, position }
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }
}

impl Orbit for FixedOrbit {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        &self.frame
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.frame = frame;
    }

    fn frame_position_at(&self, _time: f64) -> DVec3 {
        self.position
    }

    fn is_periodic(&self) -> bool {
        false
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn is_dynamic(&self) -> bool {
        false
    }

    fn period(&self) -> f64 {
        f64::INFINITY
    }

    fn bounding_radius(&self) -> f64 {
        self.position.length()
    }

    fn make_copy(&self) -> Box<dyn Orbit> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_orbit_is_static() {
        let orbit = FixedOrbit::new(
            Arc::new(ReferenceFrame::ecliptic_j2000()),
            DVec3::new(3.0, 4.0, 0.0),
        );
        assert_eq!(orbit.frame_position_at(0.0), orbit.frame_position_at(1e6));
        assert!(!orbit.is_dynamic());
        assert_eq!(orbit.mean_motion(), 0.0);
        assert_eq!(orbit.bounding_radius(), 5.0);
        assert_eq!(orbit.local_position_at(0.0, &()), DVec3::new(3.0, 4.0, 0.0));
    }
}
