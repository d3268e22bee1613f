use std::cell::Cell;
use std::sync::Arc;

use glam::DQuat;

use crate::{ReferenceFrame, Rotation};

/// Memoizes the last evaluation of an expensive rotation model.
///
/// Repeated queries for the same time return the cached orientation without
/// calling the inner model again.
#[derive(Clone, Debug)]
pub struct CachedRotation<R> {
    inner: R,
    equatorial: Cell<Option<(f64, DQuat)>>,
    rotation: Cell<Option<(f64, DQuat)>>,
}

impl<R: Rotation> CachedRotation<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            equatorial: Cell::new(None),
            rotation: Cell::new(None),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn memoized(cache: &Cell<Option<(f64, DQuat)>>, time: f64, eval: impl FnOnce() -> DQuat) -> DQuat {
        if let Some((cached_time, q)) = cache.get()
            && cached_time == time
        {
            return q;
        }
        let q = eval();
        cache.set(Some((time, q)));
        q
    }
}

impl<R: Rotation + Clone + 'static> Rotation for CachedRotation<R> {
    fn frame(&self) -> &Arc<ReferenceFrame> {
        self.inner.frame()
    }

    fn set_frame(&mut self, frame: Arc<ReferenceFrame>) {
        self.inner.set_frame(frame);
    }

    fn frame_equatorial_orientation_at(&self, time: f64) -> DQuat {
        Self::memoized(&self.equatorial, time, || {
            self.inner.frame_equatorial_orientation_at(time)
        })
    }

    fn frame_rotation_at(&self, time: f64) -> DQuat {
        Self::memoized(&self.rotation, time, || self.inner.frame_rotation_at(time))
    }

    fn is_flipped(&self) -> bool {
        self.inner.is_flipped()
    }

    fn is_dynamic(&self) -> bool {
        self.inner.is_dynamic()
    }

    fn period(&self) -> f64 {
        self.inner.period()
    }

    fn make_copy(&self) -> Box<dyn Rotation> {
        Box::new(Self::new(self.inner.clone()))
    }
}
