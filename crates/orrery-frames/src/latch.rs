use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot flag used to log a recovered fault only the first time it happens.
///
/// Cloning yields a fresh, untriggered latch so copies report their own faults.
#[derive(Debug, Default)]
pub struct WarnLatch(AtomicBool);

impl WarnLatch {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns true the first time it is called, false afterwards.
    pub fn first(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Clone for WarnLatch {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_fires_once() {
        let latch = WarnLatch::new();
        assert!(latch.first());
        assert!(!latch.first());
        assert!(latch.is_triggered());
        assert!(!latch.clone().is_triggered());
    }
}
