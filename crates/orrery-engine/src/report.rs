use orrery_lod::LodChanges;

/// What one [`Engine::tick`](crate::Engine::tick) did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub update_id: u64,
    /// Julian date the frame was evaluated at.
    pub time: f64,
    /// Anchors in view.
    pub visible: usize,
    /// Visible anchors drawn as bodies rather than points.
    pub resolved: usize,
    /// Anchors whose update failed and kept their previous state.
    pub failures: usize,
    /// LOD deltas summed over every surface.
    pub lod: LodChanges,
    /// Deepest patch level over every surface.
    pub max_lod: u8,
    pub patches_shown: usize,
    pub regions: usize,
    pub points: usize,
    pub halos: usize,
}

impl FrameReport {
    pub(crate) fn add_lod(&mut self, changes: &LodChanges) {
        self.lod.split += changes.split;
        self.lod.merged += changes.merged;
        self.lod.shown += changes.shown;
        self.lod.removed += changes.removed;
        self.lod.restitched += changes.restitched;
    }

    /// True when no surface changed level this frame.
    pub fn lod_settled(&self) -> bool {
        self.lod.split == 0 && self.lod.merged == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_changes_accumulate() {
        let mut report = FrameReport::default();
        assert!(report.lod_settled());
        report.add_lod(&LodChanges {
            split: 2,
            shown: 8,
            ..LodChanges::default()
        });
        report.add_lod(&LodChanges {
            merged: 1,
            restitched: 3,
            ..LodChanges::default()
        });
        assert_eq!(report.lod.split, 2);
        assert_eq!(report.lod.merged, 1);
        assert_eq!(report.lod.restitched, 3);
        assert_eq!(report.lod.total(), 11);
        assert!(!report.lod_settled());
    }
}
