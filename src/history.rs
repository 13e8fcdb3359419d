use image::RgbImage;
use std::collections::VecDeque;

// ============================================================================
// SNAPSHOT HISTORY - linear undo over whole-image copies
// ============================================================================

/// Undo history of full image snapshots.
///
/// Entry 0 is the image as loaded and can never be undone; the last entry is
/// always the image being displayed and edited.
pub struct SnapshotHistory {
    snapshots: VecDeque<RgbImage>,
    /// Cap on stored snapshots, counting the original. `0` = unlimited.
    max_history_size: usize,
    /// Running byte total across all snapshots.
    total_memory: usize,
}

impl SnapshotHistory {
    pub fn new(original: RgbImage) -> Self {
        Self::with_limit(original, 0)
    }

    pub fn with_limit(original: RgbImage, max_history_size: usize) -> Self {
        let total_memory = original.as_raw().len();
        let mut snapshots = VecDeque::new();
        snapshots.push_back(original);
        Self {
            snapshots,
            max_history_size,
            total_memory,
        }
    }

    pub fn push(&mut self, image: RgbImage) {
        self.total_memory += image.as_raw().len();
        self.snapshots.push_back(image);
        self.prune();
    }

    /// Drop the newest snapshot. Returns `false` (and changes nothing) when
    /// only the original is left.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        if let Some(removed) = self.snapshots.pop_back() {
            self.total_memory = self.total_memory.saturating_sub(removed.as_raw().len());
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() > 1
    }

    pub fn current(&self) -> &RgbImage {
        // The deque is never empty: `undo` refuses to pop the original.
        &self.snapshots[self.snapshots.len() - 1]
    }

    #[cfg(test)]
    fn original(&self) -> &RgbImage {
        &self.snapshots[0]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Bytes held by all snapshots (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// Discard the oldest edits beyond the cap, keeping the original.
    fn prune(&mut self) {
        if self.max_history_size == 0 {
            return;
        }
        let limit = self.max_history_size.max(2);
        while self.snapshots.len() > limit {
            if let Some(removed) = self.snapshots.remove(1) {
                self.total_memory = self.total_memory.saturating_sub(removed.as_raw().len());
            }
        }
    }
}
