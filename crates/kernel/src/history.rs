use std::collections::VecDeque;

use stockledger_common::Record;

/// Maximum number of snapshots kept on the undo stack.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// A full, independent copy of the record sequence at one point in time.
pub type Snapshot = Vec<Record>;

/// Bounded undo/redo history of full inventory snapshots.
///
/// Every mutation pushes a checkpoint of the state it is about to replace.
/// A fresh checkpoint invalidates the redo stack, so redo is only reachable
/// right after one or more undos.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    capacity: usize,
}

impl History {
    /// Create an empty history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history keeping at most `capacity` undo snapshots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity + 1),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `current` as the state to return to on the next undo.
    pub fn checkpoint(&mut self, current: &[Record]) {
        self.push_undo(current.to_vec());
        self.redo_stack.clear();
        tracing::debug!(
            undo_depth = self.undo_stack.len(),
            records = current.len(),
            "history checkpoint"
        );
    }

    /// Step back one snapshot. `current` is saved for redo.
    ///
    /// Returns `None` and changes nothing when there is nothing to undo.
    pub fn undo(&mut self, current: &[Record]) -> Option<Snapshot> {
        let restored = self.undo_stack.pop_back()?;
        self.redo_stack.push(current.to_vec());
        Some(restored)
    }

    /// Re-apply the most recently undone snapshot. `current` goes back on the
    /// undo stack.
    ///
    /// Returns `None` and changes nothing when there is nothing to redo.
    pub fn redo(&mut self, current: &[Record]) -> Option<Snapshot> {
        let restored = self.redo_stack.pop()?;
        self.push_undo(current.to_vec());
        Some(restored)
    }

    /// Drop all history and make `baseline` the only undo snapshot.
    pub fn reset(&mut self, baseline: &[Record]) {
        self.clear();
        self.undo_stack.push_back(baseline.to_vec());
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Number of snapshots available to undo.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of snapshots available to redo.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Maximum undo depth before the oldest snapshot is evicted.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.capacity {
            // oldest first
            self.undo_stack.pop_front();
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ids: &[i32]) -> Snapshot {
        ids.iter().map(|&id| Record::new(id, "x", 1, 1.0)).collect()
    }

    #[test]
    fn undo_empty_returns_none() {
        let mut h = History::new();
        assert!(h.undo(&state(&[1])).is_none());
        assert_eq!(h.redo_depth(), 0);
    }

    #[test]
    fn redo_empty_returns_none() {
        let mut h = History::new();
        assert!(h.redo(&state(&[1])).is_none());
        assert_eq!(h.undo_depth(), 0);
    }

    #[test]
    fn checkpoint_undo_redo() {
        let mut h = History::new();
        let before = state(&[1]);
        let after = state(&[1, 2]);

        h.checkpoint(&before);
        let restored = h.undo(&after).unwrap();
        assert_eq!(restored, before);
        assert!(h.can_redo());

        let reapplied = h.redo(&restored).unwrap();
        assert_eq!(reapplied, after);
        assert!(!h.can_redo());
        assert_eq!(h.undo_depth(), 1);
    }

    #[test]
    fn checkpoint_clears_redo() {
        let mut h = History::new();
        h.checkpoint(&state(&[]));
        h.undo(&state(&[1]));
        assert!(h.can_redo());

        h.checkpoint(&state(&[]));
        assert!(!h.can_redo());
    }

    #[test]
    fn oldest_snapshot_is_evicted() {
        let mut h = History::new();
        for i in 0..=DEFAULT_HISTORY_CAPACITY as i32 {
            h.checkpoint(&state(&[i]));
        }
        assert_eq!(h.undo_depth(), DEFAULT_HISTORY_CAPACITY);

        let mut current = state(&[999]);
        let mut seen = Vec::new();
        while let Some(prev) = h.undo(&current) {
            seen.push(prev[0].id());
            current = prev;
        }
        // snapshot 0 fell off the bottom
        assert_eq!(seen.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(*seen.last().unwrap(), 1);
    }

    #[test]
    fn checkpoint_after_undo_discards_redo_and_evicts() {
        let mut h = History::with_capacity(2);
        h.checkpoint(&state(&[1]));
        h.checkpoint(&state(&[2]));
        let back = h.undo(&state(&[3])).unwrap();
        h.checkpoint(&state(&[4]));
        h.checkpoint(&state(&[5]));
        assert!(h.redo(&back).is_none());
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let mut h = History::new();
        let mut live = state(&[1]);
        h.checkpoint(&live);
        live[0].set_quantity(50).unwrap();
        let restored = h.undo(&live).unwrap();
        assert_eq!(restored[0].quantity(), 1);
    }

    #[test]
    fn reset_leaves_single_baseline() {
        let mut h = History::new();
        h.checkpoint(&state(&[1]));
        h.checkpoint(&state(&[2]));
        h.undo(&state(&[3]));
        h.reset(&state(&[7]));
        assert_eq!(h.undo_depth(), 1);
        assert_eq!(h.redo_depth(), 0);
        assert_eq!(h.undo(&state(&[])).unwrap()[0].id(), 7);
    }
}
