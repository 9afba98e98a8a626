//! Snapshot undo/redo history.
//!
//! Callers `save()` the state as it stands immediately *before* each
//! mutation. The entry at `index` is the live head: undo writes the live
//! state into it before stepping back, so redo can return to it.
//!
//! - `undo()` requires `index > 0`; `redo()` requires `index < len - 1`.
//! - A `save()` after an undo truncates everything past `index`, so the
//!   abandoned redo branch is unreachable.
//! - At most `max_depth` undo steps are kept; the oldest snapshot is
//!   evicted first and `index` shifts with it.
//!
//! Drag gestures use snapshot batching: `begin_batch` captures the state
//! at gesture start and `end_batch` records it as one step, only if the
//! gesture changed anything.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<T> {
    pub state: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> HistoryEntry<T> {
    fn new(state: T) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<HistoryEntry<T>>,
    index: usize,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    batch_snapshot: Option<T>,
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_depth.min(64) + 1),
            index: 0,
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of undo steps available from the current position.
    pub fn undo_steps(&self) -> usize {
        self.index
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Record `before`, the state about to be mutated. Ignored inside a
    /// batch, whose start snapshot already covers it.
    pub fn save(&mut self, before: &T) {
        if self.batch_depth > 0 {
            return;
        }
        self.push(before.clone());
    }

    fn push(&mut self, before: T) {
        self.entries.truncate(self.index + 1);
        match self.entries.get_mut(self.index) {
            Some(head) => *head = HistoryEntry::new(before.clone()),
            None => self.entries.push_back(HistoryEntry::new(before.clone())),
        }
        // Placeholder head; overwritten with the live state on undo.
        self.entries.push_back(HistoryEntry::new(before));
        self.index = self.entries.len() - 1;

        while self.entries.len() > self.max_depth + 1 {
            self.entries.pop_front();
            self.index -= 1;
        }
    }

    /// Step back. `live` is the current state; returns the state to restore.
    pub fn undo(&mut self, live: &T) -> Option<T> {
        if !self.can_undo() {
            log::trace!("undo at oldest entry");
            return None;
        }
        self.entries[self.index] = HistoryEntry::new(live.clone());
        self.index -= 1;
        Some(self.entries[self.index].state.clone())
    }

    pub fn redo(&mut self, live: &T) -> Option<T> {
        if !self.can_redo() {
            log::trace!("redo at newest entry");
            return None;
        }
        self.entries[self.index] = HistoryEntry::new(live.clone());
        self.index += 1;
        Some(self.entries[self.index].state.clone())
    }

    /// Start a batch group. Nested calls are folded into the outermost one.
    pub fn begin_batch(&mut self, state: &T) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(state.clone());
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and `live`
    /// differs from the start snapshot, one step is recorded. Returns
    /// whether a step was recorded.
    pub fn end_batch(&mut self, live: &T) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        match self.batch_snapshot.take() {
            Some(before) if before != *live => {
                self.push(before);
                true
            }
            _ => false,
        }
    }

    /// Abandon the open batch, returning the state it started from.
    pub fn cancel_batch(&mut self) -> Option<T> {
        self.batch_depth = 0;
        self.batch_snapshot.take()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.batch_depth = 0;
        self.batch_snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mutate `state` by pushing `value`, saving first.
    fn mutate(history: &mut History<Vec<i32>>, state: &mut Vec<i32>, value: i32) {
        history.save(state);
        state.push(value);
    }

    #[test]
    fn boundaries_are_noops() {
        let mut history: History<Vec<i32>> = History::new(50);
        assert!(history.undo(&vec![]).is_none());
        assert!(history.redo(&vec![]).is_none());

        let mut state = vec![];
        mutate(&mut history, &mut state, 1);
        assert!(history.redo(&state).is_none());
        assert_eq!(history.undo(&state), Some(vec![]));
        assert!(history.undo(&vec![]).is_none());
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut history = History::new(50);
        let mut state = vec![];
        mutate(&mut history, &mut state, 1);
        mutate(&mut history, &mut state, 2);

        state = history.undo(&state).unwrap();
        assert_eq!(state, vec![1]);
        state = history.redo(&state).unwrap();
        assert_eq!(state, vec![1, 2]);
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_cap_evicts_oldest() {
        let mut history = History::new(3);
        let mut state = vec![];
        for i in 0..5 {
            mutate(&mut history, &mut state, i);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.undo_steps(), 3);
        for _ in 0..3 {
            state = history.undo(&state).unwrap();
        }
        assert_eq!(state, vec![0, 1]);
        assert!(history.undo(&state).is_none());
    }

    #[test]
    fn batch_records_one_step_only_on_change() {
        let mut history = History::new(50);
        let mut state = vec![0];

        history.begin_batch(&state);
        history.end_batch(&state);
        assert!(!history.can_undo());

        history.begin_batch(&state);
        for i in 1..5 {
            history.save(&state);
            state.push(i);
        }
        assert!(history.end_batch(&state));
        assert_eq!(history.undo_steps(), 1);
        assert_eq!(history.undo(&state), Some(vec![0]));
    }

    #[test]
    fn cancel_batch_returns_start_state() {
        let mut history = History::new(50);
        let mut state = vec![7];
        history.begin_batch(&state);
        state.push(8);
        assert_eq!(history.cancel_batch(), Some(vec![7]));
        assert!(!history.is_batching());
        assert!(!history.can_undo());
    }
}
