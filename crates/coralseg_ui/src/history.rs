//! Bounded undo/redo history of immutable snapshots.
//!
//! The store keeps two stacks of snapshots. Callers record the state *before*
//! a change; undo hands back the previous snapshot and remembers the current
//! one for redo. Every snapshot entering a stack is cloned, so a caller that
//! keeps mutating its live state can never corrupt history.

use std::collections::VecDeque;

use crate::constants::DEFAULT_HISTORY_CAPACITY;
use crate::error::HistoryError;

/// A value that can be stored in a [`HistoryStore`].
///
/// `Clone` must produce a deep copy that shares no mutable state with the
/// source value.
pub trait Snapshot: Clone {
    /// Check that the snapshot is well formed before it enters history.
    fn validate(&self) -> Result<(), HistoryError> {
        Ok(())
    }

    /// Short human-readable label used in log output.
    fn describe(&self) -> String {
        "snapshot".to_string()
    }
}

/// Undo/redo engine with FIFO eviction.
///
/// - `undo_stack`: snapshots that can be restored by undo (most recent at the back)
/// - `redo_stack`: snapshots that can be restored by redo (most recent at the back)
///
/// At most `capacity` snapshots are kept on the undo stack; recording past
/// that evicts the oldest one. Recording clears the redo stack.
///
/// # Example
/// ```
/// use coralseg_ui::{HistoryStore, Snapshot};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Text(String);
/// impl Snapshot for Text {}
///
/// let mut history = HistoryStore::new();
/// history.record(&Text("hello".into())).unwrap();
///
/// let current = Text("hello world".into());
/// let previous = history.undo(&current).unwrap();
/// assert_eq!(previous, Some(Text("hello".into())));
/// assert_eq!(history.redo(), Some(current));
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore<T: Snapshot> {
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    capacity: usize,
}

impl<T: Snapshot> Default for HistoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Snapshot> HistoryStore<T> {
    /// Create an empty store with the default capacity.
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY + 1),
            redo_stack: Vec::new(),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Create an empty store keeping at most `capacity` undo snapshots.
    pub fn with_capacity(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::InvalidCapacity { capacity });
        }
        Ok(Self {
            undo_stack: VecDeque::with_capacity(capacity + 1),
            redo_stack: Vec::new(),
            capacity,
        })
    }

    /// Maximum number of undo snapshots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest snapshots if needed.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::InvalidCapacity { capacity });
        }
        self.capacity = capacity;
        self.evict_overflow();
        Ok(())
    }

    /// Record the state before a change.
    ///
    /// The snapshot is cloned onto the undo stack and the redo stack is
    /// cleared, since a new change starts a new branch of history.
    pub fn record(&mut self, snapshot: &T) -> Result<(), HistoryError> {
        snapshot.validate()?;

        log::debug!("📝 History: recorded '{}'", snapshot.describe());
        self.undo_stack.push_back(snapshot.clone());
        self.evict_overflow();

        if !self.redo_stack.is_empty() {
            log::debug!("History: dropped {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
        Ok(())
    }

    /// Undo: returns the previous snapshot, or `None` if there is nothing to undo.
    ///
    /// `current` is the live state, cloned onto the redo stack so that it can
    /// be restored again. Nothing changes when the undo stack is empty.
    pub fn undo(&mut self, current: &T) -> Result<Option<T>, HistoryError> {
        current.validate()?;

        let Some(previous) = self.undo_stack.pop_back() else {
            log::debug!("History: nothing to undo");
            return Ok(None);
        };

        log::debug!("⏪ History: undo to '{}'", previous.describe());
        self.redo_stack.push(current.clone());
        Ok(Some(previous))
    }

    /// Redo: returns the next snapshot, or `None` if there is nothing to redo.
    ///
    /// A copy of the returned snapshot goes back onto the undo stack.
    pub fn redo(&mut self) -> Option<T> {
        let Some(next) = self.redo_stack.pop() else {
            log::debug!("History: nothing to redo");
            return None;
        };

        log::debug!("⏩ History: redo to '{}'", next.describe());
        self.undo_stack.push_back(next.clone());
        self.evict_overflow();
        Some(next)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo snapshots, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &T> + '_ {
        self.undo_stack.iter()
    }

    /// Redo snapshots, oldest first (the next redo is the last item).
    pub fn redo_entries(&self) -> impl Iterator<Item = &T> + '_ {
        self.redo_stack.iter()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ History cleared");
    }

    fn evict_overflow(&mut self) {
        while self.undo_stack.len() > self.capacity {
            if let Some(evicted) = self.undo_stack.pop_front() {
                log::debug!("History: evicted '{}'", evicted.describe());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        name: &'static str,
        items: Vec<u32>,
    }

    impl Doc {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                items: vec![1, 2, 3],
            }
        }
    }

    impl Snapshot for Doc {
        fn validate(&self) -> Result<(), HistoryError> {
            if self.name.is_empty() {
                return Err(HistoryError::invalid_record("missing name"));
            }
            Ok(())
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    fn names<'a>(entries: impl Iterator<Item = &'a Doc>) -> Vec<&'static str> {
        entries.map(|d| d.name).collect()
    }

    #[test]
    fn test_fresh_store_has_no_history() {
        let mut store: HistoryStore<Doc> = HistoryStore::new();
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(store.undo(&Doc::named("cur")).unwrap(), None);
        assert_eq!(store.redo(), None);
        assert_eq!(store.redo_count(), 0);
    }

    #[test]
    fn test_record_enables_undo() {
        let mut store = HistoryStore::new();
        store.record(&Doc::named("a")).unwrap();
        assert!(store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn test_fifo_eviction_keeps_latest() {
        let mut store = HistoryStore::with_capacity(3).unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            store.record(&Doc::named(name)).unwrap();
        }
        assert_eq!(store.undo_count(), 3);
        assert_eq!(names(store.undo_entries()), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut store = HistoryStore::new();
        store.record(&Doc::named("a")).unwrap();
        store.undo(&Doc::named("b")).unwrap();
        assert!(store.can_redo());

        store.record(&Doc::named("c")).unwrap();
        assert!(!store.can_redo());
    }

    #[test]
    fn test_undo_then_redo_returns_copy() {
        let mut store = HistoryStore::new();
        let s0 = Doc::named("s0");
        let s1 = Doc::named("s1");

        store.record(&s0).unwrap();
        assert_eq!(store.undo(&s1).unwrap(), Some(s0));

        let mut redone = store.redo().unwrap();
        assert_eq!(redone, s1);

        // The returned value is independent of the copy left on the undo stack
        redone.items.push(99);
        assert_eq!(store.undo_entries().last(), Some(&s1));
    }

    #[test]
    fn test_mutation_after_record_is_isolated() {
        let mut store = HistoryStore::new();
        let mut live = Doc::named("live");
        store.record(&live).unwrap();

        live.items.clear();
        live.name = "mutated";

        let previous = store.undo(&live).unwrap().unwrap();
        assert_eq!(previous, Doc::named("live"));
    }

    #[test]
    fn test_capacity_two_scenario() {
        let mut store = HistoryStore::with_capacity(2).unwrap();
        store.record(&Doc::named("A")).unwrap();
        store.record(&Doc::named("B")).unwrap();
        store.record(&Doc::named("C")).unwrap();
        assert_eq!(names(store.undo_entries()), vec!["B", "C"]);

        let undone = store.undo(&Doc::named("D")).unwrap().unwrap();
        assert_eq!(undone.name, "C");
        assert_eq!(names(store.undo_entries()), vec!["B"]);
        assert_eq!(names(store.redo_entries()), vec!["D"]);

        let redone = store.redo().unwrap();
        assert_eq!(redone.name, "D");
        assert_eq!(names(store.undo_entries()), vec!["B", "D"]);
        assert_eq!(store.redo_count(), 0);
    }

    #[test]
    fn test_redo_respects_capacity() {
        let mut store = HistoryStore::with_capacity(3).unwrap();
        for name in ["a", "b", "c"] {
            store.record(&Doc::named(name)).unwrap();
        }
        store.undo(&Doc::named("d")).unwrap();
        store.set_capacity(2).unwrap();
        assert_eq!(names(store.undo_entries()), vec!["a", "b"]);

        store.redo().unwrap();
        assert_eq!(names(store.undo_entries()), vec!["b", "d"]);
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        let mut store = HistoryStore::new();
        store.record(&Doc::named("a")).unwrap();
        store.undo(&Doc::named("b")).unwrap();

        let err = store.record(&Doc::named("")).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidRecord { .. }));
        // Failed record leaves history untouched
        assert!(store.can_redo());
        assert_eq!(store.undo_count(), 0);

        assert!(store.undo(&Doc::named("")).is_err());
    }

    #[test]
    fn test_invalid_capacity() {
        assert_eq!(
            HistoryStore::<Doc>::with_capacity(0).unwrap_err(),
            HistoryError::InvalidCapacity { capacity: 0 }
        );
    }

    #[test]
    fn test_shrinking_capacity_evicts_oldest() {
        let mut store = HistoryStore::with_capacity(5).unwrap();
        for name in ["a", "b", "c", "d"] {
            store.record(&Doc::named(name)).unwrap();
        }
        store.set_capacity(2).unwrap();
        assert_eq!(names(store.undo_entries()), vec!["c", "d"]);
        assert!(store.set_capacity(0).is_err());
    }

    #[test]
    fn test_clear() {
        let mut store = HistoryStore::new();
        store.record(&Doc::named("a")).unwrap();
        store.undo(&Doc::named("b")).unwrap();
        store.record(&Doc::named("c")).unwrap();
        store.clear();
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }
}
