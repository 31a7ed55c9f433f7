use crate::{Operation, Undoable, UndoableKey};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Weak;

/// A double-ended sequence of committed operations plus at most one pending
/// operation that is still being filled.
///
/// The stack owns the commit decision: finishing an empty pending operation
/// discards it, so no-op transactions never reach the queue. Preconditions
/// are programmer contracts; callers go through the [`UndoSystem`] which
/// upholds the start/finish discipline.
///
/// [`UndoSystem`]: crate::UndoSystem
pub(crate) struct UndoStack {
    operations: VecDeque<Operation>,
    pending: Option<Operation>,
}

impl UndoStack {
    pub fn new() -> UndoStack {
        UndoStack {
            operations: VecDeque::new(),
            pending: None,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Peeks the most recently committed operation.
    pub fn back(&self) -> Option<&Operation> {
        self.operations.back()
    }

    /// Removes the oldest committed operation without restoring it.
    pub fn pop_front(&mut self) -> Option<Operation> {
        self.operations.pop_front()
    }

    /// Removes the newest committed operation without restoring it.
    pub fn pop_back(&mut self) -> Option<Operation> {
        self.operations.pop_back()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
        self.pending = None;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Operation> + ExactSizeIterator {
        self.operations.iter()
    }

    /// Opens a new pending operation under a placeholder name.
    ///
    /// # Panics
    /// Panics if an operation is already pending.
    pub fn start(&mut self, name: &str) {
        assert!(
            self.pending.is_none(),
            "cannot start an operation while another is pending"
        );
        self.pending = Some(Operation::new(name));
    }

    /// Commits the pending operation under the given name.
    ///
    /// Returns `false` if there is no pending operation or nothing was
    /// recorded into it; the pending slot is discarded either way.
    pub fn finish(&mut self, name: &str) -> bool {
        match self.pending.take() {
            Some(mut operation) if !operation.is_empty() => {
                operation.set_name(name);
                self.operations.push_back(operation);
                true
            }
            _ => false,
        }
    }

    /// Records a snapshot of the object into the pending operation.
    ///
    /// # Panics
    /// Panics if no operation is pending.
    pub fn save(&mut self, key: UndoableKey, undoable: &Weak<RefCell<dyn Undoable>>) {
        let pending = self
            .pending
            .as_mut()
            .expect("no pending operation to save into");
        pending.save(key, undoable);
    }
}
