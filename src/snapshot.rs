use crate::{Memento, Undoable, UndoableKey};
use std::cell::RefCell;
use std::rc::Weak;

/// A single object's captured state within an operation.
///
/// Holds the snapshot together with a weak handle back to the object it was
/// taken from, so a snapshot of an object that has since been dropped is
/// simply skipped on restore.
pub(crate) struct Snapshot {
    key: UndoableKey,
    undoable: Weak<RefCell<dyn Undoable>>,
    memento: Memento,
}

impl Snapshot {
    pub fn new(
        key: UndoableKey,
        undoable: Weak<RefCell<dyn Undoable>>,
        memento: Memento,
    ) -> Snapshot {
        Snapshot {
            key,
            undoable,
            memento,
        }
    }

    pub fn key(&self) -> UndoableKey {
        self.key
    }

    /// Re-applies the captured memento to the originating object.
    pub fn restore(&self) {
        if let Some(undoable) = self.undoable.upgrade() {
            undoable.borrow_mut().import_state(&self.memento);
        }
    }
}
