use crate::{Undoable, UndoStack};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Stable identity for a registered undoable, derived from its allocation.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub(crate) struct UndoableKey(usize);

impl UndoableKey {
    pub fn of(undoable: &Rc<RefCell<dyn Undoable>>) -> UndoableKey {
        UndoableKey(Rc::as_ptr(undoable) as *const () as usize)
    }
}

/// Per-object handle used to capture state into the active operation.
///
/// Returned by [`UndoSystem::state_saver`]. The saver is a one-shot gate:
/// the system arms it with whichever stack is accepting snapshots at each
/// transaction boundary, and the first [`save_state`](StateSaver::save_state)
/// call consumes that association. This guarantees at most one snapshot per
/// object per operation no matter how often the object signals a change.
///
/// [`UndoSystem::state_saver`]: crate::UndoSystem::state_saver
pub struct StateSaver {
    key: UndoableKey,
    undoable: Weak<RefCell<dyn Undoable>>,
    stack: RefCell<Option<Weak<RefCell<UndoStack>>>>,
}

impl StateSaver {
    pub(crate) fn new(key: UndoableKey, undoable: Weak<RefCell<dyn Undoable>>) -> StateSaver {
        StateSaver {
            key,
            undoable,
            stack: RefCell::new(None),
        }
    }

    pub(crate) fn key(&self) -> UndoableKey {
        self.key
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.undoable.strong_count() > 0
    }

    pub(crate) fn set_stack(&self, stack: Option<Weak<RefCell<UndoStack>>>) {
        *self.stack.borrow_mut() = stack;
    }

    /// Captures the owning object's state into the active operation.
    ///
    /// Call this before the first mutation of the object inside an open
    /// operation. Disarms the saver, so repeated calls within the same
    /// transaction phase are silent no-ops, as is a call while no operation
    /// is open.
    pub fn save_state(&self) {
        let Some(stack) = self.stack.borrow_mut().take() else {
            return;
        };
        if let Some(stack) = stack.upgrade() {
            stack.borrow_mut().save(self.key, &self.undoable);
        }
    }

    /// Returns `true` if the next [`save_state`](StateSaver::save_state)
    /// call would record a snapshot.
    pub fn is_armed(&self) -> bool {
        self.stack.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{StateSaver, UndoableKey};
    use crate::{Memento, Undoable, UndoStack};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Value(i32);

    impl Undoable for Value {
        fn export_state(&self) -> Memento {
            Memento::new(self.0)
        }

        fn import_state(&mut self, memento: &Memento) {
            self.0 = *memento.downcast_ref::<i32>().unwrap();
        }
    }

    fn armed_saver(value: &Rc<RefCell<dyn Undoable>>, stack: &Rc<RefCell<UndoStack>>) -> StateSaver {
        let saver = StateSaver::new(UndoableKey::of(value), Rc::downgrade(value));
        saver.set_stack(Some(Rc::downgrade(stack)));
        saver
    }

    #[test]
    fn save_state_is_one_shot() {
        let value: Rc<RefCell<dyn Undoable>> = Rc::new(RefCell::new(Value(1)));
        let stack = Rc::new(RefCell::new(UndoStack::new()));
        stack.borrow_mut().start("unnamedCommand");

        let saver = armed_saver(&value, &stack);
        assert!(saver.is_armed());
        saver.save_state();
        assert!(!saver.is_armed());
        saver.save_state();
        saver.save_state();

        assert!(stack.borrow_mut().finish("edit"));
        let stack = stack.borrow();
        let snapshots = stack.back().unwrap().snapshots().count();
        assert_eq!(snapshots, 1);
    }

    #[test]
    fn disarmed_saver_records_nothing() {
        let value: Rc<RefCell<dyn Undoable>> = Rc::new(RefCell::new(Value(1)));
        let stack = Rc::new(RefCell::new(UndoStack::new()));
        stack.borrow_mut().start("unnamedCommand");

        let saver = StateSaver::new(UndoableKey::of(&value), Rc::downgrade(&value));
        saver.save_state();

        assert!(!stack.borrow_mut().finish("edit"));
    }

    #[test]
    fn saver_survives_its_stack() {
        let value: Rc<RefCell<dyn Undoable>> = Rc::new(RefCell::new(Value(1)));
        let stack = Rc::new(RefCell::new(UndoStack::new()));
        let saver = armed_saver(&value, &stack);
        drop(stack);
        saver.save_state();
        assert!(!saver.is_armed());
    }
}
