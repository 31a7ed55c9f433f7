//! Provides transactional undo-redo functionality based on state snapshots.
//!
//! Instead of modeling each change as a command object, mutable objects
//! implement the [`Undoable`] trait and hand out opaque [`Memento`]s of their
//! state. The [`UndoSystem`] groups those snapshots into named operations:
//! client code opens an operation with [`start`](UndoSystem::start), every
//! participating object captures its state through its [`StateSaver`] before
//! its first mutation, and the operation is committed with
//! [`finish`](UndoSystem::finish) or rolled back with
//! [`cancel`](UndoSystem::cancel). Undoing an operation restores the captured
//! snapshots and, as a side effect, records the inverse operation on the redo
//! queue, so undo and redo can alternate indefinitely.
//!
//! External subsystems that only care about transaction boundaries (for
//! example a file dirty-state tracker) implement [`Tracker`], and the
//! completion of an undo or redo is communicated through a [`Slot`]
//! connected to the system.
//!
//! # Features
//!
//! * `chrono`: operations are timestamped when they are created.
//! * `colored`: colored output when formatting the undo queue.
//!
//! # Examples
//!
//! ```
//! use memento::{Memento, Undoable, UndoSystem};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Counter {
//!     value: i32,
//! }
//!
//! impl Undoable for Counter {
//!     fn export_state(&self) -> Memento {
//!         Memento::new(self.value)
//!     }
//!
//!     fn import_state(&mut self, memento: &Memento) {
//!         if let Some(&value) = memento.downcast_ref::<i32>() {
//!             self.value = value;
//!         }
//!     }
//! }
//!
//! let mut system = UndoSystem::new();
//! let counter = Rc::new(RefCell::new(Counter { value: 0 }));
//! let saver = system.state_saver(&counter);
//!
//! system.start();
//! saver.save_state();
//! counter.borrow_mut().value = 1;
//! system.finish("increment");
//!
//! assert!(system.undo());
//! assert_eq!(counter.borrow().value, 0);
//! assert!(system.redo());
//! assert_eq!(counter.borrow().value, 1);
//! ```

#![deny(missing_docs)]

mod display;
mod format;
mod operation;
mod saver;
mod slot;
mod snapshot;
mod stack;
mod system;

use core::fmt::{self, Debug, Formatter};
use std::any::Any;
use std::rc::Rc;

pub use crate::display::Display;
pub use crate::saver::StateSaver;
pub use crate::slot::{NoOp, Signal, Slot};
pub use crate::system::{Builder, Tracker, UndoSystem};

pub(crate) use crate::format::Format;
pub(crate) use crate::operation::Operation;
pub(crate) use crate::saver::UndoableKey;
pub(crate) use crate::snapshot::Snapshot;
pub(crate) use crate::stack::UndoStack;

/// An opaque, immutable snapshot of an object's state.
///
/// Produced by [`Undoable::export_state`] and handed back unchanged through
/// [`Undoable::import_state`] when the state is restored. The undo system
/// never inspects the contents; ownership is shared between the operation
/// that recorded the snapshot and whoever else holds a clone.
#[derive(Clone)]
pub struct Memento(Rc<dyn Any>);

impl Memento {
    /// Wraps the provided state.
    pub fn new<T: 'static>(state: T) -> Memento {
        Memento(Rc::new(state))
    }

    /// Returns a reference to the wrapped state if it is of type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl Debug for Memento {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_tuple("Memento").finish()
    }
}

/// Trait for objects that participate in undoable operations.
///
/// Implementors are registered with [`UndoSystem::state_saver`] and must
/// capture their state through the returned [`StateSaver`] before the first
/// mutation inside an open operation. `import_state` is expected to be
/// idempotent for a fixed memento, since a snapshot may be re-applied.
pub trait Undoable {
    /// Exports the current state as an opaque snapshot.
    fn export_state(&self) -> Memento;

    /// Overwrites the current state from a previously exported snapshot.
    fn import_state(&mut self, memento: &Memento);
}
