use crate::{Snapshot, Undoable, UndoableKey};
#[cfg(feature = "chrono")]
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Weak;

/// A named transaction record: the ordered snapshots of every object that
/// changed during one operation.
///
/// Snapshots are inserted at the front, so restoring walks the objects in
/// most-recently-captured-first order. Objects with cross-dependencies may
/// rely on this ordering, so it is part of the contract.
pub(crate) struct Operation {
    name: String,
    snapshots: VecDeque<Snapshot>,
    #[cfg(feature = "chrono")]
    pub(crate) created_at: DateTime<Utc>,
}

impl Operation {
    pub fn new(name: &str) -> Operation {
        Operation {
            name: name.into(),
            snapshots: VecDeque::new(),
            #[cfg(feature = "chrono")]
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operations are created under a placeholder name and renamed when they
    /// are committed.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.into();
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Captures the object's current state into this operation.
    ///
    /// A no-op if the object has already been dropped.
    pub fn save(&mut self, key: UndoableKey, undoable: &Weak<RefCell<dyn Undoable>>) {
        if let Some(strong) = undoable.upgrade() {
            let memento = strong.borrow().export_state();
            self.snapshots
                .push_front(Snapshot::new(key, Weak::clone(undoable), memento));
        }
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Restores every captured snapshot, most recently captured first.
    pub fn restore_snapshot(&self) {
        for snapshot in &self.snapshots {
            snapshot.restore();
        }
    }
}
