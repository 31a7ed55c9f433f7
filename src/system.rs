//! The top-level transaction facade.

use crate::slot::Socket;
use crate::{Display, NoOp, Operation, Signal, Slot, StateSaver, Undoable, UndoStack, UndoableKey};
use core::fmt::{self, Debug, Formatter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::{Rc, Weak};

/// Placeholder name given to an operation until it is committed.
const UNNAMED_COMMAND: &str = "unnamedCommand";
/// Name given to the pending operation while it is being cancelled.
const TEMPORARY_COMMAND: &str = "$TEMPORARY";
/// Hard cap on the undo queue depth.
const MAX_UNDO_LEVELS: usize = 16384;
/// Queue depth used when the builder does not override it.
const DEFAULT_UNDO_LEVELS: usize = 64;

/// External observer of transaction boundaries.
///
/// Trackers are notified independently of the per-object snapshots, which
/// suits subsystems such as a file dirty-state tracker that only count
/// changes. All hooks default to doing nothing.
pub trait Tracker {
    /// Called when a new operation is started.
    fn begin(&mut self) {}
    /// Called before an operation is undone.
    fn undo(&mut self) {}
    /// Called before an operation is redone.
    fn redo(&mut self) {}
    /// Called when the undo and redo queues are cleared.
    fn clear(&mut self) {}
}

/// Which of the two stacks is currently accepting snapshots.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Active {
    Undo,
    Redo,
}

/// Groups state snapshots into named, undoable operations.
///
/// The system owns an undo and a redo queue, a registry of every live
/// [`Undoable`] (keyed by object identity and holding only weak handles),
/// and the set of attached [`Tracker`]s. At most one of the two queues is
/// accepting snapshots at a time: the undo queue while an operation is open,
/// the redo queue while an undo is replayed. Restoring an operation is what
/// records its inverse, because every restored object's current state is
/// captured into whichever queue is active at that instant.
///
/// Undo and redo availability changes are communicated through the connected
/// [`Slot`].
///
/// # Examples
/// ```
/// let mut system: memento::UndoSystem = memento::UndoSystem::builder()
///     .limit(100)
///     .build();
/// system.start();
/// assert!(system.operation_started());
/// system.cancel();
/// ```
pub struct UndoSystem<S = NoOp> {
    undo_stack: Rc<RefCell<UndoStack>>,
    redo_stack: Rc<RefCell<UndoStack>>,
    active: Option<Active>,
    undoables: HashMap<UndoableKey, Rc<StateSaver>>,
    trackers: Vec<Rc<RefCell<dyn Tracker>>>,
    limit: NonZeroUsize,
    socket: Socket<S>,
}

impl UndoSystem {
    /// Returns a new undo system with the default queue depth.
    pub fn new() -> UndoSystem {
        Builder::default().build()
    }
}

impl<S> UndoSystem<S> {
    /// Returns a builder for an undo system.
    pub fn builder() -> Builder<S> {
        Builder::default()
    }

    /// Returns the number of committed operations on the undo queue.
    pub fn size(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    /// Returns the number of committed operations on the redo queue.
    pub fn redo_size(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    /// Returns `true` if there is an operation to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty()
    }

    /// Returns `true` if there is an operation to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    /// Returns the name of the operation the next [`undo`](UndoSystem::undo)
    /// would consume.
    pub fn undo_name(&self) -> Option<String> {
        self.undo_stack
            .borrow()
            .back()
            .map(|operation| operation.name().into())
    }

    /// Returns the name of the operation the next [`redo`](UndoSystem::redo)
    /// would consume.
    pub fn redo_name(&self) -> Option<String> {
        self.redo_stack
            .borrow()
            .back()
            .map(|operation| operation.name().into())
    }

    /// Returns `true` while an operation is open.
    ///
    /// [`undo`](UndoSystem::undo) and [`redo`](UndoSystem::redo) refuse to
    /// run in that window, and re-entrant callers can use this to detect an
    /// already-open operation.
    pub fn operation_started(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the undo queue depth.
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Sets the undo queue depth, clamped to `1..=16384`.
    ///
    /// Excess operations are evicted oldest-first, and the new depth is
    /// enforced again on every subsequent [`start`](UndoSystem::start).
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = NonZeroUsize::new(limit.min(MAX_UNDO_LEVELS)).unwrap_or(NonZeroUsize::MIN);
        let mut undo_stack = self.undo_stack.borrow_mut();
        while undo_stack.len() > self.limit.get() {
            undo_stack.pop_front();
        }
    }

    /// Registers the object and returns its per-object save-state handle.
    ///
    /// Registering an already-registered object returns the existing handle.
    /// If an operation is currently open the new saver is armed immediately,
    /// so objects created in the middle of an operation are still captured
    /// before their first mutation.
    pub fn state_saver<U: Undoable + 'static>(
        &mut self,
        undoable: &Rc<RefCell<U>>,
    ) -> Rc<StateSaver> {
        let undoable = Rc::clone(undoable) as Rc<RefCell<dyn Undoable>>;
        let key = UndoableKey::of(&undoable);
        if let Some(existing) = self.undoables.get(&key) {
            // A dead entry at the same address belongs to a dropped object
            // whose saver was never released; replace it.
            if existing.is_alive() {
                return Rc::clone(existing);
            }
        }
        let saver = Rc::new(StateSaver::new(key, Rc::downgrade(&undoable)));
        saver.set_stack(self.active_stack());
        self.undoables.insert(key, Rc::clone(&saver));
        saver
    }

    /// Unregisters the object the saver was created for.
    ///
    /// Domain objects call this when they are destroyed. A forgotten release
    /// leaves a dangling registry entry behind, which is skipped on every
    /// boundary until the entry is replaced or the system is dropped.
    pub fn release_state_saver(&mut self, saver: &StateSaver) {
        self.undoables.remove(&saver.key());
    }

    /// Attaches an external observer of transaction boundaries.
    ///
    /// Trackers are notified in attachment order.
    pub fn attach_tracker<T: Tracker + 'static>(&mut self, tracker: &Rc<RefCell<T>>) {
        let tracker = Rc::clone(tracker) as Rc<RefCell<dyn Tracker>>;
        debug_assert!(
            !self.trackers.iter().any(|t| same_tracker(t, &tracker)),
            "tracker is already attached"
        );
        self.trackers.push(tracker);
    }

    /// Detaches a previously attached tracker.
    pub fn detach_tracker<T: Tracker + 'static>(&mut self, tracker: &Rc<RefCell<T>>) {
        let tracker = Rc::clone(tracker) as Rc<RefCell<dyn Tracker>>;
        let position = self.trackers.iter().position(|t| same_tracker(t, &tracker));
        debug_assert!(position.is_some(), "tracker was never attached");
        if let Some(position) = position {
            self.trackers.remove(position);
        }
    }

    /// Sets how the signal should be handled when the state changes.
    ///
    /// The previous slot is returned if it exists.
    pub fn connect(&mut self, slot: S) -> Option<S> {
        self.socket.connect(Some(slot))
    }

    /// Removes and returns the slot if it exists.
    pub fn disconnect(&mut self) -> Option<S> {
        self.socket.disconnect()
    }

    /// Returns a structure for configurable formatting of the undo queue.
    pub fn display(&self) -> Display<'_, S> {
        Display::from(self)
    }

    pub(crate) fn undo_stack(&self) -> &Rc<RefCell<UndoStack>> {
        &self.undo_stack
    }

    fn start_undo(&mut self) {
        self.undo_stack.borrow_mut().start(UNNAMED_COMMAND);
        self.set_active(Some(Active::Undo));
    }

    fn finish_undo(&mut self, name: &str) -> bool {
        let committed = self.undo_stack.borrow_mut().finish(name);
        self.set_active(None);
        committed
    }

    fn start_redo(&mut self) {
        self.redo_stack.borrow_mut().start(UNNAMED_COMMAND);
        self.set_active(Some(Active::Redo));
    }

    fn finish_redo(&mut self, name: &str) -> bool {
        let committed = self.redo_stack.borrow_mut().finish(name);
        self.set_active(None);
        committed
    }

    /// Re-arms every registered saver against the newly active stack.
    ///
    /// This walks the whole registry on every transaction boundary, which is
    /// fine at editor-session object counts but is the cost center to watch
    /// if the registry grows very large.
    fn set_active(&mut self, active: Option<Active>) {
        self.active = active;
        let stack = self.active_stack();
        for saver in self.undoables.values() {
            saver.set_stack(stack.clone());
        }
    }

    fn active_stack(&self) -> Option<Weak<RefCell<UndoStack>>> {
        match self.active {
            Some(Active::Undo) => Some(Rc::downgrade(&self.undo_stack)),
            Some(Active::Redo) => Some(Rc::downgrade(&self.redo_stack)),
            None => None,
        }
    }

    /// Restores an operation while the opposite stack is active.
    ///
    /// Capturing each object's current state just before its memento is
    /// applied is what populates the inverse operation; the savers are armed
    /// against the opposite stack, and their one-shot gate still guarantees
    /// one snapshot per object.
    fn replay(&self, operation: &Operation) {
        for snapshot in operation.snapshots() {
            if let Some(saver) = self.undoables.get(&snapshot.key()) {
                saver.save_state();
            }
            snapshot.restore();
        }
    }

    fn trackers_begin(&self) {
        for tracker in &self.trackers {
            tracker.borrow_mut().begin();
        }
    }

    fn trackers_undo(&self) {
        for tracker in &self.trackers {
            tracker.borrow_mut().undo();
        }
    }

    fn trackers_redo(&self) {
        for tracker in &self.trackers {
            tracker.borrow_mut().redo();
        }
    }

    fn trackers_clear(&self) {
        for tracker in &self.trackers {
            tracker.borrow_mut().clear();
        }
    }
}

impl<S: Slot> UndoSystem<S> {
    /// Begins a new undoable operation.
    ///
    /// Clears the redo queue, evicts the oldest committed operations if the
    /// undo queue is at its depth limit, opens the pending operation, arms
    /// every registered saver against the undo queue and notifies the
    /// trackers.
    ///
    /// # Panics
    /// Panics if an operation is already open.
    pub fn start(&mut self) {
        assert!(self.active.is_none(), "an operation is already in progress");
        self.redo_stack.borrow_mut().clear();
        {
            let mut undo_stack = self.undo_stack.borrow_mut();
            while undo_stack.len() >= self.limit.get() {
                undo_stack.pop_front();
            }
        }
        self.start_undo();
        self.trackers_begin();
    }

    /// Commits the open operation under the given name.
    ///
    /// Returns `false` if nothing was recorded into the operation; the
    /// operation is silently discarded in that case.
    pub fn finish(&mut self, name: &str) -> bool {
        let committed = self.finish_undo(name);
        if committed {
            log::info!("{name}");
        }
        committed
    }

    /// Abandons the open operation.
    ///
    /// The snapshots recorded so far are restored, rolling every
    /// participating object back to its pre-operation state, and nothing is
    /// committed to the undo queue. The redo queue was already cleared by
    /// [`start`](UndoSystem::start).
    pub fn cancel(&mut self) {
        if self.finish_undo(TEMPORARY_COMMAND) {
            let operation = self.undo_stack.borrow_mut().pop_back();
            if let Some(operation) = operation {
                // The savers are disarmed at this point, so the rollback
                // itself records nothing.
                operation.restore_snapshot();
            }
        }
    }

    /// Undoes the most recently committed operation.
    ///
    /// The inverse operation is recorded on the redo queue under the same
    /// name. Returns `false` if the undo queue is empty or an operation is
    /// currently open; neither queue is touched in that case.
    pub fn undo(&mut self) -> bool {
        if self.operation_started() {
            log::warn!("undo: cannot undo while an operation is in progress");
            return false;
        }
        let operation = self.undo_stack.borrow_mut().pop_back();
        let Some(operation) = operation else {
            log::info!("undo: no undo available");
            return false;
        };
        log::info!("undo: {}", operation.name());

        self.start_redo();
        self.trackers_undo();
        self.replay(&operation);
        self.finish_redo(operation.name());
        self.socket.emit(Signal::PostUndo);
        true
    }

    /// Redoes the most recently undone operation.
    ///
    /// Exact mirror of [`undo`](UndoSystem::undo) with the queues swapped.
    pub fn redo(&mut self) -> bool {
        if self.operation_started() {
            log::warn!("redo: cannot redo while an operation is in progress");
            return false;
        }
        let operation = self.redo_stack.borrow_mut().pop_back();
        let Some(operation) = operation else {
            log::info!("redo: no redo available");
            return false;
        };
        log::info!("redo: {}", operation.name());

        self.start_undo();
        self.trackers_redo();
        self.replay(&operation);
        self.finish_undo(operation.name());
        self.socket.emit(Signal::PostRedo);
        true
    }

    /// Drops all committed operations from both queues and notifies the
    /// trackers.
    ///
    /// Registered savers are kept: persistent observers survive a full
    /// reset and keep their handles.
    pub fn clear(&mut self) {
        self.set_active(None);
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
        self.trackers_clear();
    }
}

impl Default for UndoSystem {
    fn default() -> UndoSystem {
        UndoSystem::new()
    }
}

impl<S> Debug for UndoSystem<S> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("UndoSystem")
            .field("size", &self.size())
            .field("redo_size", &self.redo_size())
            .field("limit", &self.limit)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

fn same_tracker(a: &Rc<RefCell<dyn Tracker>>, b: &Rc<RefCell<dyn Tracker>>) -> bool {
    // Compare data addresses; `Rc::ptr_eq` on trait objects also compares
    // vtable pointers, which are not unique across codegen units.
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Builder for an [`UndoSystem`].
///
/// # Examples
/// ```
/// # use std::sync::mpsc;
/// # use memento::{Signal, UndoSystem};
/// let (sender, receiver) = mpsc::channel::<Signal>();
/// let mut system = UndoSystem::builder()
///     .limit(100)
///     .connect(sender)
///     .build();
/// # system.start();
/// # system.cancel();
/// ```
#[derive(Debug)]
pub struct Builder<S = NoOp> {
    limit: NonZeroUsize,
    socket: Socket<S>,
}

impl<S> Builder<S> {
    /// Sets the undo queue depth, clamped to `1..=16384`.
    ///
    /// # Panics
    /// Panics if `limit` is `0`.
    pub fn limit(mut self, limit: usize) -> Builder<S> {
        let limit = limit.min(MAX_UNDO_LEVELS);
        self.limit = NonZeroUsize::new(limit).expect("limit can not be `0`");
        self
    }

    /// Connects the slot.
    pub fn connect(mut self, slot: S) -> Builder<S> {
        self.socket = Socket::new(slot);
        self
    }

    /// Builds the undo system.
    pub fn build(self) -> UndoSystem<S> {
        UndoSystem {
            undo_stack: Rc::new(RefCell::new(UndoStack::new())),
            redo_stack: Rc::new(RefCell::new(UndoStack::new())),
            active: None,
            undoables: HashMap::new(),
            trackers: Vec::new(),
            limit: self.limit,
            socket: self.socket,
        }
    }
}

impl<S> Default for Builder<S> {
    fn default() -> Self {
        Builder {
            limit: NonZeroUsize::new(DEFAULT_UNDO_LEVELS).unwrap(),
            socket: Socket::default(),
        }
    }
}
