//! Module used to communicate completed undo and redo operations.

use std::mem;
use std::sync::mpsc::{Sender, SyncSender};

/// The `Signal` describes a completed state transition of the undo system.
///
/// See [`Slot`] for more information.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Signal {
    /// Emitted after an undo has completed.
    PostUndo,
    /// Emitted after a redo has completed.
    PostRedo,
}

/// Use this to handle signals emitted by the undo system.
///
/// The typical subscriber refreshes UI state, such as the enabled state of
/// undo and redo menu entries, whenever a signal arrives.
pub trait Slot {
    /// Receives a signal describing what the undo system just completed.
    fn on_emit(&mut self, signal: Signal);
}

/// Default slot that does nothing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NoOp;

impl Slot for NoOp {
    fn on_emit(&mut self, _: Signal) {}
}

impl Slot for () {
    fn on_emit(&mut self, _: Signal) {}
}

impl<F: FnMut(Signal)> Slot for F {
    fn on_emit(&mut self, signal: Signal) {
        self(signal)
    }
}

impl Slot for Sender<Signal> {
    fn on_emit(&mut self, signal: Signal) {
        self.send(signal).ok();
    }
}

impl Slot for SyncSender<Signal> {
    fn on_emit(&mut self, signal: Signal) {
        self.send(signal).ok();
    }
}

/// Slot wrapper that adds some additional functionality.
#[derive(Clone, Debug)]
pub(crate) struct Socket<S>(Option<S>);

impl<S> Socket<S> {
    pub const fn new(slot: S) -> Socket<S> {
        Socket(Some(slot))
    }

    pub fn connect(&mut self, slot: Option<S>) -> Option<S> {
        mem::replace(&mut self.0, slot)
    }

    pub fn disconnect(&mut self) -> Option<S> {
        self.0.take()
    }
}

impl<S> Default for Socket<S> {
    fn default() -> Self {
        Socket(None)
    }
}

impl<S: Slot> Socket<S> {
    pub fn emit(&mut self, signal: Signal) {
        if let Some(slot) = &mut self.0 {
            slot.on_emit(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Signal, Socket};

    #[test]
    fn emit_reaches_connected_slot() {
        let mut signals = Vec::new();
        let mut socket = Socket::new(|signal| signals.push(signal));
        socket.emit(Signal::PostUndo);
        socket.emit(Signal::PostRedo);
        drop(socket);
        assert_eq!(signals, [Signal::PostUndo, Signal::PostRedo]);
    }

    #[test]
    fn disconnected_socket_is_silent() {
        let mut socket: Socket<fn(Signal)> = Socket::default();
        socket.emit(Signal::PostUndo);
        assert!(socket.disconnect().is_none());
    }
}
