use crate::{Format, Operation, UndoSystem};
use core::fmt;

/// Configurable display formatting for the undo queue.
///
/// Lists the committed operations newest first, one line per operation, with
/// the queue position in front of the name. Position `0` stands for the
/// state before the oldest recorded operation; the newest position carries
/// the `HEAD` label.
///
/// # Examples
/// ```
/// # let system: memento::UndoSystem = memento::UndoSystem::new();
/// println!("{}", system.display());
/// ```
pub struct Display<'a, S> {
    system: &'a UndoSystem<S>,
    format: Format,
}

impl<S> Display<'_, S> {
    /// Show colored output (on by default).
    ///
    /// Requires the `colored` feature to be enabled.
    #[cfg(feature = "colored")]
    pub fn colored(&mut self, on: bool) -> &mut Self {
        self.format.colored = on;
        self
    }

    /// Show detailed output (on by default).
    pub fn detailed(&mut self, on: bool) -> &mut Self {
        self.format.detailed = on;
        self
    }

    /// Show the head position in the output (on by default).
    pub fn head(&mut self, on: bool) -> &mut Self {
        self.format.head = on;
        self
    }

    fn fmt_list(
        &self,
        f: &mut fmt::Formatter,
        index: usize,
        head: usize,
        operation: Option<&Operation>,
    ) -> fmt::Result {
        self.format.mark(f)?;
        self.format.position(f, index)?;

        #[cfg(feature = "chrono")]
        if let Some(operation) = operation {
            if self.format.detailed {
                self.format.timestamp(f, &operation.created_at)?;
            }
        }

        self.format.label(f, index == head)?;
        if let Some(operation) = operation {
            self.format.message(f, operation.name())?;
        }
        writeln!(f)
    }
}

impl<'a, S> From<&'a UndoSystem<S>> for Display<'a, S> {
    fn from(system: &'a UndoSystem<S>) -> Self {
        Display {
            system,
            format: Format::default(),
        }
    }
}

impl<S> fmt::Display for Display<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stack = self.system.undo_stack().borrow();
        let head = stack.len();
        for (i, operation) in stack.iter().enumerate().rev() {
            self.fmt_list(f, i + 1, head, Some(operation))?;
        }
        self.fmt_list(f, 0, head, None)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Memento, Undoable, UndoSystem};
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

    #[test]
    fn lists_operations_newest_first() {
        let mut system = UndoSystem::new();
        let value = Rc::new(RefCell::new(Value(0)));
        let saver = system.state_saver(&value);

        for (i, name) in ["first", "second"].iter().enumerate() {
            system.start();
            saver.save_state();
            value.borrow_mut().0 = i as i32 + 1;
            system.finish(name);
        }

        let output = system.display().to_string();
        let first = output.find("first").unwrap();
        let second = output.find("second").unwrap();
        assert!(second < first);
        assert!(output.contains("HEAD"));
        assert_eq!(output.lines().count(), 3);
    }
}
