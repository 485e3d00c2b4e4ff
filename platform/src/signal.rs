// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Debug;

/// A list of handlers to notify when something happens, called in the order
/// they were connected.
///
/// Handlers run synchronously inside [`Signal::emit`], on the thread driving
/// the game loop.
pub struct Signal<A> {
    handlers: Vec<Box<dyn FnMut(&A)>>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Signal {
            handlers: Vec::new(),
        }
    }
}

impl<A> Debug for Signal<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<A> Signal<A> {
    /// Creates a [`Signal`] without handlers.
    pub fn new() -> Signal<A> {
        Signal::default()
    }

    /// Adds a handler to be called on every [`Signal::emit`].
    pub fn connect(&mut self, handler: impl FnMut(&A) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Calls every handler with `args`.
    pub fn emit(&mut self, args: &A) {
        for handler in &mut self.handlers {
            handler(args);
        }
    }

    /// The amount of connected handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::Signal;

    #[test]
    fn handlers_run_in_connection_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::new();
        for id in 0..3 {
            let calls = calls.clone();
            signal.connect(move |value: &u32| calls.borrow_mut().push((id, *value)));
        }
        signal.emit(&7);
        assert_eq!(3, signal.len());
        assert_eq!(vec![(0, 7), (1, 7), (2, 7)], *calls.borrow());
    }
}
