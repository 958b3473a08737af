//! Deferred request queue drained on the next event-loop turn.

use std::cell::RefCell;
use std::collections::VecDeque;

/// FIFO of requests that must wait until the current update completes.
///
/// Used for focus: an item entering edit mode gets focus only after the
/// presentation layer has rendered its input element.
pub struct DeferredQueue<T> {
    pending: RefCell<VecDeque<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, request: T) {
        self.pending.borrow_mut().push_back(request);
    }

    /// Takes every queued request in arrival order.
    pub fn drain(&self) -> Vec<T> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}
