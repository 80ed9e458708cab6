//! Single-threaded event bus between background tasks and the UI.
//!
//! Tasks spawned on the browser event loop emit [`ChatEvent`]s; the UI drains
//! them once per frame and folds them into its state.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use chat_types::event::ChatEvent;

/// Shared event queue, cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn emit(&self, event: ChatEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Take every pending event in emission order.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    /// Convenience for the common "something went wrong" toast.
    pub fn notice(&self, message: impl Into<String>) {
        self.emit(ChatEvent::Notice {
            message: message.into(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
