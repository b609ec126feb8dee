//! Disposer - handle that unregisters a listener.

use std::cell::RefCell;
use std::fmt;

/// Removes a registration when [`dispose`](Disposer::dispose) is called.
///
/// Dropping a `Disposer` without calling `dispose` leaves the registration in
/// place. Disposing twice is harmless.
pub struct Disposer {
    cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Disposer {
    pub(crate) fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: RefCell::new(Some(Box::new(cleanup))),
        }
    }

    /// A disposer with nothing to clean up.
    pub fn noop() -> Self {
        Self {
            cleanup: RefCell::new(None),
        }
    }

    /// Run the cleanup if it has not run yet.
    pub fn dispose(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cleanup.borrow().is_none()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
