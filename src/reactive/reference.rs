//! Ref - mutable observable cell.
//!
//! # Example
//!
//! ```
//! use spark_elements::make_ref;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let r = make_ref(0);
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = log.clone();
//! r.on_change(move |v| sink.borrow_mut().push(*v));
//!
//! r.set(0); // equal, no-op
//! r.set(1);
//! r.set(1);
//! r.set(2);
//! assert_eq!(*log.borrow(), vec![1, 2]);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::computed::{self, Derivation};
use super::disposer::Disposer;
use super::produce::produce;
use super::tracking::{self, Dependency, RefId};

/// Change listener, called with the new value.
pub(crate) type Listener<T> = Rc<dyn Fn(&T)>;

pub(crate) struct RefInner<T> {
    pub(crate) id: RefId,
    value: RefCell<T>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_listener: Cell<u64>,
    /// Present only on computed refs.
    pub(crate) derivation: RefCell<Option<Derivation<T>>>,
}

/// A mutable cell that notifies listeners when its value changes.
///
/// Cloning a `Ref` creates a new handle to the **same** cell.
///
/// # Invariants
///
/// 1. Listeners fire in registration order, once per effective change.
/// 2. `set` with a value equal to the current one fires nothing.
/// 3. The value is stored before any listener runs, so a panicking listener
///    leaves the write committed and skips the listeners after it.
/// 4. Every listener is called with the value stored at the moment it runs,
///    so after a re-entrant write all listeners end on the stored value.
pub struct Ref<T: 'static> {
    pub(crate) inner: Rc<RefInner<T>>,
}

/// Create a plain ref.
pub fn make_ref<T: 'static>(value: T) -> Ref<T> {
    Ref::new(value)
}

impl<T: 'static> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Ref<T> {
    /// Create a plain ref holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefInner {
                id: RefId::next(),
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                derivation: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RefInner<T>>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> RefId {
        self.inner.id
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the value by reference. Registers this ref with the active
    /// tracking session.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same ref.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Read the value by reference without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Register `listener` to run after every change. Listeners are never
    /// de-duplicated; registering the same closure twice runs it twice.
    pub fn on_change(&self, listener: impl Fn(&T) + 'static) -> Disposer {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        let listener: Listener<T> = Rc::new(listener);
        self.inner.listeners.borrow_mut().push((id, listener));

        let weak: Weak<RefInner<T>> = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether this ref was created by [`computed`](super::computed).
    pub fn is_computed(&self) -> bool {
        self.inner.derivation.borrow().is_some()
    }

    fn track(&self) {
        tracking::record(self.inner.id, || self.to_dependency());
    }
}

impl<T: Clone + 'static> Ref<T> {
    /// Read a clone of the value. Registers this ref with the active
    /// tracking session.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Read a clone of the value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: Clone + PartialEq + 'static> Ref<T> {
    /// Store `value` and notify listeners, unless it equals the current
    /// value.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        self.inner.value.replace(value);
        self.notify();
    }

    /// Edit a copy of the value and store the result through [`set`].
    ///
    /// The current value is never mutated in place; handles that cloned it
    /// earlier keep the old value.
    ///
    /// [`set`]: Ref::set
    pub fn edit(&self, edit: impl FnOnce(&mut T)) {
        let next = self.with_untracked(|current| produce(current, edit));
        self.set(next);
    }

    /// Re-run the read function of a computed ref. No-op on plain refs.
    pub fn recompute(&self) {
        computed::recompute(&self.inner);
    }

    /// Walk the live listener list by id. Each step re-reads the list, so
    /// listeners added during the walk run in it and disposed ones are
    /// skipped. Each listener sees the value stored when it runs.
    fn notify(&self) {
        let mut last: Option<u64> = None;
        loop {
            let next = self
                .inner
                .listeners
                .borrow()
                .iter()
                .find(|(id, _)| last.is_none_or(|l| *id > l))
                .map(|(id, l)| (*id, Rc::clone(l)));
            let Some((id, listener)) = next else {
                break;
            };
            last = Some(id);
            let value = self.get_untracked();
            listener(&value);
        }
    }
}

impl<T: 'static> Dependency for Ref<T> {
    fn ref_id(&self) -> RefId {
        self.inner.id
    }

    fn subscribe(&self, notify: Rc<dyn Fn()>) -> Disposer {
        self.on_change(move |_| notify())
    }

    fn to_dependency(&self) -> Rc<dyn Dependency> {
        Rc::new(self.clone())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("computed", &self.inner.derivation.borrow().is_some())
            .finish()
    }
}

impl<T: fmt::Display + 'static> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref: {}", self.inner.value.borrow())
    }
}
