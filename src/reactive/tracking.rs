//! Dependency tracking sessions.
//!
//! A session records every ref read while it is the innermost active
//! session. Sessions live on a thread-local stack: evaluating a computed
//! pushes a fresh session and pops it afterwards (also during unwinding), so
//! a read function that builds another computed does not leak the inner
//! reads into the outer session.
//!
//! ```text
//! stack: [outer]            outer reads a   → outer = {a}
//! stack: [outer, inner]     inner reads b   → inner = {b}
//! stack: [outer]            outer reads c'  → outer = {a, c'}
//! ```
//!
//! [`untrack`] pushes a suspended entry that swallows reads.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::disposer::Disposer;

// =============================================================================
// Identity
// =============================================================================

/// Identity of a ref cell, unique within a thread.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(u64);

impl RefId {
    pub(crate) fn next() -> Self {
        thread_local! {
            static NEXT_ID: Cell<u64> = const { Cell::new(0) };
        }
        NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            RefId(id)
        })
    }
}

impl fmt::Debug for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// =============================================================================
// Dependency
// =============================================================================

/// A ref as seen by the tracker, independent of its value type.
pub trait Dependency {
    fn ref_id(&self) -> RefId;

    /// Call `notify` after every change to this ref.
    fn subscribe(&self, notify: Rc<dyn Fn()>) -> Disposer;

    /// Owned, type-erased handle to the same ref.
    fn to_dependency(&self) -> Rc<dyn Dependency>;
}

// =============================================================================
// Session Stack
// =============================================================================

#[derive(Default)]
struct Collector {
    seen: HashSet<RefId>,
    deps: Vec<Rc<dyn Dependency>>,
}

impl Collector {
    fn seeded(seed: Vec<Rc<dyn Dependency>>) -> Self {
        let mut collector = Collector::default();
        for dep in seed {
            collector.add(dep.ref_id(), || dep);
        }
        collector
    }

    fn add(&mut self, id: RefId, dep: impl FnOnce() -> Rc<dyn Dependency>) {
        if self.seen.insert(id) {
            self.deps.push(dep());
        }
    }
}

thread_local! {
    /// `None` entries are suspended sessions pushed by `untrack`.
    static SESSIONS: RefCell<Vec<Option<Collector>>> = const { RefCell::new(Vec::new()) };
}

/// Pops its session on drop so a panicking read function cannot leave the
/// stack unbalanced.
struct SessionGuard {
    popped: bool,
}

impl SessionGuard {
    fn push(entry: Option<Collector>) -> Self {
        SESSIONS.with(|s| s.borrow_mut().push(entry));
        Self { popped: false }
    }

    fn finish(mut self) -> Option<Collector> {
        self.popped = true;
        SESSIONS.with(|s| s.borrow_mut().pop().flatten())
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.popped {
            SESSIONS.with(|s| {
                s.borrow_mut().pop();
            });
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Run `f` in a fresh session and return what it read, in first-read order.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Dependency>>) {
    track_seeded(Vec::new(), f)
}

/// Like [`track`], with `seed` pre-registered ahead of any reads.
pub(crate) fn track_seeded<R>(
    seed: Vec<Rc<dyn Dependency>>,
    f: impl FnOnce() -> R,
) -> (R, Vec<Rc<dyn Dependency>>) {
    let guard = SessionGuard::push(Some(Collector::seeded(seed)));
    let value = f();
    let deps = guard.finish().map(|c| c.deps).unwrap_or_default();
    (value, deps)
}

/// Run `f` without recording its reads in any enclosing session.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _guard = SessionGuard::push(None);
    f()
}

/// Whether reads on this thread are currently being recorded.
pub fn is_tracking() -> bool {
    SESSIONS.with(|s| matches!(s.borrow().last(), Some(Some(_))))
}

/// Record a read of `id` in the innermost session. `dep` is only invoked
/// the first time a session sees `id`.
pub(crate) fn record(id: RefId, dep: impl FnOnce() -> Rc<dyn Dependency>) {
    SESSIONS.with(|s| {
        if let Some(Some(collector)) = s.borrow_mut().last_mut() {
            collector.add(id, dep);
        }
    });
}

#[cfg(test)]
pub(crate) fn depth() -> usize {
    SESSIONS.with(|s| s.borrow().len())
}
