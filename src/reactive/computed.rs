//! Computed refs - values derived from other refs.
//!
//! # Design
//!
//! [`computed`] evaluates its read function once, inside a tracking session
//! seeded with the explicit dependencies. Every ref read during that
//! evaluation becomes a dependency, and each dependency gets a listener that
//! re-runs the read function and stores the result through [`Ref::set`]
//! (so an unchanged result notifies nobody).
//!
//! Each re-run is tracked again. Dependencies that were not read this time
//! are unsubscribed, newly read ones are subscribed, explicit ones always
//! stay. A write to a ref the latest evaluation did not read can never
//! trigger a recomputation.
//!
//! # Ownership
//!
//! The computed ref owns strong handles to its explicit dependencies and its
//! dependencies' listeners hold it weakly. Dropping the last handle to a
//! computed ref unsubscribes it from everything it was tracking.
//! A computed kept only for the side effects of its read function stops
//! running once its last handle is dropped, so the caller must hold it.
//!
//! # Failure Modes
//!
//! - **Read function panics during a recomputation**: the panic unwinds
//!   through the dependency's setter. The computed keeps its previous value
//!   and its previous subscriptions.

use std::collections::HashSet;
use std::rc::{Rc, Weak};

use super::disposer::Disposer;
use super::reference::{Ref, RefInner};
use super::tracking::{self, Dependency, RefId};

/// Recompute state attached to a computed ref.
pub(crate) struct Derivation<T> {
    read: Rc<dyn Fn() -> T>,
    explicit: Vec<Rc<dyn Dependency>>,
    subscriptions: Vec<(RefId, Disposer)>,
}

impl<T> Drop for Derivation<T> {
    fn drop(&mut self) {
        for (_, subscription) in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

/// Create a ref derived from `read`, with dependencies discovered from the
/// refs it reads.
///
/// ```
/// use spark_elements::{computed, make_ref};
///
/// let a = make_ref(2);
/// let b = make_ref(3);
/// let (a2, b2) = (a.clone(), b.clone());
/// let c = computed(move || a2.get() + b2.get());
///
/// a.set(5);
/// assert_eq!(c.get(), 8);
/// b.set(10);
/// assert_eq!(c.get(), 15);
/// ```
pub fn computed<T, F>(read: F) -> Ref<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    computed_with(read, &[])
}

/// Like [`computed`], also subscribing to `explicit` whether or not `read`
/// reads them.
pub fn computed_with<T, F>(read: F, explicit: &[&dyn Dependency]) -> Ref<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    let read: Rc<dyn Fn() -> T> = Rc::new(read);
    let explicit: Vec<Rc<dyn Dependency>> = explicit.iter().map(|d| d.to_dependency()).collect();

    let (value, deps) = tracking::track_seeded(explicit.clone(), || read());

    let cell = Ref::new(value);
    let weak = Rc::downgrade(&cell.inner);
    let subscriptions = deps
        .iter()
        .map(|dep| (dep.ref_id(), subscribe(dep.as_ref(), weak.clone())))
        .collect();

    tracing::trace!(id = ?cell.id(), deps = deps.len(), "computed.create");

    *cell.inner.derivation.borrow_mut() = Some(Derivation {
        read,
        explicit,
        subscriptions,
    });
    cell
}

fn subscribe<T>(dep: &dyn Dependency, target: Weak<RefInner<T>>) -> Disposer
where
    T: Clone + PartialEq + 'static,
{
    dep.subscribe(Rc::new(move || {
        if let Some(inner) = target.upgrade() {
            recompute(&inner);
        }
    }))
}

/// Re-run the read function and store its result. No-op on plain refs.
pub(crate) fn recompute<T>(inner: &Rc<RefInner<T>>)
where
    T: Clone + PartialEq + 'static,
{
    let (read, explicit) = match inner.derivation.borrow().as_ref() {
        Some(d) => (Rc::clone(&d.read), d.explicit.clone()),
        None => return,
    };

    let (value, deps) = tracking::track_seeded(explicit, || read());
    reconcile(inner, &deps);

    tracing::trace!(id = ?inner.id, deps = deps.len(), "computed.recompute");

    Ref::from_inner(Rc::clone(inner)).set(value);
}

/// Bring the subscriptions of `inner` in line with `deps`.
fn reconcile<T>(inner: &Rc<RefInner<T>>, deps: &[Rc<dyn Dependency>])
where
    T: Clone + PartialEq + 'static,
{
    let wanted: HashSet<RefId> = deps
        .iter()
        .map(|d| d.ref_id())
        .filter(|id| *id != inner.id)
        .collect();
    let subscribed: HashSet<RefId> = inner
        .derivation
        .borrow()
        .as_ref()
        .map(|d| d.subscriptions.iter().map(|(id, _)| *id).collect())
        .unwrap_or_default();

    // Subscribe outside the borrow: a dependency may be this same cell's
    // upstream and touch its own listener list.
    let weak = Rc::downgrade(inner);
    let added: Vec<(RefId, Disposer)> = deps
        .iter()
        .filter(|d| wanted.contains(&d.ref_id()) && !subscribed.contains(&d.ref_id()))
        .map(|d| (d.ref_id(), subscribe(d.as_ref(), weak.clone())))
        .collect();

    let stale: Vec<Disposer> = {
        let mut derivation = inner.derivation.borrow_mut();
        match derivation.as_mut() {
            Some(d) => {
                let (keep, stale): (Vec<_>, Vec<_>) = d
                    .subscriptions
                    .drain(..)
                    .partition(|(id, _)| wanted.contains(id));
                d.subscriptions = keep;
                d.subscriptions.extend(added);
                stale.into_iter().map(|(_, s)| s).collect()
            }
            None => added.into_iter().map(|(_, s)| s).collect(),
        }
    };

    for subscription in stale {
        subscription.dispose();
    }
}
