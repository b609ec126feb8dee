//! Reactive graph - observable refs with automatic dependency tracking.
//!
//! - [`Ref`]: a mutable cell with ordered change listeners.
//! - [`computed`]: a `Ref` whose value is derived from a read function and
//!   kept current as the refs it reads change.
//! - [`tracking`]: the session stack that records which refs a read function
//!   touched.
//! - [`produce`]: copy-on-write editing used by [`Ref::edit`].
//!
//! # Invariants
//!
//! 1. Listeners fire in registration order.
//! 2. Writing a value equal to the current one is a no-op: nothing fires.
//! 3. A computed ref is subscribed to exactly the refs read during its most
//!    recent evaluation, plus its explicit dependencies.
//! 4. Disposing a listener is idempotent.
//!
//! Everything here is single-threaded (`Rc`, `RefCell`, thread-local session
//! stack). Listeners run synchronously inside the setter; a listener that
//! writes to another ref produces a nested notification chain.

mod computed;
mod disposer;
mod produce;
mod reference;
pub mod tracking;

pub use computed::{computed, computed_with};
pub use disposer::Disposer;
pub use produce::produce;
pub use reference::{Ref, make_ref};
pub use tracking::{Dependency, RefId};
