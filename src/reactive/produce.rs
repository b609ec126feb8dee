//! Copy-on-write editing.
//!
//! `produce` hands a draft copy of `base` to an edit function and returns the
//! edited draft. `base` itself is never touched, so anything holding the old
//! value keeps seeing the old value.
//!
//! For the persistent collections used by [`Value`](crate::types::Value)
//! (`im::Vector`, `im::OrdMap`) the copy is O(1) and an edit only rebuilds
//! the nodes on the path it writes; every other branch is shared with
//! `base`. Plain structs are cloned field by field.

/// Apply `edit` to a copy of `base` and return the copy.
pub fn produce<T: Clone>(base: &T, edit: impl FnOnce(&mut T)) -> T {
    let mut draft = base.clone();
    edit(&mut draft);
    draft
}
