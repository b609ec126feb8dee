//! Property-based invariant tests for refs, computed refs and render
//! coalescing.
//!
//! 1. Listeners observe exactly the values that differ from their
//!    predecessor, in write order.
//! 2. A computed ref always equals its read function re-run on current inputs.
//! 3. Writes to refs the latest evaluation did not read never recompute.
//! 4. Any burst of attribute writes before a frame renders once, with the
//!    last value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use spark_elements::{HeadlessHost, Props, Value, View, computed, make_ref};

// ── Helpers ─────────────────────────────────────────────────────────────

fn writes_strategy() -> impl Strategy<Value = Vec<i8>> {
    proptest::collection::vec(-3i8..=3, 0..40)
}

fn distinct_runs(initial: i8, writes: &[i8]) -> Vec<i8> {
    let mut out = Vec::new();
    let mut current = initial;
    for &w in writes {
        if w != current {
            out.push(w);
            current = w;
        }
    }
    out
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Notification sequence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn listeners_see_distinct_successive_values(initial in -3i8..=3, writes in writes_strategy()) {
        let r = make_ref(initial);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        r.on_change(move |v| sink.borrow_mut().push(*v));

        for &w in &writes {
            r.set(w);
        }

        prop_assert_eq!(log.borrow().clone(), distinct_runs(initial, &writes));
        prop_assert_eq!(r.get(), writes.last().copied().unwrap_or(initial));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Computed consistency
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn computed_matches_read_function(
        ops in proptest::collection::vec((0usize..3, -50i64..50), 0..30),
    ) {
        let inputs: Vec<_> = (0..3).map(|_| make_ref(0i64)).collect();
        let read_inputs = inputs.clone();
        let read = move || read_inputs[0].get() * 2 + read_inputs[1].get() - read_inputs[2].get();
        let expected = read.clone();
        let derived = computed(read);

        for (index, value) in ops {
            inputs[index].set(value);
            prop_assert_eq!(derived.get(), expected());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Branch-local dependencies
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unread_branch_never_recomputes(
        use_left in any::<bool>(),
        writes in proptest::collection::vec(-10i64..10, 1..20),
    ) {
        let flag = make_ref(use_left);
        let left = make_ref(0i64);
        let right = make_ref(0i64);
        let runs = Rc::new(Cell::new(0u32));

        let (f, l, r, n) = (flag.clone(), left.clone(), right.clone(), runs.clone());
        let derived = computed(move || {
            n.set(n.get() + 1);
            if f.get() { l.get() } else { r.get() }
        });

        let unread = if use_left { &right } else { &left };
        for &w in &writes {
            unread.set(w);
        }

        prop_assert_eq!(runs.get(), 1);
        prop_assert_eq!(derived.get(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Render coalescing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn attribute_burst_renders_once_with_last_value(
        values in proptest::collection::vec("[a-z0-9]{1,6}", 1..12),
    ) {
        let host = HeadlessHost::new();
        host.define("Field", || Props::new().reference("value", &make_ref(Value::Null)), &["value"])
            .unwrap()
            .template(|ctx| View::text(ctx.value("value").to_string()));

        let el = host.create_element("inc-field").unwrap();
        host.connect(&el).unwrap();
        for v in &values {
            host.set_attribute(&el, "value", v).unwrap();
        }

        prop_assert_eq!(host.tick(), 1);
        prop_assert_eq!(el.render_count(), 1);
        prop_assert_eq!(
            host.surfaces().markup(el.surface()),
            values.last().cloned()
        );
    }
}
