//! Counter Example - refs, computed refs and a component
//!
//! This example demonstrates:
//! - A `CounterView` component with a reactive `count` prop
//! - A computed label derived from the count
//! - Attribute changes coalescing into one render per frame
//! - A bound method emitting an event
//!
//! Run with: cargo run --example counter
//! Set RUST_LOG=spark_elements=debug to see lifecycle logs.

use spark_elements::{
    HeadlessHost, MountTarget, Props, Value, View, ViewNode, computed, make_ref, render_root,
};
use tracing_subscriber::EnvFilter;

/// Attribute writes deliver strings, method writes deliver integers.
fn clicks(value: &Value) -> i64 {
    match value {
        Value::Int(n) => *n,
        Value::Str(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-elements Counter Example ===\n");

    let host = HeadlessHost::new();

    let counter = host
        .define(
            "CounterView",
            || {
                let count = make_ref(Value::from(0));
                let source = count.clone();
                let label = computed(move || {
                    let n = clicks(&source.get());
                    Value::from(if n == 1 { "1 click".to_string() } else { format!("{n} clicks") })
                });
                Props::new()
                    .reference("count", &count)
                    .reference("label", &label)
                    .method("increment", |el, _| {
                        let Some(count) = el.reference("count") else {
                            return Value::Null;
                        };
                        let next = clicks(&count.get_untracked()) + 1;
                        count.set(Value::from(next));
                        el.emit("increment", Value::from_pairs([("count", next)]));
                        Value::from(next)
                    })
            },
            &["count"],
        )
        .expect("define CounterView");

    counter
        .template(|ctx| {
            ViewNode::new("button")
                .attr("part", "button")
                .text(ctx.value("label").to_string())
                .into()
        })
        .style("button { font: inherit }")
        .init(|el| println!("  [init] {} ready on {:?}", el.tag(), el.surface()));

    // Root mount
    let app: View = ViewNode::new("main")
        .child(ViewNode::new("inc-counter-view"))
        .into();
    let body = render_root(&host.platform(), &app, MountTarget::default()).expect("mount app");
    println!("Root markup: {}", host.surfaces().markup(body).unwrap_or_default());

    // The host upgrades the tag it found in the tree
    let el = host.create_element("inc-counter-view").expect("create element");
    host.connect(&el).expect("connect");
    host.tick();
    println!("After connect: {}", host.surfaces().markup(el.surface()).unwrap_or_default());

    // Two clicks before the next frame render once
    el.call("increment", &[]).expect("increment");
    el.call("increment", &[]).expect("increment");
    println!("Frames run: {}", host.tick());
    println!("After clicks: {}", host.surfaces().markup(el.surface()).unwrap_or_default());

    // Attribute writes go through the same ref
    host.set_attribute(&el, "count", "1").expect("set attribute");
    host.tick();
    println!("After attribute: {}", host.surfaces().markup(el.surface()).unwrap_or_default());

    println!("\nEvents:");
    for (target, event) in host.events().take() {
        println!("  {:?} {} {}", target, event.name, event.detail);
    }
    println!("\nRenders: {}", el.render_count());
}
