//! Element - one live instance of a component type.
//!
//! # Lifecycle
//!
//! ```text
//! construct → surface attached, style adopted, bag built, refs subscribed
//! connect   → CONNECTED, render scheduled
//! any write → render scheduled (coalesced in the element's RenderSlot)
//! tick      → RENDERING, template, renderer, first time: initializer
//! drop      → subscriptions disposed, pending render cancelled
//! ```
//!
//! Renders never run inside the write that caused them. However many writes
//! happen before a frame, the element renders once on that frame and sees
//! the state as of the frame.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::context::RenderContext;
use super::definition::Definition;
use super::props::{Prop, ReadMode};
use crate::error::{ComponentError, Result};
use crate::host::{CustomEvent, ElementId, Platform, SurfaceId};
use crate::naming::kebab_to_camel;
use crate::pipeline::RenderSlot;
use crate::reactive::{Disposer, Ref, tracking};
use crate::types::Value;

bitflags::bitflags! {
    /// Lifecycle state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ElementFlags: u8 {
        /// Attached to the document.
        const CONNECTED = 1 << 0;
        /// Template evaluation and rendering in progress.
        const RENDERING = 1 << 1;
        /// First render completed and initializer ran.
        const INITIALIZED = 1 << 2;
    }
}

/// Coarse lifecycle position, derived from the flags and the render slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Connected,
    RenderPending,
    Rendering,
}

struct Entry {
    prop: Prop,
    /// Render listener on `prop` when it is a ref.
    subscription: Option<Disposer>,
}

pub(crate) struct ElementInner {
    id: ElementId,
    definition: Rc<Definition>,
    surface: SurfaceId,
    props: RefCell<BTreeMap<String, Entry>>,
    slot: RenderSlot,
    flags: Cell<ElementFlags>,
    renders: Cell<u64>,
}

impl ElementInner {
    fn set_flag(&self, flag: ElementFlags, on: bool) {
        let mut flags = self.flags.get();
        flags.set(flag, on);
        self.flags.set(flags);
    }
}

impl Drop for ElementInner {
    fn drop(&mut self) {
        for entry in self.props.get_mut().values_mut() {
            if let Some(subscription) = entry.subscription.take() {
                subscription.dispose();
            }
        }
        self.slot.cancel(self.definition.platform.frames.as_ref());
    }
}

/// Clears `RENDERING` when dropped, including on unwind.
struct RenderingGuard<'a> {
    inner: &'a ElementInner,
}

impl<'a> RenderingGuard<'a> {
    fn enter(inner: &'a ElementInner) -> Self {
        inner.set_flag(ElementFlags::RENDERING, true);
        Self { inner }
    }
}

impl Drop for RenderingGuard<'_> {
    fn drop(&mut self) {
        self.inner.set_flag(ElementFlags::RENDERING, false);
    }
}

/// Handle to a component instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    pub(crate) fn construct(definition: Rc<Definition>, id: ElementId) -> Element {
        let platform = &definition.platform;
        let surface = platform.surfaces.attach_surface(id);
        if let Err(err) = platform.surfaces.adopt_style(surface, &definition.style) {
            tracing::error!(element = id.0, %err, "element.adopt_style");
        }

        let props = tracking::untrack(|| definition.initial_props());

        let element = Element {
            inner: Rc::new(ElementInner {
                id,
                definition: Rc::clone(&definition),
                surface,
                props: RefCell::new(BTreeMap::new()),
                slot: RenderSlot::new(),
                flags: Cell::new(ElementFlags::empty()),
                renders: Cell::new(0),
            }),
        };
        for (name, prop) in props {
            element.store(name, prop);
        }

        tracing::debug!(
            element = id.0,
            tag = %element.tag(),
            surface = surface.0,
            props = element.inner.props.borrow().len(),
            "element.construct"
        );
        element
    }

    pub(crate) fn from_inner(inner: Rc<ElementInner>) -> Element {
        Element { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ElementInner> {
        Rc::downgrade(&self.inner)
    }

    fn platform(&self) -> &Platform {
        &self.inner.definition.platform
    }

    // =========================================================================
    // Property bag
    // =========================================================================

    /// Raw entry for `name`; a ref stays a ref.
    pub fn prop(&self, name: &str) -> Option<Prop> {
        self.inner.props.borrow().get(name).map(|e| e.prop.clone())
    }

    /// Read `name` in the given mode. Unknown names read as `Null`.
    pub fn read(&self, name: &str, mode: ReadMode) -> Prop {
        match (mode, self.prop(name).unwrap_or_default()) {
            (ReadMode::Unwrap, Prop::Ref(r)) => Prop::Value(r.get()),
            (_, prop) => prop,
        }
    }

    /// Current value of `name`, unwrapping refs. Methods and unknown names
    /// read as `Null`.
    pub fn value(&self, name: &str) -> Value {
        self.read(name, ReadMode::Unwrap).unwrap_value()
    }

    /// The ref stored under `name`, if the entry is one.
    pub fn reference(&self, name: &str) -> Option<Ref<Value>> {
        self.prop(name).and_then(|p| p.as_reactive().cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.props.borrow().contains_key(name)
    }

    pub fn prop_names(&self) -> Vec<String> {
        self.inner.props.borrow().keys().cloned().collect()
    }

    /// Replace the entry for `name` and schedule a render.
    ///
    /// A ref replaces the entry, it is not written through: to change a
    /// ref's value, set the ref itself. The render listener on a previously
    /// stored ref is disposed.
    pub fn set(&self, name: &str, prop: impl Into<Prop>) {
        self.store(name.to_string(), prop.into());
        self.schedule_render();
    }

    /// Call the method stored under `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.prop(name) {
            Some(Prop::Method(method)) => method.call(args),
            Some(_) => Err(ComponentError::NotAMethod(name.to_string())),
            None => Err(ComponentError::UnknownProperty(name.to_string())),
        }
    }

    fn store(&self, name: String, prop: Prop) {
        let prop = match prop {
            Prop::Method(method) => Prop::Method(method.bind(self)),
            other => other,
        };
        let subscription = prop.as_reactive().map(|r| self.subscribe(r));

        let previous = self
            .inner
            .props
            .borrow_mut()
            .insert(name, Entry { prop, subscription });

        if let Some(subscription) = previous.and_then(|e| e.subscription) {
            subscription.dispose();
        }
    }

    fn subscribe(&self, r: &Ref<Value>) -> Disposer {
        let weak = self.downgrade();
        r.on_change(move |_| {
            if let Some(inner) = weak.upgrade() {
                Element::from_inner(inner).schedule_render();
            }
        })
    }

    // =========================================================================
    // Host callbacks
    // =========================================================================

    /// Apply an attribute change. `new` is `None` when the attribute was
    /// removed.
    ///
    /// The value lands under both the attribute name and its camelCase
    /// spelling: written through when the entry is a ref, stored as a plain
    /// value otherwise.
    pub fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        let value = new.map_or(Value::Null, Value::from);

        let camel = kebab_to_camel(name);
        let mut names = vec![name.to_string()];
        if camel != name {
            names.push(camel);
        }

        for key in names {
            match self.prop(&key) {
                Some(Prop::Ref(r)) => r.set(value.clone()),
                _ => self.store(key, Prop::Value(value.clone())),
            }
        }

        tracing::trace!(element = self.inner.id.0, name, ?old, ?new, "element.attribute_changed");
        self.schedule_render();
    }

    /// The element was attached to the document.
    pub fn connected(&self) {
        self.inner.set_flag(ElementFlags::CONNECTED, true);
        tracing::debug!(element = self.inner.id.0, tag = %self.tag(), "element.connect");
        self.schedule_render();
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Request a render on the next frame, replacing any pending request.
    pub fn schedule_render(&self) {
        let weak = self.downgrade();
        let handle = self.inner.slot.submit(
            self.platform().frames.as_ref(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Element::from_inner(inner).run_scheduled_render();
                }
            }),
        );
        tracing::trace!(element = self.inner.id.0, handle = handle.0, "element.schedule_render");
    }

    /// Cancel any pending render and render synchronously.
    pub fn render_now(&self) -> Result<()> {
        self.inner.slot.cancel(self.platform().frames.as_ref());
        self.render_cycle()
    }

    fn run_scheduled_render(&self) {
        if let Err(err) = self.render_cycle() {
            tracing::error!(element = self.inner.id.0, tag = %self.tag(), %err, "element.render failed");
        }
    }

    fn render_cycle(&self) -> Result<()> {
        {
            let _rendering = RenderingGuard::enter(&self.inner);
            let context = RenderContext::new(self);
            let tree = tracking::untrack(|| self.inner.definition.evaluate(&context));
            self.platform().renderer.render(&tree, self.inner.surface)?;
        }

        let renders = self.inner.renders.get() + 1;
        self.inner.renders.set(renders);
        tracing::debug!(element = self.inner.id.0, renders, "element.render");

        if !self.is_initialized() {
            self.inner.set_flag(ElementFlags::INITIALIZED, true);
            if let Some(initializer) = self.inner.definition.initializer() {
                tracing::debug!(element = self.inner.id.0, "element.init");
                initializer(self);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatch a bubbling, composed event from this element.
    pub fn emit(&self, name: &str, detail: impl Into<Value>) {
        let event = CustomEvent::new(name, detail.into());
        tracing::trace!(element = self.inner.id.0, event = name, "element.emit");
        self.platform().events.dispatch(self.inner.id, event);
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    pub fn tag(&self) -> &str {
        &self.inner.definition.tag
    }

    /// The element's isolated surface.
    pub fn surface(&self) -> SurfaceId {
        self.inner.surface
    }

    pub fn flags(&self) -> ElementFlags {
        self.inner.flags.get()
    }

    pub fn is_connected(&self) -> bool {
        self.flags().contains(ElementFlags::CONNECTED)
    }

    pub fn is_rendering(&self) -> bool {
        self.flags().contains(ElementFlags::RENDERING)
    }

    pub fn is_initialized(&self) -> bool {
        self.flags().contains(ElementFlags::INITIALIZED)
    }

    pub fn is_render_pending(&self) -> bool {
        self.inner.slot.is_pending()
    }

    /// Completed renders.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    pub fn phase(&self) -> Phase {
        if self.is_rendering() {
            Phase::Rendering
        } else if self.is_render_pending() {
            Phase::RenderPending
        } else if self.is_connected() {
            Phase::Connected
        } else {
            Phase::Constructed
        }
    }

    /// Whether two handles point at the same instance.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("tag", &self.tag())
            .field("flags", &self.flags())
            .field("props", &self.prop_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentType, Props};
    use crate::host::headless::HeadlessHost;
    use crate::reactive::make_ref;
    use crate::view::View;

    fn counter(host: &HeadlessHost, count: &Ref<Value>) -> ComponentType {
        let count = count.clone();
        let component = host
            .define(
                "CounterView",
                move || Props::new().reference("count", &count).value("label", "n"),
                &["count", "maxCount"],
            )
            .unwrap();
        component.template(|ctx| View::text(format!("{}={}", ctx.value("label"), ctx.value("count"))));
        component
    }

    #[test]
    fn test_bag_has_placeholders_and_setup_entries() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(0));
        counter(&host, &count);

        let el = host.create_element("inc-counter-view").unwrap();
        assert_eq!(el.prop_names(), vec!["count", "label", "max-count"]);
        assert_eq!(el.value("max-count"), Value::Null);
        assert!(el.reference("count").is_some_and(|r| r.ptr_eq(&count)));
        assert_eq!(el.phase(), Phase::Constructed);
    }

    #[test]
    fn test_read_modes() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(4));
        counter(&host, &count);
        let el = host.create_element("inc-counter-view").unwrap();

        assert!(el.read("count", ReadMode::Raw).is_reactive());
        assert_eq!(el.read("count", ReadMode::Unwrap).as_value(), Some(&Value::Int(4)));
        assert_eq!(el.read("missing", ReadMode::Raw).as_value(), Some(&Value::Null));
    }

    #[test]
    fn test_writes_coalesce_into_one_render() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(0));
        counter(&host, &count);
        let el = host.create_element("inc-counter-view").unwrap();
        host.connect(&el).unwrap();

        count.set(Value::from(1));
        count.set(Value::from(2));
        el.set("label", "total");

        assert_eq!(el.phase(), Phase::RenderPending);
        assert_eq!(host.frames().pending(), 1);
        assert_eq!(host.tick(), 1);
        assert_eq!(el.render_count(), 1);
        assert_eq!(host.surfaces().markup(el.surface()).as_deref(), Some("total=2"));
        assert_eq!(el.phase(), Phase::Connected);
    }

    #[test]
    fn test_rebinding_ref_drops_old_listener() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(0));
        counter(&host, &count);
        let el = host.create_element("inc-counter-view").unwrap();
        assert_eq!(count.listener_count(), 1);

        let other = make_ref(Value::from(10));
        el.set("count", &other);
        host.tick();

        assert_eq!(count.listener_count(), 0);
        assert_eq!(other.listener_count(), 1);

        count.set(Value::from(5));
        assert!(!el.is_render_pending());
        other.set(Value::from(11));
        assert!(el.is_render_pending());
    }

    #[test]
    fn test_attribute_writes_both_spellings() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(0));
        counter(&host, &count);
        let el = host.create_element("inc-counter-view").unwrap();

        host.set_attribute(&el, "max-count", "9").unwrap();
        assert_eq!(el.value("max-count"), Value::from("9"));
        assert_eq!(el.value("maxCount"), Value::from("9"));

        host.set_attribute(&el, "count", "3").unwrap();
        assert_eq!(count.get(), Value::from("3"));
        assert!(el.prop("count").is_some_and(|p| p.is_reactive()));

        host.remove_attribute(&el, "count").unwrap();
        assert_eq!(count.get(), Value::Null);
    }

    #[test]
    fn test_methods_are_bound() {
        let host = HeadlessHost::new();
        host.define(
            "Echo",
            || {
                Props::new()
                    .value("prefix", ">")
                    .method("echo", |el, args| {
                        let arg = args.first().cloned().unwrap_or_default();
                        Value::from(format!("{}{}", el.value("prefix"), arg))
                    })
            },
            &[],
        )
        .unwrap();
        let el = host.create_element("inc-echo").unwrap();

        assert_eq!(el.call("echo", &[Value::from("hi")]), Ok(Value::from(">hi")));
        assert_eq!(
            el.call("prefix", &[]),
            Err(ComponentError::NotAMethod("prefix".to_string()))
        );
        assert_eq!(
            el.call("nope", &[]),
            Err(ComponentError::UnknownProperty("nope".to_string()))
        );

        el.set("shout", crate::component::Method::new(|el, _| el.value("prefix")));
        assert_eq!(el.call("shout", &[]), Ok(Value::from(">")));
    }

    #[test]
    fn test_method_outliving_element() {
        let host = HeadlessHost::new();
        let component = host
            .define("Lone", || Props::new().method("ping", |_, _| Value::from(1)), &[])
            .unwrap();
        let method = {
            let el = component.construct(ElementId(500));
            el.prop("ping").and_then(|p| p.as_method().cloned()).unwrap()
        };
        assert!(method.is_bound());
        assert_eq!(method.call(&[]), Err(ComponentError::ElementDropped));
    }

    #[test]
    fn test_drop_disposes_and_cancels() {
        let host = HeadlessHost::new();
        let count = make_ref(Value::from(0));
        let component = counter(&host, &count);

        let el = component.construct(ElementId(100));
        el.connected();
        assert_eq!(count.listener_count(), 1);
        assert_eq!(host.frames().pending(), 1);

        drop(el);
        assert_eq!(count.listener_count(), 0);
        assert_eq!(host.frames().pending(), 0);
        count.set(Value::from(1));
    }

    #[test]
    fn test_emit() {
        let host = HeadlessHost::new();
        host.define_named("Button", &[]).unwrap();
        let el = host.create_element("inc-button").unwrap();

        el.emit("press", Value::from_pairs([("x", 1)]));

        let events = host.events().take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, el.id());
        assert_eq!(events[0].1.name, "press");
        assert!(events[0].1.bubbles && events[0].1.composed);
        assert_eq!(events[0].1.detail.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_rendering_flag_visible_in_template() {
        let host = HeadlessHost::new();
        let component = host.define_named("Probe", &[]).unwrap();
        component.template(|ctx| View::text(ctx.element().is_rendering().to_string()));
        let el = host.create_element("inc-probe").unwrap();

        el.render_now().unwrap();
        assert_eq!(host.surfaces().markup(el.surface()).as_deref(), Some("true"));
        assert!(!el.is_rendering());
        assert!(el.is_initialized());
    }
}
