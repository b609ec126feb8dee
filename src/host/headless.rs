//! Headless host - every platform seam implemented in memory.
//!
//! Frames are driven by hand through [`ManualFrames`], rendered trees are
//! stored per surface, events are appended to a log and elements live in a
//! registry keyed by [`ElementId`]. Nothing here paints.
//!
//! ```
//! use spark_elements::{HeadlessHost, Props, ViewNode};
//!
//! let host = HeadlessHost::new();
//! let greeting = host
//!     .define("Greeting", || Props::new().value("name", "world"), &["name"])
//!     .unwrap();
//! greeting.template(|ctx| {
//!     ViewNode::new("p").text(format!("hello {}", ctx.value("name"))).into()
//! });
//!
//! let el = host.create_element("inc-greeting").unwrap();
//! host.connect(&el).unwrap();
//! host.tick();
//!
//! assert_eq!(
//!     host.surfaces().markup(el.surface()).as_deref(),
//!     Some("<p>hello world</p>")
//! );
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::{
    CustomEvent, ElementId, ElementRegistry, EventSink, LifecycleHooks, Platform, Registration,
    StyleSheet, SurfaceHost, SurfaceId, TemplateRenderer,
};
use crate::component::{self, ComponentType, Element, Props};
use crate::config::Config;
use crate::error::{HostError, Result};
use crate::pipeline::{DEFAULT_ROOT_SELECTOR, ManualFrames};
use crate::view::View;

// =============================================================================
// Host
// =============================================================================

/// All headless services wired together.
pub struct HeadlessHost {
    frames: Rc<ManualFrames>,
    surfaces: Rc<HeadlessSurfaces>,
    events: Rc<EventLog>,
    registry: Rc<HeadlessRegistry>,
    config: Config,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            frames: Rc::new(ManualFrames::new()),
            surfaces: Rc::new(HeadlessSurfaces::new()),
            events: Rc::new(EventLog::default()),
            registry: Rc::new(HeadlessRegistry::default()),
            config,
        }
    }

    /// Service bundle handed to component types.
    pub fn platform(&self) -> Platform {
        Platform::new(
            self.frames.clone(),
            self.surfaces.clone(),
            self.surfaces.clone(),
            self.events.clone(),
        )
        .with_config(self.config.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn frames(&self) -> &ManualFrames {
        &self.frames
    }

    pub fn surfaces(&self) -> &HeadlessSurfaces {
        &self.surfaces
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn registry(&self) -> &HeadlessRegistry {
        &self.registry
    }

    /// Advance one frame. Returns the number of tasks that ran.
    pub fn tick(&self) -> usize {
        self.frames.tick()
    }

    /// Define and register a component type on this host.
    pub fn define<S>(&self, name: &str, setup: S, observed: &[&str]) -> Result<ComponentType>
    where
        S: Fn() -> Props + 'static,
    {
        component::define(self.registry.as_ref(), &self.platform(), name, setup, observed)
    }

    /// Define a component type without a setup function.
    pub fn define_named(&self, name: &str, observed: &[&str]) -> Result<ComponentType> {
        component::define_named(self.registry.as_ref(), &self.platform(), name, observed)
    }

    /// Instantiate a registered tag.
    pub fn create_element(&self, tag: &str) -> Result<Element> {
        Ok(self.registry.create(tag)?)
    }

    /// Attach an element to the document.
    pub fn connect(&self, element: &Element) -> Result<()> {
        Ok(self.registry.connect(element.id())?)
    }

    pub fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        Ok(self.registry.set_attribute(element.id(), name, Some(value))?)
    }

    pub fn remove_attribute(&self, element: &Element, name: &str) -> Result<()> {
        Ok(self.registry.set_attribute(element.id(), name, None)?)
    }

    /// Take an element out of the document. Consumes the caller's handle.
    pub fn remove(&self, element: Element) -> Result<()> {
        Ok(self.registry.remove(element.id())?)
    }
}

impl fmt::Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("frames", &self.frames)
            .field("surfaces", &self.surfaces.len())
            .field("events", &self.events.len())
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Surfaces
// =============================================================================

#[derive(Default)]
struct Surface {
    owner: Option<ElementId>,
    selector: Option<String>,
    tree: View,
    renders: usize,
    styles: Vec<StyleSheet>,
}

/// In-memory surfaces. Implements [`TemplateRenderer`] and [`SurfaceHost`].
///
/// A root surface for `"body"` exists from construction.
pub struct HeadlessSurfaces {
    surfaces: RefCell<BTreeMap<SurfaceId, Surface>>,
    next_id: Cell<u64>,
}

impl Default for HeadlessSurfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurfaces {
    pub fn new() -> Self {
        let surfaces = Self {
            surfaces: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
        };
        surfaces.add_root(DEFAULT_ROOT_SELECTOR);
        surfaces
    }

    fn allocate(&self, surface: Surface) -> SurfaceId {
        let id = SurfaceId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.surfaces.borrow_mut().insert(id, surface);
        id
    }

    /// Add a root container reachable through [`SurfaceHost::query`].
    /// Adding an existing selector returns the existing surface.
    pub fn add_root(&self, selector: &str) -> SurfaceId {
        if let Some(existing) = self.root(selector) {
            return existing;
        }
        self.allocate(Surface {
            selector: Some(selector.to_string()),
            ..Surface::default()
        })
    }

    pub fn root(&self, selector: &str) -> Option<SurfaceId> {
        self.surfaces
            .borrow()
            .iter()
            .find(|(_, s)| s.selector.as_deref() == Some(selector))
            .map(|(id, _)| *id)
    }

    /// Surface owned by `element`.
    pub fn surface_of(&self, element: ElementId) -> Option<SurfaceId> {
        self.surfaces
            .borrow()
            .iter()
            .find(|(_, s)| s.owner == Some(element))
            .map(|(id, _)| *id)
    }

    /// Last tree rendered into `surface`.
    pub fn tree(&self, surface: SurfaceId) -> Option<View> {
        self.surfaces.borrow().get(&surface).map(|s| s.tree.clone())
    }

    pub fn markup(&self, surface: SurfaceId) -> Option<String> {
        self.surfaces.borrow().get(&surface).map(|s| s.tree.to_markup())
    }

    /// Number of renders into `surface`. Zero for unknown surfaces.
    pub fn render_count(&self, surface: SurfaceId) -> usize {
        self.surfaces
            .borrow()
            .get(&surface)
            .map_or(0, |s| s.renders)
    }

    /// Current text of every sheet adopted by `surface`.
    pub fn styles(&self, surface: SurfaceId) -> Vec<String> {
        self.surfaces
            .borrow()
            .get(&surface)
            .map(|s| s.styles.iter().map(StyleSheet::text).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.surfaces.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.borrow().is_empty()
    }
}

impl TemplateRenderer for HeadlessSurfaces {
    fn render(&self, tree: &View, surface: SurfaceId) -> Result<(), HostError> {
        let mut surfaces = self.surfaces.borrow_mut();
        let target = surfaces
            .get_mut(&surface)
            .ok_or(HostError::UnknownSurface(surface))?;
        if target.tree != *tree {
            target.tree = tree.clone();
        }
        target.renders += 1;
        Ok(())
    }
}

impl SurfaceHost for HeadlessSurfaces {
    fn attach_surface(&self, element: ElementId) -> SurfaceId {
        self.allocate(Surface {
            owner: Some(element),
            ..Surface::default()
        })
    }

    fn adopt_style(&self, surface: SurfaceId, sheet: &StyleSheet) -> Result<(), HostError> {
        let mut surfaces = self.surfaces.borrow_mut();
        let target = surfaces
            .get_mut(&surface)
            .ok_or(HostError::UnknownSurface(surface))?;
        if !target.styles.iter().any(|s| s.ptr_eq(sheet)) {
            target.styles.push(sheet.clone());
        }
        Ok(())
    }

    fn query(&self, selector: &str) -> Option<SurfaceId> {
        self.root(selector)
    }
}

impl fmt::Debug for HeadlessSurfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurfaces")
            .field("surfaces", &self.len())
            .finish()
    }
}

// =============================================================================
// Events
// =============================================================================

/// Records every dispatched event in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<(ElementId, CustomEvent)>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<(ElementId, CustomEvent)> {
        self.events.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<(ElementId, CustomEvent)> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for EventLog {
    fn dispatch(&self, target: ElementId, event: CustomEvent) {
        self.events.borrow_mut().push((target, event));
    }
}

// =============================================================================
// Registry
// =============================================================================

struct Definition {
    observed: Vec<String>,
    hooks: Rc<dyn LifecycleHooks>,
}

struct Instance {
    tag: String,
    element: Element,
    attributes: BTreeMap<String, String>,
    connected: bool,
}

/// Tag registry and element store.
///
/// Hooks are always invoked with no internal borrow held, so a hook may call
/// back into the registry.
#[derive(Default)]
pub struct HeadlessRegistry {
    definitions: RefCell<HashMap<String, Definition>>,
    elements: RefCell<BTreeMap<ElementId, Instance>>,
    next_element: Cell<u64>,
}

/// A valid tag is lowercase, starts with an ASCII letter and contains a
/// hyphen.
fn validate_tag(tag: &str) -> Result<(), HostError> {
    let starts_with_letter = tag.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    let valid = starts_with_letter
        && tag.contains('-')
        && !tag.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace());
    if valid {
        Ok(())
    } else {
        Err(HostError::InvalidTagName(tag.to_string()))
    }
}

impl HeadlessRegistry {
    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.borrow().contains_key(tag)
    }

    pub fn observed_attributes(&self, tag: &str) -> Option<Vec<String>> {
        self.definitions.borrow().get(tag).map(|d| d.observed.clone())
    }

    /// Instantiate `tag`.
    pub fn create(&self, tag: &str) -> Result<Element, HostError> {
        let hooks = self
            .definitions
            .borrow()
            .get(tag)
            .map(|d| Rc::clone(&d.hooks))
            .ok_or_else(|| HostError::UnknownTag(tag.to_string()))?;

        let id = ElementId(self.next_element.get());
        self.next_element.set(id.0 + 1);

        let element = hooks.on_construct(id);
        self.elements.borrow_mut().insert(
            id,
            Instance {
                tag: tag.to_string(),
                element: element.clone(),
                attributes: BTreeMap::new(),
                connected: false,
            },
        );
        Ok(element)
    }

    /// Drop the registry's handle to `id`. Once the caller's handles are gone
    /// too, the element releases its ref listeners and pending render.
    pub fn remove(&self, id: ElementId) -> Result<(), HostError> {
        let instance = self
            .elements
            .borrow_mut()
            .remove(&id)
            .ok_or(HostError::UnknownElement(id))?;
        drop(instance);
        Ok(())
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.borrow().get(&id).map(|i| i.element.clone())
    }

    pub fn is_connected(&self, id: ElementId) -> bool {
        self.elements.borrow().get(&id).is_some_and(|i| i.connected)
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.elements
            .borrow()
            .get(&id)
            .and_then(|i| i.attributes.get(name).cloned())
    }

    /// Attach `id` to the document and run its connect hook.
    pub fn connect(&self, id: ElementId) -> Result<(), HostError> {
        let (element, hooks) = {
            let mut elements = self.elements.borrow_mut();
            let instance = elements.get_mut(&id).ok_or(HostError::UnknownElement(id))?;
            instance.connected = true;
            (instance.element.clone(), self.hooks_for(&instance.tag)?)
        };
        hooks.on_connect(&element);
        Ok(())
    }

    /// Set (`Some`) or remove (`None`) an attribute. The change hook only
    /// runs for observed attributes.
    pub fn set_attribute(
        &self,
        id: ElementId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), HostError> {
        let (element, tag, old) = {
            let mut elements = self.elements.borrow_mut();
            let instance = elements.get_mut(&id).ok_or(HostError::UnknownElement(id))?;
            let old = match value {
                Some(value) => instance
                    .attributes
                    .insert(name.to_string(), value.to_string()),
                None => instance.attributes.remove(name),
            };
            (instance.element.clone(), instance.tag.clone(), old)
        };

        let observed = self
            .definitions
            .borrow()
            .get(&tag)
            .is_some_and(|d| d.observed.iter().any(|a| a == name));
        if observed {
            let hooks = self.hooks_for(&tag)?;
            hooks.on_attribute_change(&element, name, old.as_deref(), value);
        }
        Ok(())
    }

    fn hooks_for(&self, tag: &str) -> Result<Rc<dyn LifecycleHooks>, HostError> {
        self.definitions
            .borrow()
            .get(tag)
            .map(|d| Rc::clone(&d.hooks))
            .ok_or_else(|| HostError::UnknownTag(tag.to_string()))
    }
}

impl ElementRegistry for HeadlessRegistry {
    fn register(&self, registration: Registration) -> Result<(), HostError> {
        validate_tag(&registration.tag)?;
        let mut definitions = self.definitions.borrow_mut();
        if definitions.contains_key(&registration.tag) {
            return Err(HostError::DuplicateTag(registration.tag));
        }
        definitions.insert(
            registration.tag,
            Definition {
                observed: registration.observed_attributes,
                hooks: registration.hooks,
            },
        );
        Ok(())
    }
}

impl fmt::Debug for HeadlessRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<String> = self.definitions.borrow().keys().cloned().collect();
        tags.sort();
        f.debug_struct("HeadlessRegistry")
            .field("tags", &tags)
            .field("elements", &self.elements.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::reactive::make_ref;
    use crate::types::Value;

    #[test]
    fn test_body_root_exists() {
        let surfaces = HeadlessSurfaces::new();
        assert!(surfaces.root("body").is_some());
        assert_eq!(surfaces.query("body"), surfaces.root("body"));
        assert_eq!(surfaces.add_root("body"), surfaces.root("body").unwrap());
        assert_eq!(surfaces.len(), 1);
    }

    #[test]
    fn test_render_same_tree_twice() {
        let surfaces = HeadlessSurfaces::new();
        let body = surfaces.root("body").unwrap();
        let tree = View::text("same");

        surfaces.render(&tree, body).unwrap();
        surfaces.render(&tree, body).unwrap();

        assert_eq!(surfaces.tree(body), Some(tree));
        assert_eq!(surfaces.render_count(body), 2);
    }

    #[test]
    fn test_adopted_style_follows_sheet() {
        let surfaces = HeadlessSurfaces::new();
        let surface = surfaces.attach_surface(ElementId(0));
        let sheet = StyleSheet::new();

        surfaces.adopt_style(surface, &sheet).unwrap();
        surfaces.adopt_style(surface, &sheet).unwrap();
        sheet.replace("p { margin: 0 }");

        assert_eq!(surfaces.styles(surface), vec!["p { margin: 0 }".to_string()]);
        assert_eq!(surfaces.surface_of(ElementId(0)), Some(surface));
    }

    #[test]
    fn test_event_log_take() {
        let log = EventLog::default();
        log.dispatch(ElementId(1), CustomEvent::new("ping", Value::Null));

        assert_eq!(log.len(), 1);
        let drained = log.take();
        assert_eq!(drained[0].1.name, "ping");
        assert!(log.is_empty());
    }

    #[test]
    fn test_tag_validation() {
        assert!(validate_tag("inc-counter").is_ok());
        assert!(validate_tag("counter").is_err());
        assert!(validate_tag("Inc-counter").is_err());
        assert!(validate_tag("-counter").is_err());
        assert!(validate_tag("inc-Counter").is_err());
        assert!(validate_tag("").is_err());
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let host = HeadlessHost::new();
        host.define_named("Widget", &[]).unwrap();

        let err = host.define_named("Widget", &[]).unwrap_err();
        assert_eq!(
            err,
            ComponentError::Host(HostError::DuplicateTag("inc-widget".to_string()))
        );
    }

    #[test]
    fn test_unknown_tag() {
        let host = HeadlessHost::new();
        let err = host.create_element("inc-missing").unwrap_err();
        assert_eq!(
            err,
            ComponentError::Host(HostError::UnknownTag("inc-missing".to_string()))
        );
    }

    #[test]
    fn test_unobserved_attribute_is_stored_only() {
        let host = HeadlessHost::new();
        host.define("Badge", || Props::new().value("label", "x"), &["label"])
            .unwrap();
        let el = host.create_element("inc-badge").unwrap();

        host.set_attribute(&el, "title", "tip").unwrap();
        assert_eq!(host.registry().attribute(el.id(), "title").as_deref(), Some("tip"));
        assert_eq!(el.value("title"), Value::Null);
        assert_eq!(host.frames().pending(), 0);

        host.set_attribute(&el, "label", "y").unwrap();
        assert_eq!(el.value("label"), Value::from("y"));
        assert_eq!(host.frames().pending(), 1);
    }

    #[test]
    fn test_connect_marks_instance() {
        let host = HeadlessHost::new();
        host.define_named("Pane", &[]).unwrap();
        let el = host.create_element("inc-pane").unwrap();

        assert!(!host.registry().is_connected(el.id()));
        host.connect(&el).unwrap();
        assert!(host.registry().is_connected(el.id()));
        assert!(host.registry().element(el.id()).is_some_and(|e| e.ptr_eq(&el)));
    }

    #[test]
    fn test_remove_releases_ref_listeners() {
        let shared = make_ref(Value::from(0));
        let source = shared.clone();
        let host = HeadlessHost::new();
        host.define("Meter", move || Props::new().reference("level", &source), &[])
            .unwrap();

        let el = host.create_element("inc-meter").unwrap();
        let id = el.id();
        host.connect(&el).unwrap();
        host.tick();
        shared.set(Value::from(1));
        assert_eq!(shared.listener_count(), 1);
        assert_eq!(host.frames().pending(), 1);

        host.remove(el).unwrap();

        assert_eq!(shared.listener_count(), 0);
        assert_eq!(host.frames().pending(), 0);
        assert!(host.registry().element(id).is_none());
        shared.set(Value::from(2));
        assert_eq!(host.tick(), 0);
        assert_eq!(
            host.registry().remove(id),
            Err(HostError::UnknownElement(id))
        );
    }

    #[test]
    fn test_custom_prefix() {
        let host = HeadlessHost::with_config(Config::new().with_tag_prefix("app"));
        let component = host.define_named("TodoList", &[]).unwrap();
        assert_eq!(component.tag(), "app-todo-list");
        assert!(host.registry().is_defined("app-todo-list"));
    }
}
