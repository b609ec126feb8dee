//! Host platform seams.
//!
//! The component manager never talks to a concrete platform. Everything it
//! needs is one of these traits:
//!
//! - [`FrameScheduler`] - next-frame callbacks (in [`crate::pipeline`])
//! - [`TemplateRenderer`] - diff a [`View`] into a surface
//! - [`SurfaceHost`] - isolated per-element surfaces, style adoption,
//!   selector lookup for the root mount
//! - [`EventSink`] - event dispatch
//! - [`ElementRegistry`] - tag registration; the host then drives elements
//!   through [`LifecycleHooks`]
//!
//! [`Platform`] bundles the services an element uses at runtime. A component
//! type captures one at definition time. The registry is kept out of the
//! bundle because it owns the hooks, and the hooks own the platform.
//!
//! [`headless`] implements every trait in memory.

pub mod headless;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::component::Element;
use crate::config::Config;
use crate::error::HostError;
use crate::pipeline::FrameScheduler;
use crate::types::Value;
use crate::view::View;

// =============================================================================
// Identifiers
// =============================================================================

/// A render target: an element's isolated surface or a root container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// A host element instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

// =============================================================================
// Services
// =============================================================================

/// Diff-and-patch renderer. Rendering the same tree twice leaves the surface
/// unchanged.
pub trait TemplateRenderer {
    fn render(&self, tree: &View, surface: SurfaceId) -> Result<(), HostError>;
}

/// Surfaces and styles.
pub trait SurfaceHost {
    /// Allocate the isolated surface owned by `element`.
    fn attach_surface(&self, element: ElementId) -> SurfaceId;

    /// Apply `sheet` to `surface`. The sheet is shared: later replacements of
    /// its text apply to every surface that adopted it.
    fn adopt_style(&self, surface: SurfaceId, sheet: &StyleSheet) -> Result<(), HostError>;

    /// Resolve a selector to a root surface.
    fn query(&self, selector: &str) -> Option<SurfaceId>;
}

/// Receives events emitted by elements.
pub trait EventSink {
    fn dispatch(&self, target: ElementId, event: CustomEvent);
}

/// Host-side element registration.
pub trait ElementRegistry {
    /// Register a tag. The observed attribute list is fixed from here on.
    fn register(&self, registration: Registration) -> Result<(), HostError>;
}

/// Callbacks the host invokes on a registered component type.
pub trait LifecycleHooks {
    /// Create the element for a new host instance.
    fn on_construct(&self, id: ElementId) -> Element;

    /// The element was attached to the document.
    fn on_connect(&self, element: &Element);

    /// An observed attribute changed. `new` is `None` when it was removed.
    fn on_attribute_change(
        &self,
        element: &Element,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    );
}

/// What [`ElementRegistry::register`] receives.
pub struct Registration {
    pub tag: String,
    pub observed_attributes: Vec<String>,
    pub hooks: Rc<dyn LifecycleHooks>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("tag", &self.tag)
            .field("observed_attributes", &self.observed_attributes)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Events
// =============================================================================

/// A named event with an arbitrary payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub name: String,
    pub detail: Value,
    /// Propagates to ancestors.
    pub bubbles: bool,
    /// Crosses isolated-surface boundaries.
    pub composed: bool,
}

impl CustomEvent {
    /// Bubbling, composed event.
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles: true,
            composed: true,
        }
    }
}

// =============================================================================
// Style Sheet
// =============================================================================

/// Opaque style payload shared by every instance of a component type.
///
/// Cloning shares the sheet.
#[derive(Clone, Default)]
pub struct StyleSheet {
    text: Rc<RefCell<String>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sheet's contents.
    pub fn replace(&self, text: &str) {
        let mut current = self.text.borrow_mut();
        current.clear();
        current.push_str(text);
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.text.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &StyleSheet) -> bool {
        Rc::ptr_eq(&self.text, &other.text)
    }
}

impl fmt::Debug for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StyleSheet").field(&*self.text.borrow()).finish()
    }
}

// =============================================================================
// Platform
// =============================================================================

/// Host services used by elements at runtime.
#[derive(Clone)]
pub struct Platform {
    pub frames: Rc<dyn FrameScheduler>,
    pub renderer: Rc<dyn TemplateRenderer>,
    pub surfaces: Rc<dyn SurfaceHost>,
    pub events: Rc<dyn EventSink>,
    pub config: Config,
}

impl Platform {
    pub fn new(
        frames: Rc<dyn FrameScheduler>,
        renderer: Rc<dyn TemplateRenderer>,
        surfaces: Rc<dyn SurfaceHost>,
        events: Rc<dyn EventSink>,
    ) -> Self {
        Self {
            frames,
            renderer,
            surfaces,
            events,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_sheet_is_shared() {
        let sheet = StyleSheet::new();
        let adopted = sheet.clone();

        sheet.replace(":host { color: red }");
        assert_eq!(adopted.text(), ":host { color: red }");
        assert!(sheet.ptr_eq(&adopted));

        sheet.replace("");
        assert!(adopted.is_empty());
    }

    #[test]
    fn test_custom_event_defaults() {
        let event = CustomEvent::new("change", Value::from(1));
        assert!(event.bubbles);
        assert!(event.composed);
        assert_eq!(event.detail, Value::Int(1));
    }
}
