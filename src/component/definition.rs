//! Component types - definition, registration and the configuration builder.
//!
//! # Example
//!
//! ```
//! use spark_elements::{HeadlessHost, Props, Value, View, make_ref};
//!
//! let host = HeadlessHost::new();
//! let count = make_ref(Value::from(0));
//! let shared = count.clone();
//!
//! let counter = host
//!     .define("CounterView", move || Props::new().reference("count", &shared), &["count"])
//!     .unwrap();
//! counter
//!     .template(|ctx| View::text(format!("count: {}", ctx.value("count"))))
//!     .style(":host { display: block }");
//!
//! assert_eq!(counter.tag(), "inc-counter-view");
//!
//! let el = host.create_element("inc-counter-view").unwrap();
//! host.connect(&el).unwrap();
//! count.set(Value::from(5));
//! host.tick();
//!
//! assert_eq!(host.surfaces().markup(el.surface()).as_deref(), Some("count: 5"));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::context::RenderContext;
use super::element::Element;
use super::props::{Prop, Props};
use crate::error::Result;
use crate::host::{ElementId, ElementRegistry, LifecycleHooks, Platform, Registration, StyleSheet};
use crate::naming::camel_to_kebab;
use crate::types::Value;
use crate::view::View;

type SetupFn = Box<dyn Fn() -> Props>;
type TemplateFn = Rc<dyn Fn(&RenderContext<'_>) -> View>;
type InitFn = Rc<dyn Fn(&Element)>;

#[derive(Clone, Default)]
enum Template {
    #[default]
    Empty,
    Render(TemplateFn),
    Static(View),
}

/// Everything shared by the instances of one component type.
pub(crate) struct Definition {
    name: String,
    pub(crate) tag: String,
    observed: Vec<String>,
    setup: Option<SetupFn>,
    template: RefCell<Template>,
    initializer: RefCell<Option<InitFn>>,
    pub(crate) style: StyleSheet,
    pub(crate) platform: Platform,
}

impl Definition {
    /// A `Null` placeholder per observed attribute, overlaid with the setup
    /// result.
    pub(crate) fn initial_props(&self) -> Props {
        let mut props = Props::new();
        for attribute in &self.observed {
            props.insert(attribute.clone(), Prop::Value(Value::Null));
        }
        if let Some(setup) = &self.setup {
            for (name, prop) in setup() {
                props.insert(name, prop);
            }
        }
        props
    }

    pub(crate) fn evaluate(&self, context: &RenderContext<'_>) -> View {
        let template = self.template.borrow().clone();
        match template {
            Template::Empty => View::Empty,
            Template::Render(render) => render(context),
            Template::Static(view) => view,
        }
    }

    pub(crate) fn initializer(&self) -> Option<InitFn> {
        self.initializer.borrow().clone()
    }
}

/// Define a component type and register it with `registry`.
///
/// The tag is the configured prefix followed by the kebab-cased `name`.
/// `observed` lists property names; their kebab-cased forms become the
/// observed attributes and get `Null` placeholders in every new bag.
pub fn define<S>(
    registry: &dyn ElementRegistry,
    platform: &Platform,
    name: &str,
    setup: S,
    observed: &[&str],
) -> Result<ComponentType>
where
    S: Fn() -> Props + 'static,
{
    ComponentType::register(registry, platform, name, Some(Box::new(setup)), observed)
}

/// Define a component type with no setup function. Its bag holds only the
/// observed attribute placeholders.
pub fn define_named(
    registry: &dyn ElementRegistry,
    platform: &Platform,
    name: &str,
    observed: &[&str],
) -> Result<ComponentType> {
    ComponentType::register(registry, platform, name, None, observed)
}

/// Handle to a registered component type.
///
/// The configuration methods return the handle so calls chain. They may be
/// called at any time; later calls affect subsequent renders of every
/// instance.
#[derive(Clone)]
pub struct ComponentType {
    definition: Rc<Definition>,
}

impl ComponentType {
    fn register(
        registry: &dyn ElementRegistry,
        platform: &Platform,
        name: &str,
        setup: Option<SetupFn>,
        observed: &[&str],
    ) -> Result<ComponentType> {
        let component = ComponentType {
            definition: Rc::new(Definition {
                name: name.to_string(),
                tag: platform.config.tag_for(name),
                observed: observed.iter().map(|a| camel_to_kebab(a)).collect(),
                setup,
                template: RefCell::new(Template::Empty),
                initializer: RefCell::new(None),
                style: StyleSheet::new(),
                platform: platform.clone(),
            }),
        };

        registry.register(Registration {
            tag: component.tag().to_string(),
            observed_attributes: component.observed_attributes().to_vec(),
            hooks: Rc::new(component.clone()),
        })?;

        tracing::debug!(
            tag = component.tag(),
            observed = ?component.observed_attributes(),
            "component.define"
        );
        Ok(component)
    }

    /// Render function, evaluated on every render of every instance.
    pub fn template<F>(&self, render: F) -> &Self
    where
        F: Fn(&RenderContext<'_>) -> View + 'static,
    {
        *self.definition.template.borrow_mut() = Template::Render(Rc::new(render));
        self
    }

    /// Fixed tree rendered by every instance.
    pub fn template_static(&self, view: impl Into<View>) -> &Self {
        *self.definition.template.borrow_mut() = Template::Static(view.into());
        self
    }

    /// Replace the shared style sheet's contents. Every instance, existing
    /// or future, sees the new style.
    pub fn style(&self, css: &str) -> &Self {
        self.definition.style.replace(css);
        self
    }

    /// Run once per instance, right after its first completed render.
    pub fn init<F>(&self, initializer: F) -> &Self
    where
        F: Fn(&Element) + 'static,
    {
        *self.definition.initializer.borrow_mut() = Some(Rc::new(initializer));
        self
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn tag(&self) -> &str {
        &self.definition.tag
    }

    pub fn observed_attributes(&self) -> &[String] {
        &self.definition.observed
    }

    pub fn style_sheet(&self) -> &StyleSheet {
        &self.definition.style
    }

    pub fn platform(&self) -> &Platform {
        &self.definition.platform
    }

    /// Build an instance directly, outside any registry.
    pub fn construct(&self, id: ElementId) -> Element {
        Element::construct(Rc::clone(&self.definition), id)
    }
}

impl LifecycleHooks for ComponentType {
    fn on_construct(&self, id: ElementId) -> Element {
        self.construct(id)
    }

    fn on_connect(&self, element: &Element) {
        element.connected();
    }

    fn on_attribute_change(
        &self,
        element: &Element,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        element.attribute_changed(name, old, new);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.definition.name)
            .field("tag", &self.definition.tag)
            .field("observed", &self.definition.observed)
            .finish_non_exhaustive()
    }
}
