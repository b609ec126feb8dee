//! Property bag types - values, refs and methods.
//!
//! An element's property bag maps names to [`Prop`]s. A prop is a plain
//! [`Value`], a [`Ref`] the element re-renders on, or a [`Method`] bound to
//! the element.

use std::fmt;
use std::rc::{Rc, Weak};

use super::element::{Element, ElementInner};
use crate::error::{ComponentError, Result};
use crate::reactive::Ref;
use crate::types::Value;

// =============================================================================
// Method
// =============================================================================

/// Method body. Receives the owning element and the call arguments.
pub type MethodFn = Rc<dyn Fn(&Element, &[Value]) -> Value>;

/// A callable property.
///
/// Methods come out of setup unbound. Storing one in an element's bag binds
/// it to that element, so the body always sees its owner.
#[derive(Clone)]
pub struct Method {
    f: MethodFn,
    owner: Option<Weak<ElementInner>>,
}

impl Method {
    pub fn new(f: impl Fn(&Element, &[Value]) -> Value + 'static) -> Self {
        Self {
            f: Rc::new(f),
            owner: None,
        }
    }

    /// Same body, bound to `element`.
    pub fn bind(&self, element: &Element) -> Method {
        Method {
            f: Rc::clone(&self.f),
            owner: Some(element.downgrade()),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.owner.is_some()
    }

    /// Call the body with its owner.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let owner = self.owner.as_ref().ok_or(ComponentError::UnboundMethod)?;
        let element = owner
            .upgrade()
            .map(Element::from_inner)
            .ok_or(ComponentError::ElementDropped)?;
        Ok((self.f)(&element, args))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("bound", &self.is_bound())
            .finish()
    }
}

// =============================================================================
// Prop
// =============================================================================

/// One entry of a property bag.
#[derive(Clone, Debug)]
pub enum Prop {
    /// Plain value. Replaced wholesale by writes and attribute changes.
    Value(Value),
    /// Reactive value. Every change schedules a render.
    Ref(Ref<Value>),
    /// Callable bound to the element.
    Method(Method),
}

impl Default for Prop {
    fn default() -> Self {
        Prop::Value(Value::Null)
    }
}

impl Prop {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Prop::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Ref<Value>> {
        match self {
            Prop::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Prop::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, Prop::Ref(_))
    }

    /// The value this prop currently stands for. A ref yields its current
    /// value (tracked), a method yields `Null`.
    pub fn unwrap_value(&self) -> Value {
        match self {
            Prop::Value(v) => v.clone(),
            Prop::Ref(r) => r.get(),
            Prop::Method(_) => Value::Null,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Value(value)
    }
}

impl From<Ref<Value>> for Prop {
    fn from(value: Ref<Value>) -> Self {
        Prop::Ref(value)
    }
}

impl From<&Ref<Value>> for Prop {
    fn from(value: &Ref<Value>) -> Self {
        Prop::Ref(value.clone())
    }
}

impl From<Method> for Prop {
    fn from(method: Method) -> Self {
        Prop::Method(method)
    }
}

impl From<bool> for Prop {
    fn from(value: bool) -> Self {
        Prop::Value(value.into())
    }
}

impl From<i32> for Prop {
    fn from(value: i32) -> Self {
        Prop::Value(value.into())
    }
}

impl From<i64> for Prop {
    fn from(value: i64) -> Self {
        Prop::Value(value.into())
    }
}

impl From<f64> for Prop {
    fn from(value: f64) -> Self {
        Prop::Value(value.into())
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Prop::Value(value.into())
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Prop::Value(value.into())
    }
}

// =============================================================================
// Read Mode
// =============================================================================

/// How [`Element::read`] treats reactive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Return the entry as stored; a ref stays a ref.
    #[default]
    Raw,
    /// Replace a ref with its current value. Templates read this way.
    Unwrap,
}

// =============================================================================
// Props Builder
// =============================================================================

/// Initial property bag returned by a setup function.
///
/// Entries keep insertion order; inserting an existing name replaces the
/// entry in place.
///
/// ```
/// use spark_elements::{Props, Value, make_ref};
///
/// let count = make_ref(Value::from(0));
/// let counter = count.clone();
/// let props = Props::new()
///     .value("label", "clicks")
///     .reference("count", &count)
///     .method("increment", move |_, _| {
///         let next = counter.get_untracked().as_int().unwrap_or(0) + 1;
///         counter.set(Value::from(next));
///         Value::Null
///     });
///
/// assert_eq!(props.len(), 3);
/// assert!(props.get("count").is_some_and(|p| p.is_reactive()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(String, Prop)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(name, prop);
        self
    }

    pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(name, Prop::Value(value.into()))
    }

    pub fn reference(self, name: impl Into<String>, r: &Ref<Value>) -> Self {
        self.with(name, Prop::Ref(r.clone()))
    }

    pub fn method(
        self,
        name: impl Into<String>,
        f: impl Fn(&Element, &[Value]) -> Value + 'static,
    ) -> Self {
        self.with(name, Prop::Method(Method::new(f)))
    }

    pub fn insert(&mut self, name: impl Into<String>, prop: impl Into<Prop>) {
        let name = name.into();
        let prop = prop.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = prop,
            None => self.entries.push((name, prop)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }
}

impl IntoIterator for Props {
    type Item = (String, Prop);
    type IntoIter = std::vec::IntoIter<(String, Prop)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
