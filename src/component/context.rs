//! What a template sees while it renders.

use super::element::Element;
use super::props::{Prop, ReadMode};
use crate::error::Result;
use crate::types::Value;

/// Read access to the rendering element. Every read unwraps refs.
pub struct RenderContext<'a> {
    element: &'a Element,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Current value of `name`.
    pub fn value(&self, name: &str) -> Value {
        self.element.value(name)
    }

    pub fn read(&self, name: &str) -> Prop {
        self.element.read(name, ReadMode::Unwrap)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.element.call(name, args)
    }

    pub fn element(&self) -> &'a Element {
        self.element
    }
}
