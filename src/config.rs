//! Component manager configuration.

use crate::naming;

/// Namespace token prepended to every registered tag name.
pub const DEFAULT_TAG_PREFIX: &str = "inc";

/// Settings shared by every component type defined against a [`Platform`].
///
/// [`Platform`]: crate::host::Platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix for derived tag names. The kebab-cased component name is
    /// appended verbatim, so `CounterView` becomes `inc-counter-view`.
    pub tag_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tag prefix.
    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    /// Tag name registered for a component called `name`.
    pub fn tag_for(&self, name: &str) -> String {
        naming::tag_name(&self.tag_prefix, name)
    }
}
