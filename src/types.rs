//! Core types for spark-elements.
//!
//! [`Value`] is the dynamic value stored in component property bags and
//! carried by `Ref<Value>`. Lists and maps are persistent `im` collections:
//! cloning is O(1) and an edit through [`produce`](crate::reactive::produce)
//! copies only the path it touches, so untouched branches stay shared with
//! the previous value.

use std::fmt;

use im::{OrdMap, Vector};

// =============================================================================
// Value
// =============================================================================

/// Dynamically typed property value.
///
/// Attribute writes arrive as [`Value::Str`]; a removed attribute or an
/// unset placeholder is [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vector<Value>),
    Map(OrdMap<String, Value>),
}

impl Value {
    /// Empty map value.
    pub fn map() -> Self {
        Value::Map(OrdMap::new())
    }

    /// Empty list value.
    pub fn list() -> Self {
        Value::List(Vector::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OrdMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up `key` when this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Insert into a map value. A non-map value is replaced by a fresh map
    /// first.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if !matches!(self, Value::Map(_)) {
            *self = Value::map();
        }
        if let Value::Map(entries) = self {
            entries.insert(key.into(), value.into());
        }
    }

    /// Append to a list value. A non-list value is replaced by a fresh list
    /// first.
    pub fn push(&mut self, value: impl Into<Value>) {
        if !matches!(self, Value::List(_)) {
            *self = Value::list();
        }
        if let Value::List(items) = self {
            items.push_back(value.into());
        }
    }

    /// Build a map value from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Vector<Value>> for Value {
    fn from(values: Vector<Value>) -> Self {
        Value::List(values)
    }
}

impl From<OrdMap<String, Value>> for Value {
    fn from(entries: OrdMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

// =============================================================================
// Display
// =============================================================================

/// Text form used when a value is interpolated into a template.
/// `Null` renders as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(3).as_int(), Some(3));
        assert_eq!(Value::from(3).as_float(), Some(3.0));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("hi").as_int(), None);
    }

    #[test]
    fn test_map_helpers() {
        let mut v = Value::from_pairs([("a", 1), ("b", 2)]);
        assert_eq!(v.get("a"), Some(&Value::Int(1)));

        v.insert("c", "three");
        assert_eq!(v.get("c").and_then(Value::as_str), Some("three"));

        let mut scalar = Value::from(5);
        scalar.insert("k", 1);
        assert_eq!(scalar.get("k"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_list_helpers() {
        let mut v = Value::from(vec![1, 2]);
        v.push(3);
        assert_eq!(v.as_list().map(|l| l.len()), Some(3));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::from_pairs([("a", 1)]).to_string(), "{a: 1}");
    }
}
