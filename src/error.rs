//! Error types.
//!
//! The reactive graph has no error paths: listener panics unwind through the
//! setter that triggered them. Errors only arise at the host boundary and when
//! calling into an element's property bag.

use thiserror::Error;

use crate::host::{ElementId, SurfaceId};

/// Failures reported by a host platform implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("tag already registered: {0}")]
    DuplicateTag(String),

    #[error("no component registered for tag: {0}")]
    UnknownTag(String),

    #[error("unknown surface: {0:?}")]
    UnknownSurface(SurfaceId),

    #[error("unknown element: {0:?}")]
    UnknownElement(ElementId),

    #[error("no surface matches selector: {0:?}")]
    SelectorNotFound(String),
}

/// Failures surfaced by component operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("property is not a method: {0}")]
    NotAMethod(String),

    #[error("method is not bound to an element")]
    UnboundMethod,

    #[error("element was dropped")]
    ElementDropped,
}

/// Result alias defaulting to [`ComponentError`].
pub type Result<T, E = ComponentError> = std::result::Result<T, E>;
