//! Component Manager
//!
//! Binds the reactive graph to host elements.
//!
//! - [`definition`] - `define`, the `ComponentType` builder, lifecycle hooks
//! - [`element`] - per-instance property bag, render scheduling, events
//! - [`props`] - `Prop`, `Method`, `Props`, `ReadMode`
//! - [`context`] - `RenderContext` handed to templates

pub mod context;
pub mod definition;
pub mod element;
pub mod props;

pub use context::RenderContext;
pub use definition::{ComponentType, define, define_named};
pub use element::{Element, ElementFlags, Phase};
pub use props::{Method, MethodFn, Prop, Props, ReadMode};
