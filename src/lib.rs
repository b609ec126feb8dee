//! # spark-elements
//!
//! Reactive refs bound to declarative components.
//!
//! ## Architecture
//!
//! Two layers, built in dependency order:
//!
//! ```text
//! Ref::set → listeners (sync) → Element::schedule_render → RenderSlot
//!          → next frame tick → template(RenderContext) → TemplateRenderer
//!          → initializer (first render only)
//! ```
//!
//! The reactive graph knows nothing about rendering. The component layer
//! subscribes to every `Ref` in an element's property bag and coalesces any
//! burst of writes into a single render on the host's next frame.
//!
//! Everything the host platform provides (frames, surfaces, rendering,
//! events, element registration) sits behind the traits in [`host`].
//! [`host::headless::HeadlessHost`] implements all of them in memory.
//!
//! ## Modules
//!
//! - [`reactive`] - `Ref`, `computed`, dependency tracking, `produce`
//! - [`component`] - Component types, elements, property bags
//! - [`pipeline`] - Frame scheduling and root mounting
//! - [`host`] - Host platform seams and the headless host
//! - [`types`] - Dynamic `Value` carried by property bags
//! - [`view`] - Tree descriptions handed to the template renderer

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod naming;
pub mod pipeline;
pub mod reactive;
pub mod types;
pub mod view;

// Re-export commonly used items
pub use types::Value;
pub use view::{Namespace, View, ViewNode};

pub use config::Config;
pub use error::{ComponentError, HostError, Result};

pub use reactive::{
    Dependency, Disposer, Ref, RefId, computed, computed_with, make_ref, produce,
};

pub use component::{
    ComponentType, Element, ElementFlags, Method, Phase, Prop, Props, ReadMode, RenderContext,
    define, define_named,
};

pub use pipeline::{
    FrameHandle, FrameScheduler, FrameTask, ManualFrames, MountTarget, RenderSlot, render_root,
};

pub use host::{
    CustomEvent, ElementId, ElementRegistry, EventSink, LifecycleHooks, Platform, Registration,
    StyleSheet, SurfaceHost, SurfaceId, TemplateRenderer,
};

pub use host::headless::HeadlessHost;
