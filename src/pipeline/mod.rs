//! Render Pipeline
//!
//! Connects component state changes to host output.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Ref change → Element::schedule_render → RenderSlot → FrameScheduler
//!            → (next frame) template → TemplateRenderer → surface
//! ```
//!
//! ## Key Design Principles
//!
//! - **Deferred**: a render never runs inside the write that caused it
//! - **Coalesced**: one pending render per element; the newest replaces it
//! - **Injectable**: the frame source is a trait, driven by hand in tests

pub mod mount;
pub mod scheduler;

// Re-exports
pub use mount::{DEFAULT_ROOT_SELECTOR, MountTarget, render_root};
pub use scheduler::{FrameHandle, FrameScheduler, FrameTask, ManualFrames, RenderSlot};
