//! Mount API - rendering a tree into a host surface.
//!
//! Component elements render themselves on the frame after a change. The
//! application root has no element around it, so it is rendered directly
//! and synchronously into a surface chosen by selector or by id.
//!
//! # Example
//!
//! ```
//! use spark_elements::{HeadlessHost, MountTarget, View, render_root};
//!
//! let host = HeadlessHost::new();
//! let app: View = View::node("inc-counter-view").attr("count", 3).into();
//!
//! let surface = render_root(&host.platform(), &app, MountTarget::default()).unwrap();
//! assert_eq!(
//!     host.surfaces().markup(surface).as_deref(),
//!     Some("<inc-counter-view count=\"3\"></inc-counter-view>")
//! );
//! ```

use crate::error::{HostError, Result};
use crate::host::{Platform, SurfaceId};
use crate::view::View;

/// Selector used when no mount target is given.
pub const DEFAULT_ROOT_SELECTOR: &str = "body";

/// Where [`render_root`] renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    /// First surface matching a selector.
    Selector(String),
    /// A known surface.
    Surface(SurfaceId),
}

impl Default for MountTarget {
    fn default() -> Self {
        MountTarget::Selector(DEFAULT_ROOT_SELECTOR.to_string())
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        MountTarget::Selector(selector.to_string())
    }
}

impl From<SurfaceId> for MountTarget {
    fn from(surface: SurfaceId) -> Self {
        MountTarget::Surface(surface)
    }
}

/// Render `tree` into the surface named by `target`.
///
/// Returns the surface rendered into.
pub fn render_root(
    platform: &Platform,
    tree: &View,
    target: impl Into<MountTarget>,
) -> Result<SurfaceId> {
    let surface = match target.into() {
        MountTarget::Surface(surface) => surface,
        MountTarget::Selector(selector) => platform
            .surfaces
            .query(&selector)
            .ok_or(HostError::SelectorNotFound(selector))?,
    };

    platform.renderer.render(tree, surface)?;
    tracing::debug!(surface = surface.0, "mount.render_root");
    Ok(surface)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::host::headless::HeadlessHost;

    #[test]
    fn test_render_into_body_by_default() {
        let host = HeadlessHost::new();
        let tree = View::text("hello");

        let surface = render_root(&host.platform(), &tree, MountTarget::default()).unwrap();

        assert_eq!(Some(surface), host.surfaces().root("body"));
        assert_eq!(host.surfaces().markup(surface).as_deref(), Some("hello"));
    }

    #[test]
    fn test_render_into_named_selector() {
        let host = HeadlessHost::new();
        let app = host.surfaces().add_root("#app");

        let surface = render_root(&host.platform(), &View::text("x"), "#app").unwrap();
        assert_eq!(surface, app);
    }

    #[test]
    fn test_render_into_surface_id() {
        let host = HeadlessHost::new();
        let target = host.surfaces().add_root("#side");

        render_root(&host.platform(), &View::text("side"), target).unwrap();
        assert_eq!(host.surfaces().render_count(target), 1);
    }

    #[test]
    fn test_missing_selector() {
        let host = HeadlessHost::new();
        let err = render_root(&host.platform(), &View::Empty, "#nope").unwrap_err();
        assert_eq!(
            err,
            ComponentError::Host(HostError::SelectorNotFound("#nope".to_string()))
        );
    }

    #[test]
    fn test_unknown_surface() {
        let host = HeadlessHost::new();
        let err = render_root(&host.platform(), &View::Empty, SurfaceId(999)).unwrap_err();
        assert_eq!(err, ComponentError::Host(HostError::UnknownSurface(SurfaceId(999))));
    }
}
