//! Capability contract consumed from a tiled raster source.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::coord::{Coordinate, Extent};
use crate::projection::Projection;
use crate::tilegrid::{TileGrid, DEFAULT_MAX_ZOOM, DEFAULT_TILE_SIZE};

/// Property key holding the proxy setting of a source.
pub const PROXY_PROPERTY: &str = "gridbridge.proxy";

/// Property key overriding the projection a source reports.
pub const PROJECTION_PROPERTY: &str = "gridbridge.projection";

/// Decoded tile pixels, shared without copying.
pub type TileImage = Arc<RgbaImage>;

/// Rewrites a resource URL, e.g. to route it through a proxy.
pub type UrlRewriteFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Produces attribution markup for the current view.
pub type AttributionFn = Arc<dyn Fn(&FrameState) -> Attributions + Send + Sync>;

/// Callback run on every change notification.
///
/// Returning [`ListenerAction::Detach`] removes the listener before the
/// notifier returns, so it is never called again.
pub type ChangeListener = Box<dyn FnMut() -> ListenerAction + Send>;

/// What a change listener wants after handling a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    Keep,
    Detach,
}

/// Lifecycle state of a tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceState {
    Undefined,
    Loading,
    Ready,
    Error,
}

/// Load state of a single tile.
///
/// `Loaded` is terminal success; `Empty` and `Error` are terminal but
/// non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    Idle,
    Loading,
    Loaded,
    Empty,
    Error,
}

impl TileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TileState::Loaded | TileState::Empty | TileState::Error)
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Idle => "idle",
            TileState::Loading => "loading",
            TileState::Loaded => "loaded",
            TileState::Empty => "empty",
            TileState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Value of a generic source property.
#[derive(Clone)]
pub enum PropertyValue {
    Text(String),
    UrlRewrite(UrlRewriteFn),
    Projection(Projection),
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            PropertyValue::UrlRewrite(_) => f.write_str("UrlRewrite(..)"),
            PropertyValue::Projection(p) => f.debug_tuple("Projection").field(p).finish(),
        }
    }
}

/// Attribution output: a single markup string or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attributions {
    One(String),
    Many(Vec<String>),
}

impl Attributions {
    /// Always a list, wrapping a single string.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Attributions::One(html) => vec![html],
            Attributions::Many(list) => list,
        }
    }
}

impl From<&str> for Attributions {
    fn from(html: &str) -> Self {
        Attributions::One(html.to_string())
    }
}

impl From<String> for Attributions {
    fn from(html: String) -> Self {
        Attributions::One(html)
    }
}

impl From<Vec<String>> for Attributions {
    fn from(list: Vec<String>) -> Self {
        Attributions::Many(list)
    }
}

/// View parameters handed to an attribution function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: i32,
    pub center: Coordinate,
}

/// Synthetic render context describing the live view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub view_state: ViewState,
    pub extent: Extent,
}

/// A single tile owned by the source.
///
/// The bridge only observes state, reads the image and triggers `load`; it
/// never changes tile state itself.
pub trait Tile: Send + Sync {
    fn state(&self) -> TileState;

    /// Decoded pixels, available once the tile is `Loaded`.
    fn image(&self) -> Option<TileImage>;

    /// Starts loading an idle tile. Has no effect in any other state.
    fn load(&self);

    /// Registers a listener called after every state change.
    fn on_change(&self, listener: ChangeListener);
}

/// A tiled raster source.
pub trait TileSource: Send + Sync {
    fn state(&self) -> SourceState;

    /// The source's own grid, if it has one.
    fn tile_grid(&self) -> Option<Arc<TileGrid>>;

    /// The grid to use when rendering in `projection`.
    ///
    /// Defaults to the source's own grid, else one derived from the
    /// projection.
    fn tile_grid_for_projection(&self, projection: &Projection) -> Arc<TileGrid> {
        self.tile_grid().unwrap_or_else(|| {
            Arc::new(TileGrid::for_projection(
                projection,
                DEFAULT_MAX_ZOOM,
                DEFAULT_TILE_SIZE,
            ))
        })
    }

    /// The tile at a native address. `y` is a native row.
    fn tile(
        &self,
        level: i32,
        x: i64,
        y: i64,
        pixel_ratio: f32,
        projection: &Projection,
    ) -> Arc<dyn Tile>;

    fn attributions(&self) -> Option<AttributionFn>;

    fn projection(&self) -> Option<Projection>;

    /// Generic property accessor.
    fn property(&self, key: &str) -> Option<PropertyValue>;

    /// Registers a listener called after every source change.
    fn on_change(&self, listener: ChangeListener);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TileState::Loaded.is_terminal());
        assert!(TileState::Empty.is_terminal());
        assert!(TileState::Error.is_terminal());
        assert!(!TileState::Idle.is_terminal());
        assert!(!TileState::Loading.is_terminal());
    }

    #[test]
    fn test_attributions_into_vec() {
        assert_eq!(Attributions::from("© A").into_vec(), vec!["© A".to_string()]);
        let many = Attributions::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn test_property_value_debug_hides_closure() {
        let value = PropertyValue::UrlRewrite(Arc::new(|url: &str| url.to_string()));
        assert_eq!(format!("{:?}", value), "UrlRewrite(..)");
    }
}
