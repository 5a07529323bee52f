//! Imagery provider bridge.
//!
//! Exposes a tile source through the capability set a globe renderer uses
//! to fetch imagery: readiness, coverage rectangle, tiling scheme, tile
//! size, level limits, credits, and asynchronous tile images.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gridbridge::config::BridgeConfig;
//! use gridbridge::coord::Extent;
//! use gridbridge::provider::{FixedView, ImageryProvider, TileSourceImageryProvider};
//! use gridbridge::source::MemoryTileSource;
//!
//! let view = Arc::new(FixedView::new(Extent::new(-1.0e6, -1.0e6, 1.0e6, 1.0e6)));
//! let source = Arc::new(MemoryTileSource::new());
//! let provider =
//!     TileSourceImageryProvider::new(view, source, None, &BridgeConfig::default()).unwrap();
//!
//! assert!(provider.ready());
//! assert_eq!(provider.minimum_level(), 1);
//! ```

mod bridge;
mod credit;
mod placeholder;
mod proxy;
mod request;

pub use bridge::TileSourceImageryProvider;
pub use credit::{credit_from_attribution, Credit};
pub use placeholder::{is_placeholder, placeholder_image};
pub use proxy::{DefaultProxy, Proxy};
pub use request::ImageRequest;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::coord::{Cartographic, Coordinate, Extent, Rectangle};
use crate::scheme::{SchemeError, TilingScheme};
use crate::source::TileImage;

/// The live map view attributions are computed for.
pub trait MapView: Send + Sync {
    /// Visible extent in view projection units.
    fn extent(&self) -> Extent;

    fn center(&self) -> Coordinate;
}

/// A map view that never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedView {
    extent: Extent,
    center: Coordinate,
}

impl FixedView {
    /// A view showing `extent`, centered on it.
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            center: extent.center(),
        }
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = center;
        self
    }
}

impl MapView for FixedView {
    fn extent(&self) -> Extent {
        self.extent
    }

    fn center(&self) -> Coordinate {
        self.center
    }
}

/// Decides whether a fetched tile should be discarded.
pub trait TileDiscardPolicy: Send + Sync {
    fn should_discard(&self, image: &TileImage) -> bool;
}

/// A feature found under a picked position.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<Cartographic>,
}

/// Capability set a globe renderer consumes from an imagery provider.
pub trait ImageryProvider: Send + Sync {
    type Scheme: TilingScheme;

    /// Whether the provider has finished initializing. Flips to `true` once
    /// and never back.
    fn ready(&self) -> bool;

    /// Covered area in radians, once ready.
    fn rectangle(&self) -> Option<Rectangle>;

    /// Tiling scheme, once ready.
    fn tiling_scheme(&self) -> Option<Arc<Self::Scheme>>;

    fn tile_width(&self) -> u32;

    fn tile_height(&self) -> u32;

    /// Lowest level the renderer should request.
    ///
    /// Always 1: a renderer told about a lower level loads every tile at
    /// that level eagerly, which can stall the host for large extents.
    fn minimum_level(&self) -> i32 {
        1
    }

    fn maximum_level(&self) -> i32;

    /// Subscribes to errors raised after construction.
    fn error_events(&self) -> broadcast::Receiver<SchemeError>;

    fn proxy(&self) -> Option<&Proxy>;

    /// Tiles may carry transparency.
    fn has_alpha_channel(&self) -> bool {
        true
    }

    fn tile_discard_policy(&self) -> Option<&dyn TileDiscardPolicy> {
        None
    }

    /// Feature picking is not supported.
    fn pick_features(
        &self,
        _x: i64,
        _y: i64,
        _level: i32,
        _position: &Cartographic,
    ) -> Option<Vec<FeatureInfo>> {
        None
    }

    /// Credits to display while tile (`x`, `y`, `level`) is shown.
    fn tile_credits(&self, x: i64, y: i64, level: i32) -> Vec<Credit>;

    /// The image of tile (`x`, `y`, `level`) in renderer row order.
    fn request_image(&self, x: i64, y: i64, level: i32) -> ImageRequest;
}
