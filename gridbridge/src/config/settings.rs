//! Settings structs and their defaults.

use crate::coord::{Coordinate, Extent, TileSize};
use crate::projection::Projection;
use crate::tilegrid::{
    extent_for_projection, halving_resolutions, TileGrid, TileGridError, DEFAULT_MAX_ZOOM,
};

pub use crate::tilegrid::DEFAULT_TILE_SIZE;

/// Maximum level reported for a source without a tile grid.
pub const DEFAULT_MAXIMUM_LEVEL: i32 = 18;

/// Pixel ratio passed to the source when requesting tiles.
pub const DEFAULT_PIXEL_RATIO: f32 = 1.0;

/// Bridge behaviour (`[bridge]` section).
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Accept projections other than geographic and spherical mercator by
    /// reprojecting extents.
    pub enable_reprojection: bool,
    pub pixel_ratio: f32,
    /// Tile width and height reported when the source has no grid.
    pub default_tile_size: u32,
    /// Maximum level reported when the source has no grid.
    pub default_maximum_level: i32,
    /// Projection code assumed when the source reports none.
    pub fallback_projection: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enable_reprojection: true,
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            default_tile_size: DEFAULT_TILE_SIZE,
            default_maximum_level: DEFAULT_MAXIMUM_LEVEL,
            fallback_projection: None,
        }
    }
}

impl BridgeConfig {
    /// The configured fallback projection, when its code is known.
    pub fn fallback(&self) -> Option<Projection> {
        self.fallback_projection.as_deref().and_then(Projection::get)
    }
}

/// A tile grid described in a config file (`[grid]` section).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridConfig {
    /// Projection code. Spherical mercator when unset.
    pub projection: Option<String>,
    /// Grid extent in native units. The projection's extent when unset.
    pub extent: Option<Extent>,
    /// Grid origin. The extent's top-left corner when unset.
    pub origin: Option<Coordinate>,
    /// Explicit resolutions, highest first. Derived by halving from a
    /// single top-level tile when unset.
    pub resolutions: Option<Vec<f64>>,
    /// Highest level of a derived resolution list.
    pub max_zoom: Option<i32>,
    pub tile_size: Option<u32>,
    pub min_zoom: i32,
}

impl GridConfig {
    pub fn projection(&self) -> Projection {
        self.projection
            .as_deref()
            .and_then(Projection::get)
            .unwrap_or_else(Projection::web_mercator)
    }

    /// Builds the described grid.
    pub fn to_tile_grid(&self) -> Result<TileGrid, TileGridError> {
        let projection = self.projection();
        let extent = self
            .extent
            .unwrap_or_else(|| extent_for_projection(&projection));
        let tile_size = self.tile_size.unwrap_or(DEFAULT_TILE_SIZE);

        let resolutions = match &self.resolutions {
            Some(resolutions) => resolutions.clone(),
            None => halving_resolutions(
                &extent,
                self.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM),
                tile_size,
            ),
        };

        TileGrid::builder(extent, resolutions)
            .origin(self.origin.unwrap_or_else(|| extent.top_left()))
            .tile_size(TileSize::square(tile_size))
            .min_zoom(self.min_zoom)
            .build()
    }
}
