//! Tile grid model of a tiled raster source.
//!
//! A grid subdivides an extent into tiles per zoom level using an origin, a
//! resolution (map units per pixel) and a tile size. Rows follow the source
//! convention: the origin is the top-left corner and native row indices are
//! negative below it.

use std::fmt;

use crate::coord::{Coordinate, Extent, TileSize};
use crate::projection::Projection;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Highest level of a grid derived from a projection.
pub const DEFAULT_MAX_ZOOM: i32 = 42;

/// Relative tolerance when comparing consecutive resolution ratios.
const ZOOM_FACTOR_TOLERANCE: f64 = 1e-9;

/// Tolerance for snapping fractional tile positions onto tile boundaries.
const TILE_EDGE_TOLERANCE: f64 = 1e-9;

/// The extent a grid over `projection` covers when none is given.
///
/// Projections without a known extent fall back to the spherical mercator
/// square.
pub fn extent_for_projection(projection: &Projection) -> Extent {
    projection
        .extent()
        .or_else(|| Projection::web_mercator().extent())
        .unwrap_or(Extent::new(-1.0, -1.0, 1.0, 1.0))
}

/// Resolutions for levels `0..=max_zoom`, starting from a single tile that
/// covers the longer side of `extent` and halving per level.
pub fn halving_resolutions(extent: &Extent, max_zoom: i32, tile_size: u32) -> Vec<f64> {
    let top = extent.width().max(extent.height()) / f64::from(tile_size.max(1));
    (0..=max_zoom.max(0)).map(|z| top / 2f64.powi(z)).collect()
}

/// An inclusive range of tile indices at a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRange {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl TileRange {
    pub fn new(min_x: i64, max_x: i64, min_y: i64, max_y: i64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> i64 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows.
    pub fn height(&self) -> i64 {
        self.max_y - self.min_y + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn contains_xy(&self, x: i64, y: i64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

impl fmt::Display for TileRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x {}..={}, y {}..={}",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// Errors raised while assembling a tile grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TileGridError {
    #[error("Tile grid needs at least one resolution")]
    NoResolutions,

    #[error("Resolutions must be positive and strictly decreasing")]
    UnorderedResolutions,

    #[error("{what} has {actual} entries but the grid has {expected} levels")]
    LevelCountMismatch {
        what: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("Minimum zoom {min_zoom} is outside 0..={max_zoom}")]
    InvalidMinZoom { min_zoom: i32, max_zoom: i32 },

    #[error("Tile size must be non-zero")]
    ZeroTileSize,
}

/// Per-level subdivision of an extent into tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    extent: Extent,
    origins: Vec<Coordinate>,
    resolutions: Vec<f64>,
    tile_sizes: Vec<TileSize>,
    min_zoom: i32,
    full_tile_ranges: Vec<TileRange>,
    zoom_factor: Option<f64>,
}

impl TileGrid {
    /// Starts building a grid over `extent` with the given resolutions.
    pub fn builder(extent: Extent, resolutions: Vec<f64>) -> TileGridBuilder {
        TileGridBuilder::new(extent, resolutions)
    }

    /// Derives a grid from a projection's extent.
    ///
    /// The origin is the top-left corner and each level halves the
    /// resolution of the one above, starting from a single tile covering the
    /// longer side of the extent. Projections without a known extent fall
    /// back to the spherical mercator square.
    pub fn for_projection(projection: &Projection, max_zoom: i32, tile_size: u32) -> TileGrid {
        let extent = extent_for_projection(projection);
        let tile_size = tile_size.max(1);

        TileGrid::assemble(
            extent,
            vec![extent.top_left()],
            halving_resolutions(&extent, max_zoom, tile_size),
            vec![TileSize::square(tile_size)],
            0,
            None,
        )
    }

    fn assemble(
        extent: Extent,
        origins: Vec<Coordinate>,
        resolutions: Vec<f64>,
        tile_sizes: Vec<TileSize>,
        min_zoom: i32,
        sizes: Option<Vec<(i64, i64)>>,
    ) -> TileGrid {
        let zoom_factor = detect_zoom_factor(&resolutions);
        let mut grid = TileGrid {
            extent,
            origins,
            resolutions,
            tile_sizes,
            min_zoom,
            full_tile_ranges: Vec::new(),
            zoom_factor,
        };
        grid.full_tile_ranges = match sizes {
            Some(sizes) => sizes
                .into_iter()
                .map(|(w, h)| TileRange::new(w.min(0), (w - 1).max(-1), h.min(0), (h - 1).max(-1)))
                .collect(),
            None => (0..grid.resolutions.len() as i32)
                .filter_map(|z| grid.tile_range_for_extent(&extent, z))
                .collect(),
        };
        grid
    }

    /// Full extent covered by the grid, in native units.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn min_zoom(&self) -> i32 {
        self.min_zoom
    }

    /// Highest level with a resolution.
    pub fn max_zoom(&self) -> i32 {
        self.resolutions.len() as i32 - 1
    }

    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    /// Scale ratio between consecutive levels, when it is the same for every
    /// pair of levels.
    pub fn zoom_factor(&self) -> Option<f64> {
        self.zoom_factor
    }

    fn level_index(&self, level: i32) -> Option<usize> {
        usize::try_from(level)
            .ok()
            .filter(|&i| i < self.resolutions.len())
    }

    pub fn resolution(&self, level: i32) -> Option<f64> {
        self.level_index(level).map(|i| self.resolutions[i])
    }

    pub fn origin(&self, level: i32) -> Option<Coordinate> {
        let i = self.level_index(level)?;
        self.origins.get(i).or_else(|| self.origins.first()).copied()
    }

    pub fn tile_size(&self, level: i32) -> Option<TileSize> {
        let i = self.level_index(level)?;
        self.tile_sizes.get(i).or_else(|| self.tile_sizes.first()).copied()
    }

    /// The range of tiles covering the grid extent at `level`, if the grid
    /// defines that level.
    pub fn full_tile_range(&self, level: i32) -> Option<TileRange> {
        usize::try_from(level)
            .ok()
            .and_then(|i| self.full_tile_ranges.get(i))
            .copied()
    }

    /// The range of tiles intersecting `extent` at `level`.
    pub fn tile_range_for_extent(&self, extent: &Extent, level: i32) -> Option<TileRange> {
        let origin = self.origin(level)?;
        let resolution = self.resolution(level)?;
        let size = self.tile_size(level)?;
        let span_x = resolution * f64::from(size.width);
        let span_y = resolution * f64::from(size.height);

        let min_x = floor_snapped((extent.min_x - origin.x) / span_x);
        let max_x = ceil_snapped((extent.max_x - origin.x) / span_x) - 1;
        let min_y = floor_snapped((extent.min_y - origin.y) / span_y);
        let max_y = ceil_snapped((extent.max_y - origin.y) / span_y) - 1;
        Some(TileRange::new(min_x, max_x, min_y, max_y))
    }

    /// Native extent of the tile at (`level`, `x`, `y`), with `y` a native row.
    pub fn tile_coord_extent(&self, level: i32, x: i64, y: i64) -> Option<Extent> {
        let origin = self.origin(level)?;
        let resolution = self.resolution(level)?;
        let size = self.tile_size(level)?;
        let min_x = origin.x + x as f64 * f64::from(size.width) * resolution;
        let min_y = origin.y + y as f64 * f64::from(size.height) * resolution;
        let max_x = min_x + f64::from(size.width) * resolution;
        let max_y = min_y + f64::from(size.height) * resolution;
        Some(Extent::new(min_x, min_y, max_x, max_y))
    }
}

fn floor_snapped(value: f64) -> i64 {
    let nearest = value.round();
    if (value - nearest).abs() < TILE_EDGE_TOLERANCE {
        nearest as i64
    } else {
        value.floor() as i64
    }
}

fn ceil_snapped(value: f64) -> i64 {
    let nearest = value.round();
    if (value - nearest).abs() < TILE_EDGE_TOLERANCE {
        nearest as i64
    } else {
        value.ceil() as i64
    }
}

fn detect_zoom_factor(resolutions: &[f64]) -> Option<f64> {
    let mut factor: Option<f64> = None;
    for pair in resolutions.windows(2) {
        let ratio = pair[0] / pair[1];
        match factor {
            Some(f) if ((f - ratio) / f).abs() > ZOOM_FACTOR_TOLERANCE => return None,
            Some(_) => {}
            None => factor = Some(ratio),
        }
    }
    factor
}

/// Builder for [`TileGrid`].
#[derive(Debug, Clone)]
pub struct TileGridBuilder {
    extent: Extent,
    resolutions: Vec<f64>,
    origins: Option<Vec<Coordinate>>,
    tile_sizes: Vec<TileSize>,
    min_zoom: i32,
    sizes: Option<Vec<(i64, i64)>>,
}

impl TileGridBuilder {
    fn new(extent: Extent, resolutions: Vec<f64>) -> Self {
        Self {
            extent,
            resolutions,
            origins: None,
            tile_sizes: vec![TileSize::square(DEFAULT_TILE_SIZE)],
            min_zoom: 0,
            sizes: None,
        }
    }

    /// One origin for every level. Defaults to the extent's top-left corner.
    pub fn origin(mut self, origin: Coordinate) -> Self {
        self.origins = Some(vec![origin]);
        self
    }

    /// One origin per level.
    pub fn origins(mut self, origins: Vec<Coordinate>) -> Self {
        self.origins = Some(origins);
        self
    }

    pub fn tile_size(mut self, size: TileSize) -> Self {
        self.tile_sizes = vec![size];
        self
    }

    /// One tile size per level.
    pub fn tile_sizes(mut self, sizes: Vec<TileSize>) -> Self {
        self.tile_sizes = sizes;
        self
    }

    pub fn min_zoom(mut self, min_zoom: i32) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    /// Explicit per-level grid dimensions (columns, rows). Negative values
    /// count rows downward from the origin.
    pub fn sizes(mut self, sizes: Vec<(i64, i64)>) -> Self {
        self.sizes = Some(sizes);
        self
    }

    pub fn build(self) -> Result<TileGrid, TileGridError> {
        let levels = self.resolutions.len();
        if levels == 0 {
            return Err(TileGridError::NoResolutions);
        }
        let ordered = self.resolutions.iter().all(|r| *r > 0.0)
            && self.resolutions.windows(2).all(|w| w[0] > w[1]);
        if !ordered {
            return Err(TileGridError::UnorderedResolutions);
        }
        let max_zoom = levels as i32 - 1;
        if !(0..=max_zoom).contains(&self.min_zoom) {
            return Err(TileGridError::InvalidMinZoom {
                min_zoom: self.min_zoom,
                max_zoom,
            });
        }

        let origins = self
            .origins
            .unwrap_or_else(|| vec![self.extent.top_left()]);
        check_per_level("origins", origins.len(), levels)?;
        check_per_level("tile sizes", self.tile_sizes.len(), levels)?;
        if self
            .tile_sizes
            .iter()
            .any(|s| s.width == 0 || s.height == 0)
        {
            return Err(TileGridError::ZeroTileSize);
        }
        if let Some(sizes) = &self.sizes {
            if sizes.len() != levels {
                return Err(TileGridError::LevelCountMismatch {
                    what: "sizes",
                    actual: sizes.len(),
                    expected: levels,
                });
            }
        }

        Ok(TileGrid::assemble(
            self.extent,
            origins,
            self.resolutions,
            self.tile_sizes,
            self.min_zoom,
            self.sizes,
        ))
    }
}

fn check_per_level(what: &'static str, actual: usize, expected: usize) -> Result<(), TileGridError> {
    if actual == 0 || (actual != 1 && actual != expected) {
        return Err(TileGridError::LevelCountMismatch {
            what,
            actual,
            expected,
        });
    }
    Ok(())
}
