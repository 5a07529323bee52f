//! Geometry value types shared by the tiling scheme and the imagery provider.

use std::fmt;

/// A geodetic bounding box in radians.
///
/// Longitudes lie in [-π, π], latitudes in [-π/2, π/2].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Angular width in radians.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Angular height in radians.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// The four corners as (longitude, latitude) positions: SW, SE, NE, NW.
    pub fn corners(&self) -> [Cartographic; 4] {
        [
            Cartographic::new(self.west, self.south),
            Cartographic::new(self.east, self.south),
            Cartographic::new(self.east, self.north),
            Cartographic::new(self.west, self.north),
        ]
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[W {:.9}, S {:.9}, E {:.9}, N {:.9}] rad",
            self.west, self.south, self.east, self.north
        )
    }
}

/// A geodetic position in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cartographic {
    pub longitude: f64,
    pub latitude: f64,
}

impl Cartographic {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Build a position from degrees.
    pub fn from_degrees(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude: super::to_radians(longitude),
            latitude: super::to_radians(latitude),
        }
    }
}

/// A 2D point in a projection's native units (or degrees for lon/lat).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box in native projection units or degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest extent containing every given coordinate.
    pub fn bounding(points: &[Coordinate]) -> Self {
        let mut extent = Self::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for p in points {
            extent.min_x = extent.min_x.min(p.x);
            extent.min_y = extent.min_y.min(p.y);
            extent.max_x = extent.max_x.max(p.x);
            extent.max_y = extent.max_y.max(p.y);
        }
        extent
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn top_left(&self) -> Coordinate {
        Coordinate::new(self.min_x, self.max_y)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Corners in order: bottom-left, bottom-right, top-right, top-left.
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            Coordinate::new(self.min_x, self.min_y),
            Coordinate::new(self.max_x, self.min_y),
            Coordinate::new(self.max_x, self.max_y),
            Coordinate::new(self.min_x, self.max_y),
        ]
    }

    /// Component-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        (self.min_x - other.min_x).abs() <= tolerance
            && (self.min_y - other.min_y).abs() <= tolerance
            && (self.max_x - other.max_x).abs() <= tolerance
            && (self.max_y - other.max_y).abs() <= tolerance
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Tile size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A square tile.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

/// A tile index pair in the renderer's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileXY {
    pub x: i64,
    pub y: i64,
}

impl TileXY {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// A tile address in the renderer's convention.
///
/// Renderer rows count down from the top edge of the grid; native rows are
/// reached through [`super::flip_y`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub level: i32,
    pub x: i64,
    pub y: i64,
}

impl TileCoordinate {
    pub fn new(level: i32, x: i64, y: i64) -> Self {
        Self { level, x, y }
    }

    /// The same tile addressed with the native row index.
    pub fn native_y(&self) -> i64 {
        super::flip_y(self.y)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

/// Reference body for geodetic conversions done by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub radii: (f64, f64, f64),
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Ellipsoid = Ellipsoid {
        radii: (6_378_137.0, 6_378_137.0, 6_356_752.314_245_179),
    };

    pub fn maximum_radius(&self) -> f64 {
        self.radii.0.max(self.radii.1).max(self.radii.2)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
