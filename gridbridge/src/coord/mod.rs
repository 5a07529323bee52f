//! Coordinate primitives
//!
//! Geodetic rectangles and positions (radians), native extents, tile
//! addresses, and the conversions between the renderer's and the grid's
//! conventions.

mod types;

pub use types::{
    Cartographic, Coordinate, Ellipsoid, Extent, Rectangle, TileCoordinate, TileSize, TileXY,
};

use std::f64::consts::PI;

/// Converts degrees to radians by multiplying by π/180.
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Converts radians to degrees by multiplying by 180/π.
#[inline]
pub fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Translates a row index between the renderer's and the grid's convention.
///
/// Computes `-y - 1` as a bitwise complement, which is defined for every
/// `i64`. The transform is its own inverse, so the same function serves both
/// directions.
#[inline]
pub fn flip_y(y: i64) -> i64 {
    !y
}

/// Converts a lon/lat extent in degrees to a rectangle in radians.
pub fn rectangle_from_degrees(extent: &Extent) -> Rectangle {
    Rectangle::new(
        to_radians(extent.min_x),
        to_radians(extent.min_y),
        to_radians(extent.max_x),
        to_radians(extent.max_y),
    )
}

/// Converts a rectangle in radians to a lon/lat extent in degrees.
pub fn rectangle_to_degrees(rectangle: &Rectangle) -> Extent {
    Extent::new(
        to_degrees(rectangle.west),
        to_degrees(rectangle.south),
        to_degrees(rectangle.east),
        to_degrees(rectangle.north),
    )
}
