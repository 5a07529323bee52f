//! Geodetic tiling scheme derived from a source tile grid.
//!
//! [`TileGridTilingScheme`] answers the renderer's questions (which rectangle
//! does a tile cover, how many tiles exist at a level, which tile contains a
//! position) by translating between the renderer's radians and row order and
//! the grid's native projection and row order.
//!
//! Every geodetic rectangle is obtained by reprojecting a native extent to
//! lon/lat degrees and multiplying by π/180.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::coord::{
    flip_y, rectangle_from_degrees, rectangle_to_degrees, to_degrees, Cartographic, Coordinate,
    Ellipsoid, Extent, Rectangle, TileXY,
};
use crate::projection::{transform_extent, Projection, ProjectionKind};
use crate::source::{PropertyValue, TileSource, PROJECTION_PROPERTY};
use crate::tilegrid::{TileGrid, TileRange};

/// Boundary tolerance of [`TilingScheme::contains`], in radians.
pub const CONTAINS_EPSILON: f64 = 1e-12;

/// Errors raised while deriving a tiling scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    /// The projection is neither geographic nor spherical mercator and
    /// reprojection is disabled.
    #[error("Unsupported projection {code}: only EPSG:4326 and EPSG:3857 are supported without reprojection")]
    UnsupportedProjection { code: String },
}

/// Construction options for [`TileGridTilingScheme`].
#[derive(Debug, Clone)]
pub struct SchemeOptions {
    /// Projection assumed when the source reports none.
    pub fallback_projection: Option<Projection>,

    /// Whether custom projections may be reprojected on the fly.
    pub enable_reprojection: bool,
}

impl Default for SchemeOptions {
    fn default() -> Self {
        Self {
            fallback_projection: None,
            enable_reprojection: true,
        }
    }
}

/// The renderer-facing tiling contract.
pub trait TilingScheme: Send + Sync {
    fn ellipsoid(&self) -> Ellipsoid;

    /// Area covered by the scheme, in radians.
    fn rectangle(&self) -> Rectangle;

    /// Projection family the renderer should use for this scheme.
    fn projection(&self) -> ProjectionKind;

    /// Number of tile columns at `level`.
    fn tile_count_x(&self, level: i32) -> u64;

    /// Number of tile rows at `level`.
    fn tile_count_y(&self, level: i32) -> u64;

    /// Converts a rectangle in radians to native projection units.
    fn rectangle_to_native(&self, rectangle: &Rectangle) -> Extent;

    /// Rectangle in radians covered by a tile in renderer row order.
    fn tile_to_rectangle(&self, x: i64, y: i64, level: i32) -> Option<Rectangle>;

    /// Native extent covered by a tile in renderer row order.
    fn tile_to_native_rectangle(&self, x: i64, y: i64, level: i32) -> Option<Extent>;

    /// The tile containing `position`, or `None` when the position lies
    /// outside the scheme or the level is unknown.
    fn position_to_tile(&self, position: &Cartographic, level: i32) -> Option<TileXY>;

    /// Whether `position` lies within the scheme's rectangle.
    fn contains(&self, position: &Cartographic) -> bool;
}

/// A tiling scheme backed by a source tile grid.
#[derive(Debug, Clone)]
pub struct TileGridTilingScheme {
    grid: Arc<TileGrid>,
    projection: Projection,
    kind: ProjectionKind,
    ellipsoid: Ellipsoid,
    rectangle: Rectangle,
}

impl TileGridTilingScheme {
    /// Derives the scheme for a tile source.
    ///
    /// Uses the source's own grid, or one derived for the resolved
    /// projection when the source has none.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnsupportedProjection`] when the resolved projection is
    /// not built in and reprojection is disabled.
    pub fn new(source: &dyn TileSource, options: &SchemeOptions) -> Result<Self, SchemeError> {
        let projection = resolve_projection(source, options.fallback_projection.as_ref());
        let grid = source
            .tile_grid()
            .unwrap_or_else(|| source.tile_grid_for_projection(&projection));
        Self::from_grid(grid, projection, options)
    }

    /// Builds the scheme for a grid expressed in `projection`.
    pub fn from_grid(
        grid: Arc<TileGrid>,
        projection: Projection,
        options: &SchemeOptions,
    ) -> Result<Self, SchemeError> {
        let kind = match projection.kind() {
            Some(kind) => kind,
            None if options.enable_reprojection => ProjectionKind::WebMercator,
            None => {
                return Err(SchemeError::UnsupportedProjection {
                    code: projection.code().to_string(),
                })
            }
        };

        let degrees = transform_extent(&grid.extent(), &projection, &Projection::geographic());
        let rectangle = rectangle_from_degrees(&degrees);
        debug!(
            projection = %projection,
            kind = %kind,
            rectangle = %rectangle,
            levels = grid.resolutions().len(),
            "Derived tiling scheme from tile grid"
        );

        Ok(Self {
            grid,
            projection,
            kind,
            ellipsoid: Ellipsoid::WGS84,
            rectangle,
        })
    }

    /// The source grid the scheme reads from.
    pub fn tile_grid(&self) -> &Arc<TileGrid> {
        &self.grid
    }

    /// The grid's native projection.
    pub fn native_projection(&self) -> &Projection {
        &self.projection
    }

    fn tile_count(&self, level: i32, axis: fn(&TileRange) -> i64) -> u64 {
        if let Some(range) = self.grid.full_tile_range(level) {
            return axis(&range).max(0) as u64;
        }

        // Renderers assume every level from 0 upward exists and pick a level
        // by probing tile density, so extrapolate from the defined levels.
        let Some(zoom_factor) = self.grid.zoom_factor() else {
            trace!(level, "No tile range and no zoom factor, reporting 0 tiles");
            return 0;
        };
        let min_zoom = self.grid.min_zoom();
        let Some(base) = self.grid.full_tile_range(min_zoom) else {
            return 0;
        };
        let tiles = axis(&base) as f64;
        let exponent = tiles.ln() / zoom_factor.ln() - f64::from(min_zoom) + f64::from(level);
        zoom_factor.powf(exponent).round().max(0.0) as u64
    }
}

impl TilingScheme for TileGridTilingScheme {
    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn rectangle(&self) -> Rectangle {
        self.rectangle
    }

    fn projection(&self) -> ProjectionKind {
        self.kind
    }

    fn tile_count_x(&self, level: i32) -> u64 {
        self.tile_count(level, TileRange::width)
    }

    fn tile_count_y(&self, level: i32) -> u64 {
        self.tile_count(level, TileRange::height)
    }

    fn rectangle_to_native(&self, rectangle: &Rectangle) -> Extent {
        let degrees = rectangle_to_degrees(rectangle);
        transform_extent(&degrees, &Projection::geographic(), &self.projection)
    }

    fn tile_to_rectangle(&self, x: i64, y: i64, level: i32) -> Option<Rectangle> {
        let native = self.grid.tile_coord_extent(level, x, flip_y(y))?;
        let degrees = transform_extent(&native, &self.projection, &Projection::geographic());
        Some(rectangle_from_degrees(&degrees))
    }

    fn tile_to_native_rectangle(&self, x: i64, y: i64, level: i32) -> Option<Extent> {
        let rectangle = self.tile_to_rectangle(x, y, level)?;
        Some(self.rectangle_to_native(&rectangle))
    }

    fn position_to_tile(&self, position: &Cartographic, level: i32) -> Option<TileXY> {
        if !self.contains(position) {
            return None;
        }

        let coord = self.projection.from_lon_lat(Coordinate::new(
            to_degrees(position.longitude),
            to_degrees(position.latitude),
        ));
        let origin = self.grid.origin(level)?;
        let resolution = self.grid.resolution(level)?;
        let size = self.grid.tile_size(level)?;

        // native rows grow upward from the origin, renderer rows downward
        let x = ((coord.x - origin.x) / resolution) / f64::from(size.width);
        let y = ((origin.y - coord.y) / resolution) / f64::from(size.height);
        Some(TileXY::new(x.floor() as i64, y.floor() as i64))
    }

    fn contains(&self, position: &Cartographic) -> bool {
        let rectangle = &self.rectangle;
        !(position.latitude - rectangle.north > CONTAINS_EPSILON
            || position.latitude - rectangle.south < -CONTAINS_EPSILON
            || position.longitude - rectangle.west < -CONTAINS_EPSILON
            || position.longitude - rectangle.east > CONTAINS_EPSILON)
    }
}

/// Resolves the projection a source's tiles are expressed in.
///
/// Order: the projection property, the source's own projection, the
/// fallback, spherical mercator.
pub fn resolve_projection(source: &dyn TileSource, fallback: Option<&Projection>) -> Projection {
    match source.property(PROJECTION_PROPERTY) {
        Some(PropertyValue::Projection(projection)) => return projection,
        Some(PropertyValue::Text(code)) => {
            if let Some(projection) = Projection::get(&code) {
                return projection;
            }
            debug!(code = %code, "Ignoring unknown projection override");
        }
        _ => {}
    }
    source
        .projection()
        .or_else(|| fallback.cloned())
        .unwrap_or_else(Projection::web_mercator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{ProjectionTransform, MERCATOR_HALF_SIZE};
    use crate::source::MemoryTileSource;
    use std::f64::consts::PI;

    struct Kilometres;

    impl ProjectionTransform for Kilometres {
        fn to_lon_lat(&self, native: Coordinate) -> Coordinate {
            Coordinate::new(native.x / 111.0, native.y / 111.0)
        }

        fn from_lon_lat(&self, lon_lat: Coordinate) -> Coordinate {
            Coordinate::new(lon_lat.x * 111.0, lon_lat.y * 111.0)
        }
    }

    fn kilometres() -> Projection {
        Projection::custom("LOCAL:KM", None, Arc::new(Kilometres))
    }

    fn mercator_scheme(max_zoom: i32) -> TileGridTilingScheme {
        let grid = TileGrid::for_projection(&Projection::web_mercator(), max_zoom, 256);
        let source = MemoryTileSource::new()
            .with_grid(grid)
            .with_projection(Projection::web_mercator());
        TileGridTilingScheme::new(&source, &SchemeOptions::default()).unwrap()
    }

    fn geographic_scheme() -> TileGridTilingScheme {
        let grid = TileGrid::for_projection(&Projection::geographic(), 10, 256);
        let source = MemoryTileSource::new()
            .with_grid(grid)
            .with_projection(Projection::geographic());
        TileGridTilingScheme::new(&source, &SchemeOptions::default()).unwrap()
    }

    #[test]
    fn test_mercator_rectangle() {
        let scheme = mercator_scheme(10);
        let rect = scheme.rectangle();
        assert!((rect.west + PI).abs() < 1e-12);
        assert!((rect.east - PI).abs() < 1e-12);
        let max_lat = 85.051_128_779_806_6 * PI / 180.0;
        assert!((rect.north - max_lat).abs() < 1e-12);
        assert!((rect.south + max_lat).abs() < 1e-12);
        assert_eq!(scheme.projection(), ProjectionKind::WebMercator);
        assert_eq!(scheme.ellipsoid(), Ellipsoid::WGS84);
    }

    #[test]
    fn test_geographic_rectangle() {
        let scheme = geographic_scheme();
        let rect = scheme.rectangle();
        assert!((rect.north - PI / 2.0).abs() < 1e-15);
        assert!((rect.south + PI / 2.0).abs() < 1e-15);
        assert_eq!(scheme.projection(), ProjectionKind::Geographic);
    }

    #[test]
    fn test_tile_count_defined_level() {
        let scheme = mercator_scheme(10);
        assert_eq!(scheme.tile_count_x(3), 8);
        assert_eq!(scheme.tile_count_y(3), 8);
        assert_eq!(scheme.tile_count_x(0), 1);
    }

    #[test]
    fn test_tile_count_extrapolates_with_zoom_factor() {
        let resolutions = vec![180.0 / 256.0, 90.0 / 256.0, 45.0 / 256.0];
        let grid = TileGrid::builder(Extent::new(0.0, 0.0, 180.0, 90.0), resolutions)
            .min_zoom(1)
            .build()
            .unwrap();
        let scheme = TileGridTilingScheme::from_grid(
            Arc::new(grid),
            Projection::geographic(),
            &SchemeOptions::default(),
        )
        .unwrap();

        // level 1 has 2×1 tiles, each further level doubles
        assert_eq!(scheme.tile_count_x(1), 2);
        assert_eq!(scheme.tile_count_x(5), 32);
        assert_eq!(scheme.tile_count_y(5), 16);
    }

    #[test]
    fn test_tile_count_without_zoom_factor_is_zero() {
        let grid = TileGrid::builder(Extent::new(0.0, 0.0, 256.0, 256.0), vec![1.0])
            .build()
            .unwrap();
        let scheme = TileGridTilingScheme::from_grid(
            Arc::new(grid),
            Projection::geographic(),
            &SchemeOptions::default(),
        )
        .unwrap();
        assert_eq!(scheme.tile_count_x(0), 1);
        assert_eq!(scheme.tile_count_x(3), 0);
        assert_eq!(scheme.tile_count_y(3), 0);
    }

    #[test]
    fn test_tile_to_rectangle_top_left() {
        let scheme = geographic_scheme();
        // level 1 of the derived geographic grid: two 180° tiles side by side
        let rect = scheme.tile_to_rectangle(0, 0, 1).unwrap();
        assert!((rect.west + PI).abs() < 1e-12);
        assert!(rect.east.abs() < 1e-12);
        assert!((rect.north - PI / 2.0).abs() < 1e-12);
        assert!((rect.south + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tile_to_rectangle_unknown_level() {
        let scheme = mercator_scheme(4);
        assert!(scheme.tile_to_rectangle(0, 0, 5).is_none());
        assert!(scheme.tile_to_native_rectangle(0, 0, -1).is_none());
    }

    #[test]
    fn test_tile_to_native_rectangle_matches_grid() {
        let scheme = mercator_scheme(6);
        let native = scheme.tile_to_native_rectangle(5, 9, 4).unwrap();
        let expected = scheme.tile_grid().tile_coord_extent(4, 5, flip_y(9)).unwrap();
        assert!(native.approx_eq(&expected, 1e-4), "{} vs {}", native, expected);
    }

    #[test]
    fn test_rectangle_to_native_world() {
        let scheme = mercator_scheme(2);
        let native = scheme.rectangle_to_native(&scheme.rectangle());
        let world = Projection::web_mercator().extent().unwrap();
        assert!(native.approx_eq(&world, 1e-4));
        assert!((native.max_x - MERCATOR_HALF_SIZE).abs() < 1e-4);
    }

    #[test]
    fn test_position_to_tile() {
        let scheme = mercator_scheme(10);
        // just north-east of null island lands in the top-right quadrant's
        // bottom-left tile at level 1
        let position = Cartographic::from_degrees(0.5, 0.5);
        assert_eq!(scheme.position_to_tile(&position, 1), Some(TileXY::new(1, 0)));

        let south_west = Cartographic::from_degrees(-179.0, -80.0);
        assert_eq!(scheme.position_to_tile(&south_west, 2), Some(TileXY::new(0, 3)));
    }

    #[test]
    fn test_position_outside_has_no_tile() {
        let scheme = mercator_scheme(10);
        let polar = Cartographic::from_degrees(0.0, 89.0);
        assert!(!scheme.contains(&polar));
        assert_eq!(scheme.position_to_tile(&polar, 3), None);
    }

    #[test]
    fn test_position_unknown_level_has_no_tile() {
        let scheme = mercator_scheme(3);
        let position = Cartographic::from_degrees(10.0, 10.0);
        assert_eq!(scheme.position_to_tile(&position, 4), None);
    }

    #[test]
    fn test_contains_corners_and_edges() {
        let scheme = geographic_scheme();
        for corner in scheme.rectangle().corners() {
            assert!(scheme.contains(&corner), "corner {:?}", corner);
        }

        let rect = scheme.rectangle();
        let north_edge = Cartographic::new(0.3, rect.north);
        assert!(scheme.contains(&north_edge));

        let drift = Cartographic::new(rect.east + 1e-13, 0.0);
        assert!(scheme.contains(&drift));
    }

    #[test]
    fn test_contains_rejects_beyond_epsilon() {
        let grid = TileGrid::builder(Extent::new(-10.0, -10.0, 10.0, 10.0), vec![0.1])
            .build()
            .unwrap();
        let scheme = TileGridTilingScheme::from_grid(
            Arc::new(grid),
            Projection::geographic(),
            &SchemeOptions::default(),
        )
        .unwrap();
        let rect = scheme.rectangle();
        let outside = [
            Cartographic::new(0.0, rect.north + 1e-9),
            Cartographic::new(0.0, rect.south - 1e-9),
            Cartographic::new(rect.west - 1e-9, 0.0),
            Cartographic::new(rect.east + 1e-9, 0.0),
        ];
        for position in outside {
            assert!(!scheme.contains(&position), "{:?}", position);
        }
    }

    #[test]
    fn test_unsupported_projection_without_reprojection() {
        let grid = TileGrid::builder(Extent::new(0.0, 0.0, 1110.0, 1110.0), vec![1.0])
            .build()
            .unwrap();
        let source = MemoryTileSource::new()
            .with_grid(grid)
            .with_projection(kilometres());
        let options = SchemeOptions {
            enable_reprojection: false,
            ..SchemeOptions::default()
        };

        let err = TileGridTilingScheme::new(&source, &options).unwrap_err();
        assert_eq!(
            err,
            SchemeError::UnsupportedProjection {
                code: "LOCAL:KM".to_string()
            }
        );
    }

    #[test]
    fn test_custom_projection_with_reprojection() {
        let grid = TileGrid::builder(Extent::new(0.0, 0.0, 1110.0, 1110.0), vec![1.0])
            .build()
            .unwrap();
        let source = MemoryTileSource::new()
            .with_grid(grid)
            .with_projection(kilometres());

        let scheme = TileGridTilingScheme::new(&source, &SchemeOptions::default()).unwrap();
        assert_eq!(scheme.projection(), ProjectionKind::WebMercator);
        let rect = scheme.rectangle();
        assert!((rect.east - 10.0 * PI / 180.0).abs() < 1e-12);
        assert_eq!(scheme.native_projection().code(), "LOCAL:KM");
    }

    #[test]
    fn test_resolve_projection_order() {
        let fallback = Projection::geographic();

        let bare = MemoryTileSource::new();
        assert!(resolve_projection(&bare, None).is_web_mercator());
        assert!(resolve_projection(&bare, Some(&fallback)).is_geographic());

        let own = MemoryTileSource::new().with_projection(Projection::web_mercator());
        assert!(resolve_projection(&own, Some(&fallback)).is_web_mercator());

        let overridden = MemoryTileSource::new()
            .with_projection(Projection::web_mercator())
            .with_property(PROJECTION_PROPERTY, PropertyValue::Text("EPSG:4326".into()));
        assert!(resolve_projection(&overridden, None).is_geographic());

        let bogus = MemoryTileSource::new()
            .with_property(PROJECTION_PROPERTY, PropertyValue::Text("EPSG:0".into()));
        assert!(resolve_projection(&bogus, Some(&fallback)).is_geographic());
    }

    #[test]
    fn test_source_without_grid_uses_derived_grid() {
        let source = MemoryTileSource::new();
        let options = SchemeOptions {
            fallback_projection: Some(Projection::geographic()),
            ..SchemeOptions::default()
        };
        let scheme = TileGridTilingScheme::new(&source, &options).unwrap();
        assert_eq!(scheme.projection(), ProjectionKind::Geographic);
        assert_eq!(scheme.tile_count_x(1), 2);
        assert_eq!(scheme.tile_count_y(1), 1);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_rectangle_roundtrip(
                level in 0i32..=8,
                x_raw in 0i64..256,
                y_raw in 0i64..256,
            ) {
                let scheme = mercator_scheme(8);
                let n = 1i64 << level;
                let (x, y) = (x_raw % n, y_raw % n);

                let rect = scheme.tile_to_rectangle(x, y, level).unwrap();
                let native = scheme.rectangle_to_native(&rect);
                let expected = scheme
                    .tile_grid()
                    .tile_coord_extent(level, x, flip_y(y))
                    .unwrap();
                prop_assert!(native.approx_eq(&expected, 1e-4), "{} vs {}", native, expected);
            }

            #[test]
            fn test_tile_center_maps_back_to_tile(
                level in 0i32..=8,
                x_raw in 0i64..256,
                y_raw in 0i64..256,
            ) {
                let scheme = geographic_scheme();
                let range = scheme.tile_grid().full_tile_range(level).unwrap();
                let x = x_raw % range.width();
                let y = y_raw % range.height();

                let rect = scheme.tile_to_rectangle(x, y, level).unwrap();
                let center = Cartographic::new(
                    (rect.west + rect.east) / 2.0,
                    (rect.south + rect.north) / 2.0,
                );
                prop_assert_eq!(scheme.position_to_tile(&center, level), Some(TileXY::new(x, y)));
            }
        }
    }
}
