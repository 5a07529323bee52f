//! Integration tests for the imagery provider bridge.
//!
//! These tests verify the complete flow including:
//! - Config file → tile grid → tile source → provider
//! - Renderer tile coordinates → native tiles → images
//! - Source readiness arriving after construction
//!
//! Run with: `cargo test --test bridge_integration`

use std::f64::consts::PI;
use std::sync::Arc;

use image::RgbaImage;

use gridbridge::config::{BridgeConfig, ConfigFile};
use gridbridge::coord::{Cartographic, Extent};
use gridbridge::projection::{Projection, ProjectionKind};
use gridbridge::provider::{
    is_placeholder, FixedView, ImageryProvider, MapView, TileSourceImageryProvider,
};
use gridbridge::scheme::TilingScheme;
use gridbridge::source::{
    Attributions, FrameState, MemoryTile, MemoryTileSource, SourceState, TileImage, TileOutcome,
    TileSource,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn world_view() -> Arc<dyn MapView> {
    Arc::new(FixedView::new(Extent::new(-2.0e7, -2.0e7, 2.0e7, 2.0e7)))
}

fn tile_image(shade: u8) -> TileImage {
    Arc::new(RgbaImage::from_pixel(
        256,
        256,
        image::Rgba([shade, shade, shade, 255]),
    ))
}

const GEOGRAPHIC_CONFIG: &str = "\
[bridge]
default_maximum_level = 10

[grid]
projection = EPSG:4326
extent = -180, -90, 180, 90
resolutions = 0.703125, 0.3515625, 0.17578125, 0.087890625
min_zoom = 0
";

fn configured_source(config: &ConfigFile) -> MemoryTileSource {
    let grid_config = config.grid.as_ref().expect("grid section");
    MemoryTileSource::new()
        .with_grid(grid_config.to_tile_grid().expect("valid grid"))
        .with_projection(grid_config.projection())
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A grid described in a config file drives both the tiling scheme and the
/// image requests.
#[tokio::test]
async fn test_config_to_provider_flow() {
    let config = ConfigFile::from_ini_str(GEOGRAPHIC_CONFIG).unwrap();
    let source = Arc::new(configured_source(&config));
    let provider =
        TileSourceImageryProvider::new(world_view(), Arc::clone(&source) as _, None, &config.bridge)
            .unwrap();

    assert!(provider.ready());
    assert_eq!(provider.maximum_level(), 3);
    assert_eq!(provider.minimum_level(), 1);

    let scheme = provider.tiling_scheme().unwrap();
    assert_eq!(scheme.projection(), ProjectionKind::Geographic);
    assert_eq!(scheme.tile_count_x(1), 4);
    assert_eq!(scheme.tile_count_y(1), 2);
    // beyond the grid, extrapolated with the zoom factor
    assert_eq!(scheme.tile_count_x(5), 64);

    let rectangle = provider.rectangle().unwrap();
    assert!((rectangle.west + PI).abs() < 1e-12);
    assert!((rectangle.north - PI / 2.0).abs() < 1e-12);

    // renderer row 0 is the northern row, native row -1
    let expected = tile_image(200);
    source.insert_tile(MemoryTile::settled(
        1,
        3,
        -1,
        TileOutcome::Loaded(Arc::clone(&expected)),
    ));
    let image = provider.request_image(3, 0, 1).await;
    assert!(Arc::ptr_eq(&image, &expected));
}

/// The tile a position maps to covers that position.
#[test]
fn test_position_and_rectangle_agree() {
    let config = ConfigFile::from_ini_str(GEOGRAPHIC_CONFIG).unwrap();
    let source = Arc::new(configured_source(&config));
    let provider =
        TileSourceImageryProvider::new(world_view(), source as _, None, &config.bridge).unwrap();
    let scheme = provider.tiling_scheme().unwrap();

    let hamburg = Cartographic::from_degrees(9.99, 53.55);
    let tile = scheme.position_to_tile(&hamburg, 3).unwrap();
    let rectangle = scheme.tile_to_rectangle(tile.x, tile.y, 3).unwrap();

    assert!(rectangle.west <= hamburg.longitude && hamburg.longitude <= rectangle.east);
    assert!(rectangle.south <= hamburg.latitude && hamburg.latitude <= rectangle.north);
    assert_eq!((tile.x, tile.y), (8, 1));
}

/// A tile finishing on another task resolves the pending request.
#[tokio::test]
async fn test_tile_finished_by_background_task() {
    let source = Arc::new(MemoryTileSource::new());
    let provider = TileSourceImageryProvider::new(
        world_view(),
        Arc::clone(&source) as _,
        None,
        &BridgeConfig::default(),
    )
    .unwrap();

    let request = provider.request_image(5, 7, 4);
    let tile = source.tile_handle(4, 5, -8).expect("tile requested");

    let expected = tile_image(10);
    let loaded = Arc::clone(&expected);
    let finisher = tokio::spawn(async move {
        tokio::task::yield_now().await;
        tile.finish(TileOutcome::Loaded(loaded));
    });

    let image = request.await;
    finisher.await.unwrap();
    assert!(Arc::ptr_eq(&image, &expected));
}

/// Readiness arriving after construction enables requests and credits.
#[tokio::test]
async fn test_late_readiness() {
    let source = Arc::new(
        MemoryTileSource::new()
            .with_state(SourceState::Loading)
            .with_projection(Projection::web_mercator())
            .with_default_outcome(TileOutcome::Error)
            .with_attributions(Arc::new(|frame: &FrameState| {
                Attributions::from(format!("zoom {}", frame.view_state.zoom))
            })),
    );
    let provider = TileSourceImageryProvider::new(
        world_view(),
        Arc::clone(&source) as _,
        None,
        &BridgeConfig::default(),
    )
    .unwrap();

    assert!(!provider.ready());
    assert!(is_placeholder(&provider.request_image(0, 0, 1).await));
    assert_eq!(source.tile_requests(), 0);

    source.set_state(SourceState::Ready);
    assert!(provider.ready());

    // failed tiles degrade to the placeholder
    assert!(is_placeholder(&provider.request_image(0, 0, 1).await));
    assert_eq!(source.tile_requests(), 1);

    let credits = provider.tile_credits(0, 0, 2);
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].html(), "zoom 2");
    assert!(credits[0].allow_link());
}

/// Every renderer tile at a level maps to a distinct native tile.
#[tokio::test]
async fn test_every_tile_at_level_is_requested_once() {
    let source = Arc::new(MemoryTileSource::new().with_default_outcome(TileOutcome::Empty));
    let provider = TileSourceImageryProvider::new(
        world_view(),
        Arc::clone(&source) as _,
        None,
        &BridgeConfig::default(),
    )
    .unwrap();
    let scheme = provider.tiling_scheme().unwrap();

    let level = 2;
    let columns = scheme.tile_count_x(level) as i64;
    let rows = scheme.tile_count_y(level) as i64;
    for x in 0..columns {
        for y in 0..rows {
            assert!(is_placeholder(&provider.request_image(x, y, level).await));
            assert!(source.tile_handle(level, x, -y - 1).is_some());
        }
    }
    assert_eq!(source.tile_requests(), (columns * rows) as usize);
    assert_eq!(source.tile_grid_for_projection(&Projection::web_mercator()).max_zoom(), 42);
}
