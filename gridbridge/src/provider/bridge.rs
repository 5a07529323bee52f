//! [`ImageryProvider`] over a [`TileSource`].

use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::credit::{credit_from_attribution, Credit};
use super::proxy::Proxy;
use super::request::{fetch, ImageRequest};
use super::{ImageryProvider, MapView};
use crate::config::BridgeConfig;
use crate::coord::{flip_y, Rectangle, TileSize};
use crate::projection::{Projection, ProjectionKind};
use crate::scheme::{SchemeError, SchemeOptions, TileGridTilingScheme, TilingScheme};
use crate::source::{
    FrameState, ListenerAction, SourceState, TileSource, ViewState, PROXY_PROPERTY,
};

/// Capacity of the error event channel.
const ERROR_CHANNEL_CAPACITY: usize = 16;

/// State derived once the source is ready.
struct Prepared {
    projection: Projection,
    tiling_scheme: Arc<TileGridTilingScheme>,
    rectangle: Rectangle,
}

/// State shared with the source's change listener.
struct Shared {
    source: Arc<dyn TileSource>,
    options: SchemeOptions,
    prepared: OnceLock<Prepared>,
    errors: broadcast::Sender<SchemeError>,
}

impl Shared {
    /// Derives the tiling scheme the first time the source is ready.
    ///
    /// Returns whether the provider is ready afterwards.
    fn handle_source_changed(&self) -> Result<bool, SchemeError> {
        if self.prepared.get().is_some() {
            return Ok(true);
        }
        if self.source.state() != SourceState::Ready {
            return Ok(false);
        }

        let tiling_scheme = TileGridTilingScheme::new(self.source.as_ref(), &self.options)?;
        let prepared = Prepared {
            projection: tiling_scheme.native_projection().clone(),
            rectangle: tiling_scheme.rectangle(),
            tiling_scheme: Arc::new(tiling_scheme),
        };
        info!(
            projection = %prepared.projection,
            rectangle = %prepared.rectangle,
            "Imagery provider ready"
        );
        // a concurrent notification may have won; both derived the same state
        let _ = self.prepared.set(prepared);
        Ok(true)
    }
}

/// Imagery provider backed by a tile source.
///
/// Becomes ready the first time the source reports [`SourceState::Ready`].
/// Until then, geometry accessors return `None` and image requests resolve
/// to the placeholder.
pub struct TileSourceImageryProvider {
    shared: Arc<Shared>,
    view: Arc<dyn MapView>,
    proxy: Option<Proxy>,
    pixel_ratio: f32,
    default_tile_size: u32,
    default_maximum_level: i32,
}

impl TileSourceImageryProvider {
    /// Connects to `source`.
    ///
    /// `fallback` is the projection assumed when the source reports none;
    /// when absent, the configured fallback is used.
    ///
    /// # Errors
    ///
    /// [`SchemeError::UnsupportedProjection`] when the source is already
    /// ready and its projection cannot be tiled. If the source only becomes
    /// ready later, the same error is published on [`error_events`].
    ///
    /// [`error_events`]: ImageryProvider::error_events
    pub fn new(
        view: Arc<dyn MapView>,
        source: Arc<dyn TileSource>,
        fallback: Option<Projection>,
        config: &BridgeConfig,
    ) -> Result<Self, SchemeError> {
        let proxy = source.property(PROXY_PROPERTY).and_then(Proxy::from_property);
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        let options = SchemeOptions {
            fallback_projection: fallback.or_else(|| config.fallback()),
            enable_reprojection: config.enable_reprojection,
        };

        let shared = Arc::new(Shared {
            source: Arc::clone(&source),
            options,
            prepared: OnceLock::new(),
            errors,
        });

        // Subscribe before checking the state so a transition in between
        // is still observed.
        let weak = Arc::downgrade(&shared);
        source.on_change(Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return ListenerAction::Detach;
            };
            match shared.handle_source_changed() {
                Ok(true) => ListenerAction::Detach,
                Ok(false) => ListenerAction::Keep,
                Err(err) => {
                    error!(error = %err, "Tile source became ready with an unusable projection");
                    // nobody may be subscribed yet
                    let _ = shared.errors.send(err);
                    ListenerAction::Detach
                }
            }
        }));
        shared.handle_source_changed()?;

        Ok(Self {
            shared,
            view,
            proxy,
            pixel_ratio: config.pixel_ratio,
            default_tile_size: config.default_tile_size,
            default_maximum_level: config.default_maximum_level,
        })
    }

    /// The source this provider reads from.
    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.shared.source
    }

    /// Projection tiles are requested in, once ready.
    pub fn projection(&self) -> Option<&Projection> {
        self.shared.prepared.get().map(|p| &p.projection)
    }

    fn level0_tile_size(&self) -> Option<TileSize> {
        self.shared.source.tile_grid()?.tile_size(0)
    }
}

impl ImageryProvider for TileSourceImageryProvider {
    type Scheme = TileGridTilingScheme;

    fn ready(&self) -> bool {
        self.shared.prepared.get().is_some()
    }

    fn rectangle(&self) -> Option<Rectangle> {
        self.shared.prepared.get().map(|p| p.rectangle)
    }

    fn tiling_scheme(&self) -> Option<Arc<TileGridTilingScheme>> {
        self.shared
            .prepared
            .get()
            .map(|p| Arc::clone(&p.tiling_scheme))
    }

    fn tile_width(&self) -> u32 {
        self.level0_tile_size()
            .map_or(self.default_tile_size, |size| size.width)
    }

    fn tile_height(&self) -> u32 {
        self.level0_tile_size()
            .map_or(self.default_tile_size, |size| size.height)
    }

    fn maximum_level(&self) -> i32 {
        self.shared
            .source
            .tile_grid()
            .map_or(self.default_maximum_level, |grid| grid.max_zoom())
    }

    fn error_events(&self) -> broadcast::Receiver<SchemeError> {
        self.shared.errors.subscribe()
    }

    fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    fn tile_credits(&self, _x: i64, _y: i64, level: i32) -> Vec<Credit> {
        let Some(attributions) = self.shared.source.attributions() else {
            return Vec::new();
        };

        // geographic level 0 spans two columns where mercator has one
        let geographic = self
            .shared
            .prepared
            .get()
            .is_some_and(|p| p.tiling_scheme.projection() == ProjectionKind::Geographic);
        let zoom = if geographic { level + 1 } else { level };

        let frame_state = FrameState {
            view_state: ViewState {
                zoom,
                center: self.view.center(),
            },
            extent: self.view.extent(),
        };

        attributions(&frame_state)
            .into_vec()
            .into_iter()
            .map(credit_from_attribution)
            .collect()
    }

    fn request_image(&self, x: i64, y: i64, level: i32) -> ImageRequest {
        let Some(prepared) = self.shared.prepared.get() else {
            debug!(x, y, level, "Image requested before provider is ready");
            return ImageRequest::placeholder();
        };

        let native_y = flip_y(y);
        let grid = self
            .shared
            .source
            .tile_grid_for_projection(&prepared.projection);
        if level < grid.min_zoom() - 1 || level > grid.max_zoom() {
            debug!(
                x,
                y,
                level,
                min_zoom = grid.min_zoom(),
                max_zoom = grid.max_zoom(),
                "Level outside source grid, returning placeholder"
            );
            return ImageRequest::placeholder();
        }

        let tile = self.shared.source.tile(
            level,
            x,
            native_y,
            self.pixel_ratio,
            &prepared.projection,
        );
        fetch(tile)
    }
}
