//! Tiled raster source abstraction
//!
//! Defines the capability set the bridge consumes from a tile source: its
//! state, grid, projection, tiles, attributions, properties and change
//! notifications. [`memory`] provides an in-process implementation.

pub mod memory;
mod types;

pub use memory::{MemoryTile, MemoryTileSource, TileOutcome};
pub use types::{
    AttributionFn, Attributions, ChangeListener, FrameState, ListenerAction, PropertyValue,
    SourceState, Tile, TileImage, TileSource, TileState, UrlRewriteFn, ViewState,
    PROJECTION_PROPERTY, PROXY_PROPERTY,
};
