//! GridBridge - tiled raster sources on geodetic globes
//!
//! This library adapts a 2D tiled raster source, organized by a tile grid in
//! its own projection, to the imagery provider contract of a 3D globe
//! renderer, organized by a geodetic tiling scheme in radians.
//!
//! # High-Level API
//!
//! ```ignore
//! use gridbridge::provider::{FixedView, ImageryProvider, TileSourceImageryProvider};
//!
//! let provider = TileSourceImageryProvider::new(view, source, None, &config)?;
//! let scheme = provider.tiling_scheme().expect("source is ready");
//! let image = provider.request_image(x, y, level).await;
//! ```

pub mod config;
pub mod coord;
pub mod logging;
pub mod projection;
pub mod provider;
pub mod scheme;
pub mod source;
pub mod tilegrid;

/// Version of the GridBridge library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
