//! Configuration for the bridge and for grids described in config files.
//!
//! Settings are read from `~/.gridbridge/config.ini`. A missing file yields
//! defaults; a present file overlays only the keys it sets.

mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFile, ConfigFileError};
pub use settings::{
    BridgeConfig, GridConfig, DEFAULT_MAXIMUM_LEVEL, DEFAULT_PIXEL_RATIO, DEFAULT_TILE_SIZE,
};
