//! Provider setup shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use gridbridge::config::ConfigFile;
use gridbridge::provider::{FixedView, TileSourceImageryProvider};
use gridbridge::source::MemoryTileSource;
use tracing::debug;

use crate::error::CliError;

/// Loads the config file, or the default one when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    debug!(grid = config.grid.is_some(), "Loaded configuration");
    Ok(config)
}

/// Builds a provider over the grid described by `config`.
///
/// Without a `[grid]` section the grid is derived from spherical mercator.
pub fn build_provider(config: &ConfigFile) -> Result<TileSourceImageryProvider, CliError> {
    let grid_config = config.grid.clone().unwrap_or_default();
    let grid = grid_config.to_tile_grid()?;
    let view = Arc::new(FixedView::new(grid.extent()));
    let source = MemoryTileSource::new()
        .with_grid(grid)
        .with_projection(grid_config.projection());

    Ok(TileSourceImageryProvider::new(
        view,
        Arc::new(source),
        None,
        &config.bridge,
    )?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const GEOGRAPHIC: &str = "\
[grid]
projection = EPSG:4326
extent = -180, -90, 180, 90
resolutions = 0.703125, 0.3515625, 0.17578125
";

    pub fn provider(ini: &str) -> TileSourceImageryProvider {
        build_provider(&ConfigFile::from_ini_str(ini).unwrap()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbridge::provider::ImageryProvider;

    #[test]
    fn test_load_config_from_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, test_support::GEOGRAPHIC).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.grid.is_some());
    }

    #[test]
    fn test_missing_config_uses_mercator() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = load_config(Some(&temp_dir.path().join("missing.ini"))).unwrap();

        let provider = build_provider(&config).unwrap();
        assert!(provider.projection().unwrap().is_web_mercator());
        assert_eq!(provider.maximum_level(), 42);
    }

    #[test]
    fn test_invalid_grid_is_reported() {
        let config = ConfigFile::from_ini_str("[grid]\nresolutions = 1, 2\n").unwrap();
        assert!(matches!(build_provider(&config), Err(CliError::Grid(_))));
    }
}
