//! Locate command - find the tile containing a position.

use gridbridge::coord::Cartographic;
use gridbridge::provider::{ImageryProvider, TileSourceImageryProvider};
use gridbridge::scheme::TilingScheme;

use crate::error::CliError;

/// Run the locate command.
pub fn run(
    provider: &TileSourceImageryProvider,
    lon: f64,
    lat: f64,
    level: i32,
) -> Result<(), CliError> {
    println!("{}", describe(provider, lon, lat, level)?);
    Ok(())
}

/// The tile in renderer row order as `level/x/y`, or `outside`.
pub fn describe(
    provider: &TileSourceImageryProvider,
    lon: f64,
    lat: f64,
    level: i32,
) -> Result<String, CliError> {
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(CliError::InvalidArgument(format!(
            "Position ({}, {}) is not a valid longitude/latitude",
            lon, lat
        )));
    }
    let scheme = provider
        .tiling_scheme()
        .ok_or_else(|| CliError::InvalidArgument("Tile source is not ready".to_string()))?;

    let position = Cartographic::from_degrees(lon, lat);
    Ok(match scheme.position_to_tile(&position, level) {
        Some(tile) => format!("{}/{}/{}", level, tile.x, tile.y),
        None => "outside".to_string(),
    })
}
