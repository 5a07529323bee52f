//! Tile command - show the area covered by one tile.

use gridbridge::coord::{rectangle_to_degrees, TileCoordinate};
use gridbridge::provider::{ImageryProvider, TileSourceImageryProvider};
use gridbridge::scheme::TilingScheme;

use crate::error::CliError;

/// Run the tile command.
pub fn run(provider: &TileSourceImageryProvider, tile: TileCoordinate) -> Result<(), CliError> {
    for line in describe(provider, tile)? {
        println!("{}", line);
    }
    Ok(())
}

/// Description of a tile given in renderer row order.
pub fn describe(
    provider: &TileSourceImageryProvider,
    tile: TileCoordinate,
) -> Result<Vec<String>, CliError> {
    let scheme = provider
        .tiling_scheme()
        .ok_or_else(|| CliError::InvalidArgument("Tile source is not ready".to_string()))?;
    let undefined =
        || CliError::InvalidArgument(format!("Level {} is not defined by the grid", tile.level));

    let rectangle = scheme
        .tile_to_rectangle(tile.x, tile.y, tile.level)
        .ok_or_else(undefined)?;
    // straight from the grid, without a geodetic round trip
    let native = scheme
        .tile_grid()
        .tile_coord_extent(tile.level, tile.x, tile.native_y())
        .ok_or_else(undefined)?;

    Ok(vec![
        format!("Tile:              {}", tile),
        format!("Native tile:       {}/{}/{}", tile.level, tile.x, tile.native_y()),
        format!("Rectangle (rad):   {}", rectangle),
        format!("Rectangle (deg):   {}", rectangle_to_degrees(&rectangle)),
        format!("Native extent:     {}", native),
    ])
}
