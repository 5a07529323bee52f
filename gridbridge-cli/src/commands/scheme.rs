//! Scheme command - summarize the tiling scheme of the configured grid.

use gridbridge::provider::{ImageryProvider, TileSourceImageryProvider};
use gridbridge::scheme::TilingScheme;

use crate::error::CliError;

/// Run the scheme command.
pub fn run(provider: &TileSourceImageryProvider, max_level: Option<i32>) -> Result<(), CliError> {
    for line in describe(provider, max_level)? {
        println!("{}", line);
    }
    Ok(())
}

/// Summary lines, with tile counts up to `max_level` (default: the
/// provider's maximum level).
pub fn describe(
    provider: &TileSourceImageryProvider,
    max_level: Option<i32>,
) -> Result<Vec<String>, CliError> {
    let scheme = provider
        .tiling_scheme()
        .ok_or_else(|| CliError::InvalidArgument("Tile source is not ready".to_string()))?;
    let max_level = max_level.unwrap_or_else(|| provider.maximum_level());
    if max_level < 0 {
        return Err(CliError::InvalidArgument(format!(
            "Maximum level must not be negative, got {}",
            max_level
        )));
    }

    let mut lines = vec![
        format!("Native projection: {}", scheme.native_projection()),
        format!("Scheme projection: {}", scheme.projection()),
        format!("Rectangle (rad):   {}", scheme.rectangle()),
        format!(
            "Tile size:         {}x{}",
            provider.tile_width(),
            provider.tile_height()
        ),
        format!(
            "Levels:            {}..={}",
            provider.minimum_level(),
            provider.maximum_level()
        ),
        String::new(),
        "Level  Columns  Rows".to_string(),
    ];
    for level in 0..=max_level {
        lines.push(format!(
            "{:>5}  {:>7}  {:>4}",
            level,
            scheme.tile_count_x(level),
            scheme.tile_count_y(level)
        ));
    }
    Ok(lines)
}
