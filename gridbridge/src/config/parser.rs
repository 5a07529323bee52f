//! INI parsing logic for converting `Ini` → `ConfigFile`.

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};
use super::settings::GridConfig;
use crate::coord::{Coordinate, Extent};
use crate::projection::Projection;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [bridge] section
    if let Some(section) = ini.section(Some("bridge")) {
        if let Some(v) = section.get("enable_reprojection") {
            config.bridge.enable_reprojection = parse_bool("bridge", "enable_reprojection", v)?;
        }
        if let Some(v) = section.get("pixel_ratio") {
            config.bridge.pixel_ratio = v
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|r| *r > 0.0)
                .ok_or_else(|| invalid("bridge", "pixel_ratio", v, "must be a positive number"))?;
        }
        if let Some(v) = section.get("default_tile_size") {
            config.bridge.default_tile_size = parse_tile_size("bridge", "default_tile_size", v)?;
        }
        if let Some(v) = section.get("default_maximum_level") {
            config.bridge.default_maximum_level = v
                .trim()
                .parse()
                .map_err(|_| invalid("bridge", "default_maximum_level", v, "must be an integer"))?;
        }
        if let Some(v) = section.get("fallback_projection") {
            let v = v.trim();
            if !v.is_empty() {
                config.bridge.fallback_projection =
                    Some(parse_projection_code("bridge", "fallback_projection", v)?);
            }
        }
    }

    // [grid] section
    if let Some(section) = ini.section(Some("grid")) {
        config.grid = Some(parse_grid(section)?);
    }

    Ok(config)
}

fn parse_grid(section: &Properties) -> Result<GridConfig, ConfigFileError> {
    let mut grid = GridConfig::default();

    if let Some(v) = section.get("projection") {
        grid.projection = Some(parse_projection_code("grid", "projection", v.trim())?);
    }
    if let Some(v) = section.get("extent") {
        let [min_x, min_y, max_x, max_y] = parse_numbers::<4>("grid", "extent", v)?;
        if min_x >= max_x || min_y >= max_y {
            return Err(invalid("grid", "extent", v, "minimum must be below maximum"));
        }
        grid.extent = Some(Extent::new(min_x, min_y, max_x, max_y));
    }
    if let Some(v) = section.get("origin") {
        let [x, y] = parse_numbers::<2>("grid", "origin", v)?;
        grid.origin = Some(Coordinate::new(x, y));
    }
    if let Some(v) = section.get("resolutions") {
        let resolutions = parse_list("grid", "resolutions", v)?;
        if resolutions.is_empty() {
            return Err(invalid("grid", "resolutions", v, "must list at least one value"));
        }
        grid.resolutions = Some(resolutions);
    }
    if let Some(v) = section.get("max_zoom") {
        grid.max_zoom = Some(
            v.trim()
                .parse::<i32>()
                .ok()
                .filter(|z| *z >= 0)
                .ok_or_else(|| invalid("grid", "max_zoom", v, "must be a non-negative integer"))?,
        );
    }
    if let Some(v) = section.get("tile_size") {
        grid.tile_size = Some(parse_tile_size("grid", "tile_size", v)?);
    }
    if let Some(v) = section.get("min_zoom") {
        grid.min_zoom = v
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|z| *z >= 0)
            .ok_or_else(|| invalid("grid", "min_zoom", v, "must be a non-negative integer"))?;
    }

    Ok(grid)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn parse_tile_size(section: &str, key: &str, value: &str) -> Result<u32, ConfigFileError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| invalid(section, key, value, "must be a positive integer (pixels)"))
}

fn parse_projection_code(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    Projection::get(value)
        .map(|p| p.code().to_string())
        .ok_or_else(|| {
            invalid(
                section,
                key,
                value,
                "must be a geographic (EPSG:4326) or spherical mercator (EPSG:3857) code",
            )
        })
}

fn parse_list(section: &str, key: &str, value: &str) -> Result<Vec<f64>, ConfigFileError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| invalid(section, key, value, "expected comma-separated numbers"))
        })
        .collect()
}

fn parse_numbers<const N: usize>(
    section: &str,
    key: &str,
    value: &str,
) -> Result<[f64; N], ConfigFileError> {
    let list = parse_list(section, key, value)?;
    <[f64; N]>::try_from(list)
        .map_err(|_| invalid(section, key, value, &format!("expected {} numbers", N)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(content)
    }

    #[test]
    fn test_bridge_section() {
        let config = parse(
            "[bridge]\n\
             enable_reprojection = no\n\
             pixel_ratio = 2\n\
             default_tile_size = 512\n\
             fallback_projection = CRS:84\n",
        )
        .unwrap();
        assert!(!config.bridge.enable_reprojection);
        assert_eq!(config.bridge.pixel_ratio, 2.0);
        assert_eq!(config.bridge.default_tile_size, 512);
        assert_eq!(config.bridge.fallback_projection.as_deref(), Some("CRS:84"));
        assert!(config.bridge.fallback().unwrap().is_geographic());
    }

    #[test]
    fn test_grid_section() {
        let config = parse(
            "[grid]\n\
             projection = EPSG:4326\n\
             extent = -180, -90, 180, 90\n\
             resolutions = 0.703125, 0.3515625, 0.17578125\n\
             min_zoom = 1\n",
        )
        .unwrap();
        let grid = config.grid.unwrap();
        assert_eq!(grid.resolutions.as_ref().map(Vec::len), Some(3));
        assert_eq!(grid.min_zoom, 1);

        let tile_grid = grid.to_tile_grid().unwrap();
        assert_eq!(tile_grid.max_zoom(), 2);
        assert_eq!(tile_grid.full_tile_range(1).unwrap().width(), 4);
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            "[bridge]\nenable_reprojection = maybe\n",
            "[bridge]\ndefault_tile_size = 0\n",
            "[bridge]\nfallback_projection = EPSG:27700\n",
            "[grid]\nextent = 1, 2, 3\n",
            "[grid]\nextent = 10, 0, 0, 10\n",
            "[grid]\nresolutions = 1, two\n",
            "[grid]\nmin_zoom = -1\n",
        ];
        for content in cases {
            let err = parse(content).unwrap_err();
            assert!(
                matches!(err, ConfigFileError::InvalidValue { .. }),
                "{content:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_error_message_names_key() {
        let err = parse("[grid]\ntile_size = big\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: grid.tile_size = 'big' - must be a positive integer (pixels)"
        );
    }
}
