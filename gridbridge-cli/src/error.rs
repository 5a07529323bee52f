//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use gridbridge::config::ConfigFileError;
use gridbridge::scheme::SchemeError;
use gridbridge::tilegrid::TileGridError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be read or parsed
    Config(ConfigFileError),
    /// The configured grid is inconsistent
    Grid(TileGridError),
    /// The grid cannot be expressed as a tiling scheme
    Scheme(SchemeError),
    /// A command argument is outside what the grid supports
    InvalidArgument(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) | CliError::Grid(_) => {
                eprintln!();
                eprintln!(
                    "Check the [grid] section of {}",
                    gridbridge::config::config_file_path().display()
                );
            }
            CliError::Scheme(SchemeError::UnsupportedProjection { .. }) => {
                eprintln!();
                eprintln!("Set enable_reprojection = true in the [bridge] section to reproject extents");
            }
            CliError::InvalidArgument(_) => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Grid(e) => write!(f, "Invalid tile grid: {}", e),
            CliError::Scheme(e) => write!(f, "Cannot derive tiling scheme: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Grid(e) => Some(e),
            CliError::Scheme(e) => Some(e),
            CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<TileGridError> for CliError {
    fn from(e: TileGridError) -> Self {
        CliError::Grid(e)
    }
}

impl From<SchemeError> for CliError {
    fn from(e: SchemeError) -> Self {
        CliError::Scheme(e)
    }
}
