//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`scheme`] - Tiling scheme summary (rectangle, projection, tile counts)
//! - [`tile`] - Geodetic rectangle and native extent of one tile
//! - [`locate`] - Tile containing a position

pub mod common;
pub mod locate;
pub mod scheme;
pub mod tile;
