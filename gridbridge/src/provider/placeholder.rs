//! Transparent placeholder tile.
//!
//! Returned for every tile that is out of range, empty, or failed to load,
//! so the renderer always receives an image.

use std::sync::{Arc, OnceLock};

use image::{Rgba, RgbaImage};

use crate::source::TileImage;

static PLACEHOLDER: OnceLock<TileImage> = OnceLock::new();

/// The shared 1×1 fully transparent image.
pub fn placeholder_image() -> TileImage {
    Arc::clone(PLACEHOLDER.get_or_init(|| Arc::new(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])))))
}

/// Whether `image` is the shared placeholder instance.
pub fn is_placeholder(image: &TileImage) -> bool {
    Arc::ptr_eq(image, &placeholder_image())
}
