//! Tile fetch state machine.
//!
//! Turns a source tile's event-driven load into a single-resolution future.
//! The future's output is an image, never an error: empty and failed tiles
//! resolve to the transparent placeholder.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::debug;

use super::placeholder::placeholder_image;
use crate::source::{ListenerAction, Tile, TileImage, TileState};

/// Pending image for one tile request.
///
/// Resolves exactly once. A request whose tile is dropped before reaching a
/// terminal state resolves to the placeholder.
#[must_use = "futures do nothing unless polled"]
pub struct ImageRequest {
    inner: RequestInner,
}

enum RequestInner {
    Ready(Option<TileImage>),
    Waiting(oneshot::Receiver<TileImage>),
}

impl ImageRequest {
    pub(crate) fn ready(image: TileImage) -> Self {
        Self {
            inner: RequestInner::Ready(Some(image)),
        }
    }

    pub(crate) fn placeholder() -> Self {
        Self::ready(placeholder_image())
    }

    /// Whether the image was available without waiting on the tile.
    pub fn is_immediate(&self) -> bool {
        matches!(self.inner, RequestInner::Ready(_))
    }
}

impl Future for ImageRequest {
    type Output = TileImage;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<TileImage> {
        match &mut self.inner {
            RequestInner::Ready(image) => {
                Poll::Ready(image.take().unwrap_or_else(placeholder_image))
            }
            RequestInner::Waiting(rx) => rx
                .poll_unpin(cx)
                .map(|result| result.unwrap_or_else(|_| placeholder_image())),
        }
    }
}

/// The image a tile in `state` resolves to, or `None` while it is still
/// pending.
pub(crate) fn settled_image(state: TileState, tile: &dyn Tile) -> Option<TileImage> {
    match state {
        TileState::Loaded => Some(tile.image().unwrap_or_else(placeholder_image)),
        TileState::Empty => Some(placeholder_image()),
        TileState::Error => {
            debug!("Tile failed to load, substituting placeholder");
            Some(placeholder_image())
        }
        TileState::Idle | TileState::Loading => None,
    }
}

/// Drives `tile` to a terminal state and resolves with its image.
///
/// Settled tiles resolve immediately. Otherwise a single change listener is
/// registered before `load` is triggered; it resolves on the first terminal
/// state it observes and detaches itself in the same call. The state is read
/// again once the listener is in place, since a tile settled from another
/// thread between the first read and the registration notifies nobody.
pub(crate) fn fetch(tile: Arc<dyn Tile>) -> ImageRequest {
    if let Some(image) = settled_image(tile.state(), tile.as_ref()) {
        return ImageRequest::ready(image);
    }

    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    let weak = Arc::downgrade(&tile);
    tile.on_change(Box::new(move || {
        let Some(tile) = weak.upgrade() else {
            return ListenerAction::Detach;
        };
        match settled_image(tile.state(), tile.as_ref()) {
            Some(image) => {
                if let Some(tx) = tx.take() {
                    // the caller may have dropped the request
                    let _ = tx.send(image);
                }
                ListenerAction::Detach
            }
            None => ListenerAction::Keep,
        }
    }));
    tile.load();

    if let Some(image) = settled_image(tile.state(), tile.as_ref()) {
        // the listener detaches on the next notification or with the tile
        return ImageRequest::ready(image);
    }

    ImageRequest {
        inner: RequestInner::Waiting(rx),
    }
}
