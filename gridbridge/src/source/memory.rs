//! In-process tile source.
//!
//! Holds tiles in a map keyed by native address and lets the caller script
//! how each tile finishes loading. Useful for tests, for the CLI, and for
//! embedding pre-rendered imagery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::{
    AttributionFn, ChangeListener, ListenerAction, PropertyValue, SourceState, Tile, TileImage,
    TileSource, TileState,
};
use crate::projection::Projection;
use crate::tilegrid::TileGrid;

/// How a tile ends up once it settles.
#[derive(Debug, Clone)]
pub enum TileOutcome {
    Loaded(TileImage),
    Empty,
    Error,
}

impl TileOutcome {
    fn state(&self) -> TileState {
        match self {
            TileOutcome::Loaded(_) => TileState::Loaded,
            TileOutcome::Empty => TileState::Empty,
            TileOutcome::Error => TileState::Error,
        }
    }
}

/// A set of change listeners.
///
/// Listeners run without the set being locked, so a listener may read the
/// object that notified it or register further listeners.
#[derive(Default)]
struct Listeners {
    inner: Mutex<Vec<ChangeListener>>,
}

impl Listeners {
    fn add(&self, listener: ChangeListener) {
        self.inner.lock().push(listener);
    }

    fn notify(&self) {
        let mut current = std::mem::take(&mut *self.inner.lock());
        current.retain_mut(|listener| listener() == ListenerAction::Keep);

        let mut guard = self.inner.lock();
        current.append(&mut *guard);
        *guard = current;
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

struct TileInner {
    state: TileState,
    image: Option<TileImage>,
}

/// A tile living in a [`MemoryTileSource`].
pub struct MemoryTile {
    level: i32,
    x: i64,
    y: i64,
    inner: Mutex<TileInner>,
    on_load: Mutex<Option<TileOutcome>>,
    listeners: Listeners,
    load_calls: AtomicUsize,
}

impl MemoryTile {
    /// An idle tile that stays `Loading` after `load` until [`finish`] is
    /// called.
    ///
    /// [`finish`]: MemoryTile::finish
    pub fn new(level: i32, x: i64, y: i64) -> Self {
        Self {
            level,
            x,
            y,
            inner: Mutex::new(TileInner {
                state: TileState::Idle,
                image: None,
            }),
            on_load: Mutex::new(None),
            listeners: Listeners::default(),
            load_calls: AtomicUsize::new(0),
        }
    }

    /// A tile that has already settled.
    pub fn settled(level: i32, x: i64, y: i64, outcome: TileOutcome) -> Self {
        let tile = Self::new(level, x, y);
        tile.apply(outcome);
        tile
    }

    /// Settle with `outcome` synchronously inside `load`.
    pub fn completing_with(self, outcome: TileOutcome) -> Self {
        *self.on_load.lock() = Some(outcome);
        self
    }

    /// Native address (level, x, y).
    pub fn address(&self) -> (i32, i64, i64) {
        (self.level, self.x, self.y)
    }

    /// Settles the tile and notifies listeners.
    pub fn finish(&self, outcome: TileOutcome) {
        self.apply(outcome);
        self.listeners.notify();
    }

    /// Moves to an arbitrary state and notifies listeners.
    pub fn set_state(&self, state: TileState) {
        self.inner.lock().state = state;
        self.listeners.notify();
    }

    /// Number of listeners still subscribed.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// How many times `load` was called.
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn apply(&self, outcome: TileOutcome) {
        let mut inner = self.inner.lock();
        inner.state = outcome.state();
        inner.image = match outcome {
            TileOutcome::Loaded(image) => Some(image),
            TileOutcome::Empty | TileOutcome::Error => None,
        };
    }
}

impl Tile for MemoryTile {
    fn state(&self) -> TileState {
        self.inner.lock().state
    }

    fn image(&self) -> Option<TileImage> {
        self.inner.lock().image.clone()
    }

    fn load(&self) {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.state() != TileState::Idle {
            return;
        }
        self.set_state(TileState::Loading);

        let scripted = self.on_load.lock().take();
        if let Some(outcome) = scripted {
            self.finish(outcome);
        }
    }

    fn on_change(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }
}

/// A tile source backed by an in-memory tile map.
pub struct MemoryTileSource {
    state: Mutex<SourceState>,
    grid: Option<Arc<TileGrid>>,
    projection: Option<Projection>,
    attributions: Option<AttributionFn>,
    properties: HashMap<String, PropertyValue>,
    default_outcome: Option<TileOutcome>,
    tiles: Mutex<HashMap<(i32, i64, i64), Arc<MemoryTile>>>,
    listeners: Listeners,
    tile_requests: AtomicUsize,
}

impl Default for MemoryTileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTileSource {
    /// A ready source with no grid, projection or tiles.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SourceState::Ready),
            grid: None,
            projection: None,
            attributions: None,
            properties: HashMap::new(),
            default_outcome: None,
            tiles: Mutex::new(HashMap::new()),
            listeners: Listeners::default(),
            tile_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_state(self, state: SourceState) -> Self {
        *self.state.lock() = state;
        self
    }

    pub fn with_grid(mut self, grid: TileGrid) -> Self {
        self.grid = Some(Arc::new(grid));
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_attributions(mut self, attributions: AttributionFn) -> Self {
        self.attributions = Some(attributions);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Outcome applied inside `load` for tiles created on demand. Without
    /// one, such tiles stay `Loading` until finished by hand.
    pub fn with_default_outcome(mut self, outcome: TileOutcome) -> Self {
        self.default_outcome = Some(outcome);
        self
    }

    /// Adds or replaces a tile at its native address.
    pub fn insert_tile(&self, tile: MemoryTile) -> Arc<MemoryTile> {
        let tile = Arc::new(tile);
        self.tiles.lock().insert(tile.address(), Arc::clone(&tile));
        tile
    }

    /// The tile at a native address, if it was inserted or requested.
    pub fn tile_handle(&self, level: i32, x: i64, y: i64) -> Option<Arc<MemoryTile>> {
        self.tiles.lock().get(&(level, x, y)).cloned()
    }

    /// Changes the source state and notifies listeners.
    pub fn set_state(&self, state: SourceState) {
        *self.state.lock() = state;
        self.listeners.notify();
    }

    /// Number of `tile` calls served.
    pub fn tile_requests(&self) -> usize {
        self.tile_requests.load(Ordering::SeqCst)
    }

    /// Number of source listeners still subscribed.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl TileSource for MemoryTileSource {
    fn state(&self) -> SourceState {
        *self.state.lock()
    }

    fn tile_grid(&self) -> Option<Arc<TileGrid>> {
        self.grid.clone()
    }

    fn tile(
        &self,
        level: i32,
        x: i64,
        y: i64,
        _pixel_ratio: f32,
        _projection: &Projection,
    ) -> Arc<dyn Tile> {
        self.tile_requests.fetch_add(1, Ordering::SeqCst);
        let mut tiles = self.tiles.lock();
        let tile = tiles.entry((level, x, y)).or_insert_with(|| {
            let tile = MemoryTile::new(level, x, y);
            Arc::new(match &self.default_outcome {
                Some(outcome) => tile.completing_with(outcome.clone()),
                None => tile,
            })
        });
        Arc::clone(tile) as Arc<dyn Tile>
    }

    fn attributions(&self) -> Option<AttributionFn> {
        self.attributions.clone()
    }

    fn projection(&self) -> Option<Projection> {
        self.projection.clone()
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key).cloned()
    }

    fn on_change(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }
}
