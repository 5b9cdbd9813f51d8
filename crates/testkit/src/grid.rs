//! Flat in-memory world fakes for exercising structure validation.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use ziggurat_core::block::{BLOCK_GOLD, BLOCK_PYRAMID_CASING};
use ziggurat_core::{BlockId, BlockPos, PyramidTier, WorldQuery, BLOCK_AIR, PYRAMID_LAYERS};

/// Unbounded block grid with explicit unloaded positions.
///
/// Every position is loaded air unless a block was placed or the position
/// was marked unloaded, which keeps scenario setup to the cells a test
/// actually cares about.
#[derive(Debug, Default, Clone)]
pub struct GridWorld {
    blocks: BTreeMap<BlockPos, BlockId>,
    unloaded: BTreeSet<BlockPos>,
}

impl GridWorld {
    /// An empty, fully loaded world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId) {
        self.blocks.insert(pos, id);
    }

    /// Fill a square layer centered below `center`.
    pub fn fill_layer(&mut self, center: BlockPos, y_offset: i32, radius: i32, id: BlockId) {
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                self.set_block(center.offset(dx, y_offset, dz), id);
            }
        }
    }

    /// Build the complete pyramid structure for `tier` below `core`
    /// (nothing for [`PyramidTier::None`]).
    pub fn build_pyramid(&mut self, core: BlockPos, tier: PyramidTier) {
        let layers = match tier {
            PyramidTier::None => 0,
            PyramidTier::Tier1 => 2,
            PyramidTier::Tier2 => 3,
            PyramidTier::Tier3 => 4,
        };
        for (i, spec) in PYRAMID_LAYERS.iter().enumerate().take(layers) {
            let id = if i == 0 { BLOCK_GOLD } else { BLOCK_PYRAMID_CASING };
            self.fill_layer(core, spec.y_offset, spec.radius, id);
        }
    }

    /// Treat a single position as unloaded terrain.
    pub fn mark_unloaded(&mut self, pos: BlockPos) {
        self.unloaded.insert(pos);
    }

    /// Make a previously unloaded position resident again.
    pub fn mark_loaded(&mut self, pos: BlockPos) {
        self.unloaded.remove(&pos);
    }
}

impl WorldQuery for GridWorld {
    fn is_loaded(&self, pos: BlockPos) -> bool {
        !self.unloaded.contains(&pos)
    }

    fn block_at(&self, pos: BlockPos) -> BlockId {
        if self.unloaded.contains(&pos) {
            return BLOCK_AIR;
        }
        self.blocks.get(&pos).copied().unwrap_or(BLOCK_AIR)
    }
}

/// Wraps a world query and counts the calls flowing through it, for
/// asserting scan-cost bounds.
pub struct CountingWorld<'a, W> {
    inner: &'a W,
    loaded_calls: Cell<usize>,
    block_calls: Cell<usize>,
}

impl<'a, W: WorldQuery> CountingWorld<'a, W> {
    /// Wrap `inner`, starting all counters at zero.
    pub fn new(inner: &'a W) -> Self {
        Self {
            inner,
            loaded_calls: Cell::new(0),
            block_calls: Cell::new(0),
        }
    }

    /// Number of `is_loaded` calls observed.
    pub fn loaded_calls(&self) -> usize {
        self.loaded_calls.get()
    }

    /// Number of `block_at` calls observed.
    pub fn block_calls(&self) -> usize {
        self.block_calls.get()
    }

    /// Upper bound on distinct cells touched (each cell costs at most one
    /// residency check and one block read).
    pub fn cells_touched(&self) -> usize {
        self.loaded_calls.get().max(self.block_calls.get())
    }
}

impl<W: WorldQuery> WorldQuery for CountingWorld<'_, W> {
    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.loaded_calls.set(self.loaded_calls.get() + 1);
        self.inner.is_loaded(pos)
    }

    fn block_at(&self, pos: BlockPos) -> BlockId {
        self.block_calls.set(self.block_calls.get() + 1);
        self.inner.block_at(pos)
    }
}
