use ziggurat_core::{BlockId, BlockPos, WorldQuery, BLOCK_AIR};

use crate::chunk::{world_y_to_local_y, ChunkPos, DirtyFlags, LocalPos, CHUNK_SIZE_X, CHUNK_SIZE_Z};
use crate::storage::ChunkStorage;

/// Chunked block world addressed by world coordinates.
///
/// Chunks come into residency on first write and leave it through LRU
/// eviction; nothing here ever loads a chunk on behalf of a read. Reads
/// against non-resident terrain answer air, and `is_loaded` reports
/// residency only, which is exactly the contract structure validation
/// depends on.
pub struct ChunkWorld {
    storage: ChunkStorage,
}

impl ChunkWorld {
    /// Create a world holding at most `chunk_capacity` resident chunks.
    pub fn new(chunk_capacity: usize) -> Self {
        Self {
            storage: ChunkStorage::new(chunk_capacity),
        }
    }

    fn chunk_and_local(pos: BlockPos) -> Option<(ChunkPos, LocalPos)> {
        let local_y = world_y_to_local_y(pos.y)?;
        let chunk_pos = ChunkPos::new(
            pos.x.div_euclid(CHUNK_SIZE_X as i32),
            pos.z.div_euclid(CHUNK_SIZE_Z as i32),
        );
        let local = LocalPos {
            x: pos.x.rem_euclid(CHUNK_SIZE_X as i32) as usize,
            y: local_y,
            z: pos.z.rem_euclid(CHUNK_SIZE_Z as i32) as usize,
        };
        Some((chunk_pos, local))
    }

    /// Block identity at a world position; air outside residency or the
    /// build range.
    pub fn block(&self, pos: BlockPos) -> BlockId {
        let Some((chunk_pos, local)) = Self::chunk_and_local(pos) else {
            return BLOCK_AIR;
        };
        match self.storage.get(chunk_pos) {
            Some(chunk) => chunk.block(local.x, local.y, local.z),
            None => BLOCK_AIR,
        }
    }

    /// Place a block, creating the containing chunk if necessary.
    ///
    /// Returns false when the position lies outside the vertical build range.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId) -> bool {
        let Some((chunk_pos, local)) = Self::chunk_and_local(pos) else {
            return false;
        };
        let chunk = self.storage.ensure_chunk(chunk_pos);
        chunk.set_block(local.x, local.y, local.z, id);
        true
    }

    /// Whether the chunk column containing `pos` is resident.
    pub fn is_chunk_loaded(&self, chunk_pos: ChunkPos) -> bool {
        self.storage.contains(chunk_pos)
    }

    /// Number of resident chunks.
    pub fn resident_chunks(&self) -> usize {
        self.storage.len()
    }

    /// Positions of chunks whose structural content changed since the last
    /// drain. Clears all dirty flags as a side effect; callers re-validate
    /// affected multiblocks from the returned set.
    pub fn drain_structure_dirty(&mut self) -> Vec<ChunkPos> {
        let mut dirty = Vec::new();
        for chunk in self.storage.iter_mut() {
            if chunk.take_dirty_flags().contains(DirtyFlags::STRUCTURE) {
                dirty.push(chunk.position());
            }
        }
        dirty
    }
}

impl WorldQuery for ChunkWorld {
    fn is_loaded(&self, pos: BlockPos) -> bool {
        let chunk_pos = ChunkPos::new(
            pos.x.div_euclid(CHUNK_SIZE_X as i32),
            pos.z.div_euclid(CHUNK_SIZE_Z as i32),
        );
        self.storage.contains(chunk_pos)
    }

    fn block_at(&self, pos: BlockPos) -> BlockId {
        self.block(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziggurat_core::block::{BLOCK_GOLD, BLOCK_STONE};

    #[test]
    fn blocks_round_trip_across_chunk_borders() {
        let mut world = ChunkWorld::new(8);
        let positions = [
            BlockPos::new(0, 64, 0),
            BlockPos::new(15, 64, 15),
            BlockPos::new(16, 64, 16),
            BlockPos::new(-1, 64, -1),
            BlockPos::new(-17, 0, 31),
        ];
        for pos in positions {
            assert!(world.set_block(pos, BLOCK_STONE));
        }
        for pos in positions {
            assert_eq!(world.block(pos), BLOCK_STONE);
        }
        // Negative coordinates map to their own chunks.
        assert_eq!(world.resident_chunks(), 4);
    }

    #[test]
    fn out_of_build_range_is_rejected_and_reads_air() {
        let mut world = ChunkWorld::new(8);
        assert!(!world.set_block(BlockPos::new(0, -1, 0), BLOCK_STONE));
        assert!(!world.set_block(BlockPos::new(0, 256, 0), BLOCK_STONE));
        assert_eq!(world.block(BlockPos::new(0, -1, 0)), BLOCK_AIR);
    }

    #[test]
    fn non_resident_terrain_reads_air_and_not_loaded() {
        let world = ChunkWorld::new(8);
        let pos = BlockPos::new(100, 64, 100);
        assert!(!world.is_loaded(pos));
        assert_eq!(world.block_at(pos), BLOCK_AIR);
    }

    #[test]
    fn resident_chunk_reports_loaded() {
        let mut world = ChunkWorld::new(8);
        world.set_block(BlockPos::new(3, 64, 3), BLOCK_STONE);
        // Any position in the same chunk column counts as loaded.
        assert!(world.is_loaded(BlockPos::new(0, 0, 0)));
        assert!(world.is_loaded(BlockPos::new(15, 255, 15)));
        assert!(!world.is_loaded(BlockPos::new(16, 64, 0)));
    }

    #[test]
    fn eviction_unloads_terrain() {
        let mut world = ChunkWorld::new(1);
        let a = BlockPos::new(0, 64, 0);
        let b = BlockPos::new(40, 64, 0);
        world.set_block(a, BLOCK_STONE);
        assert!(world.is_loaded(a));
        world.set_block(b, BLOCK_STONE);
        assert!(!world.is_loaded(a));
        assert_eq!(world.block_at(a), BLOCK_AIR);
    }

    #[test]
    fn structural_edits_are_drained_once() {
        let mut world = ChunkWorld::new(8);
        world.set_block(BlockPos::new(0, 64, 0), BLOCK_GOLD);
        world.set_block(BlockPos::new(40, 64, 0), BLOCK_STONE);

        let dirty = world.drain_structure_dirty();
        assert_eq!(dirty, vec![ChunkPos::new(0, 0)]);
        // Flags were consumed.
        assert!(world.drain_structure_dirty().is_empty());
    }
}
