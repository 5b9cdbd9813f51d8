use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::{Chunk, ChunkPos};

/// In-memory chunk arena with an LRU eviction policy.
/// Uses BTreeMap for deterministic iteration order. An evicted chunk is
/// unloaded: queries against its positions report not-loaded until it is
/// recreated.
pub struct ChunkStorage {
    chunks: BTreeMap<ChunkPos, Chunk>,
    lru: LruCache<ChunkPos, ()>,
    capacity: usize,
}

impl ChunkStorage {
    /// Create a storage with the desired maximum chunk count.
    pub fn new(capacity: usize) -> Self {
        // Capacity is always at least 1, so NonZeroUsize is guaranteed valid
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1 after max(1)");
        Self {
            chunks: BTreeMap::new(),
            lru: LruCache::new(cap),
            capacity: capacity.max(1),
        }
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether a chunk is currently resident.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Obtain mutable access to a chunk, creating it if necessary.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        if !self.chunks.contains_key(&pos) {
            self.evict_if_needed();
            self.chunks.insert(pos, Chunk::new(pos));
        }
        self.touch(pos);
        self.chunks.get_mut(&pos).expect("chunk present")
    }

    /// Attempt to fetch a chunk immutably.
    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Fetch a chunk mutably (without creating it).
    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        if self.chunks.contains_key(&pos) {
            self.touch(pos);
        }
        self.chunks.get_mut(&pos)
    }

    /// Iterate over currently resident chunk positions.
    pub fn iter_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Iterate mutably over resident chunks in deterministic order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> + '_ {
        self.chunks.values_mut()
    }

    fn touch(&mut self, pos: ChunkPos) {
        self.lru.put(pos, ());
    }

    fn evict_if_needed(&mut self) {
        while self.chunks.len() >= self.capacity {
            if let Some((oldest, _)) = self.lru.pop_lru() {
                self.chunks.remove(&oldest);
                debug!(chunk = %oldest, "evicted chunk");
            } else {
                break;
            }
        }
    }
}
