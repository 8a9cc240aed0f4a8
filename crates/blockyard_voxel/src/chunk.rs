//! Chunk storage: a cubic block of voxels plus its cached mesh.
//!
//! ## Mesh State
//!
//! A chunk is either *dirty* (mesh stale or never built) or *clean*.
//! Construction and every mutation make it dirty; requesting the mesh of a
//! dirty chunk rebuilds it and makes it clean. The rebuild counter goes up
//! exactly once per dirty → clean transition.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::IVec3;
use tracing::debug;

use crate::block::{Block, BlockSource};
use crate::error::{ConfigError, TerrainError, TerrainResult};
use crate::greedy_mesh::GreedyMesher;
use crate::mesh::{ChunkMesh, IndexMode};
use crate::registry::BlockRegistry;

/// Largest supported chunk edge length.
pub const MAX_CHUNK_SIZE: usize = 256;

static NEXT_CHUNK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique chunk handle, increasing in creation order.
///
/// The renderer keys its GPU buffers by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u64);

impl ChunkId {
    fn next() -> Self {
        Self(NEXT_CHUNK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A cube of `size³` voxels at a position on the chunk grid.
#[derive(Debug)]
pub struct Chunk {
    id: ChunkId,
    /// Position in chunk units; world origin is `position * size`.
    position: IVec3,
    size: usize,
    /// Indexed `(x * size + y) * size + z`.
    blocks: Box<[Block]>,
    solid_count: usize,
    mesh: ChunkMesh,
    index_mode: IndexMode,
    dirty: bool,
    rebuild_count: u64,
}

impl Chunk {
    /// Creates an all-air chunk.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0 or above [`MAX_CHUNK_SIZE`]. Use
    /// [`Self::try_new`] to handle allocation failure.
    #[must_use]
    pub fn new(position: IVec3, size: usize) -> Self {
        assert!((1..=MAX_CHUNK_SIZE).contains(&size), "chunk size {size} out of range");
        Self::with_blocks(position, size, vec![Block::AIR; size * size * size].into_boxed_slice())
    }

    /// Creates an all-air chunk, reporting allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if `size` is 0 or above
    /// [`MAX_CHUNK_SIZE`], [`TerrainError::VolumeOverflow`] if `size³`
    /// overflows, and [`TerrainError::AllocationFailed`] if the voxel buffer
    /// cannot be reserved.
    pub fn try_new(position: IVec3, size: usize) -> TerrainResult<Self> {
        if !(1..=MAX_CHUNK_SIZE).contains(&size) {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size",
                reason: format!("{size} is not in 1..={MAX_CHUNK_SIZE}"),
            }
            .into());
        }
        let volume = size
            .checked_mul(size)
            .and_then(|area| area.checked_mul(size))
            .ok_or(TerrainError::VolumeOverflow { chunks: 1, size })?;

        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(volume)
            .map_err(|_| TerrainError::AllocationFailed {
                coord: position,
                bytes: volume * std::mem::size_of::<Block>(),
            })?;
        blocks.resize(volume, Block::AIR);
        Ok(Self::with_blocks(position, size, blocks.into_boxed_slice()))
    }

    fn with_blocks(position: IVec3, size: usize, blocks: Box<[Block]>) -> Self {
        let solid_count = blocks.iter().filter(|b| b.is_solid()).count();
        Self {
            id: ChunkId::next(),
            position,
            size,
            blocks,
            solid_count,
            mesh: ChunkMesh::default(),
            index_mode: IndexMode::default(),
            dirty: true,
            rebuild_count: 0,
        }
    }

    /// Sets the index encoding used by future rebuilds and marks the chunk dirty.
    #[must_use]
    pub fn with_index_mode(mut self, mode: IndexMode) -> Self {
        self.index_mode = mode;
        self.dirty = true;
        self
    }

    /// Unique id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// Position on the chunk grid.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> IVec3 {
        self.position
    }

    /// Edge length in voxels.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// World coordinate of voxel `(0, 0, 0)`.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> IVec3 {
        self.position * self.size as i32
    }

    /// True if the cached mesh is stale.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of dirty → clean transitions so far.
    #[inline]
    #[must_use]
    pub const fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Number of non-air voxels.
    #[inline]
    #[must_use]
    pub const fn solid_count(&self) -> usize {
        self.solid_count
    }

    /// True if every voxel is air.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.solid_count == 0
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(
            x < self.size && y < self.size && z < self.size,
            "local ({x}, {y}, {z}) outside chunk of size {}",
            self.size
        );
        (x * self.size + y) * self.size + z
    }

    /// Block at local coordinates.
    ///
    /// Each coordinate must be below [`Self::size`]; debug builds assert it.
    #[inline]
    #[must_use]
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[self.index(x, y, z)]
    }

    /// Writes a voxel and marks the chunk dirty. The mesh is rebuilt lazily.
    ///
    /// Same preconditions as [`Self::block_at`].
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: Block) {
        let index = self.index(x, y, z);
        let old = std::mem::replace(&mut self.blocks[index], block);

        match (old.is_solid(), block.is_solid()) {
            (false, true) => self.solid_count += 1,
            (true, false) => self.solid_count -= 1,
            _ => {}
        }
        self.dirty = true;
    }

    /// Forces a rebuild on the next mesh request.
    ///
    /// Used when a neighbour changes a voxel this chunk's border depends on.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Raw block ids for bulk fills. Callers must follow up with [`Self::recount`].
    pub(crate) fn ids_mut(&mut self) -> &mut [u8] {
        self.dirty = true;
        bytemuck::cast_slice_mut(&mut self.blocks[..])
    }

    /// Recomputes the solid count after a bulk fill.
    pub(crate) fn recount(&mut self) {
        self.solid_count = self.blocks.iter().filter(|b| b.is_solid()).count();
    }

    /// Returns the mesh, rebuilding it first if the chunk is dirty.
    ///
    /// `surroundings` answers for voxels just outside the chunk; pass
    /// [`EmptySurroundings`](crate::EmptySurroundings) for a standalone chunk.
    pub fn mesh<S>(&mut self, surroundings: &S, registry: &BlockRegistry) -> &ChunkMesh
    where
        S: BlockSource + ?Sized,
    {
        if self.dirty {
            let mesh = self.build_mesh(surroundings, registry);
            self.install_mesh(mesh);
        }
        &self.mesh
    }

    /// The cached mesh, or `None` while dirty.
    #[must_use]
    pub fn cached_mesh(&self) -> Option<&ChunkMesh> {
        (!self.dirty).then_some(&self.mesh)
    }

    /// Runs a fresh mesher without touching the cache.
    #[must_use]
    pub fn build_mesh<S>(&self, surroundings: &S, registry: &BlockRegistry) -> ChunkMesh
    where
        S: BlockSource + ?Sized,
    {
        self.build_mesh_with(&mut GreedyMesher::new(), surroundings, registry)
    }

    /// Runs `mesher` without touching the cache, reusing its mask buffer.
    #[must_use]
    pub fn build_mesh_with<S>(
        &self,
        mesher: &mut GreedyMesher,
        surroundings: &S,
        registry: &BlockRegistry,
    ) -> ChunkMesh
    where
        S: BlockSource + ?Sized,
    {
        let quads = mesher.mesh(self, surroundings, registry);
        ChunkMesh::from_quads(quads, self.index_mode)
    }

    /// Stores a freshly built mesh and marks the chunk clean.
    pub(crate) fn install_mesh(&mut self, mesh: ChunkMesh) {
        debug!(
            chunk = %self.id,
            position = ?self.position,
            quads = mesh.quad_count(),
            "rebuilt chunk mesh"
        );
        self.mesh = mesh;
        self.dirty = false;
        self.rebuild_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::EmptySurroundings;

    #[test]
    fn test_new_chunk_is_dirty_and_empty() {
        let chunk = Chunk::new(IVec3::new(1, 2, 3), 4);
        assert!(chunk.is_dirty());
        assert!(chunk.is_empty());
        assert_eq!(chunk.rebuild_count(), 0);
        assert_eq!(chunk.origin(), IVec3::new(4, 8, 12));
        assert!(chunk.cached_mesh().is_none());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = Chunk::new(IVec3::ZERO, 1);
        let b = Chunk::new(IVec3::ZERO, 1);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_set_block_tracks_solid_count() {
        let mut chunk = Chunk::new(IVec3::ZERO, 4);
        chunk.set_block(1, 2, 3, Block::new(5));
        chunk.set_block(1, 2, 3, Block::new(6));
        assert_eq!(chunk.solid_count(), 1);
        assert_eq!(chunk.block_at(1, 2, 3), Block::new(6));

        chunk.set_block(1, 2, 3, Block::AIR);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_flat_layout() {
        let mut chunk = Chunk::new(IVec3::ZERO, 3);
        chunk.ids_mut()[(2 * 3 + 1) * 3] = 9;
        chunk.recount();
        assert_eq!(chunk.block_at(2, 1, 0), Block::new(9));
        assert_eq!(chunk.solid_count(), 1);
    }

    #[test]
    fn test_mesh_rebuilds_once_per_dirty_transition() {
        let registry = BlockRegistry::builtin();
        let mut chunk = Chunk::new(IVec3::ZERO, 4);
        chunk.set_block(0, 0, 0, Block::new(1));

        let first = chunk.mesh(&EmptySurroundings, &registry).clone();
        let second = chunk.mesh(&EmptySurroundings, &registry).clone();
        assert_eq!(first, second);
        assert_eq!(chunk.rebuild_count(), 1);
        assert!(!chunk.is_dirty());

        chunk.set_block(1, 0, 0, Block::new(1));
        assert!(chunk.is_dirty());
        let third = chunk.mesh(&EmptySurroundings, &registry);
        assert_eq!(third.quad_count(), 6);
        assert_eq!(chunk.rebuild_count(), 2);
    }

    #[test]
    fn test_try_new_matches_new() {
        let chunk = Chunk::try_new(IVec3::ONE, 8).unwrap();
        assert_eq!(chunk.size(), 8);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_try_new_rejects_bad_sizes() {
        for size in [0, MAX_CHUNK_SIZE + 1, 1 << 22] {
            let result = Chunk::try_new(IVec3::ZERO, size);
            assert!(
                matches!(result, Err(TerrainError::InvalidConfig(ConfigError::InvalidValue { field: "chunk_size", .. }))),
                "size {size} accepted"
            );
        }
        assert_eq!(Chunk::try_new(IVec3::ZERO, MAX_CHUNK_SIZE).unwrap().size(), MAX_CHUNK_SIZE);
    }

    #[test]
    fn test_reused_mesher_matches_fresh_build() {
        let registry = BlockRegistry::builtin();
        let mut big = Chunk::new(IVec3::ZERO, 8);
        let mut small = Chunk::new(IVec3::ONE, 2);
        for i in 0..8 {
            big.set_block(i, i / 2, 7 - i, Block::new(1 + (i % 3) as u8));
        }
        small.set_block(1, 0, 1, Block::new(4));

        let mut mesher = GreedyMesher::new();
        let first = big.build_mesh_with(&mut mesher, &EmptySurroundings, &registry);
        let other = small.build_mesh_with(&mut mesher, &EmptySurroundings, &registry);
        let again = big.build_mesh_with(&mut mesher, &EmptySurroundings, &registry);

        assert_eq!(first, big.build_mesh(&EmptySurroundings, &registry));
        assert_eq!(other, small.build_mesh(&EmptySurroundings, &registry));
        assert_eq!(first, again);
    }

    #[test]
    fn test_fan_mode_is_carried_into_mesh() {
        let registry = BlockRegistry::builtin();
        let mut chunk = Chunk::new(IVec3::ZERO, 2).with_index_mode(IndexMode::TriangleFan);
        chunk.set_block(0, 0, 0, Block::new(1));
        let mesh = chunk.mesh(&EmptySurroundings, &registry);
        assert_eq!(mesh.index_mode(), IndexMode::TriangleFan);
        assert_eq!(mesh.indices().len(), 6 * 5);
    }
}
