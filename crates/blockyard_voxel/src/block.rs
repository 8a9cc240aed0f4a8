//! Blocks and block lookup across chunk boundaries.

use bytemuck::{Pod, Zeroable};
use glam::IVec3;

/// A single voxel: one byte of block id. Id 0 is air.
///
/// Layout is exactly a `u8`, so a chunk's block buffer can be viewed as raw
/// ids and filled by the generator in place.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Block {
    /// Block type id.
    pub id: u8,
}

impl Block {
    /// Empty block. Also the sentinel for lookups outside the world.
    pub const AIR: Self = Self { id: 0 };

    /// Creates a block with the given type id.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self { id }
    }

    /// Returns true if this is air.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }

    /// Returns true if this block produces geometry.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        self.id != 0
    }
}

impl From<u8> for Block {
    fn from(id: u8) -> Self {
        Self::new(id)
    }
}

/// Anything that can answer "which block is at this world position".
///
/// The mesher asks its chunk's surroundings for the voxels just outside the
/// chunk. Implementations must return [`Block::AIR`] for positions they know
/// nothing about rather than failing.
pub trait BlockSource {
    /// Block at a world-space voxel coordinate.
    fn block_at(&self, world: IVec3) -> Block;
}

/// Surroundings of a chunk floating in empty space.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySurroundings;

impl BlockSource for EmptySurroundings {
    #[inline]
    fn block_at(&self, _world: IVec3) -> Block {
        Block::AIR
    }
}
