//! Greedy Meshing algorithm.
//!
//! Reduces polygon count by merging adjacent faces with the same block id
//! and orientation into rectangles.
//!
//! ## Algorithm
//!
//! For each axis `d` (with in-plane axes `u = (d + 1) % 3`, `v = (d + 2) % 3`):
//!
//! 1. Sweep `size + 1` slice planes, one per voxel boundary including both
//!    chunk borders.
//! 2. For each `(u, v)` cell of a slice compare the voxel behind the plane
//!    (`near`) with the one in front (`far`). Voxels outside the chunk come
//!    from the surroundings. Exactly one solid means a visible face, facing
//!    `+d` if `near` is the solid one and `-d` otherwise.
//! 3. Scan the mask row by row. From each unvisited face grow the width
//!    along `u` while id and orientation match; the height along `v` is the
//!    shortest matching run among those columns. Emit, clear, skip ahead.
//!
//! A face on the chunk border belongs to whichever chunk owns its solid
//! voxel, so two neighbouring chunks never both emit it.

use glam::IVec3;
use tracing::warn;

use crate::block::{Block, BlockSource};
use crate::chunk::Chunk;
use crate::mesh::{FaceDir, Quad};
use crate::registry::BlockRegistry;

/// Face mask entry for greedy meshing.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct FaceMask {
    block: u8,
    /// Outward normal points along `+d`.
    positive: bool,
}

impl FaceMask {
    const EMPTY: Self = Self { block: 0, positive: false };

    /// XOR test between the two voxels on either side of a slice plane.
    #[inline]
    fn between(near: Block, far: Block) -> Self {
        match (near.is_solid(), far.is_solid()) {
            (true, false) => Self { block: near.id, positive: true },
            (false, true) => Self { block: far.id, positive: false },
            _ => Self::EMPTY,
        }
    }

    #[inline]
    fn is_empty(self) -> bool {
        self.block == 0
    }
}

/// Greedy meshing engine.
///
/// Keeps the mask buffer between calls; one mesher per thread.
#[derive(Default)]
pub struct GreedyMesher {
    /// `size × size` cells, row-major with rows along `v`.
    mask: Vec<FaceMask>,
}

impl GreedyMesher {
    /// Creates a mesher. The mask grows on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Meshes `chunk`, reading voxels just outside it from `surroundings`.
    #[must_use]
    pub fn mesh<S>(&mut self, chunk: &Chunk, surroundings: &S, registry: &BlockRegistry) -> Vec<Quad>
    where
        S: BlockSource + ?Sized,
    {
        let size = chunk.size();
        let mut quads = Vec::new();
        let mut unknown: Option<u8> = None;

        self.mask.clear();
        self.mask.resize(size * size, FaceMask::EMPTY);

        for d in 0..3 {
            for slice in 0..=size {
                self.build_mask(chunk, surroundings, d, slice);
                self.extract(chunk, registry, d, slice, &mut quads, &mut unknown);
            }
        }

        if let Some(id) = unknown {
            warn!(chunk = %chunk.id(), block = id, "meshed a block id with no registered type");
        }

        quads
    }

    /// Fills the mask for the plane at `slice` along axis `d`.
    fn build_mask<S>(&mut self, chunk: &Chunk, surroundings: &S, d: usize, slice: usize)
    where
        S: BlockSource + ?Sized,
    {
        let size = chunk.size();
        let (u, v) = ((d + 1) % 3, (d + 2) % 3);
        let origin = chunk.origin();

        for j in 0..size {
            for i in 0..size {
                let mut local = [0usize; 3];
                local[u] = i;
                local[v] = j;

                let near = if slice > 0 {
                    local[d] = slice - 1;
                    chunk.block_at(local[0], local[1], local[2])
                } else {
                    let mut world = origin + to_ivec3(local);
                    world[d] -= 1;
                    surroundings.block_at(world)
                };

                let far = if slice < size {
                    local[d] = slice;
                    chunk.block_at(local[0], local[1], local[2])
                } else {
                    local[d] = 0;
                    let mut world = origin + to_ivec3(local);
                    world[d] += size as i32;
                    surroundings.block_at(world)
                };

                let mut cell = FaceMask::between(near, far);
                // Border faces of a neighbour's solid voxel are the neighbour's to emit
                let foreign = (slice == 0 && cell.positive) || (slice == size && !cell.positive);
                if foreign {
                    cell = FaceMask::EMPTY;
                }
                self.mask[j * size + i] = cell;
            }
        }
    }

    /// Merges the current mask into quads.
    fn extract(
        &mut self,
        chunk: &Chunk,
        registry: &BlockRegistry,
        d: usize,
        slice: usize,
        quads: &mut Vec<Quad>,
        unknown: &mut Option<u8>,
    ) {
        let size = chunk.size();
        let (u, v) = ((d + 1) % 3, (d + 2) % 3);

        for j in 0..size {
            let mut i = 0;
            while i < size {
                let cell = self.mask[j * size + i];
                if cell.is_empty() {
                    i += 1;
                    continue;
                }

                // Height of the first column, then widen while each new
                // column matches, shrinking the height to the shortest run.
                let mut height = self.run_length(size, i, j, size - j, cell);
                let mut width = 1;
                while i + width < size && self.mask[j * size + i + width] == cell {
                    height = self.run_length(size, i + width, j, height, cell);
                    width += 1;
                }

                let mut corner = [0i32; 3];
                corner[d] = slice as i32;
                corner[u] = i as i32;
                corner[v] = j as i32;

                let face = FaceDir::from_axis(d, cell.positive);
                if !registry.contains(cell.block) {
                    *unknown = Some(cell.block);
                }
                quads.push(Quad::new(
                    chunk.origin() + IVec3::from_array(corner),
                    face,
                    cell.block,
                    registry.texture(cell.block, face),
                    width as u32,
                    height as u32,
                ));

                for row in j..j + height {
                    self.mask[row * size + i..row * size + i + width].fill(FaceMask::EMPTY);
                }

                i += width;
            }
        }
    }

    /// Cells matching `cell` in column `i` from row `j` upward, at most `cap`.
    #[inline]
    fn run_length(&self, size: usize, i: usize, j: usize, cap: usize, cell: FaceMask) -> usize {
        let mut run = 0;
        while run < cap && self.mask[(j + run) * size + i] == cell {
            run += 1;
        }
        run
    }
}

#[inline]
fn to_ivec3(local: [usize; 3]) -> IVec3 {
    IVec3::new(local[0] as i32, local[1] as i32, local[2] as i32)
}
