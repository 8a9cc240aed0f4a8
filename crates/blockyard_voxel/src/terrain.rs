//! Terrain: a fixed grid of chunks with world-space block queries.
//!
//! The grid spans `extent` chunks starting at chunk `(0, 0, 0)` and is
//! fully generated at construction. Queries outside it return air.
//!
//! Meshes are built lazily per chunk, or all at once with
//! [`Terrain::rebuild_dirty_meshes`], which meshes chunks in parallel
//! against the immutable terrain and then installs the results.

use std::collections::HashMap;

use blockyard_procedural::{GenerationStats, TerrainGenerator, WorldSeed};
use glam::{IVec3, UVec3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::block::{Block, BlockSource};
use crate::chunk::{Chunk, ChunkId};
use crate::config::TerrainConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::greedy_mesh::GreedyMesher;
use crate::mesh::{ChunkMesh, IndexMode};
use crate::registry::{BlockRegistry, BlockType};

/// Progress label reported while generating chunks.
pub const GENERATING: &str = "Generating terrain";
/// Progress label reported while meshing chunks.
pub const MESHING: &str = "Meshing chunks";

/// A generated world of chunks sharing one edge length.
pub struct Terrain {
    chunks: HashMap<IVec3, Chunk>,
    chunk_size: usize,
    extent: UVec3,
    index_mode: IndexMode,
    registry: BlockRegistry,
}

impl Terrain {
    /// Generates a terrain from `config`.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_with_progress`].
    pub fn generate(config: &TerrainConfig, registry: BlockRegistry) -> TerrainResult<Self> {
        Self::generate_with_progress(config, registry, |_, _| {})
    }

    /// Generates a terrain, calling `progress(label, fraction)` after each chunk.
    ///
    /// Runs the base, cave and surface passes. The surface pass only runs on
    /// the bottom row of chunks (`y == 0`).
    ///
    /// # Errors
    ///
    /// Fails without returning a partial terrain if the config is invalid,
    /// the world volume overflows, or a voxel buffer cannot be allocated.
    pub fn generate_with_progress(
        config: &TerrainConfig,
        registry: BlockRegistry,
        mut progress: impl FnMut(&str, f32),
    ) -> TerrainResult<Self> {
        config.validate()?;
        let mut terrain = Self::allocate(config, registry)?;

        for id in config.generation.palette.ids() {
            if !terrain.registry.contains(id) {
                warn!(block = id, "generation palette uses an unregistered block id");
            }
        }

        let generator = TerrainGenerator::new(WorldSeed::new(config.seed), config.generation.clone());
        let size = terrain.chunk_size;
        let total = terrain.chunks.len();
        let mut stats = GenerationStats::default();

        progress(GENERATING, 0.0);
        for (done, coord) in Self::grid(terrain.extent).enumerate() {
            if let Some(chunk) = terrain.chunks.get_mut(&coord) {
                let origin = chunk.origin();
                stats += generator.generate_chunk(origin, size, coord.y == 0, chunk.ids_mut());
                chunk.recount();
            }
            progress(GENERATING, (done + 1) as f32 / total as f32);
        }

        info!(
            chunks = total,
            chunk_size = size,
            solid = stats.solid,
            carved = stats.carved,
            sealed = stats.sealed,
            seed = config.seed,
            "generated terrain"
        );
        Ok(terrain)
    }

    /// Creates an all-air terrain, e.g. for editing from scratch.
    ///
    /// # Errors
    ///
    /// As [`Self::generate_with_progress`], minus generation.
    pub fn empty(config: &TerrainConfig, registry: BlockRegistry) -> TerrainResult<Self> {
        config.validate()?;
        Self::allocate(config, registry)
    }

    /// Allocates every chunk slot up front so failure leaves nothing behind.
    fn allocate(config: &TerrainConfig, registry: BlockRegistry) -> TerrainResult<Self> {
        let size = config.chunk_size;
        let chunk_count = config.chunk_count();
        let volume = size.checked_mul(size).and_then(|a| a.checked_mul(size));
        match (chunk_count, volume) {
            (Some(chunks), Some(volume)) if chunks.checked_mul(volume).is_some() => {}
            _ => {
                return Err(TerrainError::VolumeOverflow {
                    chunks: chunk_count.unwrap_or(usize::MAX),
                    size,
                })
            }
        }

        let extent = UVec3::from_array(config.extent);
        let mut terrain = Self {
            chunks: HashMap::new(),
            chunk_size: size,
            extent,
            index_mode: config.index_mode,
            registry,
        };

        let slots = chunk_count.unwrap_or(usize::MAX);
        terrain
            .chunks
            .try_reserve(slots)
            .map_err(|_| TerrainError::AllocationFailed {
                coord: IVec3::ZERO,
                bytes: slots.saturating_mul(std::mem::size_of::<(IVec3, Chunk)>()),
            })?;

        for coord in Self::grid(extent) {
            let chunk = Chunk::try_new(coord, size)?.with_index_mode(config.index_mode);
            terrain.chunks.insert(coord, chunk);
        }
        debug!(chunks = terrain.chunks.len(), "allocated terrain");
        Ok(terrain)
    }

    /// Every chunk coordinate in `extent`, x-major.
    fn grid(extent: UVec3) -> impl Iterator<Item = IVec3> {
        let e = extent.as_ivec3();
        (0..e.x).flat_map(move |x| {
            (0..e.y).flat_map(move |y| (0..e.z).map(move |z| IVec3::new(x, y, z)))
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Chunk edge length in voxels.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks along each axis.
    #[must_use]
    pub const fn extent(&self) -> UVec3 {
        self.extent
    }

    /// Number of chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The block type table.
    #[must_use]
    pub const fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Chunk at a chunk-grid coordinate, if inside the extent.
    #[must_use]
    pub fn chunk_at(&self, coord: IVec3) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// All chunks, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Splits a world coordinate into chunk coordinate and local offset.
    #[must_use]
    pub fn locate(&self, world: IVec3) -> (IVec3, IVec3) {
        let size = IVec3::splat(self.chunk_size as i32);
        (world.div_euclid(size), world.rem_euclid(size))
    }

    /// Block at a world coordinate; air outside the generated extent.
    #[must_use]
    pub fn block_at(&self, world: IVec3) -> Block {
        let (coord, local) = self.locate(world);
        self.chunks.get(&coord).map_or(Block::AIR, |chunk| {
            chunk.block_at(local.x as usize, local.y as usize, local.z as usize)
        })
    }

    /// Block type for `id`.
    #[must_use]
    pub fn block_type_of(&self, id: u8) -> &BlockType {
        self.registry.get(id)
    }

    /// Number of chunks whose mesh is stale.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.chunks.values().filter(|c| c.is_dirty()).count()
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    /// Replaces the block at `world`.
    ///
    /// Marks the owning chunk dirty, plus every neighbour whose border faces
    /// touch the edited voxel. Returns false (and changes nothing) outside
    /// the generated extent.
    pub fn set_block(&mut self, world: IVec3, block: Block) -> bool {
        let (coord, local) = self.locate(world);
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        chunk.set_block(local.x as usize, local.y as usize, local.z as usize, block);

        let last = self.chunk_size as i32 - 1;
        for axis in 0..3 {
            let mut step = IVec3::ZERO;
            step[axis] = 1;
            if local[axis] == 0 {
                if let Some(neighbour) = self.chunks.get_mut(&(coord - step)) {
                    neighbour.mark_dirty();
                }
            }
            if local[axis] == last {
                if let Some(neighbour) = self.chunks.get_mut(&(coord + step)) {
                    neighbour.mark_dirty();
                }
            }
        }
        true
    }

    // =========================================================================
    // MESHING
    // =========================================================================

    /// Mesh of one chunk, rebuilt first if dirty.
    pub fn chunk_mesh(&mut self, coord: IVec3) -> Option<&ChunkMesh> {
        let terrain: &Self = self;
        let chunk = terrain.chunks.get(&coord)?;
        if chunk.is_dirty() {
            let mesh = chunk.build_mesh(terrain, &terrain.registry);
            self.chunks.get_mut(&coord)?.install_mesh(mesh);
        }
        self.chunks.get(&coord).and_then(Chunk::cached_mesh)
    }

    /// Rebuilds every dirty chunk's mesh, meshing chunks in parallel.
    ///
    /// `progress(label, fraction)` is called as meshes are installed.
    /// Returns the number of chunks rebuilt.
    pub fn rebuild_dirty_meshes(&mut self, mut progress: impl FnMut(&str, f32)) -> usize {
        let mut dirty: Vec<IVec3> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_dirty())
            .map(|(coord, _)| *coord)
            .collect();
        dirty.sort_unstable_by_key(|c| (c.x, c.y, c.z));

        progress(MESHING, 0.0);
        if dirty.is_empty() {
            progress(MESHING, 1.0);
            return 0;
        }

        let terrain: &Self = self;
        let meshes: Vec<(IVec3, ChunkMesh)> = dirty
            .par_iter()
            .map_init(GreedyMesher::new, |mesher, coord| {
                terrain.chunks.get(coord).map(|chunk| {
                    (*coord, chunk.build_mesh_with(mesher, terrain, &terrain.registry))
                })
            })
            .flatten()
            .collect();

        let total = meshes.len();
        for (done, (coord, mesh)) in meshes.into_iter().enumerate() {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.install_mesh(mesh);
            }
            progress(MESHING, (done + 1) as f32 / total as f32);
        }

        info!(rebuilt = total, "rebuilt dirty chunk meshes");
        total
    }

    /// Clean meshes keyed by chunk id, in id order, for the renderer.
    ///
    /// Dirty chunks are left out; call [`Self::rebuild_dirty_meshes`] first.
    #[must_use]
    pub fn render_list(&self) -> Vec<(ChunkId, &ChunkMesh)> {
        let mut list: Vec<_> = self
            .chunks
            .values()
            .filter_map(|chunk| chunk.cached_mesh().map(|mesh| (chunk.id(), mesh)))
            .collect();
        list.sort_unstable_by_key(|(id, _)| *id);
        list
    }

    /// Index encoding used by this terrain's chunks.
    #[must_use]
    pub const fn index_mode(&self) -> IndexMode {
        self.index_mode
    }
}

impl BlockSource for Terrain {
    #[inline]
    fn block_at(&self, world: IVec3) -> Block {
        Terrain::block_at(self, world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, extent: [u32; 3]) -> TerrainConfig {
        TerrainConfig {
            chunk_size: size,
            extent,
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_empty_terrain_slots() {
        let terrain = Terrain::empty(&config(4, [2, 1, 3]), BlockRegistry::builtin()).unwrap();
        assert_eq!(terrain.chunk_count(), 6);
        assert!(terrain.chunk_at(IVec3::new(1, 0, 2)).is_some());
        assert!(terrain.chunk_at(IVec3::new(2, 0, 0)).is_none());
        assert!(terrain.chunk_at(IVec3::new(-1, 0, 0)).is_none());
    }

    #[test]
    fn test_locate_uses_floor_division() {
        let terrain = Terrain::empty(&config(4, [1, 1, 1]), BlockRegistry::builtin()).unwrap();
        assert_eq!(terrain.locate(IVec3::new(-1, 4, 9)), (IVec3::new(-1, 1, 2), IVec3::new(3, 0, 1)));
    }

    #[test]
    fn test_set_block_round_trip_and_bounds() {
        let mut terrain = Terrain::empty(&config(4, [2, 2, 2]), BlockRegistry::builtin()).unwrap();
        assert!(terrain.set_block(IVec3::new(5, 6, 7), Block::new(2)));
        assert_eq!(terrain.block_at(IVec3::new(5, 6, 7)), Block::new(2));

        assert!(!terrain.set_block(IVec3::new(-1, 0, 0), Block::new(2)));
        assert!(!terrain.set_block(IVec3::new(0, 8, 0), Block::new(2)));
        assert_eq!(terrain.block_at(IVec3::new(-1, 0, 0)), Block::AIR);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = Terrain::empty(&config(0, [1, 1, 1]), BlockRegistry::builtin());
        assert!(matches!(result, Err(TerrainError::InvalidConfig(_))));
    }

    #[test]
    fn test_overflowing_volume_is_rejected() {
        let result = Terrain::empty(&config(256, [1 << 16, 1 << 16, 1 << 16]), BlockRegistry::builtin());
        assert!(matches!(result, Err(TerrainError::VolumeOverflow { .. })));
    }
}
