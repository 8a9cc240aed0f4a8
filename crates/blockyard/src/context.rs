//! Application context.
//!
//! Owns everything the host shares between components: one resource cache
//! per kind and the live terrain. Components receive `&AppContext` or
//! `&mut AppContext` explicitly; there is no global instance.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use blockyard_voxel::{BlockRegistry, ChunkMesh, Terrain, TerrainConfig};
use tracing::info;

use crate::assets::ResourceCache;
use crate::error::{AppError, AppResult};

/// Shared host state.
pub struct AppContext {
    registries: ResourceCache<BlockRegistry>,
    configs: ResourceCache<TerrainConfig>,
    terrain: Option<Terrain>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("registries", &self.registries)
            .field("configs", &self.configs)
            .field("terrain_chunks", &self.terrain.as_ref().map(Terrain::chunk_count))
            .finish()
    }
}

impl AppContext {
    /// Creates a context whose caches load from the filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registries: ResourceCache::new("block registry", |path: &str| BlockRegistry::load(path)),
            configs: ResourceCache::new("terrain config", |path: &str| TerrainConfig::load(path)),
            terrain: None,
        }
    }

    /// Block registry from `path`, or the built-in table for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Load`] if the file cannot be loaded.
    pub fn registry(&self, path: Option<&Path>) -> AppResult<Arc<BlockRegistry>> {
        match path {
            Some(path) => self.registries.get(&path.to_string_lossy()),
            None => Ok(Arc::new(BlockRegistry::builtin())),
        }
    }

    /// Terrain config from `path`, or defaults for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Load`] if the file cannot be loaded.
    pub fn terrain_config(&self, path: Option<&Path>) -> AppResult<Arc<TerrainConfig>> {
        match path {
            Some(path) => self.configs.get(&path.to_string_lossy()),
            None => Ok(Arc::new(TerrainConfig::default())),
        }
    }

    /// Block registry cache.
    #[must_use]
    pub const fn registries(&self) -> &ResourceCache<BlockRegistry> {
        &self.registries
    }

    /// Terrain config cache.
    #[must_use]
    pub const fn configs(&self) -> &ResourceCache<TerrainConfig> {
        &self.configs
    }

    /// Generates a terrain and makes it the live one, replacing any previous.
    ///
    /// On failure the previous terrain is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Terrain`] if construction fails.
    pub fn generate_terrain(
        &mut self,
        config: &TerrainConfig,
        registry: &BlockRegistry,
        progress: impl FnMut(&str, f32),
    ) -> AppResult<&mut Terrain> {
        let terrain = Terrain::generate_with_progress(config, registry.clone(), progress)?;
        Ok(self.terrain.insert(terrain))
    }

    /// The live terrain, if any.
    #[must_use]
    pub const fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    /// The live terrain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoTerrain`] before the first generation.
    pub fn terrain_mut(&mut self) -> AppResult<&mut Terrain> {
        self.terrain.as_mut().ok_or(AppError::NoTerrain)
    }

    /// Rebuilds every dirty chunk mesh of the live terrain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoTerrain`] before the first generation.
    pub fn rebuild_meshes(&mut self, progress: impl FnMut(&str, f32)) -> AppResult<MeshStats> {
        let terrain = self.terrain_mut()?;
        let rebuilt = terrain.rebuild_dirty_meshes(progress);
        let stats = MeshStats::collect(terrain);
        info!(rebuilt, quads = stats.quads, triangles = stats.triangles, "meshes ready");
        Ok(stats)
    }
}

/// Totals over a terrain's clean meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Chunks in the terrain.
    pub chunks: usize,
    /// Chunks with at least one quad.
    pub visible_chunks: usize,
    /// Solid voxels.
    pub solid_voxels: usize,
    /// Merged quads.
    pub quads: usize,
    /// Vertices across all meshes.
    pub vertices: usize,
    /// Triangles across all meshes.
    pub triangles: usize,
    /// Vertex plus index buffer size.
    pub bytes: usize,
}

impl MeshStats {
    /// Sums the clean meshes of `terrain`. Dirty chunks count as chunks only.
    #[must_use]
    pub fn collect(terrain: &Terrain) -> Self {
        let mut stats = Self {
            chunks: terrain.chunk_count(),
            solid_voxels: terrain.chunks().map(|c| c.solid_count()).sum(),
            ..Self::default()
        };
        for (_, mesh) in terrain.render_list() {
            stats.add(mesh);
        }
        stats
    }

    fn add(&mut self, mesh: &ChunkMesh) {
        if !mesh.is_empty() {
            self.visible_chunks += 1;
        }
        self.quads += mesh.quad_count();
        self.vertices += mesh.vertex_count();
        self.triangles += mesh.triangle_count();
        self.bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
    }
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chunks:        {} ({} visible)", self.chunks, self.visible_chunks)?;
        writeln!(f, "solid voxels:  {}", self.solid_voxels)?;
        writeln!(f, "quads:         {}", self.quads)?;
        writeln!(f, "vertices:      {}", self.vertices)?;
        writeln!(f, "triangles:     {}", self.triangles)?;
        write!(f, "buffer bytes:  {}", self.bytes)
    }
}
