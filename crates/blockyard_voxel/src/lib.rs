//! # Blockyard Voxel
//!
//! Block worlds stored as fixed-size chunks, turned into renderable meshes
//! with greedy meshing.
//!
//! ## Architecture
//!
//! ```text
//! TerrainConfig ──► Terrain ──► Chunk[] ──► GreedyMesher ──► ChunkMesh
//!                      │                         ▲
//!                      └──── BlockSource ────────┘  (cross-chunk lookups)
//! ```
//!
//! - [`Block`]: one voxel, `0` is air
//! - [`BlockRegistry`]: names and per-face texture layers for block ids
//! - [`Chunk`]: `size³` voxels, cached mesh, dirty tracking
//! - [`GreedyMesher`]: merges coplanar faces into rectangles
//! - [`Terrain`]: the chunk grid, generation, edits and remeshing
//!
//! ## Example
//!
//! ```rust
//! use blockyard_voxel::{Block, BlockRegistry, Chunk, EmptySurroundings};
//! use glam::IVec3;
//!
//! let registry = BlockRegistry::builtin();
//! let mut chunk = Chunk::new(IVec3::ZERO, 2);
//! chunk.set_block(0, 0, 0, Block::new(1));
//!
//! let mesh = chunk.mesh(&EmptySurroundings, &registry);
//! assert_eq!(mesh.quad_count(), 6);
//! ```

#![deny(unsafe_code)]

pub mod block;
pub mod chunk;
pub mod config;
pub mod error;
pub mod greedy_mesh;
pub mod mesh;
pub mod registry;
pub mod terrain;

pub use block::{Block, BlockSource, EmptySurroundings};
pub use chunk::{Chunk, ChunkId, MAX_CHUNK_SIZE};
pub use config::{TerrainConfig, MAX_EXTENT};
pub use error::{ConfigError, ConfigResult, TerrainError, TerrainResult};
pub use greedy_mesh::GreedyMesher;
pub use mesh::{ChunkMesh, FaceDir, IndexMode, Quad, Vertex, PRIMITIVE_RESTART};
pub use registry::{BlockRegistry, BlockType, MAX_BLOCK_TYPES};
pub use terrain::{Terrain, GENERATING, MESHING};
