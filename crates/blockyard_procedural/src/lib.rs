//! # Blockyard Procedural Generation
//!
//! Deterministic terrain generation for block worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Local**: Every voxel is a pure function of its world position
//! 3. **Chunk-agnostic**: Generation never needs a neighbouring chunk
//!
//! ## Core Components
//!
//! - `SimplexNoise`: 2D/3D noise generation
//! - `TerrainGenerator`: base, cave and surface passes over a voxel buffer
//! - `GenerationParams`: tunables, deserializable from TOML
//!
//! ## Example
//!
//! ```rust
//! use blockyard_procedural::{GenerationParams, TerrainGenerator, WorldSeed};
//! use glam::IVec3;
//!
//! let generator = TerrainGenerator::new(WorldSeed::new(12345), GenerationParams::default());
//! let mut voxels = vec![0u8; 16 * 16 * 16];
//! let stats = generator.generate_chunk(IVec3::ZERO, 16, true, &mut voxels);
//! assert!(stats.solid > 0);
//! ```

#![deny(unsafe_code)]

pub mod generator;
pub mod noise;

pub use generator::{
    voxel_index, BlockPalette, GenerationParams, GenerationStats, TerrainGenerator,
};
pub use noise::{SimplexNoise, WorldSeed};
