//! # Voxel Error Types
//!
//! Config/registry loading errors and terrain construction errors.
//!
//! Missing neighbour chunks are not errors: lookups resolve to air.

use std::path::PathBuf;

use glam::IVec3;
use thiserror::Error;

/// Errors raised while loading or validating a config or block registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for its schema.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// File (or `<inline>`) that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A block tried to register id 0.
    #[error("block '{name}' uses id 0, which is reserved for air")]
    ReservedId {
        /// Name of the offending block.
        name: String,
    },

    /// Two blocks share an id.
    #[error("block id {id} registered twice ('{first}' and '{second}')")]
    DuplicateId {
        /// The contested id.
        id: u8,
        /// Name already registered.
        first: String,
        /// Name that tried to register.
        second: String,
    },

    /// A block has an empty name.
    #[error("block id {id} has an empty name")]
    EmptyName {
        /// Id of the offending block.
        id: u8,
    },

    /// A face of a block has no texture layer.
    #[error("block '{name}' leaves face {face} without a texture")]
    MissingTexture {
        /// Name of the offending block.
        name: String,
        /// Face index (+x, -x, +y, -y, +z, -z).
        face: usize,
    },

    /// A block references a texture layer past the declared layer count.
    #[error("block '{name}' uses texture layer {layer} but only {layers} layers exist")]
    TextureOutOfRange {
        /// Name of the offending block.
        name: String,
        /// Requested layer.
        layer: u16,
        /// Declared layer count.
        layers: u16,
    },

    /// A numeric setting is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result alias for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while constructing a terrain.
///
/// Construction is atomic: on any of these, no terrain is returned.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// The configuration failed validation.
    #[error("invalid terrain configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The requested world does not fit in the address space.
    #[error("terrain of {chunks} chunks with {size}³ voxels each overflows usize")]
    VolumeOverflow {
        /// Requested chunk count (saturated).
        chunks: usize,
        /// Chunk edge length.
        size: usize,
    },

    /// A voxel buffer or the chunk map could not be allocated.
    #[error("failed to allocate {bytes} bytes for chunk {coord}")]
    AllocationFailed {
        /// Chunk being built when allocation failed.
        coord: IVec3,
        /// Requested size.
        bytes: usize,
    },
}

/// Result alias for terrain construction.
pub type TerrainResult<T> = Result<T, TerrainError>;
