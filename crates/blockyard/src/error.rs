//! # Host Error Types

use blockyard_voxel::TerrainError;
use thiserror::Error;

/// Boxed loader failure, kept opaque so any resource kind can plug in.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the host layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// A resource loader failed.
    #[error("failed to load {kind} '{key}': {source}")]
    Load {
        /// Resource kind, e.g. "block registry".
        kind: &'static str,
        /// Key the resource was requested under.
        key: String,
        /// Loader error.
        #[source]
        source: BoxError,
    },

    /// Terrain construction failed.
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    /// An operation needed a terrain before one was generated.
    #[error("no terrain has been generated")]
    NoTerrain,
}

/// Result alias for host operations.
pub type AppResult<T> = Result<T, AppError>;
