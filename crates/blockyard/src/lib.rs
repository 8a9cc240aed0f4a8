//! # Blockyard
//!
//! Host-side glue around [`blockyard_voxel`]: resource caches, the
//! application context, and the `blockyard` loader binary.
//!
//! ## Modules
//!
//! - `assets`: keyed `ResourceCache<T>` with a loader closure per kind
//! - `context`: `AppContext`, passed explicitly to whoever needs it
//! - `error`: host errors

#![deny(unsafe_code)]

pub mod assets;
pub mod context;
pub mod error;

pub use blockyard_voxel as voxel;

pub use assets::ResourceCache;
pub use context::{AppContext, MeshStats};
pub use error::{AppError, AppResult, BoxError};
