//! Terrain configuration, loaded from TOML at startup.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! seed = 1337
//! chunk_size = 16
//! extent = [4, 2, 4]          # chunks along x, y, z
//! index_mode = "triangle_list"
//!
//! [generation]
//! hill_amplitude = 10.0
//! cave_threshold = 0.6
//! ```

use std::path::Path;

use blockyard_procedural::GenerationParams;
use serde::{Deserialize, Serialize};

use crate::chunk::MAX_CHUNK_SIZE;
use crate::error::{ConfigError, ConfigResult};
use crate::mesh::IndexMode;

/// Largest number of chunks along one axis.
pub const MAX_EXTENT: u32 = 1 << 16;

/// Everything needed to build a [`Terrain`](crate::Terrain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    /// World seed.
    pub seed: u64,
    /// Chunk edge length in voxels.
    pub chunk_size: usize,
    /// Number of chunks along x, y and z.
    pub extent: [u32; 3],
    /// Index encoding of generated meshes.
    pub index_mode: IndexMode,
    /// Noise parameters.
    pub generation: GenerationParams,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            chunk_size: 16,
            extent: [4, 2, 4],
            index_mode: IndexMode::default(),
            generation: GenerationParams::default(),
        }
    }
}

impl TerrainConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// [`ConfigError::InvalidValue`] for out-of-range settings.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(invalid(
                "chunk_size",
                format!("{} is not in 1..={MAX_CHUNK_SIZE}", self.chunk_size),
            ));
        }
        if self.extent.contains(&0) {
            return Err(invalid("extent", format!("{:?} has an empty axis", self.extent)));
        }
        if self.extent.iter().any(|&n| n > MAX_EXTENT) {
            return Err(invalid("extent", format!("{:?} exceeds {MAX_EXTENT} on an axis", self.extent)));
        }

        let g = &self.generation;
        if !(1..=16).contains(&g.octaves) {
            return Err(invalid("generation.octaves", format!("{} is not in 1..=16", g.octaves)));
        }
        if !(1..=16).contains(&g.overhang_octaves) {
            return Err(invalid(
                "generation.overhang_octaves",
                format!("{} is not in 1..=16", g.overhang_octaves),
            ));
        }
        let finite = [
            ("generation.surface_level", g.surface_level),
            ("generation.hill_amplitude", g.hill_amplitude),
            ("generation.overhang_strength", g.overhang_strength),
            ("generation.cave_threshold", g.cave_threshold),
            ("generation.cave_depth_bias", g.cave_depth_bias),
            ("generation.cave_bias_limit", g.cave_bias_limit),
            ("generation.surface_amplitude", g.surface_amplitude),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not finite")));
            }
        }
        let positive = [
            ("generation.hill_frequency", g.hill_frequency),
            ("generation.overhang_frequency", g.overhang_frequency),
            ("generation.cave_frequency", g.cave_frequency),
            ("generation.surface_frequency", g.surface_frequency),
            ("generation.persistence", g.persistence),
            ("generation.lacunarity", g.lacunarity),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("{value} must be positive")));
            }
        }
        if g.palette.ids().contains(&0) {
            return Err(invalid("generation.palette", "id 0 is air".to_owned()));
        }

        Ok(())
    }

    /// Total chunk count, or `None` on overflow.
    #[must_use]
    pub fn chunk_count(&self) -> Option<usize> {
        self.extent
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n as usize))
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
