//! Block type registry: id → name and per-face texture layers.
//!
//! The table has one slot for every possible `u8` id, so any lookup is in
//! bounds. Ids nobody registered resolve to a fallback type on layer 0.
//!
//! ## File Format
//!
//! ```toml
//! layers = 6            # optional; enables texture bounds checks
//!
//! [[block]]
//! id = 1
//! name = "stone"
//! texture = 0           # every face
//!
//! [[block]]
//! id = 3
//! name = "grass"
//! texture = 3           # base for all faces...
//! top = 2               # ...then per-direction overrides
//! bottom = 1
//!
//! [[block]]
//! id = 5
//! name = "crate"
//! faces = [4, 4, 5, 5, 4, 4]   # +x, -x, +y, -y, +z, -z
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::mesh::FaceDir;

/// Number of registry slots, one per `u8` id.
pub const MAX_BLOCK_TYPES: usize = 256;

/// Display name and texture layers for one block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockType {
    /// Human-readable name.
    pub name: String,
    /// Texture array layer per face, in [`FaceDir`] order.
    pub textures: [u16; 6],
}

impl BlockType {
    /// Creates a block type with explicit per-face layers.
    #[must_use]
    pub fn new(name: impl Into<String>, textures: [u16; 6]) -> Self {
        Self {
            name: name.into(),
            textures,
        }
    }

    /// Creates a block type using one layer on every face.
    #[must_use]
    pub fn uniform(name: impl Into<String>, layer: u16) -> Self {
        Self::new(name, [layer; 6])
    }

    /// Creates a block type with distinct top, bottom and side layers.
    #[must_use]
    pub fn columnar(name: impl Into<String>, top: u16, bottom: u16, side: u16) -> Self {
        Self::new(name, [side, side, top, bottom, side, side])
    }

    /// Texture layer for `face`.
    #[inline]
    #[must_use]
    pub const fn texture(&self, face: FaceDir) -> u16 {
        self.textures[face.index()]
    }
}

/// Fixed-size table of block types indexed by id.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    slots: Box<[Option<BlockType>]>,
    fallback: BlockType,
    layers: Option<u16>,
}

impl BlockRegistry {
    /// Creates an empty registry. Pass `Some(n)` to reject layers `>= n`.
    #[must_use]
    pub fn new(layers: Option<u16>) -> Self {
        Self {
            slots: vec![None; MAX_BLOCK_TYPES].into_boxed_slice(),
            fallback: BlockType::uniform("unknown", 0),
            layers,
        }
    }

    /// The registry used when no block file is supplied.
    ///
    /// | id | name  | layers (top / bottom / side) |
    /// |----|-------|------------------------------|
    /// | 1  | stone | 0                            |
    /// | 2  | dirt  | 1                            |
    /// | 3  | grass | 2 / 1 / 3                    |
    /// | 4  | sand  | 4                            |
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new(Some(5));
        let defaults = [
            (1, BlockType::uniform("stone", 0)),
            (2, BlockType::uniform("dirt", 1)),
            (3, BlockType::columnar("grass", 2, 1, 3)),
            (4, BlockType::uniform("sand", 4)),
        ];
        for (id, block_type) in defaults {
            let registered = registry.register(id, block_type);
            debug_assert!(registered.is_ok(), "built-in block {id}: {registered:?}");
        }
        registry
    }

    /// Parses a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and a validation
    /// variant for the first invalid block.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Loads a registry file.
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
        let file: RegistryFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry = Self::new(file.layers);
        for entry in file.blocks {
            let textures = entry.resolve_textures()?;
            registry.register(entry.id, BlockType::new(entry.name, textures))?;
        }
        Ok(registry)
    }

    /// Adds a block type under `id`.
    ///
    /// # Errors
    ///
    /// Rejects id 0, an id already taken, an empty name, and texture layers
    /// past the declared layer count.
    pub fn register(&mut self, id: u8, block_type: BlockType) -> ConfigResult<()> {
        if id == 0 {
            return Err(ConfigError::ReservedId {
                name: block_type.name,
            });
        }
        if block_type.name.trim().is_empty() {
            return Err(ConfigError::EmptyName { id });
        }
        if let Some(existing) = &self.slots[usize::from(id)] {
            return Err(ConfigError::DuplicateId {
                id,
                first: existing.name.clone(),
                second: block_type.name,
            });
        }
        if let Some(layers) = self.layers {
            if let Some(&layer) = block_type.textures.iter().find(|&&layer| layer >= layers) {
                return Err(ConfigError::TextureOutOfRange {
                    name: block_type.name,
                    layer,
                    layers,
                });
            }
        }

        self.slots[usize::from(id)] = Some(block_type);
        Ok(())
    }

    /// Block type for `id`; the fallback type if unregistered.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u8) -> &BlockType {
        self.slots[usize::from(id)].as_ref().unwrap_or(&self.fallback)
    }

    /// True if `id` was registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: u8) -> bool {
        self.slots[usize::from(id)].is_some()
    }

    /// Texture layer for `id` on `face`.
    #[inline]
    #[must_use]
    pub fn texture(&self, id: u8, face: FaceDir) -> u16 {
        self.get(id).texture(face)
    }

    /// Declared texture layer count, if any.
    #[must_use]
    pub const fn texture_layers(&self) -> Option<u16> {
        self.layers
    }

    /// Registered `(id, type)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BlockType)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|t| (id as u8, t)))
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// =============================================================================
// FILE SCHEMA
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    layers: Option<u16>,
    #[serde(default, rename = "block")]
    blocks: Vec<BlockEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockEntry {
    id: u8,
    name: String,
    texture: Option<u16>,
    top: Option<u16>,
    bottom: Option<u16>,
    side: Option<u16>,
    faces: Option<[u16; 6]>,
}

impl BlockEntry {
    /// `faces` wins outright; otherwise `texture` fills all faces and
    /// `side`/`top`/`bottom` override.
    fn resolve_textures(&self) -> ConfigResult<[u16; 6]> {
        if let Some(faces) = self.faces {
            return Ok(faces);
        }

        let mut slots = [self.texture; 6];
        if let Some(side) = self.side {
            for face in [FaceDir::PosX, FaceDir::NegX, FaceDir::PosZ, FaceDir::NegZ] {
                slots[face.index()] = Some(side);
            }
        }
        if let Some(top) = self.top {
            slots[FaceDir::PosY.index()] = Some(top);
        }
        if let Some(bottom) = self.bottom {
            slots[FaceDir::NegY.index()] = Some(bottom);
        }

        let mut textures = [0u16; 6];
        for (face, (slot, texture)) in slots.iter().zip(textures.iter_mut()).enumerate() {
            *texture = slot.ok_or_else(|| ConfigError::MissingTexture {
                name: self.name.clone(),
                face,
            })?;
        }
        Ok(textures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = BlockRegistry::builtin();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(3).name, "grass");
        assert_eq!(registry.texture(3, FaceDir::PosY), 2);
        assert_eq!(registry.texture(3, FaceDir::NegY), 1);
        assert_eq!(registry.texture(3, FaceDir::NegZ), 3);
    }

    #[test]
    fn test_unregistered_id_uses_fallback() {
        let registry = BlockRegistry::builtin();
        assert!(!registry.contains(200));
        assert_eq!(registry.get(255).name, "unknown");
        assert_eq!(registry.texture(255, FaceDir::PosX), 0);
    }

    #[test]
    fn test_reject_reserved_and_duplicate_ids() {
        let mut registry = BlockRegistry::new(None);
        assert!(matches!(
            registry.register(0, BlockType::uniform("void", 0)),
            Err(ConfigError::ReservedId { .. })
        ));

        registry.register(9, BlockType::uniform("ore", 0)).unwrap();
        let err = registry.register(9, BlockType::uniform("gem", 0)).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId { id: 9, .. }));
        assert!(err.to_string().contains("ore"));
        assert!(err.to_string().contains("gem"));
    }

    #[test]
    fn test_reject_texture_past_layer_count() {
        let mut registry = BlockRegistry::new(Some(4));
        let err = registry.register(1, BlockType::columnar("log", 4, 0, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::TextureOutOfRange { layer: 4, layers: 4, .. }));
    }

    #[test]
    fn test_parse_all_texture_forms() {
        let registry = BlockRegistry::from_toml_str(
            r#"
            layers = 8

            [[block]]
            id = 1
            name = "stone"
            texture = 0

            [[block]]
            id = 3
            name = "grass"
            texture = 3
            top = 2
            bottom = 1

            [[block]]
            id = 7
            name = "log"
            top = 6
            bottom = 6
            side = 5

            [[block]]
            id = 5
            name = "crate"
            faces = [4, 4, 5, 5, 4, 4]
            "#,
        )
        .unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(1).textures, [0; 6]);
        assert_eq!(registry.get(3).textures, [3, 3, 2, 1, 3, 3]);
        assert_eq!(registry.get(7).textures, [5, 5, 6, 6, 5, 5]);
        assert_eq!(registry.get(5).textures, [4, 4, 5, 5, 4, 4]);
        assert_eq!(registry.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_missing_face_is_reported() {
        let err = BlockRegistry::from_toml_str(
            r#"
            [[block]]
            id = 2
            name = "half"
            top = 1
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingTexture { face: 0, .. }));
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = BlockRegistry::from_toml_str("[[block]]\nid = \"one\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("<inline>"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = BlockRegistry::load("/definitely/not/here/blocks.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("blocks.toml"));
    }
}
