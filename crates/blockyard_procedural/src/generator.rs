//! # Terrain Generator
//!
//! Fills one chunk's voxel buffer from noise in three passes:
//!
//! 1. **Base**: solid below a 2D octaved height field, perturbed by 3D
//!    noise so hills grow overhangs. Near-surface voxels get the top and
//!    filler ids, everything deeper gets the base id.
//! 2. **Caves**: 3D noise plus a depth bias; solid voxels above the
//!    threshold are carved back to air. Deeper rock is hollowed more.
//! 3. **Surface**: optional. Forces a noisy ground-cover layer from local
//!    `y = 0` upward. Only the caller knows which chunks want it.
//!
//! Every pass is a pure function of world coordinates, so two chunks that
//! share a face agree on every voxel near it and chunk order never matters.
//!
//! ## Buffer Layout
//!
//! Voxels are block ids (`0` = air) in a flat `size³` buffer indexed
//! `(x * size + y) * size + z`; see [`voxel_index`].

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::noise::{SimplexNoise, WorldSeed};

/// Block ids the generator writes. `0` is air and is never a valid choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPalette {
    /// Deep rock.
    pub base: u8,
    /// Layer just under the top.
    pub filler: u8,
    /// Topmost solid layer.
    pub top: u8,
    /// Surface pass fill.
    pub ground_cover: u8,
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self {
            base: 1,
            filler: 2,
            top: 3,
            ground_cover: 4,
        }
    }
}

impl BlockPalette {
    /// All ids in pass order, for validation.
    #[must_use]
    pub const fn ids(&self) -> [u8; 4] {
        [self.base, self.filler, self.top, self.ground_cover]
    }
}

/// Tunable generation parameters.
///
/// Frequencies are in cycles per block; heights and depths are in blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// World `y` the height field oscillates around.
    pub surface_level: f64,
    /// Peak deviation of the height field from `surface_level`.
    pub hill_amplitude: f64,
    /// Horizontal frequency of the height field.
    pub hill_frequency: f64,
    /// Octaves of the height field.
    pub octaves: u32,
    /// Amplitude decay per octave.
    pub persistence: f64,
    /// Frequency growth per octave.
    pub lacunarity: f64,
    /// Frequency of the 3D overhang perturbation.
    pub overhang_frequency: f64,
    /// Peak overhang displacement.
    pub overhang_strength: f64,
    /// Octaves of the overhang perturbation. Shares the height field's
    /// persistence and lacunarity.
    pub overhang_octaves: u32,
    /// Number of `top` layers.
    pub top_depth: u32,
    /// Number of `filler` layers under the top.
    pub filler_depth: u32,
    /// Frequency of the cave noise.
    pub cave_frequency: f64,
    /// Carve where noise plus bias exceeds this.
    pub cave_threshold: f64,
    /// Bias added per block of depth below the height field.
    pub cave_depth_bias: f64,
    /// Cap on the accumulated depth bias.
    pub cave_bias_limit: f64,
    /// Horizontal frequency of the surface pass.
    pub surface_frequency: f64,
    /// Maximum ground-cover thickness above the one guaranteed layer.
    pub surface_amplitude: f64,
    /// Block ids.
    pub palette: BlockPalette,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            surface_level: 18.0,
            hill_amplitude: 8.0,
            hill_frequency: 0.012,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            overhang_frequency: 0.045,
            overhang_strength: 5.0,
            overhang_octaves: 2,
            top_depth: 1,
            filler_depth: 3,
            cave_frequency: 0.07,
            cave_threshold: 0.62,
            cave_depth_bias: 0.012,
            cave_bias_limit: 0.25,
            surface_frequency: 0.05,
            surface_amplitude: 2.0,
            palette: BlockPalette::default(),
        }
    }
}

/// Voxel counts produced by one [`TerrainGenerator::generate_chunk`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Non-air voxels after all passes.
    pub solid: usize,
    /// Voxels removed by the cave pass.
    pub carved: usize,
    /// Voxels written by the surface pass.
    pub sealed: usize,
}

impl std::ops::AddAssign for GenerationStats {
    fn add_assign(&mut self, rhs: Self) {
        self.solid += rhs.solid;
        self.carved += rhs.carved;
        self.sealed += rhs.sealed;
    }
}

/// Flat index of local voxel `(x, y, z)` in a `size³` buffer.
#[inline]
#[must_use]
pub const fn voxel_index(size: usize, x: usize, y: usize, z: usize) -> usize {
    (x * size + y) * size + z
}

/// Deterministic terrain generator.
///
/// Holds one noise field per pass, each from its own derived seed.
#[derive(Clone)]
pub struct TerrainGenerator {
    params: GenerationParams,
    height_noise: SimplexNoise,
    overhang_noise: SimplexNoise,
    cave_noise: SimplexNoise,
    surface_noise: SimplexNoise,
}

impl TerrainGenerator {
    /// Creates a generator for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, params: GenerationParams) -> Self {
        Self {
            params,
            height_noise: SimplexNoise::new(seed.derive(100)),
            overhang_noise: SimplexNoise::new(seed.derive(101)),
            cave_noise: SimplexNoise::new(seed.derive(102)),
            surface_noise: SimplexNoise::new(seed.derive(103)),
        }
    }

    /// The parameters this generator was built with.
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Height field value for world column `(x, z)`.
    #[must_use]
    pub fn surface_height(&self, x: i32, z: i32) -> f64 {
        let p = &self.params;
        let n = self.height_noise.octaved(
            f64::from(x) * p.hill_frequency,
            f64::from(z) * p.hill_frequency,
            p.octaves,
            p.persistence,
            p.lacunarity,
        );
        p.surface_level + n * p.hill_amplitude
    }

    /// Fills `voxels` for the chunk whose minimum corner is at world `origin`.
    ///
    /// `seal_surface` enables the surface pass.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `voxels.len() != size³`.
    pub fn generate_chunk(
        &self,
        origin: IVec3,
        size: usize,
        seal_surface: bool,
        voxels: &mut [u8],
    ) -> GenerationStats {
        debug_assert_eq!(voxels.len(), size * size * size, "voxel buffer does not match size");

        let heights: Vec<f64> = (0..size * size)
            .map(|column| {
                let (x, z) = (column / size, column % size);
                self.surface_height(origin.x + x as i32, origin.z + z as i32)
            })
            .collect();

        self.base_pass(origin, size, &heights, voxels);
        let carved = self.cave_pass(origin, size, &heights, voxels);
        let sealed = if seal_surface {
            self.surface_pass(origin, size, voxels)
        } else {
            0
        };

        GenerationStats {
            solid: voxels.iter().filter(|&&id| id != 0).count(),
            carved,
            sealed,
        }
    }

    // =========================================================================
    // PASSES
    // =========================================================================

    fn base_pass(&self, origin: IVec3, size: usize, heights: &[f64], voxels: &mut [u8]) {
        let p = &self.params;
        let top_end = i64::from(p.top_depth);
        let filler_end = top_end + i64::from(p.filler_depth);

        for x in 0..size {
            let wx = origin.x + x as i32;
            for z in 0..size {
                let wz = origin.z + z as i32;
                let height = heights[x * size + z];
                for y in 0..size {
                    let wy = origin.y + y as i32;
                    let overhang = self.overhang_noise.octaved3(
                        f64::from(wx) * p.overhang_frequency,
                        f64::from(wy) * p.overhang_frequency,
                        f64::from(wz) * p.overhang_frequency,
                        p.overhang_octaves,
                        p.persistence,
                        p.lacunarity,
                    );
                    let density = height - f64::from(wy) + overhang * p.overhang_strength;

                    voxels[voxel_index(size, x, y, z)] = if density > 0.0 {
                        let depth = height.floor() as i64 - i64::from(wy);
                        if depth < top_end {
                            p.palette.top
                        } else if depth < filler_end {
                            p.palette.filler
                        } else {
                            p.palette.base
                        }
                    } else {
                        0
                    };
                }
            }
        }
    }

    fn cave_pass(&self, origin: IVec3, size: usize, heights: &[f64], voxels: &mut [u8]) -> usize {
        let p = &self.params;
        let mut carved = 0;

        for x in 0..size {
            let wx = origin.x + x as i32;
            for z in 0..size {
                let wz = origin.z + z as i32;
                let height = heights[x * size + z];
                for y in 0..size {
                    let index = voxel_index(size, x, y, z);
                    if voxels[index] == 0 {
                        continue;
                    }
                    let wy = origin.y + y as i32;
                    let depth = (height - f64::from(wy)).max(0.0);
                    let bias = (depth * p.cave_depth_bias).min(p.cave_bias_limit);
                    let value = self.cave_noise.sample3(
                        f64::from(wx) * p.cave_frequency,
                        f64::from(wy) * p.cave_frequency,
                        f64::from(wz) * p.cave_frequency,
                    ) + bias;

                    if value > p.cave_threshold {
                        voxels[index] = 0;
                        carved += 1;
                    }
                }
            }
        }

        carved
    }

    fn surface_pass(&self, origin: IVec3, size: usize, voxels: &mut [u8]) -> usize {
        let p = &self.params;
        let mut sealed = 0;

        for x in 0..size {
            let wx = origin.x + x as i32;
            for z in 0..size {
                let wz = origin.z + z as i32;
                let n = self.surface_noise.sample(
                    f64::from(wx) * p.surface_frequency,
                    f64::from(wz) * p.surface_frequency,
                );
                let extra = ((n + 1.0) * 0.5 * p.surface_amplitude).max(0.0) as usize;
                let height = (1 + extra).min(size);

                for y in 0..height {
                    voxels[voxel_index(size, x, y, z)] = p.palette.ground_cover;
                    sealed += 1;
                }
            }
        }

        sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64, origin: IVec3, size: usize, seal: bool) -> (Vec<u8>, GenerationStats) {
        let generator = TerrainGenerator::new(WorldSeed::new(seed), GenerationParams::default());
        let mut voxels = vec![0u8; size * size * size];
        let stats = generator.generate_chunk(origin, size, seal, &mut voxels);
        (voxels, stats)
    }

    #[test]
    fn test_voxel_index_layout() {
        assert_eq!(voxel_index(4, 0, 0, 0), 0);
        assert_eq!(voxel_index(4, 0, 0, 1), 1);
        assert_eq!(voxel_index(4, 0, 1, 0), 4);
        assert_eq!(voxel_index(4, 1, 0, 0), 16);
        assert_eq!(voxel_index(4, 3, 3, 3), 63);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (a, stats_a) = generate(42, IVec3::new(16, 0, -16), 16, true);
        let (b, stats_b) = generate(42, IVec3::new(16, 0, -16), 16, true);
        assert_eq!(a, b);
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (a, _) = generate(1, IVec3::ZERO, 16, false);
        let (b, _) = generate(2, IVec3::ZERO, 16, false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_size_does_not_change_world() {
        // A 16³ chunk and the 8³ chunk at its corner must agree voxel for voxel.
        let (big, _) = generate(7, IVec3::new(-16, 8, 32), 16, false);
        let (small, _) = generate(7, IVec3::new(-16, 8, 32), 8, false);

        for x in 0..8 {
            for y in 0..8 {
                for z in 0..8 {
                    assert_eq!(
                        big[voxel_index(16, x, y, z)],
                        small[voxel_index(8, x, y, z)],
                        "mismatch at ({x}, {y}, {z})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_surface_pass_seals_bottom_layer() {
        let palette = BlockPalette::default();
        let (voxels, stats) = generate(42, IVec3::ZERO, 16, true);

        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(voxels[voxel_index(16, x, 0, z)], palette.ground_cover);
            }
        }
        assert!(stats.sealed >= 16 * 16);
    }

    #[test]
    fn test_unsealed_chunk_has_no_forced_layer() {
        let (_, stats) = generate(42, IVec3::ZERO, 16, false);
        assert_eq!(stats.sealed, 0);
    }

    #[test]
    fn test_sky_is_empty_and_depths_are_solid() {
        // Far above any hill nothing survives; far below only caves remove rock.
        let (sky, sky_stats) = generate(42, IVec3::new(0, 256, 0), 16, false);
        assert!(sky.iter().all(|&id| id == 0));
        assert_eq!(sky_stats.solid, 0);

        let (_, deep) = generate(42, IVec3::new(0, -256, 0), 16, false);
        assert_eq!(deep.solid + deep.carved, 16 * 16 * 16);
    }

    #[test]
    fn test_cave_threshold_controls_carving() {
        let origin = IVec3::new(0, -64, 0);
        let mut voxels = vec![0u8; 16 * 16 * 16];

        let never = GenerationParams { cave_threshold: 2.0, ..GenerationParams::default() };
        let stats = TerrainGenerator::new(WorldSeed::new(3), never).generate_chunk(origin, 16, false, &mut voxels);
        assert_eq!(stats.carved, 0);

        let always = GenerationParams { cave_threshold: -2.0, ..GenerationParams::default() };
        let stats = TerrainGenerator::new(WorldSeed::new(3), always).generate_chunk(origin, 16, false, &mut voxels);
        assert_eq!(stats.solid, 0);
        assert_eq!(stats.carved, 16 * 16 * 16);
    }

    #[test]
    fn test_overhang_octaves_shape_voxels_not_heights() {
        let generate_with = |overhang_octaves| {
            let params = GenerationParams { overhang_octaves, cave_threshold: 2.0, ..GenerationParams::default() };
            let generator = TerrainGenerator::new(WorldSeed::new(5), params);
            let mut voxels = vec![0u8; 32 * 32 * 32];
            generator.generate_chunk(IVec3::ZERO, 32, false, &mut voxels);
            (generator.surface_height(7, -3), voxels)
        };

        let (height_one, smooth) = generate_with(1);
        let (height_four, rough) = generate_with(4);
        assert!((height_one - height_four).abs() < f64::EPSILON);
        assert_ne!(smooth, rough);
    }

    #[test]
    fn test_layers_follow_palette() {
        let params = GenerationParams {
            overhang_strength: 0.0,
            cave_threshold: 2.0,
            ..GenerationParams::default()
        };
        let generator = TerrainGenerator::new(WorldSeed::new(11), params.clone());
        let mut voxels = vec![0u8; 32 * 32 * 32];
        generator.generate_chunk(IVec3::ZERO, 32, false, &mut voxels);

        // With no overhangs each column is solid, then top, then air.
        for x in 0..32 {
            for z in 0..32 {
                let top = (0..32).rev().find(|&y| voxels[voxel_index(32, x, y, z)] != 0);
                if let Some(y) = top {
                    assert_eq!(voxels[voxel_index(32, x, y, z)], params.palette.top);
                }
                if let Some(y) = top.filter(|&y| y >= 4) {
                    assert_eq!(voxels[voxel_index(32, x, y - 4, z)], params.palette.base);
                }
            }
        }
    }

    #[test]
    fn test_params_from_partial_toml() {
        let params: GenerationParams = toml::from_str(
            r"
            hill_amplitude = 3.5
            [palette]
            top = 9
            ",
        )
        .unwrap();

        assert!((params.hill_amplitude - 3.5).abs() < f64::EPSILON);
        assert_eq!(params.palette.top, 9);
        assert_eq!(params.palette.base, BlockPalette::default().base);
        assert_eq!(params.octaves, GenerationParams::default().octaves);
    }
}
