//! # Terrain Quality Tests
//!
//! Verifies the generated world looks like terrain: rolling hills that are
//! neither flat nor noise, caves underground, and a sealed floor.

use blockyard_procedural::{voxel_index, GenerationParams, TerrainGenerator, WorldSeed};
use glam::IVec3;

/// Test: Height field varies but stays within its amplitude.
#[test]
fn test_hills_are_bounded_and_varied() {
    let params = GenerationParams::default();
    let generator = TerrainGenerator::new(WorldSeed::new(42), params.clone());

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for z in (-400..400).step_by(8) {
        for x in (-400..400).step_by(8) {
            let h = generator.surface_height(x, z);
            min = min.min(h);
            max = max.max(h);
        }
    }

    println!("Surface height range: [{min:.1}, {max:.1}]");
    assert!(min >= params.surface_level - params.hill_amplitude);
    assert!(max <= params.surface_level + params.hill_amplitude);
    assert!(max - min > params.hill_amplitude * 0.5, "Terrain is too flat: {:.1}", max - min);
}

/// Test: Neighbouring columns rarely jump by more than a few blocks.
#[test]
fn test_hills_are_smooth() {
    let generator = TerrainGenerator::new(WorldSeed::new(42), GenerationParams::default());

    let mut steep = 0;
    let mut total = 0;
    for z in -100..100 {
        for x in -100..100 {
            let a = generator.surface_height(x, z);
            let b = generator.surface_height(x + 1, z);
            if (a - b).abs() > 2.0 {
                steep += 1;
            }
            total += 1;
        }
    }

    let steep_percentage = f64::from(steep) / f64::from(total) * 100.0;
    println!("Steep steps: {steep_percentage:.2}%");
    assert!(steep_percentage < 1.0, "Too many cliffs: {steep_percentage:.2}%");
}

/// Test: Caves exist underground and get more common with depth.
#[test]
fn test_caves_deepen() {
    let generator = TerrainGenerator::new(WorldSeed::new(42), GenerationParams::default());
    let size = 16;
    let mut voxels = vec![0u8; size * size * size];

    let carved_ratio = |y: i32, voxels: &mut Vec<u8>| {
        let mut carved = 0;
        let mut rock = 0;
        for cx in 0..6 {
            for cz in 0..6 {
                let origin = IVec3::new(cx * 16, y, cz * 16);
                let stats = generator.generate_chunk(origin, size, false, voxels);
                carved += stats.carved;
                rock += stats.carved + stats.solid;
            }
        }
        carved as f64 / rock.max(1) as f64
    };

    let shallow = carved_ratio(0, &mut voxels);
    let deep = carved_ratio(-160, &mut voxels);

    println!("Carved ratio: shallow={shallow:.3} deep={deep:.3}");
    assert!(deep > 0.0, "No caves underground");
    assert!(deep > shallow, "Caves should not thin out with depth");
}

/// Test: A sealed chunk never has a hole in its floor.
#[test]
fn test_sealed_floor_has_no_holes() {
    let params = GenerationParams::default();
    let generator = TerrainGenerator::new(WorldSeed::new(99), params.clone());
    let size = 16;
    let mut voxels = vec![0u8; size * size * size];

    for cx in -2..2 {
        for cz in -2..2 {
            generator.generate_chunk(IVec3::new(cx * 16, 0, cz * 16), size, true, &mut voxels);
            for x in 0..size {
                for z in 0..size {
                    assert_eq!(voxels[voxel_index(size, x, 0, z)], params.palette.ground_cover);
                }
            }
        }
    }
}
