//! Shared helpers for the integration tests: world setup and a reference solver.
#![allow(dead_code, clippy::unwrap_used, missing_docs)]

use std::{collections::VecDeque, sync::Arc};

use lumen_core::{
    BlockLight, BlockLightEngine, LightUpdateReport, VoxelWorld,
    chunk::{
        chunk_light::LightStore,
        light_engine::{Direction, LightChannel, LightChunkGetter},
    },
    world::BlockRegistry,
};
use lumen_utils::{BlockPos, BlockStateId, ChunkPos};
use rustc_hash::FxHashMap;

pub const MIN_SECTION: i32 = 0;
pub const MAX_SECTION: i32 = 1;

/// A world with every chunk within `radius` of the origin loaded.
pub fn world(radius: i32) -> VoxelWorld {
    let mut world = VoxelWorld::new(Arc::new(BlockRegistry::default()), MIN_SECTION, MAX_SECTION);
    for x in -radius..=radius {
        for z in -radius..=radius {
            world.load_chunk(ChunkPos::new(x, z));
        }
    }
    world
}

pub fn store() -> LightStore {
    LightStore::for_channel::<BlockLight>(MIN_SECTION, MAX_SECTION)
}

pub fn block(world: &VoxelWorld, name: &str) -> BlockStateId {
    world.registry().get_by_name(name).unwrap()
}

/// Sorted so runs are reproducible.
pub fn loaded_chunks(world: &VoxelWorld) -> Vec<ChunkPos> {
    let mut chunks: Vec<_> = world.loaded_chunks().collect();
    chunks.sort_by_key(|chunk| (chunk.x(), chunk.z()));
    chunks
}

/// Lights every loaded chunk from scratch, with edge checks.
pub fn light_all(engine: &mut BlockLightEngine, world: &VoxelWorld, store: &mut LightStore) {
    for chunk in loaded_chunks(world) {
        engine.light_chunk(world, store, chunk, true);
    }
}

/// A freshly lit copy of the world's light.
pub fn lit_from_scratch(world: &VoxelWorld) -> LightStore {
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    light_all(&mut engine, &world.clone_geometry(), &mut store);
    store
}

/// Places a block and tells the engine about it, section flip included.
pub fn place(
    engine: &mut BlockLightEngine,
    world: &mut VoxelWorld,
    store: &mut LightStore,
    pos: BlockPos,
    name: &str,
) -> LightUpdateReport {
    let id = block(world, name);
    place_all(engine, world, store, &[(pos, id)])
}

/// Applies a batch of placements as one engine update.
pub fn place_all(
    engine: &mut BlockLightEngine,
    world: &mut VoxelWorld,
    store: &mut LightStore,
    edits: &[(BlockPos, BlockStateId)],
) -> LightUpdateReport {
    let mut flips = Vec::new();
    let mut positions = Vec::new();
    for (pos, id) in edits {
        let change = world.set_block(*pos, *id).unwrap();
        if let Some(now_empty) = change.section_emptiness {
            flips.push((pos.section_pos(), now_empty));
        }
        positions.push(*pos);
    }
    let mut report = engine.sections_changed(world, store, &flips);
    report.merge(engine.propagate_block_changes(world, store, positions));
    report
}

/// Every voxel position that can hold light in the loaded chunks.
pub fn light_positions(world: &VoxelWorld, store: &LightStore) -> Vec<BlockPos> {
    let min_y = store.min_light_section() * 16;
    let max_y = store.max_light_section() * 16 + 15;
    let mut positions = Vec::new();
    for chunk in loaded_chunks(world) {
        for y in min_y..=max_y {
            for z in 0..16 {
                for x in 0..16 {
                    positions.push(BlockPos::new(
                        chunk.min_block_x() + x,
                        y,
                        chunk.min_block_z() + z,
                    ));
                }
            }
        }
    }
    positions
}

/// The light field as the least fixpoint of "a voxel holds at least its emission, and
/// at least what each open neighbour hands it", found by relaxing until nothing changes.
pub fn reference_light(world: &VoxelWorld, store: &LightStore) -> FxHashMap<BlockPos, u8> {
    let min_y = store.min_light_section() * 16;
    let max_y = store.max_light_section() * 16 + 15;
    let inside = |pos: BlockPos| {
        (min_y..=max_y).contains(&pos.y()) && world.is_loaded(pos.chunk_pos())
    };

    let mut levels = FxHashMap::default();
    let mut queue = VecDeque::new();
    for pos in light_positions(world, store) {
        let emitted = world
            .material(pos)
            .map_or(0, BlockLight::emitted_level);
        if emitted > 0 {
            levels.insert(pos, emitted);
            queue.push_back(pos);
        }
    }

    while let Some(pos) = queue.pop_front() {
        let level = levels.get(&pos).copied().unwrap_or(0);
        let from = world.material(pos).unwrap();
        for dir in Direction::ALL {
            let neighbour = dir.relative(pos);
            if !inside(neighbour) || from.occludes_face(dir) {
                continue;
            }
            let to = world.material(neighbour).unwrap();
            if to.occludes_face(dir.opposite()) {
                continue;
            }
            let target = level.saturating_sub(to.attenuation());
            if target > levels.get(&neighbour).copied().unwrap_or(0) {
                levels.insert(neighbour, target);
                queue.push_back(neighbour);
            }
        }
    }
    levels
}

fn report_mismatches(mismatches: &[(BlockPos, u8, u8)], what: &str) {
    if mismatches.is_empty() {
        return;
    }
    let shown: Vec<_> = mismatches
        .iter()
        .take(8)
        .map(|(pos, got, want)| format!("{pos}: got {got}, want {want}"))
        .collect();
    panic!(
        "{} voxels differ from {what}:\n{}",
        mismatches.len(),
        shown.join("\n")
    );
}

/// Panics with the first differences between the stored light and the reference.
pub fn assert_matches_reference(world: &VoxelWorld, store: &LightStore) {
    let reference = reference_light(world, store);
    let mismatches: Vec<_> = light_positions(world, store)
        .into_iter()
        .filter_map(|pos| {
            let got = store.light_level(pos);
            let want = reference.get(&pos).copied().unwrap_or(0);
            (got != want).then_some((pos, got, want))
        })
        .collect();
    report_mismatches(&mismatches, "the reference solution");
}

/// Panics with the first differences between two stores over the loaded chunks.
pub fn assert_same_light(world: &VoxelWorld, got: &LightStore, want: &LightStore) {
    let mismatches: Vec<_> = light_positions(world, got)
        .into_iter()
        .filter_map(|pos| {
            let (a, b) = (got.light_level(pos), want.light_level(pos));
            (a != b).then_some((pos, a, b))
        })
        .collect();
    report_mismatches(&mismatches, "a from-scratch relight");
}

/// Panics unless every published level matches the updater's.
pub fn assert_published(world: &VoxelWorld, store: &LightStore) {
    for pos in light_positions(world, store) {
        assert_eq!(
            store.visible_level(pos),
            store.light_level(pos),
            "unpublished light at {pos}"
        );
    }
}
