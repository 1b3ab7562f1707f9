//! End-to-end lighting scenarios against the reference world.
#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use common::{
    assert_matches_reference, assert_published, assert_same_light, block, light_all,
    lit_from_scratch, place, place_all, store, world,
};
use lumen_core::{
    BlockLightEngine, VoxelWorld,
    chunk::{
        chunk_light::LightStore,
        light_engine::{Direction, LightChunkGetter},
    },
};
use lumen_utils::{BlockPos, BlockStateId, ChunkPos, SectionPos};

fn lit_world(radius: i32) -> (BlockLightEngine, VoxelWorld, LightStore) {
    let world = world(radius);
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    light_all(&mut engine, &world, &mut store);
    (engine, world, store)
}

#[test]
fn test_single_source_falls_off_by_distance() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let source = BlockPos::new(8, 8, 8);
    place(&mut engine, &mut world, &mut store, source, "lantern");

    for distance in 0..=15 {
        let expected = 15 - distance as u8;
        assert_eq!(store.light_level(source.offset(distance, 0, 0)), expected);
        assert_eq!(store.light_level(source.offset(0, 0, -distance)), expected);
    }
    assert_eq!(store.light_level(BlockPos::new(12, 12, 12)), 3);
    assert_eq!(store.light_level(BlockPos::new(13, 13, 13)), 0);
    assert_matches_reference(&world, &store);
    assert_published(&world, &store);
}

#[test]
fn test_removing_sole_source_darkens_everything() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let source = BlockPos::new(8, 8, 8);
    place(&mut engine, &mut world, &mut store, source, "lantern");
    let report = place(&mut engine, &mut world, &mut store, source, "air");

    assert!(report.decreases > 0);
    assert!(!report.changed_sections.is_empty());
    assert_matches_reference(&world, &store);
    assert_eq!(store.light_level(source), 0);
    assert_eq!(store.visible_level(source.offset(3, 0, 0)), 0);
}

#[test]
fn test_full_wall_blocks_light() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let stone = block(&world, "stone");
    let wall: Vec<_> = (0..32)
        .flat_map(|y| (-16..32).map(move |z| (BlockPos::new(10, y, z), stone)))
        .collect();
    place_all(&mut engine, &mut world, &mut store, &wall);
    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 8, 8), "lantern");

    assert_eq!(store.light_level(BlockPos::new(9, 8, 8)), 14);
    assert_eq!(store.light_level(BlockPos::new(10, 8, 8)), 0);
    assert_eq!(store.light_level(BlockPos::new(11, 8, 8)), 0);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_partial_wall_lights_the_far_side_around_it() {
    let (mut engine, mut world, mut store) = lit_world(1);
    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 8, 8), "lantern");
    assert_eq!(store.light_level(BlockPos::new(11, 8, 8)), 12);

    let stone = block(&world, "stone");
    let wall: Vec<_> = (4..=12)
        .flat_map(|y| (4..=12).map(move |z| (BlockPos::new(10, y, z), stone)))
        .collect();
    place_all(&mut engine, &mut world, &mut store, &wall);

    // Shortest open path detours five blocks out and five back
    assert_eq!(store.light_level(BlockPos::new(11, 8, 8)), 2);
    assert_eq!(store.light_level(BlockPos::new(9, 8, 8)), 14);
    assert_matches_reference(&world, &store);
    assert_same_light(&world, &store, &lit_from_scratch(&world));
}

#[test]
fn test_overlapping_sources_take_the_maximum() {
    let (mut engine, mut world, mut store) = lit_world(1);
    place(&mut engine, &mut world, &mut store, BlockPos::new(0, 8, 8), "lantern");
    place(&mut engine, &mut world, &mut store, BlockPos::new(10, 8, 8), "soul_torch");

    assert_eq!(store.light_level(BlockPos::new(6, 8, 8)), 9);
    assert_eq!(store.light_level(BlockPos::new(8, 8, 8)), 8);
    assert_eq!(store.light_level(BlockPos::new(9, 8, 8)), 9);
    assert_eq!(store.light_level(BlockPos::new(10, 8, 8)), 10);
    assert_matches_reference(&world, &store);

    // Dimming the brighter source leaves the other one in charge
    place(&mut engine, &mut world, &mut store, BlockPos::new(0, 8, 8), "air");
    assert_eq!(store.light_level(BlockPos::new(6, 8, 8)), 6);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_slab_faces() {
    let (mut engine, mut world, mut store) = lit_world(1);
    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 7, 8), "bottom_slab");
    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 8, 8), "lantern");

    // Light enters through the open top but cannot leave through the bottom
    assert_eq!(store.light_level(BlockPos::new(8, 7, 8)), 14);
    assert_eq!(store.light_level(BlockPos::new(8, 6, 8)), 11);
    assert_matches_reference(&world, &store);

    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 7, 8), "top_slab");
    assert_eq!(store.light_level(BlockPos::new(8, 7, 8)), 12);
    assert_eq!(store.light_level(BlockPos::new(8, 6, 8)), 11);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_translucent_blocks_attenuate() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let water = block(&world, "water");
    let pool: Vec<_> = (0..=6)
        .flat_map(|x| (0..=6).map(move |z| (BlockPos::new(x, 4, z), water)))
        .collect();
    place_all(&mut engine, &mut world, &mut store, &pool);
    place(&mut engine, &mut world, &mut store, BlockPos::new(3, 5, 3), "torch");

    assert_eq!(store.light_level(BlockPos::new(3, 4, 3)), 12);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_opaque_emitter_lights_its_surroundings() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let center = BlockPos::new(4, 4, 4);
    place(&mut engine, &mut world, &mut store, center, "glowstone");
    assert_eq!(store.light_level(center), 15);
    assert_eq!(store.light_level(BlockPos::new(4, 3, 4)), 14);
    assert_eq!(store.light_level(BlockPos::new(3, 4, 3)), 13);

    // Burying it keeps its own level but lets nothing out
    let stone = block(&world, "stone");
    let shell: Vec<_> = Direction::ALL
        .into_iter()
        .map(|dir| (dir.relative(center), stone))
        .collect();
    place_all(&mut engine, &mut world, &mut store, &shell);
    assert_eq!(store.light_level(center), 15);
    assert_eq!(store.light_level(BlockPos::new(6, 4, 4)), 0);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_light_crosses_chunk_seams() {
    let (mut engine, mut world, mut store) = lit_world(1);
    place(&mut engine, &mut world, &mut store, BlockPos::new(15, 8, 15), "lantern");

    assert_eq!(store.light_level(BlockPos::new(16, 8, 15)), 14);
    assert_eq!(store.light_level(BlockPos::new(16, 8, 16)), 13);
    assert_eq!(store.light_level(BlockPos::new(20, 8, 20)), 5);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_late_neighbour_is_reconciled_by_edge_checks() {
    let mut world = world(0);
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    let torch = block(&world, "torch");
    world.set_block(BlockPos::new(15, 8, 8), torch).unwrap();
    engine.light_chunk(&world, &mut store, ChunkPos::new(0, 0), true);
    assert_eq!(store.light_level(BlockPos::new(15, 8, 8)), 14);

    // The neighbour arrives with a torch of its own right at the seam
    let east = ChunkPos::new(1, 0);
    world.load_chunk(east);
    world.set_block(BlockPos::new(16, 20, 3), torch).unwrap();
    engine.light_chunk(&world, &mut store, east, true);

    assert_eq!(store.light_level(BlockPos::new(16, 8, 8)), 13);
    assert_eq!(store.light_level(BlockPos::new(15, 20, 3)), 13);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_neighbour_levels_are_pulled_in_without_edge_checks() {
    let mut world = world(0);
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    world
        .set_block(BlockPos::new(15, 8, 8), block(&world, "lantern"))
        .unwrap();
    engine.light_chunk(&world, &mut store, ChunkPos::new(0, 0), false);

    let east = ChunkPos::new(1, 0);
    world.load_chunk(east);
    engine.light_chunk(&world, &mut store, east, false);
    assert_eq!(store.light_level(BlockPos::new(16, 8, 8)), 14);
    assert_eq!(store.light_level(BlockPos::new(18, 9, 8)), 11);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_check_chunk_edges_after_independent_lighting() {
    let mut world = world(0).with_authoritative(true);
    let west = ChunkPos::new(0, 0);
    let east = ChunkPos::new(1, 0);
    world.load_chunk(east);
    world
        .set_block(BlockPos::new(16, 8, 8), block(&world, "lantern"))
        .unwrap();

    // Neither chunk is light-correct yet, so neither run may touch the other
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    engine.light_chunk(&world, &mut store, west, false);
    engine.light_chunk(&world, &mut store, east, false);
    assert_eq!(store.light_level(BlockPos::new(15, 8, 8)), 0);

    world.mark_light_correct(west).unwrap();
    world.mark_light_correct(east).unwrap();
    let report = engine.check_chunk_edges(&world, &mut store, west);
    assert!(!report.changed_sections.is_empty());
    assert_eq!(store.light_level(BlockPos::new(15, 8, 8)), 14);
    assert_eq!(store.visible_level(BlockPos::new(10, 8, 8)), 9);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_edits_in_unusable_chunks_are_skipped() {
    let mut world = world(0).with_authoritative(true);
    let mut engine = BlockLightEngine::new();
    let mut store = store();
    let chunk = ChunkPos::new(0, 0);
    engine.light_chunk(&world, &mut store, chunk, true);

    let pos = BlockPos::new(4, 4, 4);
    world.set_block(pos, block(&world, "torch")).unwrap();
    let report = engine.propagate_block_changes(&world, &mut store, [pos]);
    assert_eq!(report.increases, 0);
    assert_eq!(store.light_level(pos), 0);

    world.mark_light_correct(chunk).unwrap();
    engine.propagate_block_changes(&world, &mut store, [pos]);
    assert_eq!(store.light_level(pos), 14);
}

#[test]
fn test_sections_hide_and_unhide_with_geometry() {
    let (mut engine, mut world, mut store) = lit_world(1);
    let torch_pos = BlockPos::new(8, 14, 8);
    place(&mut engine, &mut world, &mut store, torch_pos, "torch");
    let above = BlockPos::new(8, 20, 8);
    assert_eq!(store.visible_level(above), 8);

    // Emptiness flips are reported before the edit itself is propagated
    let air = BlockStateId(0);
    let change = world.set_block(torch_pos, air).unwrap();
    assert_eq!(change.section_emptiness, Some(true));
    let hidden = engine.sections_changed(&world, &mut store, &[(torch_pos.section_pos(), true)]);
    assert!(hidden.changed_sections.contains(&SectionPos::new(0, 1, 0)));

    let chunk = store.chunk(ChunkPos::new(0, 0)).unwrap();
    assert!(chunk.section(0).unwrap().is_hidden());
    assert!(chunk.section(1).unwrap().is_hidden());
    assert_eq!(store.visible_level(above), 0);
    // The updater still sees the stale light until the decrease runs
    assert_eq!(store.light_level(above), 8);

    engine.propagate_block_changes(&world, &mut store, [torch_pos]);
    assert_eq!(store.light_level(above), 0);
    assert_matches_reference(&world, &store);

    place(&mut engine, &mut world, &mut store, torch_pos, "torch");
    let chunk = store.chunk(ChunkPos::new(0, 0)).unwrap();
    assert!(chunk.section(1).unwrap().is_present());
    assert_eq!(store.visible_level(above), 8);
    assert_published(&world, &store);
}

#[test]
fn test_unreported_emptiness_flip_is_picked_up() {
    let (mut engine, mut world, mut store) = lit_world(0);
    let pos = BlockPos::new(5, 5, 5);
    world.set_block(pos, block(&world, "lantern")).unwrap();
    engine.propagate_block_changes(&world, &mut store, [pos]);

    assert!(!store.chunk(ChunkPos::new(0, 0)).unwrap().emptiness_map().is_empty(0));
    assert_eq!(store.light_level(pos), 15);
    assert_matches_reference(&world, &store);
}

#[test]
fn test_relight_matches_incremental_result() {
    let (mut engine, mut world, mut store) = lit_world(1);
    place(&mut engine, &mut world, &mut store, BlockPos::new(-3, 3, 12), "lantern");
    place(&mut engine, &mut world, &mut store, BlockPos::new(20, 17, -5), "torch");
    place(&mut engine, &mut world, &mut store, BlockPos::new(0, 3, 12), "stone");
    let before = lit_from_scratch(&world);
    assert_same_light(&world, &store, &before);

    let reader = store.reader(SectionPos::new(-1, 0, 0)).unwrap();
    let chunks: Vec<_> = world.loaded_chunks().collect();
    let report = engine.relight_chunks(&world, &mut store, &chunks);
    assert_eq!(report.lit_chunks.len(), 9);
    assert_same_light(&world, &store, &before);
    assert_eq!(reader.get(13, 3, 12), 15);
    assert_published(&world, &store);
}

#[test]
fn test_out_of_world_padding_holds_light() {
    let (mut engine, mut world, mut store) = lit_world(0);
    place(&mut engine, &mut world, &mut store, BlockPos::new(8, 1, 8), "lantern");
    assert_eq!(store.light_level(BlockPos::new(8, -1, 8)), 13);
    assert_eq!(world.min_section(), 0);
    assert_matches_reference(&world, &store);
}
