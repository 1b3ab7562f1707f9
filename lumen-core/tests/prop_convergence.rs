//! Incremental updates must land on the same light field as lighting from scratch.
#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use common::{
    assert_matches_reference, assert_same_light, light_all, light_positions, lit_from_scratch,
    place_all, store,
};
use lumen_core::{
    BlockLightEngine, VoxelWorld,
    chunk::{
        light_engine::{Direction, LightChunkGetter},
        material::MaterialSample,
    },
};
use lumen_utils::{BlockPos, BlockStateId, ChunkPos};
use proptest::prelude::*;

/// Two chunks side by side, so every run crosses a seam.
fn two_chunk_world() -> VoxelWorld {
    let mut world = common::world(0);
    world.load_chunk(ChunkPos::new(1, 0));
    world
}

/// Edits biased towards air and light sources, clustered so they interact.
fn edit() -> impl Strategy<Value = (BlockPos, BlockStateId)> {
    let pos = (10..22i32, 0..20i32, 2..14i32).prop_map(|(x, y, z)| BlockPos::new(x, y, z));
    let id = prop_oneof![
        3 => Just(0u16),
        2 => Just(1u16),
        1 => 2u16..10,
        2 => prop::sample::select(vec![4u16, 5, 6, 7]),
    ]
    .prop_map(BlockStateId);
    (pos, id)
}

fn batches() -> impl Strategy<Value = Vec<Vec<(BlockPos, BlockStateId)>>> {
    prop::collection::vec(prop::collection::vec(edit(), 1..6), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn incremental_matches_scratch(batches in batches()) {
        let mut world = two_chunk_world();
        let mut engine = BlockLightEngine::new();
        let mut store = store();
        light_all(&mut engine, &world, &mut store);

        for batch in &batches {
            place_all(&mut engine, &mut world, &mut store, batch);
        }

        assert_same_light(&world, &store, &lit_from_scratch(&world));
        assert_matches_reference(&world, &store);
    }

    #[test]
    fn levels_stay_bounded_and_smooth(batches in batches()) {
        let mut world = two_chunk_world();
        let mut engine = BlockLightEngine::new();
        let mut store = store();
        light_all(&mut engine, &world, &mut store);
        for batch in &batches {
            place_all(&mut engine, &mut world, &mut store, batch);
        }

        for pos in light_positions(&world, &store) {
            let level = store.light_level(pos);
            prop_assert!(level <= 15);
            if world.material(pos) != Some(MaterialSample::AIR) {
                continue;
            }
            for dir in [Direction::Up, Direction::South, Direction::East] {
                let next = dir.relative(pos);
                if world.material(next) != Some(MaterialSample::AIR) {
                    continue;
                }
                let Some(chunk) = store.chunk(next.chunk_pos()) else {
                    continue;
                };
                let Some(other) = chunk.light(next) else {
                    continue;
                };
                prop_assert!(
                    level.abs_diff(other) <= 1,
                    "{} holds {} but its neighbour {} holds {}",
                    pos, level, next, other
                );
            }
        }
    }

    #[test]
    fn edit_order_does_not_matter(edits in prop::collection::vec(edit(), 1..24)) {
        let mut forward_world = two_chunk_world();
        let mut forward_engine = BlockLightEngine::new();
        let mut forward = store();
        light_all(&mut forward_engine, &forward_world, &mut forward);
        for edit in &edits {
            place_all(&mut forward_engine, &mut forward_world, &mut forward, &[*edit]);
        }

        // Same final geometry: keep only the last edit per position, applied in reverse
        let mut last = Vec::new();
        for edit in edits.iter().rev() {
            if !last.iter().any(|(pos, _)| *pos == edit.0) {
                last.push(*edit);
            }
        }
        let mut backward_world = two_chunk_world();
        let mut backward_engine = BlockLightEngine::new();
        let mut backward = store();
        light_all(&mut backward_engine, &backward_world, &mut backward);
        for edit in &last {
            place_all(&mut backward_engine, &mut backward_world, &mut backward, &[*edit]);
        }

        assert_same_light(&forward_world, &forward, &backward);
    }
}
