//! The soak run: a generated world, lit once and then edited tick after tick through a
//! [`LightInterface`], while another thread reads the published light.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::{Context, bail};
use lumen_core::{
    BlockLight, BlockLightEngine, LightInterface, LightUpdateReport, VoxelWorld,
    chunk::{chunk_light::LightStore, light_storage::SectionLightReader},
    world::BlockRegistry,
};
use lumen_utils::{BlockPos, BlockStateId, ChunkPos, SectionPos};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info_span;

use crate::config::LumenConfig;

/// Share of edits that clear a voxel instead of placing a block.
const AIR_EDIT_CHANCE: f64 = 0.4;

/// What a soak run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoakSummary {
    /// Chunks in the world.
    pub chunks: usize,
    /// Block edits that changed something.
    pub edits: u64,
    /// Increase entries the engine processed.
    pub increases: u64,
    /// Decrease entries the engine processed.
    pub decreases: u64,
    /// Section publications.
    pub published_sections: usize,
    /// Snapshots taken by the reader thread.
    pub snapshots: u64,
    /// Voxels compared against a from-scratch relight, when verification ran.
    pub verified_voxels: Option<usize>,
}

impl SoakSummary {
    fn absorb(&mut self, report: &LightUpdateReport) {
        self.increases += report.increases;
        self.decreases += report.decreases;
        self.published_sections += report.changed_sections.len();
    }
}

/// Runs a full soak: generation, initial lighting, the edit ticks and, if enabled,
/// verification.
pub fn run(config: &LumenConfig) -> anyhow::Result<SoakSummary> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut world = {
        let _span = info_span!("generate", radius = config.chunk_radius).entered();
        generate_world(config, &mut rng)?
    };
    let interface = LightInterface::<BlockLight>::new();
    let mut store = LightStore::for_channel::<BlockLight>(config.min_section, config.max_section);
    let mut summary = SoakSummary {
        chunks: world.loaded_chunks().count(),
        ..SoakSummary::default()
    };

    {
        let _span = info_span!("light_world").entered();
        let start = Instant::now();
        let report = light_world(&interface, &mut world, &mut store)?;
        log::info!(
            "Lit {} chunks in {:?}",
            report.lit_chunks.len(),
            start.elapsed()
        );
        summary.absorb(&report);
    }

    let readers = center_readers(&store);
    let done = AtomicBool::new(false);
    let snapshots = AtomicU64::new(0);
    let (readers, done, snapshots) = (&readers, &done, &snapshots);

    let start = Instant::now();
    thread::scope(|scope| {
        if config.reader_thread {
            scope.spawn(move || sample_published_light(readers, done, snapshots));
        }
        let result = run_ticks(config, &mut rng, &interface, &mut world, &mut store, &mut summary);
        done.store(true, Ordering::Release);
        result
    })?;
    summary.snapshots = snapshots.load(Ordering::Relaxed);
    log::info!(
        "Applied {} edits over {} ticks in {:?}",
        summary.edits,
        config.ticks,
        start.elapsed()
    );

    if config.verify {
        let _span = info_span!("verify").entered();
        summary.verified_voxels = Some(verify(&world, &store)?);
    }
    Ok(summary)
}

/// Stone terrain with a scattering of light sources, glass and water on top.
fn generate_world(config: &LumenConfig, rng: &mut StdRng) -> anyhow::Result<VoxelWorld> {
    let registry = Arc::new(BlockRegistry::default());
    let block = |name: &str| {
        registry
            .get_by_name(name)
            .with_context(|| format!("block {name} is not registered"))
    };
    let stone = block("stone")?;
    let glass = block("glass")?;
    let water = block("water")?;
    let torch = block("torch")?;
    let lantern = block("lantern")?;
    let glowstone = block("glowstone")?;

    let mut world = VoxelWorld::new(Arc::clone(&registry), config.min_section, config.max_section)
        .with_authoritative(config.authoritative);
    let ground = config.min_y() + (config.max_y() - config.min_y()) / 3;
    let radius = config.chunk_radius;

    for cx in -radius..=radius {
        for cz in -radius..=radius {
            let chunk = ChunkPos::new(cx, cz);
            world.load_chunk(chunk);
            for x in 0..16 {
                for z in 0..16 {
                    let (bx, bz) = (chunk.min_block_x() + x, chunk.min_block_z() + z);
                    let height = ground + rng.random_range(-3..=3);
                    world.fill(
                        BlockPos::new(bx, config.min_y(), bz),
                        BlockPos::new(bx, height, bz),
                        stone,
                    )?;

                    let top = BlockPos::new(bx, height + 1, bz);
                    match rng.random_range(0..100) {
                        0 => {
                            world.set_block(top, torch)?;
                        }
                        1 => {
                            world.set_block(top, lantern)?;
                        }
                        2 => {
                            world.set_block(top.offset(0, -1, 0), glowstone)?;
                        }
                        3..=5 => {
                            world.set_block(top, water)?;
                        }
                        6 => {
                            world.fill(top, top.offset(0, 2, 0), glass)?;
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(world)
}

/// Lights every chunk and marks it light-correct.
///
/// In authoritative mode no chunk can see its neighbours while they are lit, so the seams
/// are reconciled in a second batch once every chunk is usable.
fn light_world(
    interface: &LightInterface<BlockLight>,
    world: &mut VoxelWorld,
    store: &mut LightStore,
) -> anyhow::Result<LightUpdateReport> {
    let mut chunks: Vec<_> = world.loaded_chunks().collect();
    chunks.sort_by_key(|chunk| (chunk.x(), chunk.z()));

    let authoritative = world.is_authoritative();
    for &chunk in &chunks {
        interface.schedule_light_chunk(chunk, !authoritative);
    }
    let mut report = interface.propagate_changes(&*world, store);
    for &chunk in &chunks {
        world.mark_light_correct(chunk)?;
    }

    if authoritative {
        for &chunk in &chunks {
            interface.schedule_edge_checks(chunk);
        }
        report.merge(interface.propagate_changes(&*world, store));
    }
    Ok(report)
}

fn center_readers(store: &LightStore) -> Vec<SectionLightReader> {
    (store.min_light_section()..=store.max_light_section())
        .filter_map(|section_y| store.reader(SectionPos::of(ChunkPos::new(0, 0), section_y)))
        .collect()
}

/// Reader side: takes snapshots of the centre chunk's sections until `done` is set.
fn sample_published_light(readers: &[SectionLightReader], done: &AtomicBool, snapshots: &AtomicU64) {
    let mut lit_sections = 0u64;
    while !done.load(Ordering::Acquire) {
        for reader in readers {
            if reader.snapshot().is_some_and(|array| !array.is_zero()) {
                lit_sections += 1;
            }
            snapshots.fetch_add(1, Ordering::Relaxed);
        }
        thread::yield_now();
    }
    log::debug!(
        "Reader saw light in {lit_sections} of {} section snapshots",
        snapshots.load(Ordering::Relaxed)
    );
}

fn run_ticks(
    config: &LumenConfig,
    rng: &mut StdRng,
    interface: &LightInterface<BlockLight>,
    world: &mut VoxelWorld,
    store: &mut LightStore,
    summary: &mut SoakSummary,
) -> anyhow::Result<()> {
    let palette: Vec<BlockStateId> = world.registry().iter().map(|(id, _)| id).collect();
    let air = world
        .registry()
        .get_by_name("air")
        .context("block air is not registered")?;
    let span = config.chunk_radius * 16;

    for tick in 0..config.ticks {
        let _span = info_span!("tick", tick).entered();
        for _ in 0..config.edits_per_tick {
            let pos = BlockPos::new(
                rng.random_range(-span..span + 16),
                rng.random_range(config.min_y()..=config.max_y()),
                rng.random_range(-span..span + 16),
            );
            let id = if rng.random_bool(AIR_EDIT_CHANCE) {
                air
            } else {
                palette[rng.random_range(0..palette.len())]
            };

            let change = world
                .set_block(pos, id)
                .with_context(|| format!("failed to edit {pos}"))?;
            if !change.is_change() {
                continue;
            }
            interface.block_change(pos);
            if let Some(now_empty) = change.section_emptiness {
                interface.section_change(pos.section_pos(), now_empty);
            }
            summary.edits += 1;
        }

        let report = interface.propagate_changes(&*world, store);
        log::debug!(
            "Tick {tick}: published {} sections ({} increases, {} decreases)",
            report.changed_sections.len(),
            report.increases,
            report.decreases
        );
        summary.absorb(&report);
    }
    Ok(())
}

/// Relights a copy of the world from scratch and compares every voxel. Returns how many
/// voxels were compared.
fn verify(world: &VoxelWorld, store: &LightStore) -> anyhow::Result<usize> {
    let geometry = world.clone_geometry().with_authoritative(false);
    let mut chunks: Vec<_> = geometry.loaded_chunks().collect();
    chunks.sort_by_key(|chunk| (chunk.x(), chunk.z()));

    let mut engine = BlockLightEngine::new();
    let mut fresh = LightStore::for_channel::<BlockLight>(store.min_section(), store.max_section());
    for &chunk in &chunks {
        engine.light_chunk(&geometry, &mut fresh, chunk, true);
    }

    let min_y = store.min_light_section() * 16;
    let max_y = store.max_light_section() * 16 + 15;
    let mut checked = 0;
    let mut mismatches = Vec::new();
    for chunk in chunks {
        for y in min_y..=max_y {
            for z in 0..16 {
                for x in 0..16 {
                    let pos = BlockPos::new(chunk.min_block_x() + x, y, chunk.min_block_z() + z);
                    let (got, want) = (store.light_level(pos), fresh.light_level(pos));
                    if got != want {
                        mismatches.push((pos, got, want));
                    }
                    checked += 1;
                }
            }
        }
    }

    if let Some((pos, got, want)) = mismatches.first() {
        bail!(
            "{} of {checked} voxels differ from a from-scratch relight, first at {pos}: {got} instead of {want}",
            mismatches.len()
        );
    }
    log::info!("Verified {checked} voxels against a from-scratch relight");
    Ok(checked)
}
