//! Entry points that turn world events into propagation runs.
//!
//! Every public operation here follows the same shape: prepare storage, set the encode
//! origin around one chunk, seed the queues, run decrease and increase passes to
//! completion, then publish every section the run wrote.

use std::time::Instant;

use lumen_utils::{BlockPos, ChunkPos, SECTION_SIZE, SectionPos};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::{
    access::{ChunkLightAccess, LightChunkAccess, LightChunkGetter},
    base::LightEngine,
    channel::LightChannel,
    direction::Direction,
    queue_entry::{EncodeOrigin, QueueEntry},
};
use crate::chunk::chunk_light::LightStore;

/// What one or more entry point calls changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightUpdateReport {
    /// Sections whose published light changed.
    pub changed_sections: Vec<SectionPos>,
    /// Chunks that were lit from scratch.
    pub lit_chunks: Vec<ChunkPos>,
    /// Increase entries processed.
    pub increases: u64,
    /// Decrease entries processed.
    pub decreases: u64,
}

impl LightUpdateReport {
    /// Folds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.changed_sections.extend(other.changed_sections);
        self.lit_chunks.extend(other.lit_chunks);
        self.increases += other.increases;
        self.decreases += other.decreases;
    }

    /// Whether nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_sections.is_empty() && self.lit_chunks.is_empty()
    }
}

type ChunkEdits = SmallVec<[BlockPos; 8]>;

impl<C: LightChannel> LightEngine<C> {
    /// Reacts to an edit at `pos`: the voxel takes its new emission immediately, a decrease
    /// from its old level clears whatever it used to provide, and an increase floods the
    /// new emission.
    ///
    /// Only queues work. The caller runs [`Self::perform_light_decrease`].
    pub fn check_block<A: LightChunkAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) {
        let Some(current) = access.light(pos) else {
            return;
        };
        let Some(material) = access.material(pos) else {
            return;
        };
        let emitted = C::emitted_level(material);
        access.set_light(pos, emitted);

        let origin = self.origin();
        if emitted != 0 {
            self.enqueue_increase(QueueEntry::increase_from_emission(
                origin,
                pos,
                emitted,
                material.is_conditionally_opaque(),
            ));
        }
        // Not sided: the new shape must not hide neighbours lit through the old one
        self.enqueue_decrease(QueueEntry::decrease_all_directions(origin, pos, current));
    }

    /// Applies edits that all lie in `chunk` and publishes the result.
    pub fn blocks_changed_in_chunk<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
        positions: &[BlockPos],
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let start = Instant::now();
        let mut touched = FxHashSet::default();
        Self::refresh_emptiness(getter, store, positions.iter().copied(), &mut touched);
        self.run_block_changes(getter, store, chunk, positions, &mut touched);
        let report = self.finish(store, touched, Vec::new());
        log::debug!(
            "{} light: {} edits in chunk {chunk} took {:?} ({} increases, {} decreases)",
            C::NAME,
            positions.len(),
            start.elapsed(),
            report.increases,
            report.decreases
        );
        report
    }

    /// Applies a batch of edits anywhere in the world.
    ///
    /// Duplicates are dropped and edits are grouped so each chunk gets a single run.
    /// Everything is published once, after the last run.
    pub fn propagate_block_changes<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        positions: impl IntoIterator<Item = BlockPos>,
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let start = Instant::now();
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut grouped: FxHashMap<ChunkPos, ChunkEdits> = FxHashMap::default();
        for pos in positions {
            if !seen.insert(pos) {
                continue;
            }
            grouped
                .entry(pos.chunk_pos())
                .or_insert_with(|| {
                    order.push(pos.chunk_pos());
                    ChunkEdits::new()
                })
                .push(pos);
        }

        let mut touched = FxHashSet::default();
        Self::refresh_emptiness(getter, store, seen.iter().copied(), &mut touched);
        for chunk in &order {
            if let Some(edits) = grouped.get(chunk) {
                self.run_block_changes(getter, store, *chunk, edits, &mut touched);
            }
        }

        let report = self.finish(store, touched, Vec::new());
        log::debug!(
            "{} light: {} edits over {} chunks took {:?} ({} increases, {} decreases, {} sections published)",
            C::NAME,
            seen.len(),
            order.len(),
            start.elapsed(),
            report.increases,
            report.decreases,
            report.changed_sections.len()
        );
        report
    }

    fn run_block_changes<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
        positions: &[BlockPos],
        touched: &mut FxHashSet<SectionPos>,
    ) {
        if !store.contains_chunk(chunk) || !getter.can_use_chunk(chunk) {
            log::trace!(
                "{} light: skipping {} edits in unusable chunk {chunk}",
                C::NAME,
                positions.len()
            );
            return;
        }
        self.run_centred(getter, store, chunk, touched, |engine, access| {
            for pos in positions {
                engine.check_block(access, *pos);
            }
            engine.perform_light_decrease(access);
        });
    }

    /// Lights a chunk that just became available and publishes the result.
    ///
    /// With `needs_edge_checks` the chunk's own sources are flooded first and the seams to
    /// its neighbours are reconciled afterwards. Without, the neighbours' face levels are
    /// pulled in alongside the sources, which is enough when none of them has been lit
    /// independently of this chunk.
    pub fn light_chunk<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
        needs_edge_checks: bool,
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let start = Instant::now();
        let mut touched = FxHashSet::default();
        self.light_chunk_inner(getter, store, chunk, needs_edge_checks, &mut touched);
        let report = self.finish(store, touched, vec![chunk]);
        log::debug!(
            "{} light: lit chunk {chunk} in {:?} (edge checks: {needs_edge_checks}, {} increases, {} decreases)",
            C::NAME,
            start.elapsed(),
            report.increases,
            report.decreases
        );
        report
    }

    fn light_chunk_inner<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
        needs_edge_checks: bool,
        touched: &mut FxHashSet<SectionPos>,
    ) {
        Self::prepare_chunk(getter, store, chunk, touched);
        let (min_light_section, max_light_section) =
            (store.min_light_section(), store.max_light_section());

        self.run_centred(getter, store, chunk, touched, |engine, access| {
            let origin = engine.origin();
            for pos in C::sources(getter, chunk) {
                let Some(current) = access.light(pos) else {
                    continue;
                };
                let Some(material) = access.material(pos) else {
                    continue;
                };
                let emitted = C::emitted_level(material);
                if emitted <= current {
                    continue;
                }
                access.set_light(pos, emitted);
                engine.enqueue_increase(QueueEntry::increase_from_emission(
                    origin,
                    pos,
                    emitted,
                    material.is_conditionally_opaque(),
                ));
            }

            if needs_edge_checks {
                engine.perform_light_increase(access);
                engine.check_edges(access, chunk, min_light_section, max_light_section);
            } else {
                engine.propagate_neighbour_levels(
                    access,
                    chunk,
                    min_light_section,
                    max_light_section,
                );
                engine.perform_light_increase(access);
            }
        });
    }

    /// Creates storage for `chunk` if it has none, rebuilds its emptiness map from the
    /// host and updates section visibility around every section whose flag flipped.
    fn prepare_chunk<G: LightChunkGetter + ?Sized>(
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
        touched: &mut FxHashSet<SectionPos>,
    ) {
        let (min_section, max_section) = (store.min_section(), store.max_section());
        let light = store.insert_chunk(chunk);
        let mut flipped = Vec::new();
        for section_y in min_section..=max_section {
            let section = SectionPos::of(chunk, section_y);
            let empty = getter.is_section_empty(section).unwrap_or(true);
            if light.emptiness_map_mut().set(section_y, empty) {
                flipped.push(section);
            }
        }

        let mut targets: FxHashSet<SectionPos> = light
            .sections()
            .filter(|(_, section)| section.has_data())
            .map(|(section_y, _)| SectionPos::of(chunk, section_y))
            .collect();
        targets.extend(neighbourhoods(store, &flipped));
        update_visibility(getter, store, targets, touched);
    }

    /// Reconciles the seams between `chunk` and its horizontal neighbours and publishes
    /// the result. Used when a neighbour becomes available after `chunk` was lit.
    pub fn check_chunk_edges<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunk: ChunkPos,
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let start = Instant::now();
        let mut touched = FxHashSet::default();
        if store.contains_chunk(chunk) && getter.can_use_chunk(chunk) {
            let (min_light_section, max_light_section) =
                (store.min_light_section(), store.max_light_section());
            self.run_centred(getter, store, chunk, &mut touched, |engine, access| {
                engine.check_edges(access, chunk, min_light_section, max_light_section);
            });
        } else {
            log::trace!("{} light: skipping edge checks of unusable chunk {chunk}", C::NAME);
        }
        let report = self.finish(store, touched, Vec::new());
        log::debug!(
            "{} light: edge checks of chunk {chunk} took {:?} ({} increases, {} decreases)",
            C::NAME,
            start.elapsed(),
            report.increases,
            report.decreases
        );
        report
    }

    /// Compares every voxel pair across the four horizontal seams of `chunk` with what its
    /// neighbours say it should hold, re-checks every mismatch and runs the resulting
    /// decrease pass.
    pub(super) fn check_edges<A: LightChunkAccess + ?Sized>(
        &mut self,
        access: &mut A,
        chunk: ChunkPos,
        min_light_section: i32,
        max_light_section: i32,
    ) {
        let mut mismatched = Vec::new();
        let mut seen = FxHashSet::default();

        for section_y in (min_light_section..=max_light_section).rev() {
            let section = SectionPos::of(chunk, section_y);
            let Some(has_light) = access.section_has_light(section) else {
                continue;
            };
            for dir in Direction::HORIZONTAL {
                let (dx, _, dz) = dir.offset();
                let Some(neighbour_has_light) =
                    access.section_has_light(section.offset(dx, 0, dz))
                else {
                    continue;
                };
                if !has_light && !neighbour_has_light {
                    continue;
                }

                for pos in face_positions(section, dir) {
                    let neighbour = dir.relative(pos);
                    for check in [pos, neighbour] {
                        let Some(stored) = access.light(check) else {
                            continue;
                        };
                        // Corner columns sit on two faces
                        if !seen.insert(check) {
                            continue;
                        }
                        if self.calculate_light_value(access, check, stored) != stored {
                            mismatched.push(check);
                        }
                    }
                }
            }
        }

        for pos in mismatched {
            self.check_block(access, pos);
        }
        self.perform_light_decrease(access);
    }

    /// Queues every lit voxel on the far side of the seams of `chunk` to flood into it.
    pub(super) fn propagate_neighbour_levels<A: LightChunkAccess + ?Sized>(
        &mut self,
        access: &mut A,
        chunk: ChunkPos,
        min_light_section: i32,
        max_light_section: i32,
    ) {
        let origin = self.origin();
        for section_y in min_light_section..=max_light_section {
            let section = SectionPos::of(chunk, section_y);
            if access.section_has_light(section).is_none() {
                continue;
            }
            for dir in Direction::HORIZONTAL {
                let (dx, _, dz) = dir.offset();
                if access.section_has_light(section.offset(dx, 0, dz)) != Some(true) {
                    continue;
                }
                for pos in face_positions(section, dir) {
                    let neighbour = dir.relative(pos);
                    let level = access.light(neighbour).unwrap_or(0);
                    if level <= 1 {
                        continue;
                    }
                    self.enqueue_increase(QueueEntry::increase_only_one_direction(
                        origin,
                        neighbour,
                        level,
                        true,
                        dir.opposite(),
                    ));
                }
            }
        }
    }

    /// Records sections whose emptiness flipped and shows or hides the light of every
    /// section around them accordingly.
    ///
    /// `changes` pairs each section with whether it is now empty. No light is propagated;
    /// the block edits that caused the flips do that.
    pub fn sections_changed<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        changes: &[(SectionPos, bool)],
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let mut flipped = Vec::new();
        for &(section, empty) in changes {
            let Some(light) = store.chunk_mut(section.chunk()) else {
                log::trace!("{} light: emptiness change in unloaded section {section}", C::NAME);
                continue;
            };
            if light.emptiness_map_mut().set(section.y(), empty) {
                flipped.push(section);
            }
        }

        let mut touched = FxHashSet::default();
        let targets = neighbourhoods(store, &flipped);
        update_visibility(getter, store, targets, &mut touched);
        let report = self.finish(store, touched, Vec::new());
        log::debug!(
            "{} light: {} emptiness changes, {} flipped, {} sections republished",
            C::NAME,
            changes.len(),
            flipped.len(),
            report.changed_sections.len()
        );
        report
    }

    /// Drops the stored light of every listed chunk and lights each of them again with
    /// edge checks. Readers keep seeing the old light until the final publication.
    pub fn relight_chunks<G: LightChunkGetter + ?Sized>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        chunks: &[ChunkPos],
    ) -> LightUpdateReport {
        if !Self::store_spans_world(getter, store) {
            return LightUpdateReport::default();
        }
        let start = Instant::now();
        let mut touched = FxHashSet::default();
        for &chunk in chunks {
            let light = store.insert_chunk(chunk);
            touched.extend(
                light
                    .sections()
                    .filter(|(_, section)| section.has_data())
                    .map(|(section_y, _)| SectionPos::of(chunk, section_y)),
            );
            light.clear();
        }

        for &chunk in chunks {
            self.light_chunk_inner(getter, store, chunk, true, &mut touched);
        }

        let report = self.finish(store, touched, chunks.to_vec());
        log::debug!(
            "{} light: relit {} chunks in {:?}",
            C::NAME,
            report.lit_chunks.len(),
            start.elapsed()
        );
        report
    }

    /// Whether `store` covers exactly the sections of the host world. Every entry point
    /// refuses to run against a store that does not.
    pub fn store_spans_world<G: LightChunkGetter + ?Sized>(getter: &G, store: &LightStore) -> bool {
        let (min_section, max_section) = (getter.min_section(), getter.max_section());
        if store.min_section() == min_section && store.max_section() == max_section {
            return true;
        }
        log::warn!(
            "{} light: store spans sections {}..={} but the world spans {min_section}..={max_section}, skipping run",
            C::NAME,
            store.min_section(),
            store.max_section()
        );
        false
    }

    /// Re-reads the host's emptiness of every section holding one of `positions`.
    fn refresh_emptiness<G: LightChunkGetter + ?Sized>(
        getter: &G,
        store: &mut LightStore,
        positions: impl Iterator<Item = BlockPos>,
        touched: &mut FxHashSet<SectionPos>,
    ) {
        let sections: FxHashSet<SectionPos> = positions.map(BlockPos::section_pos).collect();
        let mut flipped = Vec::new();
        for section in sections {
            let Some(empty) = getter.is_section_empty(section) else {
                continue;
            };
            let Some(light) = store.chunk_mut(section.chunk()) else {
                continue;
            };
            if light.emptiness_map_mut().set(section.y(), empty) {
                flipped.push(section);
            }
        }
        if flipped.is_empty() {
            return;
        }
        log::trace!(
            "{} light: {} sections flipped emptiness without being reported",
            C::NAME,
            flipped.len()
        );
        let targets = neighbourhoods(store, &flipped);
        update_visibility(getter, store, targets, touched);
    }

    /// Runs `run` with the origin and an access centred on `center`, collecting the
    /// sections it wrote.
    fn run_centred<G: LightChunkGetter + ?Sized, R>(
        &mut self,
        getter: &G,
        store: &mut LightStore,
        center: ChunkPos,
        touched: &mut FxHashSet<SectionPos>,
        run: impl FnOnce(&mut Self, &mut ChunkLightAccess<'_, G>) -> R,
    ) -> R {
        self.set_origin(EncodeOrigin::around(center, store.min_light_section()));
        let mut access = ChunkLightAccess::new(getter, store, center);
        let result = run(self, &mut access);
        debug_assert!(!self.has_work(), "propagation run left queued entries");
        touched.extend(access.into_touched());
        result
    }

    fn finish(
        &mut self,
        store: &mut LightStore,
        touched: FxHashSet<SectionPos>,
        lit_chunks: Vec<ChunkPos>,
    ) -> LightUpdateReport {
        let (increases, decreases) = self.take_processed_counts();
        LightUpdateReport {
            changed_sections: store.publish(touched),
            lit_chunks,
            increases,
            decreases,
        }
    }
}

/// The voxels of `section` on its face towards `dir`, which must be horizontal.
fn face_positions(section: SectionPos, dir: Direction) -> impl Iterator<Item = BlockPos> {
    let origin = section.origin();
    let (dx, _, dz) = dir.offset();
    let edge = |delta: i32, along: i32| match delta {
        1 => SECTION_SIZE - 1,
        -1 => 0,
        _ => along,
    };
    (0..SECTION_SIZE).flat_map(move |y| {
        (0..SECTION_SIZE).map(move |along| {
            origin.offset(edge(dx, along), y, edge(dz, along))
        })
    })
}

/// Every light section within one section of any of `sections`.
fn neighbourhoods(store: &LightStore, sections: &[SectionPos]) -> FxHashSet<SectionPos> {
    let (min, max) = (store.min_light_section(), store.max_light_section());
    let mut targets = FxHashSet::default();
    for section in sections {
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    let neighbour = section.offset(dx, dy, dz);
                    if (min..=max).contains(&neighbour.y()) {
                        targets.insert(neighbour);
                    }
                }
            }
        }
    }
    targets
}

/// Whether `section` or any of its 26 neighbours holds something other than air.
fn is_section_relevant<G: LightChunkGetter + ?Sized>(
    getter: &G,
    store: &LightStore,
    section: SectionPos,
) -> bool {
    for dy in -1..=1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                let neighbour = section.offset(dx, dy, dz);
                let empty = match store.chunk(neighbour.chunk()) {
                    Some(light) => light.emptiness_map().is_empty(neighbour.y()),
                    None => getter.is_section_empty(neighbour).unwrap_or(true),
                };
                if !empty {
                    return true;
                }
            }
        }
    }
    false
}

/// Hides present sections that became irrelevant and shows hidden ones that became
/// relevant again.
fn update_visibility<G: LightChunkGetter + ?Sized>(
    getter: &G,
    store: &mut LightStore,
    targets: FxHashSet<SectionPos>,
    touched: &mut FxHashSet<SectionPos>,
) {
    for section in targets {
        let relevant = is_section_relevant(getter, store, section);
        let Some(light) = store.chunk_mut(section.chunk()) else {
            continue;
        };
        let changed = if relevant {
            light.unhide_section(section.y())
        } else {
            light.hide_section(section.y())
        };
        if changed {
            touched.insert(section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_positions_cover_one_face() {
        let section = SectionPos::new(1, -1, 2);
        let east: Vec<_> = face_positions(section, Direction::East).collect();
        assert_eq!(east.len(), 256);
        assert!(east.iter().all(|pos| pos.x() == 31));
        assert!(east.iter().all(|pos| pos.section_pos() == section));

        let north: FxHashSet<_> = face_positions(section, Direction::North).collect();
        assert_eq!(north.len(), 256);
        assert!(north.iter().all(|pos| pos.z() == 32));
        assert!(north.contains(&BlockPos::new(16, -16, 32)));
        assert!(north.contains(&BlockPos::new(31, -1, 32)));
    }

    #[test]
    fn test_neighbourhoods_clamp_to_light_range() {
        let store = LightStore::new(0, 3, 1);
        let targets = neighbourhoods(&store, &[SectionPos::new(0, 4, 0)]);
        assert_eq!(targets.len(), 18);
        assert!(targets.iter().all(|section| section.y() <= 4));
    }

    #[test]
    fn test_report_merge() {
        let mut report = LightUpdateReport {
            changed_sections: vec![SectionPos::new(0, 0, 0)],
            increases: 3,
            ..LightUpdateReport::default()
        };
        assert!(!report.is_empty());
        report.merge(LightUpdateReport {
            lit_chunks: vec![ChunkPos::new(1, 1)],
            decreases: 2,
            ..LightUpdateReport::default()
        });
        assert_eq!(report.lit_chunks, vec![ChunkPos::new(1, 1)]);
        assert_eq!((report.increases, report.decreases), (3, 2));
        assert!(LightUpdateReport::default().is_empty());
    }
}
