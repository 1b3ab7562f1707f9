//! Thread-safe front door to the light engine.
//!
//! Any thread can report world events; they accumulate until the updater calls
//! [`LightInterface::propagate_changes`], which drains them in one batch.

use lumen_utils::{BlockPos, ChunkPos, SectionPos};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    access::LightChunkGetter, base::LightEngine, channel::LightChannel,
    updates::LightUpdateReport,
};
use crate::chunk::chunk_light::LightStore;

/// Events waiting for the next update.
#[derive(Debug, Default)]
struct PendingChanges {
    /// Chunks to light from scratch, with their edge check flag, in request order.
    light_chunks: Vec<(ChunkPos, bool)>,
    /// Latest reported emptiness per section.
    sections: FxHashMap<SectionPos, bool>,
    blocks: Vec<BlockPos>,
    edge_checks: FxHashSet<ChunkPos>,
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.light_chunks.is_empty()
            && self.sections.is_empty()
            && self.blocks.is_empty()
            && self.edge_checks.is_empty()
    }
}

/// Collects light-relevant world events from any thread and applies them in batches.
///
/// # Architecture
///
/// 1. Producers call [`Self::block_change`], [`Self::section_change`],
///    [`Self::schedule_light_chunk`] or [`Self::schedule_edge_checks`].
/// 2. The updater calls [`Self::propagate_changes`], which runs, in order: chunk lighting,
///    section emptiness changes, block changes, edge checks.
/// 3. Each step publishes the sections it touched, so readers never see a half-done step.
///
/// The engine sits behind its own mutex, so two updaters can never interleave a run.
#[derive(Debug)]
pub struct LightInterface<C: LightChannel> {
    engine: Mutex<LightEngine<C>>,
    pending: Mutex<PendingChanges>,
}

impl<C: LightChannel> LightInterface<C> {
    /// Creates an interface with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: Mutex::new(LightEngine::new()),
            pending: Mutex::new(PendingChanges::default()),
        }
    }

    /// Reports that the block at `pos` changed.
    pub fn block_change(&self, pos: BlockPos) {
        self.pending.lock().blocks.push(pos);
    }

    /// Reports that a section became empty or non-empty. The last report per section wins.
    pub fn section_change(&self, section: SectionPos, now_empty: bool) {
        self.pending.lock().sections.insert(section, now_empty);
    }

    /// Requests initial lighting of a chunk.
    ///
    /// Requesting a chunk twice lights it once, with edge checks if either request asked
    /// for them.
    pub fn schedule_light_chunk(&self, chunk: ChunkPos, needs_edge_checks: bool) {
        let mut pending = self.pending.lock();
        if let Some((_, edges)) = pending
            .light_chunks
            .iter_mut()
            .find(|(queued, _)| *queued == chunk)
        {
            *edges |= needs_edge_checks;
        } else {
            pending.light_chunks.push((chunk, needs_edge_checks));
        }
    }

    /// Requests a seam reconciliation for a chunk whose neighbour became available.
    pub fn schedule_edge_checks(&self, chunk: ChunkPos) {
        self.pending.lock().edge_checks.insert(chunk);
    }

    /// Whether anything is waiting for [`Self::propagate_changes`].
    #[must_use]
    pub fn has_updates(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Applies every queued event. Against a store that does not span the host world the
    /// events are dropped and nothing runs.
    pub fn propagate_changes<G: LightChunkGetter + ?Sized>(
        &self,
        getter: &G,
        store: &mut LightStore,
    ) -> LightUpdateReport {
        let pending = std::mem::take(&mut *self.pending.lock());
        let mut report = LightUpdateReport::default();
        if pending.is_empty() || !LightEngine::<C>::store_spans_world(getter, store) {
            return report;
        }

        let mut engine = self.engine.lock();
        for (chunk, needs_edge_checks) in pending.light_chunks {
            report.merge(engine.light_chunk(getter, store, chunk, needs_edge_checks));
        }
        if !pending.sections.is_empty() {
            let sections: Vec<_> = pending.sections.into_iter().collect();
            report.merge(engine.sections_changed(getter, store, &sections));
        }
        if !pending.blocks.is_empty() {
            report.merge(engine.propagate_block_changes(getter, store, pending.blocks));
        }
        for chunk in pending.edge_checks {
            report.merge(engine.check_chunk_edges(getter, store, chunk));
        }
        report
    }

    /// Drops and recomputes the light of `chunks` right away.
    pub fn relight_chunks<G: LightChunkGetter + ?Sized>(
        &self,
        getter: &G,
        store: &mut LightStore,
        chunks: &[ChunkPos],
    ) -> LightUpdateReport {
        self.engine.lock().relight_chunks(getter, store, chunks)
    }
}

impl<C: LightChannel> Default for LightInterface<C> {
    fn default() -> Self {
        Self::new()
    }
}
