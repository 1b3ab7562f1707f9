//! The seams between the light engine, the host world and the stored light.

use std::cell::RefCell;

use lumen_utils::{BlockPos, ChunkPos, SectionPos};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::chunk::{chunk_light::LightStore, light_storage::SwmrNibbleArray, material::MaterialSample};

/// Read-only capabilities the host world has to provide.
pub trait LightChunkGetter {
    /// The material at `pos`, or `None` when its chunk is not loaded.
    fn material(&self, pos: BlockPos) -> Option<MaterialSample>;

    /// Whether light in `chunk` can be read and written by the engine.
    fn can_use_chunk(&self, chunk: ChunkPos) -> bool;

    /// Whether a section holds only air. `None` when its chunk is not loaded.
    fn is_section_empty(&self, section: SectionPos) -> Option<bool>;

    /// Candidate light sources of a chunk for initial lighting. Finite, consumed once.
    fn light_sources(&self, chunk: ChunkPos) -> Box<dyn Iterator<Item = BlockPos> + '_>;

    /// The lowest world section.
    fn min_section(&self) -> i32;

    /// The highest world section.
    fn max_section(&self) -> i32;
}

/// Per-voxel view the propagation core works against.
pub trait LightChunkAccess {
    /// The stored level at `pos`, `None` when there is no usable light there.
    fn light(&self, pos: BlockPos) -> Option<u8>;

    /// Stores a level. Positions without usable light are ignored.
    fn set_light(&mut self, pos: BlockPos, level: u8);

    /// The material at `pos`, `None` when there is no usable light there.
    fn material(&self, pos: BlockPos) -> Option<MaterialSample>;

    /// Whether a usable section holds any light data. `None` when the section is unusable.
    fn section_has_light(&self, section: SectionPos) -> Option<bool>;
}

/// Furthest chunk, in chunks from the centre, a run may touch. Keeps every reachable
/// position inside the queue entry encode window.
pub const MAX_RUN_RADIUS: i32 = 120;

/// [`LightChunkAccess`] over a host getter and a [`LightStore`], centred on one chunk.
///
/// The centre chunk is always usable once it has stored light. Any other chunk is usable
/// when it has stored light and the host accepts it. Every section written during the
/// run is recorded so it can be published afterwards.
pub struct ChunkLightAccess<'a, G: LightChunkGetter + ?Sized> {
    getter: &'a G,
    store: &'a mut LightStore,
    center: ChunkPos,
    min_section: i32,
    max_section: i32,
    usable: RefCell<FxHashMap<ChunkPos, bool>>,
    touched: FxHashSet<SectionPos>,
}

impl<'a, G: LightChunkGetter + ?Sized> ChunkLightAccess<'a, G> {
    /// Creates an access centred on `center`.
    pub fn new(getter: &'a G, store: &'a mut LightStore, center: ChunkPos) -> Self {
        Self {
            getter,
            min_section: store.min_section(),
            max_section: store.max_section(),
            store,
            center,
            usable: RefCell::new(FxHashMap::default()),
            touched: FxHashSet::default(),
        }
    }

    /// Whether the engine may read and write light in `chunk` during this run.
    #[must_use]
    pub fn is_chunk_usable(&self, chunk: ChunkPos) -> bool {
        if let Some(usable) = self.usable.borrow().get(&chunk) {
            return *usable;
        }
        let usable = self.store.contains_chunk(chunk)
            && (chunk == self.center
                || (chunk.chessboard_distance(self.center) <= MAX_RUN_RADIUS
                    && self.getter.can_use_chunk(chunk)));
        self.usable.borrow_mut().insert(chunk, usable);
        usable
    }

    /// Ends the run and returns every section it wrote.
    #[must_use]
    pub fn into_touched(self) -> FxHashSet<SectionPos> {
        self.touched
    }
}

impl<G: LightChunkGetter + ?Sized> LightChunkAccess for ChunkLightAccess<'_, G> {
    #[inline]
    fn light(&self, pos: BlockPos) -> Option<u8> {
        let chunk = pos.chunk_pos();
        if !self.is_chunk_usable(chunk) {
            return None;
        }
        self.store.chunk(chunk)?.light(pos)
    }

    fn set_light(&mut self, pos: BlockPos, level: u8) {
        let chunk = pos.chunk_pos();
        if !self.is_chunk_usable(chunk) {
            return;
        }
        let Some(section) = self
            .store
            .chunk_mut(chunk)
            .and_then(|light| light.section_mut(pos.y() >> 4))
        else {
            return;
        };
        let index = pos.section_index();
        if section.get_updating(index) == level {
            return;
        }
        section.set_updating(index, level);
        self.touched.insert(pos.section_pos());
    }

    fn material(&self, pos: BlockPos) -> Option<MaterialSample> {
        let chunk = pos.chunk_pos();
        if !self.is_chunk_usable(chunk) {
            return None;
        }
        let section_y = pos.y() >> 4;
        if section_y < self.min_section || section_y > self.max_section {
            return Some(MaterialSample::AIR);
        }
        let light = self.store.chunk(chunk)?;
        if light.emptiness_map().is_empty(section_y) {
            return Some(MaterialSample::AIR);
        }
        self.getter.material(pos)
    }

    fn section_has_light(&self, section: SectionPos) -> Option<bool> {
        if !self.is_chunk_usable(section.chunk()) {
            return None;
        }
        self.store
            .chunk(section.chunk())?
            .section(section.y())
            .map(SwmrNibbleArray::has_data)
    }
}
