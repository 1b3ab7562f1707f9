//! An in-memory voxel world that hosts the light engine.
//!
//! [`VoxelWorld`] owns block data only. Light lives in a
//! [`LightStore`](crate::chunk::chunk_light::LightStore) the caller keeps next to it, and the
//! world talks to the engine through [`LightChunkGetter`].

pub mod block_registry;
pub mod block_section;
mod error;

use std::sync::Arc;

use lumen_utils::{BlockPos, BlockStateId, ChunkPos, SECTION_SIZE, SectionPos};
use rustc_hash::FxHashMap;

pub use block_registry::{BlockEntry, BlockRegistry};
pub use block_section::BlockSection;
pub use error::WorldError;

use crate::chunk::{light_engine::access::LightChunkGetter, material::MaterialSample};

/// How far a loaded chunk has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkStatus {
    /// Block data is available, light may not be.
    Loaded,
    /// The chunk's light has been computed and can be relied on.
    LightCorrect,
}

/// What [`VoxelWorld::set_block`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChange {
    /// The edited position.
    pub pos: BlockPos,
    /// The block that was replaced.
    pub old: BlockStateId,
    /// The block now at `pos`.
    pub new: BlockStateId,
    /// `Some(now_empty)` when the edit flipped the emptiness of the section.
    pub section_emptiness: Option<bool>,
}

impl BlockChange {
    /// Whether the edit replaced a block with a different one.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

#[derive(Debug, Clone)]
struct WorldChunk {
    status: ChunkStatus,
    sections: Box<[BlockSection]>,
}

/// Loaded chunks of block data over a fixed section range.
#[derive(Debug, Clone)]
pub struct VoxelWorld {
    registry: Arc<BlockRegistry>,
    min_section: i32,
    max_section: i32,
    authoritative: bool,
    chunks: FxHashMap<ChunkPos, WorldChunk>,
}

impl VoxelWorld {
    /// Creates an empty world spanning sections `min_section..=max_section`.
    #[must_use]
    pub fn new(registry: Arc<BlockRegistry>, min_section: i32, max_section: i32) -> Self {
        debug_assert!(min_section <= max_section);
        Self {
            registry,
            min_section,
            max_section,
            authoritative: false,
            chunks: FxHashMap::default(),
        }
    }

    /// In authoritative mode only light-correct chunks can be used by the light engine.
    #[must_use]
    pub fn with_authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    /// Whether the world runs in authoritative mode.
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    /// The block registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Loads an all-air chunk. Returns false if it was already loaded.
    pub fn load_chunk(&mut self, chunk: ChunkPos) -> bool {
        if self.chunks.contains_key(&chunk) {
            return false;
        }
        let count = (self.max_section - self.min_section + 1) as usize;
        self.chunks.insert(
            chunk,
            WorldChunk {
                status: ChunkStatus::Loaded,
                sections: vec![BlockSection::EMPTY; count].into_boxed_slice(),
            },
        );
        true
    }

    /// Unloads a chunk. Returns whether it was loaded.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) -> bool {
        self.chunks.remove(&chunk).is_some()
    }

    /// Whether the chunk is loaded.
    #[must_use]
    pub fn is_loaded(&self, chunk: ChunkPos) -> bool {
        self.chunks.contains_key(&chunk)
    }

    /// The chunk's status, `None` when it is not loaded.
    #[must_use]
    pub fn status(&self, chunk: ChunkPos) -> Option<ChunkStatus> {
        self.chunks.get(&chunk).map(|loaded| loaded.status)
    }

    /// Positions of every loaded chunk.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Records that the chunk's light has been computed.
    pub fn mark_light_correct(&mut self, chunk: ChunkPos) -> Result<(), WorldError> {
        let loaded = self
            .chunks
            .get_mut(&chunk)
            .ok_or(WorldError::ChunkNotLoaded(chunk))?;
        loaded.status = ChunkStatus::LightCorrect;
        Ok(())
    }

    fn section_slot(&self, section_y: i32) -> Option<usize> {
        (self.min_section..=self.max_section)
            .contains(&section_y)
            .then(|| (section_y - self.min_section) as usize)
    }

    fn out_of_world(&self, pos: BlockPos) -> WorldError {
        WorldError::OutOfWorld {
            pos,
            min_section: self.min_section,
            max_section: self.max_section,
        }
    }

    /// The block at `pos`.
    pub fn block(&self, pos: BlockPos) -> Result<BlockStateId, WorldError> {
        let loaded = self
            .chunks
            .get(&pos.chunk_pos())
            .ok_or(WorldError::ChunkNotLoaded(pos.chunk_pos()))?;
        let slot = self
            .section_slot(pos.y() >> 4)
            .ok_or_else(|| self.out_of_world(pos))?;
        Ok(loaded.sections[slot].get(pos.section_index()))
    }

    /// Places a block.
    ///
    /// The light engine is not told; pass the returned change to it.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockStateId) -> Result<BlockChange, WorldError> {
        if self.registry.get(id).is_none() {
            return Err(WorldError::UnknownBlock(id));
        }
        let slot = self
            .section_slot(pos.y() >> 4)
            .ok_or_else(|| self.out_of_world(pos))?;
        let loaded = self
            .chunks
            .get_mut(&pos.chunk_pos())
            .ok_or(WorldError::ChunkNotLoaded(pos.chunk_pos()))?;

        let section = &mut loaded.sections[slot];
        let was_empty = section.is_empty();
        let old = section.set(pos.section_index(), id);
        let now_empty = if old == id { was_empty } else { section.is_empty() };

        Ok(BlockChange {
            pos,
            old,
            new: id,
            section_emptiness: (was_empty != now_empty).then_some(now_empty),
        })
    }

    /// Fills a box of blocks, inclusive on both corners, and returns every real change.
    pub fn fill(
        &mut self,
        from: BlockPos,
        to: BlockPos,
        id: BlockStateId,
    ) -> Result<Vec<BlockChange>, WorldError> {
        let mut changes = Vec::new();
        for y in from.y().min(to.y())..=from.y().max(to.y()) {
            for z in from.z().min(to.z())..=from.z().max(to.z()) {
                for x in from.x().min(to.x())..=from.x().max(to.x()) {
                    let change = self.set_block(BlockPos::new(x, y, z), id)?;
                    if change.is_change() {
                        changes.push(change);
                    }
                }
            }
        }
        Ok(changes)
    }

    /// A copy of the loaded chunks' blocks with every chunk back at
    /// [`ChunkStatus::Loaded`], ready to be lit from scratch.
    #[must_use]
    pub fn clone_geometry(&self) -> Self {
        let mut copy = self.clone();
        for loaded in copy.chunks.values_mut() {
            loaded.status = ChunkStatus::Loaded;
        }
        copy
    }
}

impl LightChunkGetter for VoxelWorld {
    fn material(&self, pos: BlockPos) -> Option<MaterialSample> {
        let loaded = self.chunks.get(&pos.chunk_pos())?;
        let Some(slot) = self.section_slot(pos.y() >> 4) else {
            return Some(MaterialSample::AIR);
        };
        self.registry
            .material(loaded.sections[slot].get(pos.section_index()))
    }

    fn can_use_chunk(&self, chunk: ChunkPos) -> bool {
        self.chunks.get(&chunk).is_some_and(|loaded| {
            !self.authoritative || loaded.status == ChunkStatus::LightCorrect
        })
    }

    fn is_section_empty(&self, section: SectionPos) -> Option<bool> {
        let loaded = self.chunks.get(&section.chunk())?;
        Some(
            self.section_slot(section.y())
                .is_none_or(|slot| loaded.sections[slot].is_empty()),
        )
    }

    fn light_sources(&self, chunk: ChunkPos) -> Box<dyn Iterator<Item = BlockPos> + '_> {
        let Some(loaded) = self.chunks.get(&chunk) else {
            return Box::new(std::iter::empty());
        };
        let registry = &self.registry;
        let min_section = self.min_section;
        Box::new(
            loaded
                .sections
                .iter()
                .enumerate()
                .flat_map(move |(slot, section)| {
                    let origin = SectionPos::of(chunk, min_section + slot as i32).origin();
                    section
                        .positions_matching(move |id| {
                            registry
                                .material(id)
                                .is_some_and(|material| material.raw_emission() != 0)
                        })
                        .map(move |index| {
                            let index = index as i32;
                            origin.offset(
                                index & (SECTION_SIZE - 1),
                                index >> 8,
                                (index >> 4) & (SECTION_SIZE - 1),
                            )
                        })
                }),
        )
    }

    fn min_section(&self) -> i32 {
        self.min_section
    }

    fn max_section(&self) -> i32 {
        self.max_section
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> VoxelWorld {
        let mut world = VoxelWorld::new(Arc::new(BlockRegistry::default()), -1, 1);
        world.load_chunk(ChunkPos::new(0, 0));
        world
    }

    fn id(world: &VoxelWorld, name: &str) -> BlockStateId {
        world.registry().get_by_name(name).unwrap()
    }

    #[test]
    fn test_set_block_reports_emptiness_flips() {
        let mut world = world();
        let stone = id(&world, "stone");
        let pos = BlockPos::new(3, -5, 9);

        let change = world.set_block(pos, stone).unwrap();
        assert_eq!(change.old, BlockStateId(0));
        assert_eq!(change.section_emptiness, Some(false));
        assert_eq!(world.block(pos), Ok(stone));

        let again = world.set_block(pos, stone).unwrap();
        assert!(!again.is_change());
        assert_eq!(again.section_emptiness, None);

        let removed = world.set_block(pos, BlockStateId(0)).unwrap();
        assert_eq!(removed.section_emptiness, Some(true));
    }

    #[test]
    fn test_set_block_errors() {
        let mut world = world();
        assert_eq!(
            world.set_block(BlockPos::new(16, 0, 0), BlockStateId(1)),
            Err(WorldError::ChunkNotLoaded(ChunkPos::new(1, 0)))
        );
        assert!(matches!(
            world.set_block(BlockPos::new(0, 32, 0), BlockStateId(1)),
            Err(WorldError::OutOfWorld { .. })
        ));
        assert_eq!(
            world.set_block(BlockPos::new(0, 0, 0), BlockStateId(999)),
            Err(WorldError::UnknownBlock(BlockStateId(999)))
        );
    }

    #[test]
    fn test_getter_view() {
        let mut world = world();
        let torch = id(&world, "torch");
        world.set_block(BlockPos::new(1, 2, 3), torch).unwrap();
        world.set_block(BlockPos::new(15, -16, 0), torch).unwrap();

        let mut sources: Vec<_> = world.light_sources(ChunkPos::new(0, 0)).collect();
        sources.sort_by_key(|pos| pos.y());
        assert_eq!(sources, vec![BlockPos::new(15, -16, 0), BlockPos::new(1, 2, 3)]);

        assert_eq!(world.material(BlockPos::new(0, 100, 0)), Some(MaterialSample::AIR));
        assert_eq!(world.material(BlockPos::new(-1, 0, 0)), None);
        assert_eq!(world.is_section_empty(SectionPos::new(0, 0, 0)), Some(false));
        assert_eq!(world.is_section_empty(SectionPos::new(0, 1, 0)), Some(true));
        assert_eq!(world.is_section_empty(SectionPos::new(0, 5, 0)), Some(true));
        assert_eq!(world.is_section_empty(SectionPos::new(2, 0, 0)), None);
    }

    #[test]
    fn test_authoritative_needs_light_correct() {
        let chunk = ChunkPos::new(0, 0);
        let mut world = world().with_authoritative(true);
        assert!(!world.can_use_chunk(chunk));
        world.mark_light_correct(chunk).unwrap();
        assert!(world.can_use_chunk(chunk));
        assert_eq!(world.clone_geometry().status(chunk), Some(ChunkStatus::Loaded));
        assert!(!world.can_use_chunk(ChunkPos::new(5, 5)));
    }

    #[test]
    fn test_fill_returns_changes() {
        let mut world = world();
        let glass = id(&world, "glass");
        let changes = world
            .fill(BlockPos::new(0, 0, 0), BlockPos::new(1, 1, 1), glass)
            .unwrap();
        assert_eq!(changes.len(), 8);
        assert_eq!(
            changes
                .iter()
                .filter(|change| change.section_emptiness.is_some())
                .count(),
            1
        );
    }
}
