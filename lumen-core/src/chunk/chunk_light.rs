//! Light data of whole chunks and the store that owns it.

use lumen_utils::{BlockPos, ChunkPos, SectionPos};
use rustc_hash::FxHashMap;

use super::{
    emptiness_map::EmptinessMap,
    light_engine::channel::LightChannel,
    light_storage::{NibbleArray, SectionLightReader, SwmrNibbleArray},
};

/// One chunk's light for a single channel.
///
/// Holds a [`SwmrNibbleArray`] for every light section, which are the world's sections plus
/// the channel's padding above and below, and the chunk's [`EmptinessMap`].
#[derive(Debug)]
pub struct ChunkLight {
    min_light_section: i32,
    sections: Box<[SwmrNibbleArray]>,
    emptiness: EmptinessMap,
}

impl ChunkLight {
    /// Creates a chunk whose light sections are all absent.
    #[must_use]
    pub fn new(min_light_section: i32, max_light_section: i32, emptiness: EmptinessMap) -> Self {
        let count = (max_light_section - min_light_section + 1).max(0) as usize;
        Self {
            min_light_section,
            sections: (0..count).map(|_| SwmrNibbleArray::new()).collect(),
            emptiness,
        }
    }

    fn slot(&self, section_y: i32) -> Option<usize> {
        let index = usize::try_from(section_y - self.min_light_section).ok()?;
        (index < self.sections.len()).then_some(index)
    }

    /// The light section at `section_y`, if it is inside the light range.
    #[must_use]
    #[inline]
    pub fn section(&self, section_y: i32) -> Option<&SwmrNibbleArray> {
        self.slot(section_y).map(|index| &self.sections[index])
    }

    /// Mutable access to the light section at `section_y`.
    #[inline]
    pub fn section_mut(&mut self, section_y: i32) -> Option<&mut SwmrNibbleArray> {
        self.slot(section_y).map(|index| &mut self.sections[index])
    }

    /// Iterates `(section_y, section)` bottom to top.
    pub fn sections(&self) -> impl Iterator<Item = (i32, &SwmrNibbleArray)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(index, section)| (self.min_light_section + index as i32, section))
    }

    /// Replaces the array of a section; `None` makes it absent.
    pub fn set_section_array(&mut self, section_y: i32, array: Option<NibbleArray>) -> bool {
        self.section_mut(section_y)
            .map(|section| section.set_array(array))
            .is_some()
    }

    /// Hides a present section. Returns whether the state changed.
    pub fn hide_section(&mut self, section_y: i32) -> bool {
        self.section_mut(section_y).is_some_and(SwmrNibbleArray::hide)
    }

    /// Makes a hidden section present again. Returns whether the state changed.
    pub fn unhide_section(&mut self, section_y: i32) -> bool {
        self.section_mut(section_y)
            .is_some_and(SwmrNibbleArray::unhide)
    }

    /// A reader handle for the published light of a section.
    #[must_use]
    pub fn reader(&self, section_y: i32) -> Option<SectionLightReader> {
        self.section(section_y).map(SwmrNibbleArray::reader)
    }

    /// The chunk's emptiness map.
    #[must_use]
    pub fn emptiness_map(&self) -> &EmptinessMap {
        &self.emptiness
    }

    /// Mutable access to the emptiness map.
    pub fn emptiness_map_mut(&mut self) -> &mut EmptinessMap {
        &mut self.emptiness
    }

    /// Replaces the emptiness map.
    pub fn set_emptiness_map(&mut self, map: EmptinessMap) {
        self.emptiness = map;
    }

    /// The updater's light level at `pos`, `None` outside the light range.
    #[must_use]
    #[inline]
    pub fn light(&self, pos: BlockPos) -> Option<u8> {
        self.section(pos.y() >> 4)
            .map(|section| section.get_updating(pos.section_index()))
    }

    /// The published light level at `pos`.
    #[must_use]
    pub fn visible_light(&self, pos: BlockPos) -> u8 {
        self.section(pos.y() >> 4)
            .map_or(0, |section| section.get_visible(pos.section_index()))
    }

    /// Makes every section absent.
    pub fn clear(&mut self) {
        for section in &mut self.sections {
            if section.has_data() {
                section.set_array(None);
            }
        }
    }
}

/// The light of every chunk the engine knows about, for one channel.
///
/// Owned by the host; the engine borrows it mutably for the duration of an update.
#[derive(Debug)]
pub struct LightStore {
    min_section: i32,
    max_section: i32,
    padding: i32,
    chunks: FxHashMap<ChunkPos, ChunkLight>,
}

impl LightStore {
    /// Creates an empty store for a world spanning `min_section..=max_section`, keeping
    /// `padding` extra light sections above and below.
    #[must_use]
    pub fn new(min_section: i32, max_section: i32, padding: i32) -> Self {
        Self {
            min_section,
            max_section,
            padding,
            chunks: FxHashMap::default(),
        }
    }

    /// Creates an empty store sized for channel `C`.
    #[must_use]
    pub fn for_channel<C: LightChannel>(min_section: i32, max_section: i32) -> Self {
        Self::new(min_section, max_section, C::SECTION_PADDING)
    }

    /// The lowest world section.
    #[must_use]
    pub fn min_section(&self) -> i32 {
        self.min_section
    }

    /// The highest world section.
    #[must_use]
    pub fn max_section(&self) -> i32 {
        self.max_section
    }

    /// The lowest section that stores light.
    #[must_use]
    pub fn min_light_section(&self) -> i32 {
        self.min_section - self.padding
    }

    /// The highest section that stores light.
    #[must_use]
    pub fn max_light_section(&self) -> i32 {
        self.max_section + self.padding
    }

    /// A fresh, dark chunk with an all-empty emptiness map.
    #[must_use]
    pub fn new_chunk_light(&self) -> ChunkLight {
        ChunkLight::new(
            self.min_light_section(),
            self.max_light_section(),
            EmptinessMap::new(self.min_section, self.max_section, self.padding),
        )
    }

    /// Returns the chunk's light, creating dark storage if it has none yet.
    pub fn insert_chunk(&mut self, pos: ChunkPos) -> &mut ChunkLight {
        let (min_section, max_section, padding) = (self.min_section, self.max_section, self.padding);
        self.chunks.entry(pos).or_insert_with(|| {
            ChunkLight::new(
                min_section - padding,
                max_section + padding,
                EmptinessMap::new(min_section, max_section, padding),
            )
        })
    }

    /// Drops a chunk's light, typically when the chunk unloads.
    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<ChunkLight> {
        self.chunks.remove(&pos)
    }

    /// Whether the chunk has stored light.
    #[must_use]
    pub fn contains_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// The chunk's light.
    #[must_use]
    #[inline]
    pub fn chunk(&self, pos: ChunkPos) -> Option<&ChunkLight> {
        self.chunks.get(&pos)
    }

    /// Mutable access to the chunk's light.
    #[inline]
    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut ChunkLight> {
        self.chunks.get_mut(&pos)
    }

    /// Positions of every chunk with stored light.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of chunks with stored light.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk has stored light.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The updater's light level at `pos`; 0 when nothing is stored there.
    #[must_use]
    pub fn light_level(&self, pos: BlockPos) -> u8 {
        self.chunk(pos.chunk_pos())
            .and_then(|chunk| chunk.light(pos))
            .unwrap_or(0)
    }

    /// The published light level at `pos`, as a reader thread would see it.
    #[must_use]
    pub fn visible_level(&self, pos: BlockPos) -> u8 {
        self.chunk(pos.chunk_pos())
            .map_or(0, |chunk| chunk.visible_light(pos))
    }

    /// A reader handle for one section.
    #[must_use]
    pub fn reader(&self, section: SectionPos) -> Option<SectionLightReader> {
        self.chunk(section.chunk())
            .and_then(|chunk| chunk.reader(section.y()))
    }

    /// Publishes the given sections. Returns those whose published state changed.
    pub fn publish(&mut self, sections: impl IntoIterator<Item = SectionPos>) -> Vec<SectionPos> {
        let mut published = Vec::new();
        for section in sections {
            let Some(light) = self
                .chunks
                .get_mut(&section.chunk())
                .and_then(|chunk| chunk.section_mut(section.y()))
            else {
                continue;
            };
            if light.update_visible() {
                published.push(section);
            }
        }
        published
    }
}
