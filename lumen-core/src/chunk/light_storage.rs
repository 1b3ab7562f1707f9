//! Light storage for chunk sections.
//!
//! Light values are stored as 4-bit values (0-15), packed as two values per byte.
//! For a 16x16x16 section, this requires 2048 bytes (4096 blocks / 2).
//!
//! Each section has one writer (the light updater) and any number of readers. The writer
//! works on its own copy of the array; readers only ever see arrays published by
//! [`SwmrNibbleArray::update_visible`], which swaps the whole array atomically.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// The number of bytes needed to store light data for a 16x16x16 section.
/// 16*16*16 blocks = 4096 blocks, at 4 bits per block = 2048 bytes
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// Packed 4-bit light levels for one section, indexed `y * 256 + z * 16 + x`.
#[derive(Clone, PartialEq, Eq)]
pub struct NibbleArray(Box<[u8; LIGHT_ARRAY_SIZE]>);

impl NibbleArray {
    /// Creates an all-dark array.
    #[must_use]
    pub fn new() -> Self {
        Self(Box::new([0; LIGHT_ARRAY_SIZE]))
    }

    /// Creates an array with every voxel at `light_level`.
    #[must_use]
    pub fn new_filled(light_level: u8) -> Self {
        debug_assert!(light_level <= 15, "Light level must be 0-15");
        let packed = (light_level & 0x0F) | ((light_level & 0x0F) << 4);
        Self(Box::new([packed; LIGHT_ARRAY_SIZE]))
    }

    /// The section-local index of a voxel.
    #[must_use]
    #[inline]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        y * 256 + z * 16 + x
    }

    /// Gets the light level at a section-local index.
    #[must_use]
    #[inline]
    pub fn get_index(&self, block_index: usize) -> u8 {
        let byte = self.0[block_index >> 1];
        if block_index & 1 == 1 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }

    /// Sets the light level at a section-local index.
    #[inline]
    pub fn set_index(&mut self, block_index: usize, light_level: u8) {
        debug_assert!(light_level <= 15, "Light level must be 0-15");
        let byte = &mut self.0[block_index >> 1];
        if block_index & 1 == 1 {
            *byte = (*byte & 0x0F) | ((light_level & 0x0F) << 4);
        } else {
            *byte = (*byte & 0xF0) | (light_level & 0x0F);
        }
    }

    /// Gets the light level at the given position.
    ///
    /// # Arguments
    /// * `x` - X coordinate (0-15)
    /// * `y` - Y coordinate (0-15)
    /// * `z` - Z coordinate (0-15)
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        self.get_index(Self::index(x, y, z))
    }

    /// Sets the light level at the given position.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, light_level: u8) {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        self.set_index(Self::index(x, y, z), light_level);
    }

    /// Whether every voxel is dark.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// The raw packed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; LIGHT_ARRAY_SIZE] {
        &self.0
    }
}

impl Default for NibbleArray {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NibbleArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = (0..4096).filter(|i| self.get_index(*i) != 0).count();
        f.debug_struct("NibbleArray").field("lit", &lit).finish()
    }
}

/// Updater-side lifecycle of a section's light.
#[derive(Debug, Clone)]
pub enum SectionState {
    /// No array: every voxel is dark.
    Absent,
    /// The section owns an array that is published to readers.
    Present(Arc<NibbleArray>),
    /// The section keeps its array for the updater but publishes nothing.
    Hidden(Arc<NibbleArray>),
}

/// Single-writer, multi-reader light for one section.
#[derive(Debug)]
pub struct SwmrNibbleArray {
    updating: SectionState,
    dirty: bool,
    visible: Arc<ArcSwapOption<NibbleArray>>,
}

impl SwmrNibbleArray {
    /// Creates an absent section.
    #[must_use]
    pub fn new() -> Self {
        Self {
            updating: SectionState::Absent,
            dirty: false,
            visible: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Whether the section holds a published array.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self.updating, SectionState::Present(_))
    }

    /// Whether the section is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self.updating, SectionState::Hidden(_))
    }

    /// Whether the section holds an array at all, hidden or not.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !matches!(self.updating, SectionState::Absent)
    }

    /// Whether there are changes that have not been published yet.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads the updater's view of a voxel.
    #[must_use]
    #[inline]
    pub fn get_updating(&self, block_index: usize) -> u8 {
        match &self.updating {
            SectionState::Absent => 0,
            SectionState::Present(array) | SectionState::Hidden(array) => {
                array.get_index(block_index)
            }
        }
    }

    /// Writes the updater's view of a voxel.
    ///
    /// The first write after a publication copies the array, later writes in the same
    /// cycle reuse the copy. Writing zero into an absent section allocates nothing.
    #[inline]
    pub fn set_updating(&mut self, block_index: usize, light_level: u8) {
        if matches!(self.updating, SectionState::Absent) {
            if light_level == 0 {
                return;
            }
            self.updating = SectionState::Present(Arc::new(NibbleArray::new()));
        }
        if let SectionState::Present(array) | SectionState::Hidden(array) = &mut self.updating {
            Arc::make_mut(array).set_index(block_index, light_level);
            self.dirty = true;
        }
    }

    /// Replaces the section's array; `None` makes the section absent.
    pub fn set_array(&mut self, array: Option<NibbleArray>) {
        self.updating = match array {
            Some(array) => SectionState::Present(Arc::new(array)),
            None => SectionState::Absent,
        };
        self.dirty = true;
    }

    /// Hides a present section, keeping its data for the updater.
    pub fn hide(&mut self) -> bool {
        match std::mem::replace(&mut self.updating, SectionState::Absent) {
            SectionState::Present(array) => {
                self.updating = SectionState::Hidden(array);
                self.dirty = true;
                true
            }
            other => {
                self.updating = other;
                false
            }
        }
    }

    /// Makes a hidden section present again.
    pub fn unhide(&mut self) -> bool {
        match std::mem::replace(&mut self.updating, SectionState::Absent) {
            SectionState::Hidden(array) => {
                self.updating = SectionState::Present(array);
                self.dirty = true;
                true
            }
            other => {
                self.updating = other;
                false
            }
        }
    }

    /// Publishes the updater's state to readers with one atomic swap.
    ///
    /// Returns whether anything was published.
    pub fn update_visible(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let published = match &self.updating {
            SectionState::Present(array) => Some(Arc::clone(array)),
            SectionState::Absent | SectionState::Hidden(_) => None,
        };
        self.visible.store(published);
        self.dirty = false;
        true
    }

    /// Reads the published view of a voxel.
    #[must_use]
    pub fn get_visible(&self, block_index: usize) -> u8 {
        self.visible
            .load()
            .as_ref()
            .map_or(0, |array| array.get_index(block_index))
    }

    /// A handle readers on other threads can use.
    #[must_use]
    pub fn reader(&self) -> SectionLightReader {
        SectionLightReader {
            visible: Arc::clone(&self.visible),
        }
    }
}

impl Default for SwmrNibbleArray {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle to a section's published light.
#[derive(Debug, Clone)]
pub struct SectionLightReader {
    visible: Arc<ArcSwapOption<NibbleArray>>,
}

impl SectionLightReader {
    /// Gets the published light level at the given section-local position.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.visible
            .load()
            .as_ref()
            .map_or(0, |array| array.get(x, y, z))
    }

    /// The currently published array. The snapshot never changes after it is taken.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<NibbleArray>> {
        self.visible.load_full()
    }
}
