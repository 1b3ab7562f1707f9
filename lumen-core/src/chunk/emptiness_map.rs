//! Per-chunk cache of which sections hold no light-affecting blocks.

/// One flag per light section of a chunk, `true` when the section holds only air.
///
/// Indexed by section y. Padding sections above and below the world are always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptinessMap {
    min_light_section: i32,
    min_section: i32,
    max_section: i32,
    flags: Box<[bool]>,
}

impl EmptinessMap {
    /// Creates a map with every section empty.
    ///
    /// `min_section..=max_section` are the world's sections, `padding` extra sections are
    /// tracked above and below them.
    #[must_use]
    pub fn new(min_section: i32, max_section: i32, padding: i32) -> Self {
        let min_light_section = min_section - padding;
        let count = (max_section - min_section + 1 + 2 * padding).max(0) as usize;
        Self {
            min_light_section,
            min_section,
            max_section,
            flags: vec![true; count].into_boxed_slice(),
        }
    }

    fn slot(&self, section_y: i32) -> Option<usize> {
        let index = usize::try_from(section_y - self.min_light_section).ok()?;
        (index < self.flags.len()).then_some(index)
    }

    /// Whether the section at `section_y` is empty. Sections outside the map are empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self, section_y: i32) -> bool {
        self.slot(section_y).is_none_or(|index| self.flags[index])
    }

    /// Updates a world section's flag and returns whether it changed.
    ///
    /// Padding sections cannot be marked non-empty.
    pub fn set(&mut self, section_y: i32, empty: bool) -> bool {
        if section_y < self.min_section || section_y > self.max_section {
            return false;
        }
        let Some(index) = self.slot(section_y) else {
            return false;
        };
        let changed = self.flags[index] != empty;
        self.flags[index] = empty;
        changed
    }

    /// Whether every section is empty.
    #[must_use]
    pub fn all_empty(&self) -> bool {
        self.flags.iter().all(|empty| *empty)
    }

    /// Section y coordinates of non-empty sections, bottom to top.
    pub fn non_empty_sections(&self) -> impl Iterator<Item = i32> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, empty)| !**empty)
            .map(|(index, _)| self.min_light_section + index as i32)
    }
}
