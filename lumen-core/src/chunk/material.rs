//! Light-relevant properties of a block, sampled once per voxel visit.

use super::light_engine::direction::{Direction, DirectionSet};

/// Immutable per-voxel view of a block's light behaviour.
///
/// A fully opaque block (opacity 15) never lets light in, so it carries no face set.
/// A block with a non-empty face set is *conditionally opaque*: light may cross some of
/// its faces but not others, and propagation has to test the face it crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialSample {
    emission: u8,
    opacity: u8,
    occluding_faces: DirectionSet,
}

impl MaterialSample {
    /// Air: no emission, no opacity, no occluding faces.
    pub const AIR: Self = Self::new(0, 0, DirectionSet::empty());

    /// Creates a sample. Face sets of fully opaque blocks are dropped.
    #[must_use]
    pub const fn new(emission: u8, opacity: u8, occluding_faces: DirectionSet) -> Self {
        let opacity = if opacity > 15 { 15 } else { opacity };
        let occluding_faces = if opacity >= 15 {
            DirectionSet::empty()
        } else {
            occluding_faces
        };
        Self {
            emission,
            opacity,
            occluding_faces,
        }
    }

    /// A block light cannot enter from any side.
    #[must_use]
    pub const fn opaque(emission: u8) -> Self {
        Self::new(emission, 15, DirectionSet::empty())
    }

    /// A block that attenuates light uniformly from every side.
    #[must_use]
    pub const fn translucent(emission: u8, opacity: u8) -> Self {
        Self::new(emission, opacity, DirectionSet::empty())
    }

    /// The emitted level masked to one light channel.
    #[must_use]
    #[inline]
    pub const fn emission(self, mask: u8) -> u8 {
        self.emission & mask
    }

    /// The unmasked emission value.
    #[must_use]
    pub const fn raw_emission(self) -> u8 {
        self.emission
    }

    /// Opacity, 0 (transparent) to 15 (fully opaque).
    #[must_use]
    #[inline]
    pub const fn opacity(self) -> u8 {
        self.opacity
    }

    /// Levels lost when light enters this block. Entering any block costs at least one level.
    #[must_use]
    #[inline]
    pub const fn attenuation(self) -> u8 {
        if self.opacity == 0 { 1 } else { self.opacity }
    }

    /// Whether the face on side `dir` of this block fully blocks light.
    #[must_use]
    #[inline]
    pub const fn occludes_face(self, dir: Direction) -> bool {
        self.occluding_faces.has(dir)
    }

    /// The faces that fully block light.
    #[must_use]
    pub const fn occluding_faces(self) -> DirectionSet {
        self.occluding_faces
    }

    /// Whether light crossing this block depends on the side it crosses.
    #[must_use]
    #[inline]
    pub const fn is_conditionally_opaque(self) -> bool {
        !self.occluding_faces.is_empty()
    }

    /// Whether nothing can ever propagate into this block.
    #[must_use]
    pub const fn is_fully_opaque(self) -> bool {
        self.opacity >= 15
    }
}

impl Default for MaterialSample {
    fn default() -> Self {
        Self::AIR
    }
}
