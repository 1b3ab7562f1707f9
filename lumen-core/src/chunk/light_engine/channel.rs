//! Light channels: the per-channel rules a [`LightEngine`](super::LightEngine) is parameterized by.

use lumen_utils::{BlockPos, ChunkPos};

use super::access::LightChunkGetter;
use crate::chunk::material::MaterialSample;

/// The capability set that distinguishes one light channel from another.
///
/// The propagation algorithm is shared; a channel only decides which bits of a block's
/// emission it reads, how many light sections it keeps outside the world, and where its
/// sources come from.
pub trait LightChannel: Send + Sync + 'static {
    /// Name used in log output.
    const NAME: &'static str;

    /// Bits of a block's raw emission that belong to this channel.
    const EMISSION_MASK: u8;

    /// Light sections kept above and below the world's sections.
    const SECTION_PADDING: i32;

    /// The level `material` emits on this channel.
    #[must_use]
    #[inline]
    fn emitted_level(material: MaterialSample) -> u8 {
        material.emission(Self::EMISSION_MASK)
    }

    /// Candidate source positions for initial lighting of `chunk`.
    fn sources<'a, G: LightChunkGetter + ?Sized>(
        getter: &'a G,
        chunk: ChunkPos,
    ) -> Box<dyn Iterator<Item = BlockPos> + 'a>;
}

/// Block light: emitted by blocks such as torches, flooded in every direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLight;

impl LightChannel for BlockLight {
    const NAME: &'static str = "block";
    const EMISSION_MASK: u8 = 0x0F;
    const SECTION_PADDING: i32 = 1;

    fn sources<'a, G: LightChunkGetter + ?Sized>(
        getter: &'a G,
        chunk: ChunkPos,
    ) -> Box<dyn Iterator<Item = BlockPos> + 'a> {
        getter.light_sources(chunk)
    }
}
