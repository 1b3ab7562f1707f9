//! Block states and the light properties they carry.

use lumen_utils::BlockStateId;
use rustc_hash::FxHashMap;

use crate::chunk::{
    light_engine::direction::DirectionSet,
    material::MaterialSample,
};

/// A registered block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// The block's name, unique within a registry.
    pub name: &'static str,
    /// How the block interacts with light.
    pub material: MaterialSample,
}

/// Empty space.
pub const AIR: BlockEntry = BlockEntry {
    name: "air",
    material: MaterialSample::AIR,
};

/// Fully opaque, no emission.
pub const STONE: BlockEntry = BlockEntry {
    name: "stone",
    material: MaterialSample::opaque(0),
};

/// Transparent, light passes as through air.
pub const GLASS: BlockEntry = BlockEntry {
    name: "glass",
    material: MaterialSample::translucent(0, 0),
};

/// Costs two levels to enter.
pub const WATER: BlockEntry = BlockEntry {
    name: "water",
    material: MaterialSample::translucent(0, 2),
};

/// Emits 14.
pub const TORCH: BlockEntry = BlockEntry {
    name: "torch",
    material: MaterialSample::translucent(14, 0),
};

/// Emits 10.
pub const SOUL_TORCH: BlockEntry = BlockEntry {
    name: "soul_torch",
    material: MaterialSample::translucent(10, 0),
};

/// Fully opaque, emits 15.
pub const GLOWSTONE: BlockEntry = BlockEntry {
    name: "glowstone",
    material: MaterialSample::opaque(15),
};

/// Emits 15.
pub const LANTERN: BlockEntry = BlockEntry {
    name: "lantern",
    material: MaterialSample::translucent(15, 0),
};

/// Occludes only its bottom face.
pub const BOTTOM_SLAB: BlockEntry = BlockEntry {
    name: "bottom_slab",
    material: MaterialSample::new(0, 0, DirectionSet::DOWN),
};

/// Occludes only its top face.
pub const TOP_SLAB: BlockEntry = BlockEntry {
    name: "top_slab",
    material: MaterialSample::new(0, 0, DirectionSet::UP),
};

/// The blocks every default registry starts with, in id order.
pub const DEFAULT_BLOCKS: [BlockEntry; 10] = [
    AIR,
    STONE,
    GLASS,
    WATER,
    TORCH,
    SOUL_TORCH,
    GLOWSTONE,
    LANTERN,
    BOTTOM_SLAB,
    TOP_SLAB,
];

/// Maps block state ids to their entries. Id 0 is always air.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    by_id: Vec<BlockEntry>,
    by_name: FxHashMap<&'static str, BlockStateId>,
}

impl BlockRegistry {
    /// Creates a registry holding only air.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            by_id: Vec::new(),
            by_name: FxHashMap::default(),
        };
        registry.register(AIR);
        registry
    }

    /// Registers a block and returns its id. Registering a name twice returns the
    /// existing id.
    pub fn register(&mut self, entry: BlockEntry) -> BlockStateId {
        if let Some(id) = self.by_name.get(entry.name) {
            return *id;
        }
        let id = BlockStateId(self.by_id.len() as u16);
        self.by_name.insert(entry.name, id);
        self.by_id.push(entry);
        id
    }

    /// The entry for `id`.
    #[must_use]
    #[inline]
    pub fn get(&self, id: BlockStateId) -> Option<&BlockEntry> {
        self.by_id.get(usize::from(id.0))
    }

    /// The id registered under `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<BlockStateId> {
        self.by_name.get(name).copied()
    }

    /// The light properties of `id`, `None` for unknown ids.
    #[must_use]
    #[inline]
    pub fn material(&self, id: BlockStateId) -> Option<MaterialSample> {
        self.get(id).map(|entry| entry.material)
    }

    /// Ids of every registered block with a nonzero emission.
    pub fn emissive(&self) -> impl Iterator<Item = BlockStateId> + '_ {
        self.iter()
            .filter(|(_, entry)| entry.material.raw_emission() != 0)
            .map(|(id, _)| id)
    }

    /// Iterates `(id, entry)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockStateId, &BlockEntry)> {
        self.by_id
            .iter()
            .enumerate()
            .map(|(index, entry)| (BlockStateId(index as u16), entry))
    }

    /// Number of registered blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Always false, air is registered on creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for entry in DEFAULT_BLOCKS {
            registry.register(entry);
        }
        registry
    }
}
