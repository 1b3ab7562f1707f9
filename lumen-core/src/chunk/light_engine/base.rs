//! Base light engine for flood-fill light propagation.

use std::marker::PhantomData;

use lumen_utils::BlockPos;

use super::{
    access::LightChunkAccess,
    channel::LightChannel,
    direction::Direction,
    light_queue::LightQueue,
    queue_entry::{EncodeOrigin, QueueEntry},
};

/// Base light engine that handles light propagation using a flood-fill algorithm.
///
/// This structure maintains two FIFO queues for light propagation:
/// - `increase_queue`: Processes light additions/increases
/// - `decrease_queue`: Processes light removals/decreases
///
/// A run processes all decrease operations first, which removes light that lost its
/// source and queues re-propagation for voxels that are still lit by something else,
/// then all increase operations.
///
/// Every queued position is encoded relative to the engine's current [`EncodeOrigin`],
/// which is set once at the start of a run.
#[derive(Debug)]
pub struct LightEngine<C: LightChannel> {
    /// Queue for light increase operations.
    increase_queue: LightQueue,
    /// Queue for light decrease operations.
    decrease_queue: LightQueue,
    origin: EncodeOrigin,
    increases_processed: u64,
    decreases_processed: u64,
    channel: PhantomData<C>,
}

impl<C: LightChannel> LightEngine<C> {
    /// Creates a new light engine with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self {
            increase_queue: LightQueue::new(),
            decrease_queue: LightQueue::new(),
            origin: EncodeOrigin::default(),
            increases_processed: 0,
            decreases_processed: 0,
            channel: PhantomData,
        }
    }

    /// The origin queued positions are currently encoded against.
    #[must_use]
    pub fn origin(&self) -> EncodeOrigin {
        self.origin
    }

    /// Sets the encode origin for the next run. The queues must be empty.
    pub fn set_origin(&mut self, origin: EncodeOrigin) {
        debug_assert!(!self.has_work(), "origin changed with queued entries");
        self.origin = origin;
    }

    /// Enqueues a light increase.
    pub fn enqueue_increase(&mut self, entry: QueueEntry) {
        self.increase_queue.enqueue(entry);
    }

    /// Enqueues a light decrease.
    pub fn enqueue_decrease(&mut self, entry: QueueEntry) {
        self.decrease_queue.enqueue(entry);
    }

    /// Checks if there are any pending light updates.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.increase_queue.is_empty() || !self.decrease_queue.is_empty()
    }

    /// Returns and resets the number of increase and decrease entries processed.
    pub fn take_processed_counts(&mut self) -> (u64, u64) {
        let counts = (self.increases_processed, self.decreases_processed);
        self.increases_processed = 0;
        self.decreases_processed = 0;
        counts
    }

    /// Floods light outward from every queued increase entry until the queue is empty.
    ///
    /// An entry means "this voxel holds the entry's level". Each neighbour it reaches
    /// through an open face is raised to `level - max(1, opacity)` when that is brighter
    /// than what it holds, and continues the flood if it can still light anything.
    pub fn perform_light_increase<A: LightChunkAccess + ?Sized>(&mut self, access: &mut A) {
        let origin = self.origin;
        while let Some(entry) = self.increase_queue.dequeue() {
            self.increases_processed += 1;

            let level = entry.level();
            if level == 0 {
                continue;
            }
            let pos = entry.pos(origin);
            if entry.is_recheck() && access.light(pos) != Some(level) {
                // Lowered or raised since it was queued
                continue;
            }

            let from = if entry.is_sided() {
                access.material(pos)
            } else {
                None
            };

            for dir in entry.directions().directions() {
                if from.is_some_and(|material| material.occludes_face(dir)) {
                    continue;
                }
                let neighbour = dir.relative(pos);
                let Some(current) = access.light(neighbour) else {
                    continue;
                };
                if current + 1 >= level {
                    continue;
                }
                let Some(material) = access.material(neighbour) else {
                    continue;
                };
                if material.occludes_face(dir.opposite()) {
                    continue;
                }
                let target = level.saturating_sub(material.attenuation());
                if target <= current {
                    continue;
                }

                access.set_light(neighbour, target);
                if target > 1 {
                    self.increase_queue
                        .enqueue(QueueEntry::increase_skip_one_direction(
                            origin,
                            neighbour,
                            target,
                            material.is_conditionally_opaque(),
                            dir.opposite(),
                        ));
                }
            }
        }
    }

    /// Removes light that was propagated from the queued decrease entries, then runs
    /// [`Self::perform_light_increase`].
    ///
    /// A decrease entry at level `L` looks at each neighbour `n` it can reach and compares
    /// `n`'s level with `L - max(1, opacity(n))`:
    /// - equal: `n` was lit through the retracted light, so it falls back to its own
    ///   emission and the decrease continues from `n`.
    /// - higher: `n` is lit by something else. It keeps its level and is queued to
    ///   re-propagate it, which re-lights whatever the decrease darkens around it.
    /// - lower: the entry is stale for `n`, which is left alone.
    pub fn perform_light_decrease<A: LightChunkAccess + ?Sized>(&mut self, access: &mut A) {
        let origin = self.origin;
        while let Some(entry) = self.decrease_queue.dequeue() {
            self.decreases_processed += 1;

            let pos = entry.pos(origin);
            let level = entry.level();
            let from = if entry.is_sided() {
                access.material(pos)
            } else {
                None
            };

            for dir in entry.directions().directions() {
                if from.is_some_and(|material| material.occludes_face(dir)) {
                    continue;
                }
                let neighbour = dir.relative(pos);
                let Some(current) = access.light(neighbour) else {
                    continue;
                };
                if current == 0 {
                    continue;
                }
                let Some(material) = access.material(neighbour) else {
                    continue;
                };
                if material.occludes_face(dir.opposite()) {
                    continue;
                }
                let sided = material.is_conditionally_opaque();
                let target = level.saturating_sub(material.attenuation());

                if current < target {
                    continue;
                }
                if current > target {
                    self.increase_queue.enqueue(QueueEntry::recheck_all_directions(
                        origin, neighbour, current, sided,
                    ));
                    continue;
                }

                let emitted = C::emitted_level(material);
                if emitted != 0 {
                    self.increase_queue.enqueue(QueueEntry::increase_from_emission(
                        origin, neighbour, emitted, sided,
                    ));
                }
                access.set_light(neighbour, emitted);
                self.decrease_queue
                    .enqueue(QueueEntry::decrease_skip_one_direction(
                        origin,
                        neighbour,
                        target,
                        sided,
                        dir.opposite(),
                    ));
            }
        }

        self.perform_light_increase(access);
    }

    /// The level `pos` should hold given its emission and its neighbours' current levels.
    ///
    /// Stops early once the result exceeds `expect`, so callers comparing against the
    /// stored level get a cheap "differs" answer. Positions without usable light report
    /// `expect`.
    pub fn calculate_light_value<A: LightChunkAccess + ?Sized>(
        &self,
        access: &A,
        pos: BlockPos,
        expect: u8,
    ) -> u8 {
        let Some(center) = access.material(pos) else {
            return expect;
        };
        let mut level = C::emitted_level(center);
        if level >= 14 || level > expect || center.is_fully_opaque() {
            return level;
        }
        let attenuation = center.attenuation();

        for dir in Direction::ALL {
            let neighbour = dir.relative(pos);
            let Some(neighbour_level) = access.light(neighbour) else {
                continue;
            };
            let calculated = neighbour_level.saturating_sub(attenuation);
            if calculated <= level {
                continue;
            }
            if center.occludes_face(dir) {
                continue;
            }
            if access
                .material(neighbour)
                .is_some_and(|material| material.occludes_face(dir.opposite()))
            {
                continue;
            }
            level = calculated;
            if level > expect {
                return level;
            }
        }

        level
    }
}

impl<C: LightChannel> Default for LightEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}
