//! Flat particle storage with slot reuse
//!
//! Every particle is a fixed-length run of `f64`s inside one contiguous
//! buffer. Slots of expired particles go onto a free list and are reused
//! before the buffer grows, so spawning does not allocate once the pool has
//! warmed up.
//!
//! Records never move. The order in which particles are visited lives in a
//! separate side table, which global modules (depth sorting) may reorder.
//!
//! # Performance Characteristics
//!
//! | Operation        | Time Complexity |
//! |------------------|-----------------|
//! | `acquire`        | O(1) amortized  |
//! | `expire`         | O(n)            |
//! | `record`         | O(1)            |
//! | `sort_render_order_by_key` | O(n log n) |

use crate::error::Result;

// ============================================================================
// Particle Id
// ============================================================================

/// Slot index of a live particle.
///
/// The id stays valid until the particle expires or the pool is cleared;
/// afterwards the slot may be handed to a new particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(usize);

impl ParticleId {
    /// Get the raw slot index.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

// ============================================================================
// Slot State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Live particle with its remaining lifetime in ticks
    Occupied(u32),
    /// Free slot pointing at the next free slot (or `NONE`)
    Vacant(usize),
}

/// Direction for [`ParticlePool::sort_render_order_by_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest key first
    Ascending,
    /// Largest key first
    Descending,
}

// ============================================================================
// Particle Pool
// ============================================================================

/// Storage for the live particles of one system.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    record_length: usize,
    /// `slots.len() * record_length` values
    data: Vec<f64>,
    slots: Vec<Slot>,
    /// Head of the free list, or `NONE`
    free_head: usize,
    /// Live slots in traversal order
    order: Vec<ParticleId>,
}

impl ParticlePool {
    const NONE: usize = usize::MAX;

    /// Create an empty pool of records with `record_length` values each.
    #[must_use]
    pub fn new(record_length: usize) -> Self {
        Self::with_capacity(record_length, 0)
    }

    /// Create a pool with room for `capacity` particles before reallocating.
    ///
    /// # Panics
    ///
    /// If `capacity * record_length` values cannot be allocated.
    #[must_use]
    pub fn with_capacity(record_length: usize, capacity: usize) -> Self {
        Self {
            record_length,
            data: Vec::with_capacity(capacity * record_length),
            slots: Vec::with_capacity(capacity),
            free_head: Self::NONE,
            order: Vec::with_capacity(capacity),
        }
    }

    /// Values per particle record.
    #[must_use]
    #[inline]
    pub const fn record_length(&self) -> usize {
        self.record_length
    }

    /// Number of live particles.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the pool has no live particles.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Allocated slots, live or free.
    #[must_use]
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Store a new particle and append it to the traversal order.
    ///
    /// The record is zeroed and `values` is copied to its start. Callers
    /// ensure `values.len() <= record_length` and `lifetime > 0`.
    pub(crate) fn acquire(&mut self, lifetime: u32, values: &[f64]) -> ParticleId {
        let index = if self.free_head != Self::NONE {
            // Reuse a free slot
            let index = self.free_head;
            if let Slot::Vacant(next) = self.slots[index] {
                self.free_head = next;
            }
            self.slots[index] = Slot::Occupied(lifetime);
            index
        } else {
            // Allocate new slot
            let index = self.slots.len();
            self.slots.push(Slot::Occupied(lifetime));
            self.data.resize(self.data.len() + self.record_length, 0.0);
            index
        };

        let range = self.range(index);
        let record = &mut self.data[range];
        record.fill(0.0);
        record[..values.len()].copy_from_slice(values);

        let id = ParticleId(index);
        self.order.push(id);
        id
    }

    /// Count down every lifetime by one tick and free particles that reach
    /// zero. Returns how many expired.
    ///
    /// The traversal order of the survivors is unchanged.
    pub(crate) fn expire(&mut self) -> usize {
        let before = self.order.len();
        let slots = &mut self.slots;
        let free_head = &mut self.free_head;

        self.order.retain(|id| {
            let slot = &mut slots[id.0];
            let Slot::Occupied(remaining) = slot else {
                return false;
            };
            *remaining = remaining.saturating_sub(1);
            if *remaining > 0 {
                return true;
            }
            *slot = Slot::Vacant(*free_head);
            *free_head = id.0;
            false
        });

        before - self.order.len()
    }

    /// Remove every particle, keeping allocated memory.
    pub fn clear(&mut self) {
        self.data.clear();
        self.slots.clear();
        self.order.clear();
        self.free_head = Self::NONE;
    }

    /// Live particles in traversal order.
    #[must_use]
    pub fn live_particles(&self) -> &[ParticleId] {
        &self.order
    }

    /// Whether `id` refers to a live particle.
    #[must_use]
    pub fn is_alive(&self, id: ParticleId) -> bool {
        matches!(self.slots.get(id.0), Some(Slot::Occupied(_)))
    }

    /// Ticks left before `id` expires.
    #[must_use]
    pub fn remaining_lifetime(&self, id: ParticleId) -> Option<u32> {
        match self.slots.get(id.0) {
            Some(Slot::Occupied(remaining)) => Some(*remaining),
            _ => None,
        }
    }

    /// The record of a live particle.
    #[must_use]
    pub fn record(&self, id: ParticleId) -> Option<&[f64]> {
        self.is_alive(id).then(|| &self.data[self.range(id.0)])
    }

    /// The mutable record of a live particle.
    pub fn record_mut(&mut self, id: ParticleId) -> Option<&mut [f64]> {
        if !self.is_alive(id) {
            return None;
        }
        let range = self.range(id.0);
        Some(&mut self.data[range])
    }

    /// Iterate over live records in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.order.iter().map(|id| &self.data[self.range(id.0)])
    }

    /// Run `f` on every live record in traversal order, stopping at the first
    /// error.
    pub fn try_for_each_mut(&mut self, mut f: impl FnMut(&mut [f64]) -> Result<()>) -> Result<()> {
        let len = self.record_length;
        for id in &self.order {
            let start = id.0 * len;
            f(&mut self.data[start..start + len])?;
        }
        Ok(())
    }

    /// Stably reorder traversal by a key computed once per particle.
    ///
    /// Particles with equal keys keep their relative order. Records are not
    /// moved.
    pub fn sort_render_order_by_key(
        &mut self,
        mut key: impl FnMut(&[f64]) -> Result<f64>,
        order: SortOrder,
    ) -> Result<()> {
        let mut keyed = Vec::with_capacity(self.order.len());
        for &id in &self.order {
            keyed.push((key(&self.data[self.range(id.0)])?, id));
        }

        match order {
            SortOrder::Ascending => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
            SortOrder::Descending => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }

        self.order.clear();
        self.order.extend(keyed.into_iter().map(|(_, id)| id));
        Ok(())
    }

    #[inline]
    fn range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.record_length;
        start..start + self.record_length
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_writes_prefix_and_zeroes_rest() {
        let mut pool = ParticlePool::new(4);
        let id = pool.acquire(10, &[1.0, 2.0]);

        assert_eq!(pool.record(id).unwrap(), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(pool.remaining_lifetime(id), Some(10));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_expire_counts_down() {
        let mut pool = ParticlePool::new(1);
        let short = pool.acquire(1, &[1.0]);
        let long = pool.acquire(3, &[2.0]);

        assert_eq!(pool.expire(), 1);
        assert!(!pool.is_alive(short));
        assert_eq!(pool.remaining_lifetime(long), Some(2));

        assert_eq!(pool.expire(), 0);
        assert_eq!(pool.expire(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_reuse_slot_and_reset_record() {
        let mut pool = ParticlePool::new(2);
        let first = pool.acquire(1, &[5.0, 6.0]);
        pool.expire();

        let second = pool.acquire(4, &[7.0]);
        assert_eq!(first.raw(), second.raw(), "Should reuse the same slot");
        assert_eq!(pool.record(second).unwrap(), &[7.0, 0.0]);
        assert_eq!(pool.slot_count(), 1);
    }

    #[test]
    fn test_free_list_order() {
        let mut pool = ParticlePool::new(1);
        pool.acquire(2, &[0.0]);
        pool.acquire(1, &[1.0]);
        pool.acquire(1, &[2.0]);
        pool.expire();

        // Slots 1 then 2 were freed, so 2 comes back first
        assert_eq!(pool.acquire(1, &[]).raw(), 2);
        assert_eq!(pool.acquire(1, &[]).raw(), 1);
        assert_eq!(pool.acquire(1, &[]).raw(), 3);
    }

    #[test]
    fn test_traversal_keeps_insertion_order() {
        let mut pool = ParticlePool::new(1);
        pool.acquire(5, &[1.0]);
        pool.acquire(1, &[2.0]);
        pool.acquire(5, &[3.0]);
        pool.expire();
        pool.acquire(5, &[4.0]);

        let values: Vec<f64> = pool.iter().map(|r| r[0]).collect();
        assert_eq!(values, vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut pool = ParticlePool::new(2);
        pool.acquire(5, &[1.0, 0.0]);
        pool.acquire(5, &[3.0, 1.0]);
        pool.acquire(5, &[1.0, 2.0]);

        pool.sort_render_order_by_key(|r| Ok(r[0]), SortOrder::Descending)
            .unwrap();
        let tags: Vec<f64> = pool.iter().map(|r| r[1]).collect();
        assert_eq!(tags, vec![1.0, 0.0, 2.0]);

        pool.sort_render_order_by_key(|r| Ok(r[0]), SortOrder::Ascending)
            .unwrap();
        let tags: Vec<f64> = pool.iter().map(|r| r[1]).collect();
        assert_eq!(tags, vec![0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_try_for_each_mut() {
        let mut pool = ParticlePool::new(1);
        let a = pool.acquire(5, &[1.0]);
        let b = pool.acquire(5, &[2.0]);

        pool.try_for_each_mut(|r| {
            r[0] *= 10.0;
            Ok(())
        })
        .unwrap();

        assert_eq!(pool.record(a).unwrap(), &[10.0]);
        assert_eq!(pool.record(b).unwrap(), &[20.0]);
    }

    #[test]
    fn test_clear() {
        let mut pool = ParticlePool::with_capacity(3, 8);
        let id = pool.acquire(5, &[1.0]);
        pool.clear();

        assert!(pool.is_empty());
        assert!(pool.record(id).is_none());
        assert_eq!(pool.slot_count(), 0);
    }
}
