//! Deferred particle spawning
//!
//! Modules cannot reach their system while it is ticking, so spawns issued
//! during a tick go through a shared queue instead. The system drains the
//! queue at the end of the tick, which means a particle spawned mid-tick is
//! first updated on the following tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;

use crate::error::{ParticleError, Result};

/// A spawn request waiting for the end of the tick
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSpawn {
    pub lifetime: u32,
    pub values: SmallVec<[f64; 16]>,
}

#[derive(Debug, Default)]
struct QueueState {
    /// Zero until the owning system is built
    record_length: usize,
    pending: Vec<PendingSpawn>,
}

/// Cloneable handle for queueing spawns into a system.
///
/// Handles taken from a builder become usable once the system is built.
#[derive(Debug, Clone, Default)]
pub struct SpawnQueue {
    state: Arc<Mutex<QueueState>>,
}

impl SpawnQueue {
    #[cfg(test)]
    fn new(record_length: usize) -> Self {
        let queue = Self::default();
        queue.set_record_length(record_length);
        queue
    }

    pub(crate) fn set_record_length(&self, record_length: usize) {
        self.lock().record_length = record_length;
    }

    /// Queue a particle for the end of the current (or next) tick.
    ///
    /// # Errors
    ///
    /// `Configuration` if `lifetime` is zero, `values` is longer than the
    /// system's record, or the system has not been built yet.
    pub fn push(&self, lifetime: u32, values: &[f64]) -> Result<()> {
        let mut state = self.lock();
        if state.record_length == 0 {
            return Err(ParticleError::configuration("spawn queue used before its system was built"));
        }
        validate_spawn(lifetime, values, state.record_length)?;
        state.pending.push(PendingSpawn {
            lifetime,
            values: values.iter().copied().collect(),
        });
        Ok(())
    }

    /// Number of queued spawns
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub(crate) fn drain(&self) -> Vec<PendingSpawn> {
        std::mem::take(&mut self.lock().pending)
    }

    pub(crate) fn clear(&self) {
        self.lock().pending.clear();
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The queue holds plain data, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check a spawn request against a record layout.
pub(crate) fn validate_spawn(lifetime: u32, values: &[f64], record_length: usize) -> Result<()> {
    if lifetime == 0 {
        return Err(ParticleError::configuration("particle lifetime must be at least one tick"));
    }
    if values.len() > record_length {
        return Err(ParticleError::configuration(format!(
            "{} initial values given for a record of {record_length}",
            values.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain() {
        let queue = SpawnQueue::new(3);
        let handle = queue.clone();

        handle.push(5, &[1.0, 2.0]).unwrap();
        assert_eq!(queue.len(), 1);

        let drained = queue.drain();
        assert_eq!(drained[0].lifetime, 5);
        assert_eq!(drained[0].values.as_slice(), &[1.0, 2.0]);
        assert!(handle.is_empty());
    }

    #[test]
    fn test_push_validates() {
        let queue = SpawnQueue::new(2);

        assert!(matches!(
            queue.push(0, &[]),
            Err(ParticleError::Configuration(_))
        ));
        assert!(matches!(
            queue.push(1, &[1.0, 2.0, 3.0]),
            Err(ParticleError::Configuration(_))
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unbuilt_queue_refuses_spawns() {
        let queue = SpawnQueue::default();
        assert!(queue.push(1, &[]).is_err());

        queue.set_record_length(1);
        assert!(queue.push(1, &[]).is_ok());
    }
}
