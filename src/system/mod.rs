//! Particle systems
//!
//! A [`ParticleSystem`] owns a [`ParticlePool`] and the modules that drive it.
//! Systems are wired once through [`ParticleSystemBuilder`]:
//!
//! ```ignore
//! let mut builder = ParticleSystem::builder();
//! let position = builder.bind_named("position", 3);
//! let velocity = builder.bind_named("velocity", 3);
//! builder.add_update_module(VelocityUpdateModule::new(position, velocity, None)?);
//! let mut system = builder.build()?;
//!
//! system.add_particle(200, &[0.0, 64.0, 0.0, 0.0, 0.1, 0.0])?;
//! system.tick()?;
//! ```

mod pool;
mod spawn;

use rustc_hash::FxHashMap;

use crate::bindings::StoredBinding;
use crate::core::{OverflowPolicy, SystemConfig};
use crate::error::{ParticleError, Result};
use crate::modules::{ParticleGlobalUpdateModule, ParticleRenderModule, ParticleUpdateModule};
use crate::render::DrawBuffer;

pub use pool::{ParticleId, ParticlePool, SortOrder};
pub use spawn::SpawnQueue;

use spawn::validate_spawn;

/// Particles reserved up front when the system is built
const PREALLOCATED_PARTICLES: usize = 1024;

// ============================================================================
// Statistics
// ============================================================================

/// Lifetime counters for a system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemStats {
    /// Ticks run
    pub ticks: u64,
    /// Particles admitted to the pool
    pub spawned: u64,
    /// Particles removed because their lifetime ran out
    pub expired: u64,
    /// Spawns discarded by the `Drop` policy
    pub dropped: u64,
    /// Spawns refused by the `Reject` policy
    pub rejected: u64,
}

// ============================================================================
// Builder
// ============================================================================

/// One-time wiring of a particle system
#[derive(Default)]
pub struct ParticleSystemBuilder {
    next_offset: usize,
    record_length: Option<usize>,
    fields: FxHashMap<String, StoredBinding>,
    config: SystemConfig,
    spawn_queue: SpawnQueue,
    update_modules: Vec<Box<dyn ParticleUpdateModule>>,
    global_update_modules: Vec<Box<dyn ParticleGlobalUpdateModule>>,
    render_modules: Vec<Box<dyn ParticleRenderModule>>,
}

impl ParticleSystemBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next `size` values of the record.
    pub fn bind(&mut self, size: usize) -> StoredBinding {
        let binding = StoredBinding::new(self.next_offset, size);
        self.next_offset = self.next_offset.saturating_add(size);
        binding
    }

    /// Reserve the next `size` values and register them under `name`.
    ///
    /// A later binding with the same name replaces the lookup entry.
    pub fn bind_named(&mut self, name: impl Into<String>, size: usize) -> StoredBinding {
        let binding = self.bind(size);
        self.fields.insert(name.into(), binding);
        binding
    }

    /// Handle for queueing spawns, e.g. from a module being configured.
    ///
    /// The handle starts working once [`build`](Self::build) succeeds.
    #[must_use]
    pub fn spawner(&self) -> SpawnQueue {
        self.spawn_queue.clone()
    }

    /// Fix the record length instead of deriving it from `bind` calls.
    pub fn record_length(&mut self, length: usize) -> &mut Self {
        self.record_length = Some(length);
        self
    }

    /// Set the system configuration.
    pub fn config(&mut self, config: SystemConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Append a per-particle update module.
    pub fn add_update_module(&mut self, module: impl ParticleUpdateModule + 'static) -> &mut Self {
        self.update_modules.push(Box::new(module));
        self
    }

    /// Append a whole-pool update module.
    pub fn add_global_update_module(
        &mut self,
        module: impl ParticleGlobalUpdateModule + 'static,
    ) -> &mut Self {
        self.global_update_modules.push(Box::new(module));
        self
    }

    /// Append a render module.
    pub fn add_render_module(&mut self, module: impl ParticleRenderModule + 'static) -> &mut Self {
        self.render_modules.push(Box::new(module));
        self
    }

    /// Validate the layout and create the system.
    ///
    /// # Errors
    ///
    /// `Configuration` if the record is empty, shorter than the bound fields,
    /// too large to allocate, or if any module binding reaches past the end
    /// of the record.
    pub fn build(self) -> Result<ParticleSystem> {
        let record_length = self.record_length.unwrap_or(self.next_offset);
        if record_length == 0 {
            return Err(ParticleError::configuration("particle record has no fields"));
        }
        if record_length < self.next_offset {
            return Err(ParticleError::configuration(format!(
                "bound fields need {} values but the record holds {record_length}",
                self.next_offset
            )));
        }

        let module_bindings = self
            .update_modules
            .iter()
            .flat_map(|m| m.bindings())
            .chain(self.global_update_modules.iter().flat_map(|m| m.bindings()))
            .chain(self.render_modules.iter().flat_map(|m| m.bindings()));
        for binding in module_bindings {
            if let Some(range) = binding.stored_range()
                && range.end > record_length
            {
                return Err(ParticleError::configuration(format!(
                    "binding over {range:?} exceeds record length {record_length}"
                )));
            }
        }

        // Large caps grow on demand instead of reserving everything up front
        let capacity = self
            .config
            .max_particles
            .unwrap_or(0)
            .min(PREALLOCATED_PARTICLES);
        let reserved_bytes = record_length
            .checked_mul(capacity.max(1))
            .and_then(|values| values.checked_mul(std::mem::size_of::<f64>()));
        if !reserved_bytes.is_some_and(|bytes| bytes <= isize::MAX as usize) {
            return Err(ParticleError::configuration(format!(
                "records of {record_length} values are too large to allocate"
            )));
        }
        self.spawn_queue.set_record_length(record_length);
        log::debug!(
            "Built particle system: {} values per particle, {} update / {} global / {} render modules",
            record_length,
            self.update_modules.len(),
            self.global_update_modules.len(),
            self.render_modules.len()
        );

        Ok(ParticleSystem {
            pool: ParticlePool::with_capacity(record_length, capacity),
            spawn_queue: self.spawn_queue,
            fields: self.fields,
            config: self.config,
            update_modules: self.update_modules,
            global_update_modules: self.global_update_modules,
            render_modules: self.render_modules,
            stats: SystemStats::default(),
            warned_growth: false,
        })
    }
}

// ============================================================================
// Particle System
// ============================================================================

/// A pool of particles and the modules that simulate and draw them.
///
/// Each [`tick`](Self::tick):
///
/// 1. counts every lifetime down by one and removes particles reaching zero
/// 2. runs each update module over all remaining particles, finishing one
///    module before starting the next
/// 3. runs the global update modules in order
/// 4. admits spawns queued through [`spawner`](Self::spawner)
pub struct ParticleSystem {
    pool: ParticlePool,
    spawn_queue: SpawnQueue,
    fields: FxHashMap<String, StoredBinding>,
    config: SystemConfig,
    update_modules: Vec<Box<dyn ParticleUpdateModule>>,
    global_update_modules: Vec<Box<dyn ParticleGlobalUpdateModule>>,
    render_modules: Vec<Box<dyn ParticleRenderModule>>,
    stats: SystemStats,
    /// Set once the `Grow` policy has passed `max_particles`
    warned_growth: bool,
}

impl ParticleSystem {
    /// Start wiring a new system
    #[must_use]
    pub fn builder() -> ParticleSystemBuilder {
        ParticleSystemBuilder::new()
    }

    /// Spawn a particle.
    ///
    /// `values` is written from the start of the record; remaining fields are
    /// zero. The particle survives `lifetime` ticks. When the pool is full the
    /// configured [`OverflowPolicy`] applies: `Drop` returns `Ok(None)`,
    /// `Reject` fails, `Grow` admits the particle anyway.
    ///
    /// # Errors
    ///
    /// `Configuration` for a zero lifetime or too many values,
    /// `CapacityExceeded` under the `Reject` policy.
    pub fn add_particle(&mut self, lifetime: u32, values: &[f64]) -> Result<Option<ParticleId>> {
        validate_spawn(lifetime, values, self.pool.record_length())?;
        self.admit(lifetime, values)
    }

    /// Handle for spawning from inside modules or other owners.
    ///
    /// Queued particles enter the pool at the end of the next `tick` and are
    /// first updated on the tick after that.
    #[must_use]
    pub fn spawner(&self) -> SpawnQueue {
        self.spawn_queue.clone()
    }

    /// Advance the simulation by one fixed step.
    ///
    /// # Errors
    ///
    /// Propagates the first binding error raised by a module.
    pub fn tick(&mut self) -> Result<()> {
        let expired = self.pool.expire();
        self.stats.expired += expired as u64;

        for module in &self.update_modules {
            self.pool
                .try_for_each_mut(|particle| module.update(particle))?;
        }
        for module in &mut self.global_update_modules {
            module.update(&mut self.pool)?;
        }

        for spawn in self.spawn_queue.drain() {
            match self.admit(spawn.lifetime, &spawn.values) {
                Ok(_) => {}
                Err(ParticleError::CapacityExceeded { max }) => {
                    log::warn!("Queued particle refused, capacity of {max} reached");
                }
                Err(err) => return Err(err),
            }
        }

        self.stats.ticks += 1;
        Ok(())
    }

    /// Emit geometry for every live particle.
    ///
    /// Particles are visited in traversal order (spawn order unless a global
    /// module resorted it); for each particle every render module runs in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Propagates the first binding error raised by a module.
    pub fn render(&self, partial_tick: f32, target: &mut dyn DrawBuffer) -> Result<()> {
        let partial_tick = partial_tick.clamp(0.0, 1.0);
        for particle in self.pool.iter() {
            for module in &self.render_modules {
                module.render(particle, partial_tick, target)?;
            }
        }
        Ok(())
    }

    /// Remove every particle without running any module.
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// Remove every particle and every queued spawn.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.spawn_queue.clear();
    }

    /// Scale a spawn count by the configured density.
    ///
    /// Non-zero counts never drop below one.
    #[must_use]
    pub fn adjust_particle_count(&self, count: usize) -> usize {
        if self.config.ignore_density || count == 0 {
            return count;
        }
        let scaled = (count as f64 * self.config.density.factor()).ceil() as usize;
        scaled.max(1)
    }

    /// A field registered with [`ParticleSystemBuilder::bind_named`]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<StoredBinding> {
        self.fields.get(name).copied()
    }

    /// The particle pool
    #[must_use]
    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Live records in traversal order
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.pool.iter()
    }

    /// Number of live particles
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether no particles are alive
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Values per particle record
    #[must_use]
    pub fn record_length(&self) -> usize {
        self.pool.record_length()
    }

    /// The system configuration
    #[must_use]
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Lifetime counters
    #[must_use]
    pub fn stats(&self) -> SystemStats {
        self.stats
    }

    fn admit(&mut self, lifetime: u32, values: &[f64]) -> Result<Option<ParticleId>> {
        if let Some(max) = self.config.max_particles
            && self.pool.len() >= max
        {
            match self.config.overflow {
                OverflowPolicy::Drop => {
                    log::trace!("Particle dropped, capacity of {max} reached");
                    self.stats.dropped += 1;
                    return Ok(None);
                }
                OverflowPolicy::Reject => {
                    self.stats.rejected += 1;
                    return Err(ParticleError::CapacityExceeded { max });
                }
                OverflowPolicy::Grow => {
                    if !self.warned_growth {
                        log::warn!("Particle pool growing past configured maximum of {max}");
                        self.warned_growth = true;
                    }
                }
            }
        }

        let id = self.pool.acquire(lifetime, values);
        self.stats.spawned += 1;
        Ok(Some(id))
    }
}

// ============================================================================
// Tests
// ============================================================================
