//! Fixed-rate tick scheduling with interpolation

use std::time::Duration;

/// Turns variable frame times into a whole number of fixed ticks.
///
/// The host calls [`advance`](Self::advance) once per frame, runs `tick()` as
/// many times as it returns, then renders with
/// [`partial_tick`](Self::partial_tick).
#[derive(Debug, Clone)]
pub struct TickClock {
    tick_length: Duration,
    accumulator: Duration,
    max_ticks_per_frame: u32,
    total_ticks: u64,
}

impl TickClock {
    /// Default simulation rate
    pub const DEFAULT_TICK_RATE: u32 = 20;

    /// Shortest representable tick
    const MIN_TICK_LENGTH: Duration = Duration::from_nanos(1);

    /// Create a clock running at `ticks_per_second`.
    ///
    /// Rates are clamped to between 1 Hz and one tick per nanosecond.
    #[must_use]
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            tick_length: (Duration::from_secs(1) / ticks_per_second.max(1))
                .max(Self::MIN_TICK_LENGTH),
            accumulator: Duration::ZERO,
            max_ticks_per_frame: 10,
            total_ticks: 0,
        }
    }

    /// Cap the ticks run for a single frame.
    ///
    /// Time beyond the cap is discarded so a long stall does not turn into a
    /// burst of catch-up ticks.
    #[must_use]
    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max.max(1);
        self
    }

    /// Duration of one tick
    #[must_use]
    pub const fn tick_length(&self) -> Duration {
        self.tick_length
    }

    /// Ticks issued so far
    #[must_use]
    pub const fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Add frame time and return how many ticks are due.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        self.accumulator += delta;

        let mut ticks = 0;
        while self.accumulator >= self.tick_length {
            if ticks == self.max_ticks_per_frame {
                let dropped = self.accumulator.as_nanos() / self.tick_length.as_nanos();
                log::warn!("Tick clock behind, skipping {dropped} ticks");
                self.accumulator = Duration::from_nanos(
                    (self.accumulator.as_nanos() % self.tick_length.as_nanos()) as u64,
                );
                break;
            }
            self.accumulator -= self.tick_length;
            ticks += 1;
        }

        self.total_ticks += u64::from(ticks);
        ticks
    }

    /// Fraction of a tick elapsed since the last tick, in `[0, 1)`.
    #[must_use]
    pub fn partial_tick(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.tick_length.as_secs_f32()
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK_RATE)
    }
}
