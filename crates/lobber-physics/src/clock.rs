//! Fixed-interval tick clock.
//!
//! The host calls [`PhysicsWorld::update`](crate::world::PhysicsWorld::update)
//! with wall-clock milliseconds; the clock turns that into a whole number of
//! physics ticks.

/// Accumulates elapsed time into fixed ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicsClock {
    /// Milliseconds per tick
    interval_ms: u32,
    /// Time not yet converted into ticks
    accumulator: u32,
    /// Most ticks returned by one `advance`
    max_catch_up: u32,
}

impl PhysicsClock {
    /// Creates a clock with the given interval and catch-up limit.
    #[must_use]
    pub fn new(interval_ms: u32, max_catch_up: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            accumulator: 0,
            max_catch_up: max_catch_up.max(1),
        }
    }

    /// Milliseconds per tick.
    #[must_use]
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Time carried over to the next call.
    #[must_use]
    pub const fn pending_ms(&self) -> u32 {
        self.accumulator
    }

    /// Accumulate time and return the number of ticks due.
    pub fn advance(&mut self, elapsed_ms: u32) -> u32 {
        self.accumulator = self.accumulator.saturating_add(elapsed_ms);
        let mut count = 0;

        while self.accumulator >= self.interval_ms && count < self.max_catch_up {
            self.accumulator -= self.interval_ms;
            count += 1;
        }

        // Still behind after catching up: drop the backlog
        if self.accumulator >= self.interval_ms {
            self.accumulator %= self.interval_ms;
        }

        count
    }

    /// Forget any carried-over time (after a pause or a level load).
    pub fn reset(&mut self) {
        self.accumulator = 0;
    }
}
