
/// A fixed timestep accumulator.
///
/// Frame time is accumulated by [`advance`](Self::advance)
/// and consumed in fixed steps by [`tick`](Self::tick).
/// Frame deltas are clamped so that a long stall does not cause a burst of ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTimer {
    tick_seconds:      f32,
    max_frame_seconds: f32,
    accumulated:       f32,
    last_tick_seconds: f32,
}

impl Default for TickTimer {
    fn default() -> Self { Self::new(Self::DEFAULT_TICK_RATE) }
}

impl TickTimer {
    /// The tick rate of [`TickTimer::default`], in ticks per second.
    pub const DEFAULT_TICK_RATE: f32 = 10.0;

    /// The frame delta clamp of a new timer, in seconds.
    pub const DEFAULT_MAX_FRAME_SECONDS: f32 = 1.0;

    /// Creates a timer ticking `tick_rate` times per second.
    ///
    /// # Panics
    /// Panics if `tick_rate` is not a positive finite number.
    pub fn new(tick_rate: f32) -> Self {
        assert!(tick_rate.is_finite() && tick_rate > 0.0, "invalid tick rate {tick_rate}");

        Self {
            tick_seconds:      tick_rate.recip(),
            max_frame_seconds: Self::DEFAULT_MAX_FRAME_SECONDS,
            accumulated:       0.0,
            last_tick_seconds: 0.0,
        }
    }

    /// Sets the largest frame delta accepted by [`advance`](Self::advance).
    ///
    /// # Panics
    /// Panics if `seconds` is negative or not a number.
    pub fn with_max_frame_seconds(mut self, seconds: f32) -> Self {
        assert!(seconds >= 0.0, "invalid frame delta clamp {seconds}");
        self.max_frame_seconds = seconds;
        self
    }

    /// The number of ticks per second.
    pub fn tick_rate(&self) -> f32 { self.tick_seconds.recip() }

    /// The duration of a tick in seconds.
    pub fn tick_seconds(&self) -> f32 { self.tick_seconds }

    /// The duration of the last tick consumed by [`tick`](Self::tick).
    pub fn last_tick_seconds(&self) -> f32 { self.last_tick_seconds }

    /// The accumulated time not consumed by ticks yet.
    pub fn accumulated_seconds(&self) -> f32 { self.accumulated }

    /// Accumulates the duration of a frame.
    pub fn advance(&mut self, frame_seconds: f32) {
        let clamped = frame_seconds.clamp(0.0, self.max_frame_seconds);
        if clamped != frame_seconds {
            log::debug!("Clamped frame delta of {frame_seconds}s to {clamped}s");
        }
        self.accumulated += clamped;
    }

    /// Consumes one tick from the accumulated time.
    ///
    /// Returns `false` if less than one tick has accumulated.
    pub fn tick(&mut self) -> bool {
        if self.accumulated < self.tick_seconds {
            return false;
        }

        self.accumulated -= self.tick_seconds;
        self.last_tick_seconds = self.tick_seconds;
        true
    }

    /// How far the accumulated time is into the next tick, between `0` and `1`.
    pub fn alpha(&self) -> f32 { (self.accumulated / self.tick_seconds).clamp(0.0, 1.0) }
}
