use std::cell::RefCell;

use super::{Instance, TickTimer};
use crate::event::Dispatcher;

/// Events dispatched by [`Framework::process_frame`].
#[derive(Default)]
pub struct FrameEvents {
    /// Dispatched once per frame before any tick.
    /// This does not mean that a tick will actually be processed.
    pub tick_requested:   Dispatcher<()>,
    /// Dispatched after each processed tick with the tick duration.
    /// It can be dispatched multiple times per frame.
    pub tick_processed:   Dispatcher<f32>,
    /// Dispatched once per frame with the frame duration.
    pub update_processed: Dispatcher<f32>,
    /// Dispatched once per frame with the interpolation alpha.
    pub draw_requested:   Dispatcher<f32>,
}

/// Drives an [`Instance`] frame by frame.
///
/// With a [`TickTimer`], the instance ticks at a fixed rate,
/// possibly several times or not at all per frame.
/// Without one, the instance ticks exactly once per frame with the frame duration.
pub struct Framework {
    instance:   Instance,
    tick_timer: RefCell<Option<TickTimer>>,
    /// The frame events.
    pub events: FrameEvents,
}

impl Framework {
    /// Drives `instance` with an optional fixed timestep.
    pub fn new(instance: Instance, tick_timer: Option<TickTimer>) -> Self {
        Self { instance, tick_timer: RefCell::new(tick_timer), events: FrameEvents::default() }
    }

    /// The driven instance.
    pub fn instance(&self) -> &Instance { &self.instance }

    /// A copy of the current tick timer.
    pub fn tick_timer(&self) -> Option<TickTimer> { *self.tick_timer.borrow() }

    /// Replaces the tick timer.
    pub fn set_tick_timer(&self, tick_timer: Option<TickTimer>) {
        *self.tick_timer.borrow_mut() = tick_timer;
    }

    /// Processes one frame lasting `update_seconds`.
    ///
    /// Returns the number of ticks processed.
    pub fn process_frame(&self, update_seconds: f32) -> usize {
        if let Some(timer) = self.tick_timer.borrow_mut().as_mut() {
            timer.advance(update_seconds);
        }

        self.events.tick_requested.dispatch(());

        let mut ticks = 0;
        loop {
            let tick_seconds = match self.tick_timer.borrow_mut().as_mut() {
                Some(timer) => {
                    if !timer.tick() {
                        break;
                    }
                    timer.last_tick_seconds()
                }
                None if ticks == 0 => update_seconds,
                None => break,
            };

            self.instance.tick(tick_seconds);
            self.events.tick_processed.dispatch(tick_seconds);
            ticks += 1;
        }
        log::trace!("Processed {ticks} ticks in a frame of {update_seconds}s");

        self.events.update_processed.dispatch(update_seconds);

        let alpha = self.tick_timer.borrow().as_ref().map_or(1.0, TickTimer::alpha);
        self.events.draw_requested.dispatch(alpha);

        ticks
    }
}
