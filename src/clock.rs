//! Frame time sources.
//!
//! The frame driver never reads wall-clock time directly; it asks a
//! [`FrameClock`] so that tests can step frames at chosen instants.

use std::{cell::Cell, rc::Rc};

pub trait FrameClock {
    /// Milliseconds since the clock started.
    fn now_ms(&mut self) -> f64;
}

/// Monotonic clock starting at zero when created.
#[derive(Debug)]
pub struct SystemClock {
    start: instant::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: instant::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now_ms(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&mut self) -> f64 {
        self.now.get()
    }
}
