//! Wall-clock source used by the ticker to stamp each tick.

use jiff::Zoned;

/// Something that can tell the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Zoned;
}

/// The system clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Zoned::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone)]
pub struct FixedClock(Zoned);

impl FixedClock {
    pub fn new(at: Zoned) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.0.clone()
    }
}
