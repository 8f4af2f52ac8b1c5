use crate::{LOW_TIME_SECONDS, ROUND_SECONDS, Seconds};

/// Round clock counting whole seconds down to zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: Seconds,
}

impl Countdown {
    pub const fn new(budget: Seconds) -> Self {
        Self { remaining: budget }
    }

    pub const fn remaining(self) -> Seconds {
        self.remaining
    }

    pub const fn is_expired(self) -> bool {
        self.remaining == 0
    }

    pub const fn is_running_low(self) -> bool {
        self.remaining < LOW_TIME_SECONDS
    }

    /// Takes one second off the clock, stopping at zero.
    pub fn tick(&mut self) -> Seconds {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(ROUND_SECONDS)
    }
}
