use core::fmt;

/// Whole seconds on the round clock.
pub type Seconds = u16;

/// Time budget of a round.
pub const ROUND_SECONDS: Seconds = 180;

/// Below this many seconds the clock is shown as running out.
pub const LOW_TIME_SECONDS: Seconds = 30;

/// Pause between a solved verdict and the win screen.
pub const WIN_REVEAL_DELAY_MS: u32 = 1_000;

/// Identifies one round; every asynchronous request carries the round it was issued for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(u32);

impl RoundId {
    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round#{}", self.0)
    }
}
