use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Whole-session elapsed-seconds sampler.
///
/// Driven by the same 1-second heartbeat as the countdowns, but independent
/// of them: it keeps counting across question and explanation windows and is
/// stopped exactly once when the session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    seconds: u64,
    running: bool,
}

impl Stopwatch {
    #[must_use]
    pub fn start() -> Self {
        Self {
            seconds: 0,
            running: true,
        }
    }

    /// Advance the sampler by one second. No effect once stopped.
    pub fn tick(&mut self) {
        if self.running {
            self.seconds += 1;
        }
    }

    /// Stop the sampler and return the total. Later calls keep returning the
    /// total recorded at the first stop.
    pub fn stop(&mut self) -> u64 {
        self.running = false;
        self.seconds
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.seconds
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Outcome of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Expired,
}

/// A fixed-duration countdown decremented by an external 1-second heartbeat.
///
/// The remainder is clamped at zero; `tick` reports `Expired` exactly when
/// the remainder first reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    total: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            total: seconds,
        }
    }

    /// Decrement by one second.
    pub fn tick(&mut self) -> CountdownState {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            CountdownState::Expired
        } else {
            CountdownState::Running
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Renders a second count as `MM:SS`, clamping at zero.
#[must_use]
pub fn format_seconds(seconds: u64) -> String {
    let minutes = seconds / 60;
    let rest = seconds % 60;
    format!("{minutes:02}:{rest:02}")
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
