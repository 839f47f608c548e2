use std::time::{Duration, Instant};

pub const TIMER_HZ: f32 = 60.0;

/// Wall-clock cadence for the delay and sound timers.
///
/// Counts how many whole periods have passed since the last tick and moves
/// its reference point forward by exactly that many periods, so a late poll
/// catches up instead of drifting.
#[derive(Debug, Clone)]
pub struct TimerClock {
    period: Duration,
    last_tick: Instant,
}

impl TimerClock {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            last_tick: now,
        }
    }

    /// Number of ticks due at `now`. Zero periods never tick.
    pub fn poll(&mut self, now: Instant) -> u32 {
        if self.period.is_zero() {
            return 0;
        }

        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / self.period.as_nanos()) as u32;
        self.last_tick += self.period * ticks;
        ticks
    }

    /// Time left until the next tick falls due.
    pub fn until_next_tick(&self, now: Instant) -> Duration {
        (self.last_tick + self.period).saturating_duration_since(now)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
