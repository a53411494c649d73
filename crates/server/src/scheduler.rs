//! Self-rescheduling tick timing.
//!
//! The next tick starts `interval - elapsed` after the current one began, so
//! a slow tick shortens the following sleep but ticks never overlap.

use std::time::{Duration, Instant};

/// Longest simulated step, in intervals, after a stall.
const MAX_CATCH_UP: u32 = 4;

#[derive(Debug)]
pub struct TickScheduler {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// Record the start of a tick and return the simulated step. The first
    /// tick uses the nominal interval.
    pub fn begin_tick(&mut self, now: Instant) -> Duration {
        let dt = match self.last_tick {
            Some(last) => now.saturating_duration_since(last),
            None => self.interval,
        };
        self.last_tick = Some(now);
        dt.min(self.interval * MAX_CATCH_UP)
    }

    /// How long to sleep after a tick that started at `started`.
    pub fn delay_after(&self, started: Instant, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(started))
    }

    /// Time left until the next tick is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self.delay_after(last, now),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_first_tick_uses_interval() {
        let mut sched = TickScheduler::new(MS * 50);
        assert_eq!(sched.begin_tick(Instant::now()), MS * 50);
    }

    #[test]
    fn test_dt_measured_and_capped() {
        let mut sched = TickScheduler::new(MS * 50);
        let t0 = Instant::now();
        sched.begin_tick(t0);
        assert_eq!(sched.begin_tick(t0 + MS * 60), MS * 60);
        assert_eq!(sched.begin_tick(t0 + MS * 60 + MS * 1000), MS * 200);
    }

    #[test]
    fn test_delay_compresses_but_never_negative() {
        let sched = TickScheduler::new(MS * 50);
        let t0 = Instant::now();
        assert_eq!(sched.delay_after(t0, t0 + MS * 10), MS * 40);
        assert_eq!(sched.delay_after(t0, t0 + MS * 50), Duration::ZERO);
        assert_eq!(sched.delay_after(t0, t0 + MS * 80), Duration::ZERO);
    }

    #[test]
    fn test_time_until_next() {
        let mut sched = TickScheduler::new(MS * 50);
        let t0 = Instant::now();
        assert_eq!(sched.time_until_next(t0), Duration::ZERO);
        sched.begin_tick(t0);
        assert_eq!(sched.time_until_next(t0 + MS * 20), MS * 30);
    }
}
