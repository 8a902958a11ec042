use std::time::{Duration, Instant};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_CATCH_UP_TICKS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

pub fn plan_tick_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_step: u32,
) -> TickPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_step {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        TickPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        TickPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

pub fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

/// Fixed-rate tick schedule driven by wall-clock instants.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    max_catch_up_ticks: u32,
    accumulator: Duration,
    last_instant: Instant,
}

impl TickClock {
    pub fn new(interval: Duration, max_catch_up_ticks: u32, now: Instant) -> Self {
        Self {
            interval: normalize_non_zero_duration(interval, DEFAULT_TICK_INTERVAL),
            max_catch_up_ticks: max_catch_up_ticks.max(1),
            accumulator: Duration::ZERO,
            last_instant: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Folds elapsed time into the schedule and reports how many ticks are due.
    pub fn advance(&mut self, now: Instant) -> TickPlan {
        let elapsed = now.saturating_duration_since(self.last_instant);
        self.last_instant = now;
        let plan = plan_tick_steps(
            self.accumulator.saturating_add(elapsed),
            self.interval,
            self.max_catch_up_ticks,
        );
        self.accumulator = plan.remaining_accumulator;
        plan
    }

    pub fn until_next_tick(&self, now: Instant) -> Duration {
        let pending = self
            .accumulator
            .saturating_add(now.saturating_duration_since(self.last_instant));
        self.interval.saturating_sub(pending)
    }
}
