mod metrics;
mod tick;

pub use metrics::{MetricsAccumulator, TickMetricsSnapshot};
pub use tick::{
    normalize_non_zero_duration, plan_tick_steps, TickClock, TickPlan,
    DEFAULT_MAX_CATCH_UP_TICKS, DEFAULT_TICK_INTERVAL,
};
