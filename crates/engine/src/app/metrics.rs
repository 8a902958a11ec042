use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickMetricsSnapshot {
    pub tps: f32,
    pub events_per_second: f32,
    pub dropped_ticks: u32,
}

#[derive(Debug)]
pub struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    events: u32,
    dropped_ticks: u32,
}

impl MetricsAccumulator {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            events: 0,
            dropped_ticks: 0,
        }
    }

    pub fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_dropped_ticks(&mut self, count: u32) {
        self.dropped_ticks = self.dropped_ticks.saturating_add(count);
    }

    pub fn maybe_snapshot(&mut self, now: Instant) -> Option<TickMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = TickMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            events_per_second: self.events as f32 / elapsed_seconds,
            dropped_ticks: self.dropped_ticks,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.events = 0;
        self.dropped_ticks = 0;

        Some(snapshot)
    }
}
