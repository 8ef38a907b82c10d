//! Latency aggregation shared by all workers.

use std::sync::Mutex;
use std::time::Duration;

use tracing::info;

/// Progress is reported every `ceil(target / 100)` completions, but at
/// least every completion and at most every 100.
fn progress_interval(target: u64) -> u64 {
    target.div_ceil(100).clamp(1, 100)
}

#[derive(Debug, Default, Clone)]
struct Inner {
    completed: u64,
    min: Option<Duration>,
    max: Option<Duration>,
    sum: Duration,
}

/// Thread-safe aggregate of completed-order latencies.
///
/// All mutation goes through one mutex; there is no other lock in the load
/// path, so lock ordering is never a concern. Progress lines are emitted
/// while the lock is held, keeping the printed count consistent with the
/// counter at print time.
#[derive(Debug)]
pub struct StatsAggregator {
    inner: Mutex<Inner>,
    target: u64,
    progress_every: u64,
}

impl StatsAggregator {
    pub fn new(target: u64) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            target,
            progress_every: progress_interval(target),
        }
    }

    /// Record one successful order round trip.
    pub fn record(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        inner.completed += 1;
        inner.min = Some(inner.min.map_or(latency, |m| m.min(latency)));
        inner.max = Some(inner.max.map_or(latency, |m| m.max(latency)));
        inner.sum += latency;

        if inner.completed % self.progress_every == 0 {
            info!(
                completed = inner.completed,
                target = self.target,
                "Progress"
            );
        }
    }

    /// Completed count right now. Workers poll this before each iteration.
    pub fn completed(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).completed
    }

    /// Plain-value copy of the aggregate. Taken after all workers have
    /// joined, when no writer remains.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        StatsSnapshot {
            completed: inner.completed,
            min: inner.min,
            max: inner.max,
            sum: inner.sum,
        }
    }
}

/// Read-only view of the aggregate at one point in time.
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub completed: u64,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
    pub sum: Duration,
}

impl StatsSnapshot {
    /// Mean latency, undefined when nothing completed.
    pub fn average(&self) -> Option<Duration> {
        if self.completed == 0 {
            None
        } else {
            Some(Duration::from_nanos(
                (self.sum.as_nanos() / self.completed as u128) as u64,
            ))
        }
    }
}
