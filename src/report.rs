//! Final run report: derived throughput figures and the JSON sink.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::load::StatsSnapshot;

/// Latency figures in seconds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatencySummary {
    pub min_secs: f64,
    pub max_secs: f64,
    pub avg_secs: f64,
}

/// Immutable summary of one run, built after all workers have joined.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Engine the load was generated against
    pub url: String,

    /// Markets orders were submitted to
    pub markets: Vec<String>,

    /// Currencies each trader was funded in
    pub currencies: Vec<String>,

    /// Number of provisioned traders
    pub traders: usize,

    /// Number of worker threads
    pub workers: usize,

    /// Configured completion target
    pub target: u64,

    /// Orders actually completed (may exceed target, see worker pool)
    pub completed: u64,

    /// Load phase start, provisioning excluded
    pub started_at: DateTime<Utc>,

    /// Load phase end
    pub completed_at: DateTime<Utc>,

    /// Load phase duration in seconds
    pub elapsed_secs: f64,

    /// Completed orders per second
    pub throughput: f64,

    /// Round-trip latency summary
    pub latency: LatencySummary,
}

impl Report {
    /// One-line console summary.
    pub fn summary_line(&self) -> String {
        format!(
            "{} orders in {:.2}s: {:.2} orders/sec (latency min {:.4}s avg {:.4}s max {:.4}s)",
            self.completed,
            self.elapsed_secs,
            self.throughput,
            self.latency.min_secs,
            self.latency.avg_secs,
            self.latency.max_secs,
        )
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))
    }
}

/// Derives the report from configuration and final statistics.
pub struct ReportBuilder;

impl ReportBuilder {
    /// Throughput is completed count over the load-phase elapsed time.
    ///
    /// Fails when nothing completed or no time elapsed; the caller surfaces
    /// that as insufficient data instead of a NaN or infinity.
    pub fn build(
        config: &RunConfig,
        snapshot: &StatsSnapshot,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Result<Report> {
        if snapshot.completed == 0 {
            return Err(Error::Report("no orders completed".to_string()));
        }

        let elapsed_secs = elapsed.as_secs_f64();
        if elapsed_secs == 0.0 {
            return Err(Error::Report("load phase elapsed time is zero".to_string()));
        }

        let (Some(min), Some(max), Some(avg)) = (snapshot.min, snapshot.max, snapshot.average())
        else {
            return Err(Error::Report("no latency samples recorded".to_string()));
        };

        Ok(Report {
            url: config.url.clone(),
            markets: config.markets.clone(),
            currencies: config.currencies.clone(),
            traders: config.traders,
            workers: config.workers,
            target: config.orders,
            completed: snapshot.completed,
            started_at,
            completed_at,
            elapsed_secs,
            throughput: snapshot.completed as f64 / elapsed_secs,
            latency: LatencySummary {
                min_secs: min.as_secs_f64(),
                max_secs: max.as_secs_f64(),
                avg_secs: avg.as_secs_f64(),
            },
        })
    }
}
