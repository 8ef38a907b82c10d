//! Run orchestration: provision traders, drive the load phase, build the
//! report.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::api::EngineApi;
use crate::config::RunConfig;
use crate::error::Result;
use crate::load::{ParameterGrid, ShutdownFlag, StatsAggregator, TraderProvisioner, WorkerPool};
use crate::report::{Report, ReportBuilder};

/// Drives one complete run against a validated configuration.
pub struct Harness {
    config: RunConfig,
    api: Arc<dyn EngineApi>,
}

impl Harness {
    pub fn new(config: RunConfig, api: Arc<dyn EngineApi>) -> Self {
        Self { config, api }
    }

    /// Execute the run. Provisioning failures abort; the load phase runs
    /// until the target is reached or `shutdown` is raised. Throughput is
    /// measured over the load phase only.
    pub fn run(&self, shutdown: ShutdownFlag) -> Result<Report> {
        let volumes = ParameterGrid::build(self.config.volume);
        let prices = ParameterGrid::build(self.config.price);
        debug!(volumes = ?volumes.values(), prices = ?prices.values(), "Parameter grids built");
        info!(
            volumes = volumes.len(),
            prices = prices.len(),
            "Parameter space ready"
        );

        let provisioner = TraderProvisioner::new(Arc::clone(&self.api));
        let traders = provisioner.provision(self.config.traders)?;
        provisioner.fund(&traders, &self.config.currencies)?;

        let stats = Arc::new(StatsAggregator::new(self.config.orders));
        let pool = WorkerPool {
            api: Arc::clone(&self.api),
            traders,
            markets: self.config.markets.clone(),
            volumes,
            prices,
            stats: Arc::clone(&stats),
            shutdown,
        };

        info!(
            workers = self.config.workers,
            target = self.config.orders,
            markets = ?self.config.markets,
            "Load phase starting"
        );

        let started_at = Utc::now();
        let load_timer = Instant::now();
        pool.run(self.config.workers, self.config.orders);
        let elapsed = load_timer.elapsed();
        let completed_at = Utc::now();

        let snapshot = stats.snapshot();
        info!(
            completed = snapshot.completed,
            elapsed_secs = elapsed.as_secs_f64(),
            "Load phase finished"
        );

        ReportBuilder::build(&self.config, &snapshot, started_at, completed_at, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::StatusCode;
    use rust_decimal::Decimal;

    use crate::api::{Balance, OrderAck};
    use crate::error::{ApiError, Error, HttpFailure};
    use crate::models::{OrderRequest, Trader};

    struct MockEngine {
        fail_deposits: bool,
    }

    impl EngineApi for MockEngine {
        fn account_balances(&self, _trader: &Trader) -> Result<Vec<Balance>> {
            Ok(Vec::new())
        }

        fn submit_order(&self, _trader: &Trader, _order: &OrderRequest) -> Result<OrderAck> {
            Ok(OrderAck {
                id: Some(1),
                state: Some("wait".to_string()),
            })
        }

        fn credit_deposit(
            &self,
            _trader: &Trader,
            _currency: &str,
            _amount: Decimal,
        ) -> Result<()> {
            if self.fail_deposits {
                return Err(Error::Provisioning(ApiError::from(HttpFailure {
                    method: "POST".to_string(),
                    url: "/api/v2/management/deposits/new".to_string(),
                    status: StatusCode::UNAUTHORIZED,
                    request_headers: String::new(),
                    request_body: String::new(),
                    response_headers: String::new(),
                    response_body: "signature mismatch".to_string(),
                })));
            }
            Ok(())
        }
    }

    fn small_config() -> RunConfig {
        RunConfig {
            traders: 2,
            orders: 25,
            workers: 2,
            ..Default::default()
        }
    }

    #[test]
    fn full_run_produces_a_report() {
        let harness = Harness::new(
            small_config(),
            Arc::new(MockEngine {
                fail_deposits: false,
            }),
        );

        let report = harness.run(ShutdownFlag::default()).unwrap();

        assert!(report.completed >= 25);
        assert!(report.completed < 25 + 2);
        assert!(report.throughput > 0.0);
        assert_eq!(report.traders, 2);
        assert!(report.completed_at >= report.started_at);
    }

    #[test]
    fn provisioning_failure_aborts_the_run() {
        let harness = Harness::new(
            small_config(),
            Arc::new(MockEngine {
                fail_deposits: true,
            }),
        );

        let err = harness.run(ShutdownFlag::default()).unwrap_err();
        assert!(matches!(err, Error::Provisioning(_)));
    }

    #[test]
    fn immediate_shutdown_yields_insufficient_data() {
        let harness = Harness::new(
            small_config(),
            Arc::new(MockEngine {
                fail_deposits: false,
            }),
        );

        let shutdown = ShutdownFlag::default();
        shutdown.request();
        let err = harness.run(shutdown).unwrap_err();

        assert!(matches!(err, Error::Report(_)));
    }
}
