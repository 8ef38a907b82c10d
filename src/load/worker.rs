//! The worker pool: parallel order submission against a completion target.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::Rng;
use tracing::{debug, warn};

use crate::api::EngineApi;
use crate::models::{OrderRequest, OrderSide, Trader};

use super::grid::ParameterGrid;
use super::shutdown::ShutdownFlag;
use super::stats::StatsAggregator;

/// Shared inputs for the load phase.
///
/// Everything here is read-only while workers run except the aggregator,
/// which serializes its own mutation; the pool itself holds no other lock.
pub struct WorkerPool {
    pub api: Arc<dyn EngineApi>,
    pub traders: Vec<Trader>,
    pub markets: Vec<String>,
    pub volumes: ParameterGrid,
    pub prices: ParameterGrid,
    pub stats: Arc<StatsAggregator>,
    pub shutdown: ShutdownFlag,
}

impl WorkerPool {
    /// Launch `workers` OS threads and block until every one has exited.
    ///
    /// Workers stop once the completed count reaches `target` or the
    /// shutdown flag is set. The stop check and the submission after it are
    /// not atomic across workers, so the final count can exceed `target` by
    /// up to `workers - 1`; the target is a best-effort cap, not a hard
    /// limit.
    pub fn run(&self, workers: usize, target: u64) {
        thread::scope(|scope| {
            for id in 0..workers {
                scope.spawn(move || self.worker_loop(id, target));
            }
        });
    }

    fn worker_loop(&self, id: usize, target: u64) {
        let mut rng = rand::thread_rng();
        debug!(worker = id, "Worker started");

        loop {
            if self.shutdown.is_terminating() {
                debug!(worker = id, "Worker stopping on shutdown request");
                break;
            }
            if self.stats.completed() >= target {
                debug!(worker = id, "Worker stopping at target");
                break;
            }

            let trader = &self.traders[rng.gen_range(0..self.traders.len())];
            let order = self.sample_order(&mut rng);

            let started = Instant::now();
            match self.api.submit_order(trader, &order) {
                Ok(ack) => {
                    self.stats.record(started.elapsed());
                    debug!(worker = id, order = ?ack.id, state = ?ack.state, "Order acknowledged");
                }
                Err(e) => warn!(worker = id, error = %e, "Order attempt dropped"),
            }
        }
    }

    /// Uniformly sample one order from the parameter space.
    fn sample_order<R: Rng>(&self, rng: &mut R) -> OrderRequest {
        let side = if rng.gen_bool(0.5) {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };

        OrderRequest {
            market: self.markets[rng.gen_range(0..self.markets.len())].clone(),
            side,
            volume: self.volumes.sample(rng),
            price: self.prices.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::api::{Balance, OrderAck};
    use crate::config::RangeSpec;
    use crate::error::{ApiError, Error, HttpFailure, Result};

    struct MockEngine {
        orders: AtomicUsize,
        delay: Option<Duration>,
        fail_every: Option<usize>,
    }

    impl MockEngine {
        fn instant() -> Self {
            Self {
                orders: AtomicUsize::new(0),
                delay: None,
                fail_every: None,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::instant()
            }
        }

        fn with_fail_every(n: usize) -> Self {
            Self {
                fail_every: Some(n),
                ..Self::instant()
            }
        }
    }

    impl EngineApi for MockEngine {
        fn account_balances(&self, _trader: &Trader) -> Result<Vec<Balance>> {
            Ok(Vec::new())
        }

        fn submit_order(&self, _trader: &Trader, _order: &OrderRequest) -> Result<OrderAck> {
            let n = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            if let Some(every) = self.fail_every {
                if n % every == 0 {
                    return Err(Error::Request(ApiError::from(HttpFailure {
                        method: "POST".to_string(),
                        url: "/api/v2/market/orders".to_string(),
                        status: StatusCode::UNPROCESSABLE_ENTITY,
                        request_headers: String::new(),
                        request_body: String::new(),
                        response_headers: String::new(),
                        response_body: "rejected".to_string(),
                    })));
                }
            }
            Ok(OrderAck {
                id: Some(n as u64),
                state: Some("wait".to_string()),
            })
        }

        fn credit_deposit(
            &self,
            _trader: &Trader,
            _currency: &str,
            _amount: Decimal,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn make_pool(api: Arc<dyn EngineApi>, target: u64) -> WorkerPool {
        WorkerPool {
            api,
            traders: (0..4)
                .map(|i| Trader::from_suffix(&format!("0000000{i}")))
                .collect(),
            markets: vec!["btcusd".to_string(), "ethusd".to_string()],
            volumes: ParameterGrid::build(RangeSpec::new(dec!(0.1), dec!(1.0), dec!(0.1))),
            prices: ParameterGrid::build(RangeSpec::new(dec!(100), dec!(200), dec!(10))),
            stats: Arc::new(StatsAggregator::new(target)),
            shutdown: ShutdownFlag::default(),
        }
    }

    #[test]
    fn reaches_target_with_bounded_overshoot() {
        let pool = make_pool(Arc::new(MockEngine::instant()), 200);
        pool.run(8, 200);

        let completed = pool.stats.snapshot().completed;
        assert!(completed >= 200);
        assert!(completed < 200 + 8);
    }

    #[test]
    fn single_worker_hits_target_exactly() {
        let pool = make_pool(Arc::new(MockEngine::instant()), 50);
        pool.run(1, 50);

        assert_eq!(pool.stats.snapshot().completed, 50);
    }

    #[test]
    fn failed_attempts_are_dropped_not_counted() {
        let api = Arc::new(MockEngine::with_fail_every(3));
        let pool = make_pool(api.clone(), 40);
        pool.run(4, 40);

        let completed = pool.stats.snapshot().completed;
        assert!(completed >= 40);
        assert!(completed < 40 + 4);
        assert!(api.orders.load(Ordering::SeqCst) as u64 > completed);
    }

    #[test]
    fn preset_shutdown_prevents_any_work() {
        let api = Arc::new(MockEngine::instant());
        let pool = make_pool(api.clone(), 1_000);
        pool.shutdown.request();
        pool.run(4, 1_000);

        assert_eq!(pool.stats.snapshot().completed, 0);
        assert_eq!(api.orders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn shutdown_mid_run_stops_workers_and_returns() {
        let pool = Arc::new(make_pool(
            Arc::new(MockEngine::with_delay(Duration::from_millis(2))),
            u64::MAX,
        ));
        let flag = pool.shutdown.clone();

        let runner = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.run(4, u64::MAX))
        };

        thread::sleep(Duration::from_millis(30));
        flag.request();
        runner.join().unwrap();

        let completed = pool.stats.snapshot().completed;
        assert!(completed > 0);
    }

    #[test]
    fn sampled_orders_stay_inside_the_parameter_space() {
        let pool = make_pool(Arc::new(MockEngine::instant()), 10);
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let order = pool.sample_order(&mut rng);
            assert!(pool.markets.contains(&order.market));
            assert!(pool.volumes.values().contains(&order.volume));
            assert!(pool.prices.values().contains(&order.price));
        }
    }
}
