//! Trader provisioning: create and fund the identities a run trades as.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::api::EngineApi;
use crate::error::Result;
use crate::models::Trader;

/// Credited per currency per trader; large enough that balances never
/// constrain a run.
const FUNDING_AMOUNT: Decimal = dec!(1000000000);

/// Creates the fixed trader set before load begins, then funds it.
///
/// Both steps are fatal on failure: a run with half-provisioned traders is
/// not worth measuring. Suffixes are drawn at random and redrawn on
/// collision, so uids and emails are unique within the run.
pub struct TraderProvisioner {
    api: Arc<dyn EngineApi>,
}

impl TraderProvisioner {
    pub fn new(api: Arc<dyn EngineApi>) -> Self {
        Self { api }
    }

    /// Create `count` unique traders, materializing each at the engine with
    /// an authenticated balance read.
    pub fn provision(&self, count: usize) -> Result<Vec<Trader>> {
        let mut issued = HashSet::with_capacity(count);
        let mut traders = Vec::with_capacity(count);
        let mut rng = rand::thread_rng();

        for _ in 0..count {
            let trader = loop {
                let suffix = format!("{:08x}", rng.gen::<u32>());
                if issued.insert(suffix.clone()) {
                    break Trader::from_suffix(&suffix);
                }
            };

            // The first authenticated read creates the account engine-side
            let balances = self.api.account_balances(&trader)?;
            for balance in &balances {
                debug!(
                    uid = %trader.uid,
                    currency = %balance.currency,
                    amount = %balance.balance,
                    locked = %balance.locked,
                    "Existing balance"
                );
            }
            debug!(uid = %trader.uid, "Trader materialized");
            traders.push(trader);
        }

        info!(count = traders.len(), "Traders provisioned");
        Ok(traders)
    }

    /// Credit every trader in every configured currency.
    pub fn fund(&self, traders: &[Trader], currencies: &[String]) -> Result<()> {
        for trader in traders {
            for currency in currencies {
                self.api.credit_deposit(trader, currency, FUNDING_AMOUNT)?;
            }
        }

        info!(
            traders = traders.len(),
            currencies = currencies.len(),
            amount = %FUNDING_AMOUNT,
            "Traders funded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;

    use crate::api::{Balance, OrderAck};
    use crate::error::{ApiError, Error, HttpFailure};
    use crate::models::OrderRequest;

    fn rejected(method: &str, url: &str) -> ApiError {
        ApiError::from(HttpFailure {
            method: method.to_string(),
            url: url.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            request_headers: String::new(),
            request_body: String::new(),
            response_headers: String::new(),
            response_body: "boom".to_string(),
        })
    }

    #[derive(Default)]
    struct MockEngine {
        balance_calls: AtomicUsize,
        deposit_calls: AtomicUsize,
        fail_balances: bool,
        fail_deposits: bool,
    }

    impl EngineApi for MockEngine {
        fn account_balances(&self, _trader: &Trader) -> Result<Vec<Balance>> {
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_balances {
                return Err(Error::Provisioning(rejected("GET", "/balances")));
            }
            Ok(Vec::new())
        }

        fn submit_order(&self, _trader: &Trader, _order: &OrderRequest) -> Result<OrderAck> {
            Ok(OrderAck {
                id: None,
                state: None,
            })
        }

        fn credit_deposit(
            &self,
            _trader: &Trader,
            _currency: &str,
            _amount: Decimal,
        ) -> Result<()> {
            self.deposit_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_deposits {
                return Err(Error::Provisioning(rejected("POST", "/deposits")));
            }
            Ok(())
        }
    }

    #[test]
    fn five_hundred_traders_have_distinct_ids() {
        let api = Arc::new(MockEngine::default());
        let provisioner = TraderProvisioner::new(api.clone());

        let traders = provisioner.provision(500).unwrap();

        assert_eq!(traders.len(), 500);
        let uids: HashSet<_> = traders.iter().map(|t| t.uid.as_str()).collect();
        let emails: HashSet<_> = traders.iter().map(|t| t.email.as_str()).collect();
        assert_eq!(uids.len(), 500);
        assert_eq!(emails.len(), 500);
        assert_eq!(api.balance_calls.load(Ordering::SeqCst), 500);
    }

    #[test]
    fn funding_covers_every_trader_currency_pair() {
        let api = Arc::new(MockEngine::default());
        let provisioner = TraderProvisioner::new(api.clone());

        let traders = provisioner.provision(3).unwrap();
        let currencies = vec!["usd".to_string(), "btc".to_string()];
        provisioner.fund(&traders, &currencies).unwrap();

        assert_eq!(api.deposit_calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn balance_probe_failure_is_fatal() {
        let api = Arc::new(MockEngine {
            fail_balances: true,
            ..Default::default()
        });
        let provisioner = TraderProvisioner::new(api);

        let err = provisioner.provision(5).unwrap_err();
        assert!(matches!(err, Error::Provisioning(_)));
    }

    #[test]
    fn funding_stops_at_first_failure() {
        let api = Arc::new(MockEngine {
            fail_deposits: true,
            ..Default::default()
        });
        let provisioner = TraderProvisioner::new(api.clone());

        let traders = provisioner.provision(4).unwrap();
        let currencies = vec!["usd".to_string(), "btc".to_string()];

        let err = provisioner.fund(&traders, &currencies).unwrap_err();
        assert!(matches!(err, Error::Provisioning(_)));
        assert_eq!(api.deposit_calls.load(Ordering::SeqCst), 1);
    }
}
