//! Engine API surface: auth, blocking client, and wire types.

mod auth;
mod client;
mod types;

pub use auth::{ManagementSigner, SessionClaims, TokenSigner};
pub use client::EngineClient;
pub use types::{Balance, OrderAck};

use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{OrderRequest, Trader};

/// The calls the harness makes against the engine.
///
/// Provisioning and the worker pool depend on this trait rather than the
/// concrete client, so tests can inject controllable fakes.
pub trait EngineApi: Send + Sync {
    /// Read account balances as the trader. First read materializes the
    /// account on the engine side; failures are fatal to the run.
    fn account_balances(&self, trader: &Trader) -> Result<Vec<Balance>>;

    /// Submit one order as the trader. Failures are contained to the
    /// attempt.
    fn submit_order(&self, trader: &Trader, order: &OrderRequest) -> Result<OrderAck>;

    /// Credit a deposit to the trader through the management API. Failures
    /// are fatal to the run.
    fn credit_deposit(&self, trader: &Trader, currency: &str, amount: Decimal) -> Result<()>;
}
