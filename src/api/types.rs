//! Wire types for engine responses.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One currency balance on a trader account. Fetching these is also the
/// provisioning probe: the engine materializes the account on first read.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    /// Currency code
    pub currency: String,

    /// Available amount
    pub balance: Decimal,

    /// Amount locked in open orders
    #[serde(default)]
    pub locked: Decimal,
}

/// Acknowledgement returned for an accepted order. Only logged; the harness
/// cares about success, not the created record.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    /// Engine-assigned order id
    #[serde(default)]
    pub id: Option<u64>,

    /// Order state after acceptance
    #[serde(default)]
    pub state: Option<String>,
}
