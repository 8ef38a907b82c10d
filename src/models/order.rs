//! Synthetic order types submitted during the load phase.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// One synthetic order, built per attempt by sampling the parameter space.
///
/// Serializes to the exact wire body the engine expects; the acting trader
/// travels alongside as the authentication subject, not in the body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Market the order is placed against
    pub market: String,

    /// Buy or sell
    pub side: OrderSide,

    /// Order volume in base currency
    pub volume: Decimal,

    /// Limit price in quote currency
    pub price: Decimal,
}
