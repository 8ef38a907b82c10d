//! Domain models shared across the harness.

mod order;
mod trader;

pub use order::{OrderRequest, OrderSide};
pub use trader::Trader;
