//! Synthetic trader identity used to generate load.

use serde::Serialize;

/// Access level granted to every synthetic trader; high enough to trade.
const TRADER_LEVEL: u32 = 3;

/// Account state the engine expects for an active identity.
const TRADER_STATE: &str = "active";

/// A trading identity created for one run.
///
/// Built once during provisioning and immutable afterwards; the worker pool
/// shares the full set read-only. `uid` keys deposits on the engine side,
/// `email` is the login handle. Both are unique within a run.
#[derive(Debug, Clone, Serialize)]
pub struct Trader {
    /// Engine-side unique id
    pub uid: String,

    /// Login handle
    pub email: String,

    /// Access level
    pub level: u32,

    /// Account state
    pub state: String,
}

impl Trader {
    /// Build an identity from a random suffix. The caller guarantees the
    /// suffix is unique within the run.
    pub fn from_suffix(suffix: &str) -> Self {
        Self {
            uid: format!("UID{}", suffix.to_uppercase()),
            email: format!("trader.{}@tradebench.dev", suffix),
            level: TRADER_LEVEL,
            state: TRADER_STATE.to_string(),
        }
    }
}
