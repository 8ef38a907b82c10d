//! Run configuration, validated once before anything touches the network.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::api::{ManagementSigner, TokenSigner};
use crate::error::{Error, Result};

/// Inclusive decimal range stepped from `min` to `max`.
#[derive(Debug, Clone, Copy)]
pub struct RangeSpec {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl RangeSpec {
    pub fn new(min: Decimal, max: Decimal, step: Decimal) -> Self {
        Self { min, max, step }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.step <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "{name} step must be positive, got {}",
                self.step
            )));
        }
        if self.min > self.max {
            return Err(Error::Config(format!(
                "{name} range is inverted: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Everything one run needs, owned for the whole run and read-only after
/// validation. No ambient globals: components receive what they need from
/// here explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root URL of the trading-engine API
    pub url: String,

    /// Currencies every trader is funded in (at least two)
    pub currencies: Vec<String>,

    /// Markets orders are submitted against (at least one)
    pub markets: Vec<String>,

    /// Number of synthetic traders to provision
    pub traders: usize,

    /// Target number of completed orders
    pub orders: u64,

    /// Number of parallel worker threads
    pub workers: usize,

    /// Order volume range
    pub volume: RangeSpec,

    /// Order price range
    pub price: RangeSpec,

    /// Base64-encoded RSA private key PEM for session tokens
    pub token_key: Option<String>,

    /// Base64-encoded RSA private key PEM for management calls
    pub management_key: Option<String>,

    /// Name the engine knows the management key by (the JWS `kid`)
    pub management_signer: String,

    /// Where to write the JSON report, if anywhere
    pub report_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            currencies: vec!["usd".to_string(), "btc".to_string()],
            markets: vec!["btcusd".to_string()],
            traders: 10,
            orders: 1000,
            workers: 4,
            volume: RangeSpec::new(dec!(0.1), dec!(1.0), dec!(0.1)),
            price: RangeSpec::new(dec!(100), dec!(200), dec!(10)),
            token_key: None,
            management_key: None,
            management_signer: "tradebench".to_string(),
            report_path: None,
        }
    }
}

impl RunConfig {
    /// Check every structural rule. Called once at startup; nothing external
    /// is attempted if this fails.
    pub fn validate(&self) -> Result<()> {
        if self.currencies.len() < 2 {
            return Err(Error::Config(format!(
                "at least 2 currencies are required, got {}",
                self.currencies.len()
            )));
        }
        if self.markets.is_empty() {
            return Err(Error::Config("at least 1 market is required".to_string()));
        }
        if self.traders < 2 {
            return Err(Error::Config(format!(
                "at least 2 traders are required, got {}",
                self.traders
            )));
        }
        if self.workers == 0 {
            return Err(Error::Config("at least 1 worker is required".to_string()));
        }
        self.volume.validate("volume")?;
        self.price.validate("price")?;
        if self.token_key.is_none() {
            return Err(Error::Config(
                "token signing key is missing (--token-key or TRADEBENCH_TOKEN_KEY)".to_string(),
            ));
        }
        if self.management_key.is_none() {
            return Err(Error::Config(
                "management key is missing (--management-key or TRADEBENCH_MANAGEMENT_KEY)"
                    .to_string(),
            ));
        }
        if self.management_signer.is_empty() {
            return Err(Error::Config("management signer name is empty".to_string()));
        }
        Ok(())
    }

    /// Build the session-token signer from the configured key material.
    pub fn build_session_signer(&self) -> Result<TokenSigner> {
        let pem = decode_key("token signing key", self.token_key.as_deref())?;
        TokenSigner::from_rsa_pem(&pem)
            .map_err(|e| Error::Config(format!("token signing key is not a valid RSA PEM: {e}")))
    }

    /// Build the management signer from the configured key material.
    pub fn build_management_signer(&self) -> Result<ManagementSigner> {
        let pem = decode_key("management key", self.management_key.as_deref())?;
        ManagementSigner::from_rsa_pem(&pem, self.management_signer.clone())
            .map_err(|e| Error::Config(format!("management key is not a valid RSA PEM: {e}")))
    }
}

fn decode_key(name: &str, encoded: Option<&str>) -> Result<Vec<u8>> {
    let encoded = encoded.ok_or_else(|| Error::Config(format!("{name} is missing")))?;
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Config(format!("{name} is not valid base64: {e}")))
}
