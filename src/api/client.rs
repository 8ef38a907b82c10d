//! Blocking HTTP client for the trading-engine API.

use reqwest::blocking::{Client, Request, Response};
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;

use crate::error::{ApiError, Error, HttpFailure, Result};
use crate::models::{OrderRequest, Trader};

use super::auth::{ManagementSigner, TokenSigner};
use super::types::{Balance, OrderAck};
use super::EngineApi;

/// Deposits are created directly in this state so funds are spendable
/// without a separate confirmation step.
const DEPOSIT_STATE: &str = "accepted";

/// Client for the three engine endpoints the harness drives.
pub struct EngineClient {
    http: Client,
    root: String,
    sessions: TokenSigner,
    management: ManagementSigner,
}

impl EngineClient {
    /// Build a client for the engine at `root`.
    ///
    /// No request timeout is set: workers block for as long as the engine
    /// takes, and slow responses are measured rather than failed.
    pub fn new(root: &str, sessions: TokenSigner, management: ManagementSigner) -> Result<Self> {
        let http = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            root: root.trim_end_matches('/').to_string(),
            sessions,
            management,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path)
    }

    fn balances(&self, trader: &Trader) -> std::result::Result<Vec<Balance>, ApiError> {
        let url = self.url("api/v2/account/balances");
        let token = self.sessions.session_token(trader)?;

        debug!(url = %url, uid = %trader.uid, "Fetching account balances");

        let request = self
            .http
            .get(&url)
            .bearer_auth(token)
            .build()
            .map_err(|source| ApiError::Transport {
                method: "GET".to_string(),
                url: url.clone(),
                source,
            })?;

        let response = self.send(request)?;
        response
            .json::<Vec<Balance>>()
            .map_err(|source| ApiError::Decode { url, source })
    }

    fn order(
        &self,
        trader: &Trader,
        order: &OrderRequest,
    ) -> std::result::Result<OrderAck, ApiError> {
        let url = self.url("api/v2/market/orders");
        let token = self.sessions.session_token(trader)?;

        let request = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(order)
            .build()
            .map_err(|source| ApiError::Transport {
                method: "POST".to_string(),
                url: url.clone(),
                source,
            })?;

        let response = self.send(request)?;
        response
            .json::<OrderAck>()
            .map_err(|source| ApiError::Decode { url, source })
    }

    fn deposit(
        &self,
        trader: &Trader,
        currency: &str,
        amount: Decimal,
    ) -> std::result::Result<(), ApiError> {
        let url = self.url("api/v2/management/deposits/new");
        let envelope = self.management.envelope(&json!({
            "uid": trader.uid,
            "currency": currency,
            "amount": amount,
            "state": DEPOSIT_STATE,
        }))?;

        debug!(url = %url, uid = %trader.uid, currency = currency, "Crediting deposit");

        let request = self
            .http
            .post(&url)
            .json(&envelope)
            .build()
            .map_err(|source| ApiError::Transport {
                method: "POST".to_string(),
                url: url.clone(),
                source,
            })?;

        self.send(request)?;
        Ok(())
    }

    /// Execute a prepared request. Anything but a success status becomes a
    /// diagnostic carrying both sides of the exchange.
    fn send(&self, request: Request) -> std::result::Result<Response, ApiError> {
        let method = request.method().to_string();
        let url = request.url().to_string();
        let request_headers = render_headers(request.headers());
        let request_body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let response = self
            .http
            .execute(request)
            .map_err(|source| ApiError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let response_headers = render_headers(response.headers());
        let response_body = response.text().unwrap_or_default();

        Err(HttpFailure {
            method,
            url,
            status,
            request_headers,
            request_body,
            response_headers,
            response_body,
        }
        .into())
    }
}

impl EngineApi for EngineClient {
    fn account_balances(&self, trader: &Trader) -> Result<Vec<Balance>> {
        self.balances(trader).map_err(Error::Provisioning)
    }

    fn submit_order(&self, trader: &Trader, order: &OrderRequest) -> Result<OrderAck> {
        self.order(trader, order).map_err(Error::Request)
    }

    fn credit_deposit(&self, trader: &Trader, currency: &str, amount: Decimal) -> Result<()> {
        self.deposit(trader, currency, amount)
            .map_err(Error::Provisioning)
    }
}

fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("; ")
}
