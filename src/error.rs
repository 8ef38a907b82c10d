//! Error taxonomy for the harness.
//!
//! Failures are tagged by run phase so callers can decide fatality by kind:
//! configuration and provisioning errors abort the run, request errors are
//! contained within a single worker iteration, and report errors mark the
//! result as insufficient data.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error kinds, one per run phase.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run parameters or credentials, rejected before any request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Trader creation or funding failed; the run cannot continue.
    #[error("provisioning failed: {0}")]
    Provisioning(#[source] ApiError),

    /// A single order attempt failed; the worker discards it and moves on.
    #[error("order request failed: {0}")]
    Request(#[source] ApiError),

    /// Not enough data to derive throughput figures.
    #[error("insufficient data: {0}")]
    Report(String),
}

/// Failure of one HTTP call against the engine.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect/DNS/socket failure).
    #[error("{method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The engine answered with a non-success status.
    #[error(transparent)]
    Status(Box<HttpFailure>),

    /// A success response carried a body the client could not parse.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Signing the auth token for the call failed.
    #[error("failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Serializing the signed management payload failed.
    #[error("failed to encode management payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Full diagnostic for a non-success response: method, URL, and both sides
/// of the exchange. This is the unit the logs and abort messages surface.
#[derive(Debug)]
pub struct HttpFailure {
    pub method: String,
    pub url: String,
    pub status: StatusCode,
    pub request_headers: String,
    pub request_body: String,
    pub response_headers: String,
    pub response_body: String,
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} returned {} | request headers: {} | request body: {} | response headers: {} | response body: {}",
            self.method,
            self.url,
            self.status,
            self.request_headers,
            self.request_body,
            self.response_headers,
            self.response_body,
        )
    }
}

impl std::error::Error for HttpFailure {}

impl From<HttpFailure> for ApiError {
    fn from(failure: HttpFailure) -> Self {
        ApiError::Status(Box::new(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_failure() -> HttpFailure {
        HttpFailure {
            method: "POST".to_string(),
            url: "http://engine.local/api/v2/market/orders".to_string(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
            request_headers: "authorization: Bearer <redacted>".to_string(),
            request_body: r#"{"market":"btcusd"}"#.to_string(),
            response_headers: "content-type: application/json".to_string(),
            response_body: r#"{"errors":["market.order.invalid_volume"]}"#.to_string(),
        }
    }

    #[test]
    fn http_failure_display_carries_both_sides() {
        let text = sample_failure().to_string();
        assert!(text.contains("POST http://engine.local/api/v2/market/orders"));
        assert!(text.contains("422"));
        assert!(text.contains(r#"{"market":"btcusd"}"#));
        assert!(text.contains("invalid_volume"));
    }

    #[test]
    fn request_error_wraps_api_failure() {
        let err = Error::Request(ApiError::from(sample_failure()));
        let text = err.to_string();
        assert!(text.starts_with("order request failed:"));
        assert!(text.contains("422"));
    }

    #[test]
    fn config_error_is_descriptive() {
        let err = Error::Config("at least 2 currencies are required, got 1".to_string());
        assert!(err.to_string().contains("at least 2 currencies"));
    }
}
