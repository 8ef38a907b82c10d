//! Token signing for engine authentication.
//!
//! Two signers back the three engine calls: trading and balance calls carry
//! a short-lived session JWT signed as the acting trader, and management
//! calls carry a JWS envelope signed by a named administrative key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::Trader;

/// Lifetime of a signed token. Every call signs a fresh one, so the expiry
/// only has to outlive a single round trip.
const TOKEN_TTL_SECS: i64 = 60;

/// Issuer claim the engine is configured to trust.
const TOKEN_ISSUER: &str = "tradebench";

/// Audience claim on session and management tokens.
const TOKEN_AUDIENCE: &str = "engine";

/// Role granted to synthetic traders.
const TRADER_ROLE: &str = "member";

/// Claims carried by a per-trader session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub uid: String,
    pub email: String,
    pub role: String,
    pub level: u32,
    pub state: String,
}

/// Signs session tokens, one per call, as the acting trader.
pub struct TokenSigner {
    key: EncodingKey,
    alg: Algorithm,
}

// Manual impl because `EncodingKey` has no `Debug`; key material stays out
// of any formatted output.
impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(key: EncodingKey, alg: Algorithm) -> Self {
        Self { key, alg }
    }

    /// RS256 signer from an RSA private key in PEM form.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self::new(EncodingKey::from_rsa_pem(pem)?, Algorithm::RS256))
    }

    /// Sign a fresh token identifying the trader for one call.
    pub fn session_token(&self, trader: &Trader) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = SessionClaims {
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            sub: "session".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: vec![TOKEN_AUDIENCE.to_string()],
            uid: trader.uid.clone(),
            email: trader.email.clone(),
            role: TRADER_ROLE.to_string(),
            level: trader.level,
            state: trader.state.clone(),
        };

        Ok(jsonwebtoken::encode(&Header::new(self.alg), &claims, &self.key)?)
    }
}

/// Signs administrative payloads as a named key the engine recognizes.
///
/// Output is a JWS JSON General Serialization envelope; the engine matches
/// the signature to a configured signer through the `kid` header field.
pub struct ManagementSigner {
    key: EncodingKey,
    alg: Algorithm,
    name: String,
}

impl ManagementSigner {
    pub fn new(key: EncodingKey, alg: Algorithm, name: impl Into<String>) -> Self {
        Self {
            key,
            alg,
            name: name.into(),
        }
    }

    /// RS256 signer from an RSA private key in PEM form.
    pub fn from_rsa_pem(
        pem: &[u8],
        name: impl Into<String>,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self::new(
            EncodingKey::from_rsa_pem(pem)?,
            Algorithm::RS256,
            name,
        ))
    }

    /// Wrap the action fields of a management call in a signed envelope.
    pub fn envelope(&self, action: &Value) -> Result<Value, ApiError> {
        let now = Utc::now();
        let mut claims = serde_json::Map::new();
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(TOKEN_TTL_SECS)).timestamp()),
        );
        claims.insert("jti".to_string(), json!(Uuid::new_v4().simple().to_string()));
        claims.insert("iss".to_string(), json!(TOKEN_ISSUER));
        claims.insert("aud".to_string(), json!([TOKEN_AUDIENCE]));
        if let Value::Object(fields) = action {
            for (key, value) in fields {
                claims.insert(key.clone(), value.clone());
            }
        }

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Value::Object(claims))?);
        let protected = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Header::new(self.alg))?);
        let message = format!("{protected}.{payload}");
        let signature = jsonwebtoken::crypto::sign(message.as_bytes(), &self.key, self.alg)?;

        Ok(json!({
            "payload": payload,
            "signatures": [{
                "protected": protected,
                "header": { "kid": self.name },
                "signature": signature,
            }],
        }))
    }
}
