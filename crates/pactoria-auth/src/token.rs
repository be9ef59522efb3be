//! HS256 access tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)`
//! where the signature is HMAC-SHA256 over the first two segments.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use pactoria_config::AuthConfig;
use pactoria_core::entities::User;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::random::generate_token_hex;

type HmacSha256 = Hmac<Sha256>;

/// Clock skew tolerated when checking `exp`.
const LEEWAY_SECS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// A freshly issued token and when it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    issuer: String,
    ttl: TimeDelta,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[redacted]")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::InvalidToken(format!("{what} is not base64url: {e}")))
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let bytes = serde_json::to_vec(value).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

impl TokenIssuer {
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` for an empty secret.
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: TimeDelta) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::NotConfigured("empty signing secret".into()));
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            issuer: issuer.into(),
            ttl,
        })
    }

    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` when `auth.jwt_secret` is unset.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let ttl = i64::try_from(config.token_ttl_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        Self::new(&config.jwt_secret, config.issuer.clone(), ttl)
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::NotConfigured(e.to_string()))
    }

    /// Issue a token for `user`, valid from now for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Random` if no token id can be generated.
    pub fn issue(&self, user: &User) -> Result<AccessToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Random` if no token id can be generated.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            company_id: user.company_id.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: generate_token_hex(16)?,
        };
        let header = Header {
            alg: "HS256".into(),
            typ: Some("JWT".into()),
        };
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(AccessToken {
            token: format!("{signing_input}.{signature}"),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Verify a token's signature, algorithm, issuer, and expiry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for malformed, non-HS256, or badly signed
    /// tokens, `WrongIssuer` for another issuer, and `TokenExpired` past
    /// `exp` plus the leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("expected three segments".into()));
        };

        let header: Header = serde_json::from_slice(&decode_segment(header_b64, "header")?)
            .map_err(|e| AuthError::InvalidToken(format!("header: {e}")))?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm '{}'",
                header.alg
            )));
        }

        let signature = decode_segment(sig_b64, "signature")?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".into()))?;

        let claims: Claims = serde_json::from_slice(&decode_segment(claims_b64, "claims")?)
            .map_err(|e| AuthError::InvalidToken(format!("claims: {e}")))?;
        if claims.iss != self.issuer {
            return Err(AuthError::WrongIssuer(claims.iss));
        }
        if now.timestamp() > claims.exp.saturating_add(LEEWAY_SECS) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}
