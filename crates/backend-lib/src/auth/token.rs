// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/** Signed, stateless session tokens.
Tokens are compact JWS strings (`header.claims.signature`, each part base64
URL-safe without padding) signed with HMAC-SHA256. Nothing is stored on the
server: a token is valid as long as its signature checks out against a
configured key and its `exp` has not passed. */
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use companion_common::UserId;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::AuthSettings;

type HmacSha256 = Hmac<Sha256>;

/// The only accepted signing algorithm
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Size of generated signing keys in bytes
const GENERATED_KEY_BYTES: usize = 32;

/// Reasons a token can be rejected. Callers outside the auth module only ever
/// see `Unauthenticated`; the detail is for logs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token was signed with an unknown key")]
    UnknownKey,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token subject is not a valid user id")]
    InvalidSubject,

    #[error("token has no expiry")]
    MissingExpiry,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// An HMAC key together with its public fingerprint (`kid`)
pub struct SigningKey {
    id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        let secret = Zeroizing::new(secret.into());
        let digest = Sha256::digest(secret.as_slice());
        let id = format!("{digest:x}")[..16].to_string();
        Self { id, secret }
    }

    /// Random key for deployments that do not configure one
    pub fn generate() -> Self {
        let mut secret = vec![0u8; GENERATED_KEY_BYTES];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Fingerprint written to the token header
    pub fn id(&self) -> &str {
        &self.id
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

/// Claims carried by every issued token
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Unique token id
    pub jti: String,
}

// Claims as found on the wire, before the subject is coerced.
#[derive(Deserialize)]
struct RawClaims {
    user_id: serde_json::Value,
    #[serde(default)]
    iat: i64,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    jti: String,
}

/// Accepts a JSON integer or a string of decimal digits
fn coerce_user_id(value: &serde_json::Value) -> Result<UserId, TokenError> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(UserId).ok_or(TokenError::InvalidSubject),
        // Plain decimal digits only: no sign, whitespace or exponent
        serde_json::Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| TokenError::InvalidSubject),
        _ => Err(TokenError::InvalidSubject),
    }
}

/// Issues and verifies session tokens.
///
/// New tokens are always signed with the current key; retired keys are kept
/// for verification only so a key can be rotated without logging everyone out.
pub struct TokenService {
    current: SigningKey,
    previous: Vec<SigningKey>,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(current: SigningKey, previous: Vec<SigningKey>, ttl: Option<Duration>) -> Self {
        Self {
            current,
            previous,
            ttl,
        }
    }

    /// Build the service from configuration, generating an ephemeral key if
    /// none is configured
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let current = match &settings.signing_key {
            Some(key) => SigningKey::new(key.as_bytes()),
            None => {
                tracing::warn!(
                    "no auth.signing_key configured; using an ephemeral key, \
                     issued tokens will not survive a restart"
                );
                SigningKey::generate()
            },
        };
        let previous = settings
            .previous_signing_keys
            .iter()
            .map(|k| SigningKey::new(k.as_bytes()))
            .collect();
        let ttl = (settings.token_ttl_secs > 0).then(|| Duration::from_secs(settings.token_ttl_secs));

        Self::new(current, previous, ttl)
    }

    /// Configured token lifetime, if tokens expire
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issue a fresh token bound to `user_id`
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let exp = match self.ttl {
            Some(ttl) => Some(
                i64::try_from(ttl.as_secs())
                    .ok()
                    .and_then(|secs| now.checked_add(secs))
                    .ok_or_else(|| TokenError::Signing("token lifetime out of range".to_string()))?,
            ),
            None => None,
        };
        let claims = Claims {
            user_id,
            iat: now,
            exp,
            jti: Uuid::new_v4().simple().to_string(),
        };
        self.sign(&claims)
    }

    /// Verify a token and return the user id it was issued for.
    /// Performs no lookup: the user may no longer exist.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_claims(token).map(|claims| claims.user_id)
    }

    /// Verify a token and return all of its claims
    pub fn verify_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header: Header = decode_json(header_b64)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let key = match header.kid.as_deref() {
            Some(kid) => self.key_by_id(kid).ok_or(TokenError::UnknownKey)?,
            None => &self.current,
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = key.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let raw: RawClaims = decode_json(claims_b64)?;
        let user_id = coerce_user_id(&raw.user_id)?;

        match raw.exp {
            Some(exp) if Utc::now().timestamp() >= exp => return Err(TokenError::Expired),
            None if self.ttl.is_some() => return Err(TokenError::MissingExpiry),
            _ => {},
        }

        Ok(Claims {
            user_id,
            iat: raw.iat,
            exp: raw.exp,
            jti: raw.jti,
        })
    }

    fn key_by_id(&self, kid: &str) -> Option<&SigningKey> {
        std::iter::once(&self.current)
            .chain(self.previous.iter())
            .find(|key| key.id == kid)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let header = Header {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: "JWT".to_string(),
            kid: Some(self.current.id.clone()),
        };
        let header_b64 = encode_json(&header)?;
        let claims_b64 = encode_json(claims)?;

        let mut mac = self.current.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{header_b64}.{claims_b64}.{signature}"))
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_json<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
