//! Signed-token codec
//!
//! Every token Janus mints goes through this module: claims are wrapped
//! in an envelope carrying the expiry and signed HS256 under the secret
//! for the token's purpose. Purpose-keyed secrets make cross-purpose
//! replay cryptographically impossible rather than merely disallowed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

/// What a token is for. Selects the signing secret and the default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Short-lived request credential
    Access,
    /// Long-lived renewal credential
    Refresh,
    /// Pending-registration envelope
    Activation,
    /// Password-reset link payload
    PasswordReset,
}

impl TokenPurpose {
    /// Default time-to-live for tokens of this purpose.
    pub fn ttl(self) -> Duration {
        match self {
            Self::Access => Duration::minutes(15),
            Self::Refresh => Duration::days(7),
            Self::Activation => Duration::minutes(5),
            Self::PasswordReset => Duration::minutes(5),
        }
    }
}

/// Token codec errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, tampered, wrong-secret, or expired. Callers get one
    /// failure kind; there is no oracle for which check rejected the
    /// token.
    #[error("token verification failed")]
    Verification,

    /// The payload could not be parsed at all
    #[error("token payload could not be decoded")]
    Undecodable,

    /// Claims could not be serialized or signed
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signed claims wrapper: the flow's claims plus the registered expiry.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    #[serde(flatten)]
    claims: T,
    exp: i64,
}

/// Claims recovered without signature verification.
///
/// Produced only by [`TokenCodec::decode_unverified`]; holding one is a
/// reminder that nothing about the payload has been authenticated. The
/// embedded expiry is exposed for the caller to check.
#[derive(Debug, Clone)]
pub struct Unverified<T> {
    /// The unauthenticated claims
    pub claims: T,
    /// Expiry as a unix timestamp in seconds
    pub expires_at: i64,
}

impl<T> Unverified<T> {
    /// Whether the embedded expiry has elapsed
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

struct KeyPair {
    enc: EncodingKey,
    dec: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret.as_bytes()),
            dec: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

struct PurposeKeys {
    access: KeyPair,
    refresh: KeyPair,
    activation: KeyPair,
    reset: KeyPair,
}

/// Signs and verifies purpose-bound tokens.
#[derive(Clone)]
pub struct TokenCodec {
    keys: Arc<PurposeKeys>,
}

impl TokenCodec {
    /// Build the codec from the configured secrets, one key pair per
    /// purpose.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            keys: Arc::new(PurposeKeys {
                access: KeyPair::from_secret(&config.access_token_secret),
                refresh: KeyPair::from_secret(&config.refresh_token_secret),
                activation: KeyPair::from_secret(&config.activation_secret),
                reset: KeyPair::from_secret(&config.forgot_password_secret),
            }),
        }
    }

    fn keys_for(&self, purpose: TokenPurpose) -> &KeyPair {
        match purpose {
            TokenPurpose::Access => &self.keys.access,
            TokenPurpose::Refresh => &self.keys.refresh,
            TokenPurpose::Activation => &self.keys.activation,
            TokenPurpose::PasswordReset => &self.keys.reset,
        }
    }

    /// Sign `claims` under the purpose's secret, expiring `ttl` from now.
    pub fn sign<T: Serialize>(
        &self,
        claims: &T,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let envelope = Envelope {
            claims,
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::default(), &envelope, &self.keys_for(purpose).enc)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token against the purpose's secret and return its claims.
    ///
    /// Rejects expired tokens with zero leeway. Every failure collapses
    /// into [`TokenError::Verification`].
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Envelope<T>>(token, &self.keys_for(purpose).dec, &validation)
            .map_err(|e| {
                tracing::debug!("token verification failed: {e}");
                TokenError::Verification
            })?;

        Ok(data.claims.claims)
    }

    /// Parse a token's payload without verifying its signature.
    ///
    /// The signature is NOT checked and an expired token is NOT
    /// rejected; the caller owns the expiry decision. This exists for
    /// the password-reset path only and must not be mistaken for
    /// [`verify`](Self::verify).
    pub fn decode_unverified<T: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<Unverified<T>, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        let data = decode::<Envelope<T>>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| {
                tracing::debug!("token decode failed: {e}");
                TokenError::Undecodable
            })?;

        Ok(Unverified {
            claims: data.claims.claims,
            expires_at: data.claims.exp,
        })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
