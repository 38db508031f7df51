//! Session issuance
//!
//! Mints the access/refresh pair for an authenticated user. Claims stay
//! small: the access token carries `{id, email}`, the refresh token
//! only `{id}`.

use janus_db::UserRow;
use janus_types::TokenPair;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::{TokenCodec, TokenPurpose};

/// Access-token claims.
///
/// `email` is present on pairs minted at sign-in and absent on pairs
/// minted by the renewal guard; see [`RenewalGuard`](crate::RenewalGuard).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Refresh-token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
}

/// Mints access/refresh token pairs. Pure: no side effects beyond
/// signing.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
}

impl SessionIssuer {
    /// Create an issuer over the given codec
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Mint the pair for a freshly authenticated user.
    pub fn issue(&self, user: &UserRow) -> Result<TokenPair, AuthError> {
        self.issue_for(user.id, Some(user.email.clone()))
    }

    pub(crate) fn issue_for(&self, id: Uuid, email: Option<String>) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.sign(
            &AccessClaims { id, email },
            TokenPurpose::Access,
            TokenPurpose::Access.ttl(),
        )?;

        let refresh_token = self.codec.sign(
            &RefreshClaims { id },
            TokenPurpose::Refresh,
            TokenPurpose::Refresh.ttl(),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
