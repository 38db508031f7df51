//! Session renewal guard
//!
//! The per-request gate. Neither token is ever passively accepted: every
//! successful check re-derives the pair from the refresh token's subject
//! and hands back an immutable context for downstream handlers. The
//! caller relays the rotated pair to the client on every authenticated
//! response.

use std::sync::Arc;

use janus_db::{UserRepository, UserRow};
use janus_types::TokenPair;

use crate::error::AuthError;
use crate::session::{AccessClaims, RefreshClaims, SessionIssuer};
use crate::token::{TokenCodec, TokenPurpose};

/// Outcome of a successful renewal: the resolved user plus the rotated
/// pair.
#[derive(Debug, Clone)]
pub struct RenewedSession {
    /// User resolved from the refresh token's subject
    pub user: UserRow,
    /// Freshly minted pair replacing the submitted one
    pub tokens: TokenPair,
}

/// Verifies and unconditionally rotates a session pair.
pub struct RenewalGuard<U> {
    codec: TokenCodec,
    issuer: SessionIssuer,
    users: Arc<U>,
}

impl<U> Clone for RenewalGuard<U> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            issuer: self.issuer.clone(),
            users: Arc::clone(&self.users),
        }
    }
}

impl<U: UserRepository> RenewalGuard<U> {
    /// Create a guard over the codec and user store
    pub fn new(codec: TokenCodec, users: Arc<U>) -> Self {
        let issuer = SessionIssuer::new(codec.clone());
        Self {
            codec,
            issuer,
            users,
        }
    }

    /// Verify both tokens and rotate them.
    ///
    /// The access token gates progress on validity alone; its claims are
    /// not used for lookup. The refresh token's subject drives the user
    /// load and the new pair. The rotated access token carries only the
    /// id, not the email the sign-in pair embeds; callers that need the
    /// email read it from the resolved user, not the token.
    pub async fn renew(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RenewedSession, AuthError> {
        self.codec
            .verify::<AccessClaims>(access_token, TokenPurpose::Access)
            .map_err(|_| AuthError::InvalidAccessToken)?;

        let claims = self
            .codec
            .verify::<RefreshClaims>(refresh_token, TokenPurpose::Refresh)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(claims.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Signing failures surface as Internal via the issuer; the
        // request never proceeds with the stale pair.
        let tokens = self.issuer.issue_for(user.id, None)?;

        Ok(RenewedSession { user, tokens })
    }
}

impl<U> std::fmt::Debug for RenewalGuard<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalGuard").finish_non_exhaustive()
    }
}
