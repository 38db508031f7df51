//! Auth service - wires the token codec, session issuance, renewal, and
//! the activation / reset / federation flows behind one facade.

use std::sync::Arc;

use janus_db::{UserRepository, UserRow};
use janus_types::TokenPair;

use crate::activation::{ActivatedUser, ActivationFlow, ActivationStart, Registration};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::google::{FederatedSignIn, GoogleSignInFlow, IdentityProvider};
use crate::guard::{RenewalGuard, RenewedSession};
use crate::mailer::{MailDispatcher, Mailer};
use crate::password;
use crate::reset::PasswordResetFlow;
use crate::session::SessionIssuer;
use crate::token::TokenCodec;

/// Authentication service
///
/// Constructed once from an [`AuthConfig`]; every secret, URL, and
/// collaborator is injected here and never looked up ambiently
/// mid-request.
pub struct AuthService<U, P, M> {
    users: Arc<U>,
    issuer: SessionIssuer,
    guard: RenewalGuard<U>,
    activation: ActivationFlow<U, M>,
    reset: PasswordResetFlow<U, M>,
    google: GoogleSignInFlow<U, P>,
    mail: MailDispatcher<M>,
}

impl<U, P, M> AuthService<U, P, M>
where
    U: UserRepository,
    P: IdentityProvider,
    M: Mailer,
{
    /// Create a new auth service
    pub fn new(config: AuthConfig, users: Arc<U>, provider: Arc<P>, mailer: Arc<M>) -> Self {
        let codec = TokenCodec::new(&config);
        let issuer = SessionIssuer::new(codec.clone());
        let mail = MailDispatcher::new(mailer);
        let reset_base_url = config.reset_base_url().to_string();

        Self {
            guard: RenewalGuard::new(codec.clone(), Arc::clone(&users)),
            activation: ActivationFlow::new(codec.clone(), Arc::clone(&users), mail.clone()),
            reset: PasswordResetFlow::new(codec, Arc::clone(&users), mail.clone(), reset_base_url),
            google: GoogleSignInFlow::new(issuer.clone(), Arc::clone(&users), provider),
            issuer,
            users,
            mail,
        }
    }

    // =========================================================================
    // Registration & activation
    // =========================================================================

    /// Start a registration; nothing is persisted until activation.
    pub async fn register(&self, registration: Registration) -> Result<ActivationStart, AuthError> {
        self.activation.begin(registration).await
    }

    /// Complete an activation with the mailed code.
    pub async fn activate(&self, token: &str, code: &str) -> Result<ActivatedUser, AuthError> {
        self.activation.complete(token, code).await
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Password login. Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        email: &str,
        password_plain: &str,
    ) -> Result<(UserRow, TokenPair), AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) if password::verify_password(password_plain, &user.password_hash) => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let tokens = self.issuer.issue(&user)?;
        Ok((user, tokens))
    }

    /// Verify and rotate a session pair.
    pub async fn renew(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RenewedSession, AuthError> {
        self.guard.renew(access_token, refresh_token).await
    }

    /// Cheaply cloneable handle on the renewal guard, for transport
    /// middleware.
    pub fn renewal_guard(&self) -> RenewalGuard<U> {
        self.guard.clone()
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Mail a reset link to the account registered under `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.reset.request(email).await
    }

    /// Apply a mailed reset token and store the new password.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<UserRow, AuthError> {
        self.reset.apply(token, new_password).await
    }

    // =========================================================================
    // Federation
    // =========================================================================

    /// Sign in with a Google authorization code.
    pub async fn sign_in_with_google(&self, code: &str) -> Result<FederatedSignIn, AuthError> {
        self.google.sign_in(code).await
    }

    // =========================================================================
    // Observability
    // =========================================================================

    /// Mail deliveries that have failed since startup
    pub fn mail_failure_count(&self) -> u64 {
        self.mail.failure_count()
    }
}

impl<U, P, M> std::fmt::Debug for AuthService<U, P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}
