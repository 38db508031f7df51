//! Registration and activation
//!
//! A draft user never touches the store: the whole record rides inside
//! a signed activation token together with a one-time 4-digit code, and
//! is committed only when the code comes back within the token's
//! 5-minute window.

use std::sync::Arc;

use janus_db::{CreateUser, UserRepository, UserRow};
use janus_types::TokenPair;
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::AuthError;
use crate::mailer::{MailDispatcher, MailTemplate, Mailer, OutboundMail};
use crate::password;
use crate::session::SessionIssuer;
use crate::token::{TokenCodec, TokenPurpose};

/// Unpersisted user record carried inside an activation token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<i64>,
    pub is_google_user: bool,
}

/// Activation-token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationClaims {
    pub user: DraftUser,
    pub activation_code: String,
}

/// What [`ActivationFlow::begin`] hands back. The transport forwards
/// only the token to the client; the code travels by mail.
#[derive(Debug, Clone)]
pub struct ActivationStart {
    pub token: String,
    pub activation_code: String,
}

/// A committed activation: the created user and its first session pair
#[derive(Debug, Clone)]
pub struct ActivatedUser {
    pub user: UserRow,
    pub tokens: TokenPair,
}

/// Registration input prior to hashing
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<i64>,
}

/// Deferred-activation registration flow
pub struct ActivationFlow<U, M> {
    codec: TokenCodec,
    issuer: SessionIssuer,
    users: Arc<U>,
    mail: MailDispatcher<M>,
}

impl<U: UserRepository, M: Mailer> ActivationFlow<U, M> {
    pub fn new(codec: TokenCodec, users: Arc<U>, mail: MailDispatcher<M>) -> Self {
        let issuer = SessionIssuer::new(codec.clone());
        Self {
            codec,
            issuer,
            users,
            mail,
        }
    }

    /// Start a registration: duplicate checks, draft token, activation
    /// mail. Nothing is persisted yet; the returned token is the only
    /// record of the pending registration.
    pub async fn begin(&self, registration: Registration) -> Result<ActivationStart, AuthError> {
        if self
            .users
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicatePhoneOrEmail(
                "a user with this email already exists".to_string(),
            ));
        }

        if let Some(phone) = registration.phone_number {
            if self.users.find_by_phone(phone).await?.is_some() {
                return Err(AuthError::DuplicatePhoneOrEmail(
                    "a user with this phone number already exists".to_string(),
                ));
            }
        }

        let draft = DraftUser {
            name: registration.name.clone(),
            email: registration.email.clone(),
            password_hash: password::hash_password(&registration.password)?,
            phone_number: registration.phone_number,
            is_google_user: false,
        };

        let activation_code = rand::thread_rng().gen_range(1000..=9999).to_string();

        let token = self.codec.sign(
            &ActivationClaims {
                user: draft,
                activation_code: activation_code.clone(),
            },
            TokenPurpose::Activation,
            TokenPurpose::Activation.ttl(),
        )?;

        self.mail.dispatch(OutboundMail {
            to: registration.email,
            subject: "Activate your account".to_string(),
            template: MailTemplate::Activation,
            name: registration.name,
            payload: activation_code.clone(),
        });

        Ok(ActivationStart {
            token,
            activation_code,
        })
    }

    /// Complete an activation: check the code, re-check for a
    /// race-created duplicate, commit the user, and return the first
    /// session pair. Any failure leaves the store untouched.
    pub async fn complete(
        &self,
        token: &str,
        supplied_code: &str,
    ) -> Result<ActivatedUser, AuthError> {
        let claims: ActivationClaims = self
            .codec
            .verify(token, TokenPurpose::Activation)
            .map_err(|_| AuthError::InvalidOrExpiredToken)?;

        let code_matches: bool = claims
            .activation_code
            .as_bytes()
            .ct_eq(supplied_code.as_bytes())
            .into();
        if !code_matches {
            return Err(AuthError::InvalidActivationCode);
        }

        let draft = claims.user;

        // Two completions can both pass this check; the store's unique
        // constraint is the backstop and surfaces as UserAlreadyExists.
        if self.users.find_by_email(&draft.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        // The id is chosen here, so the pair can be minted before the
        // insert: a failed insert leaves no user, and a created user
        // always has its session pair.
        let id = Uuid::new_v4();
        let tokens = self.issuer.issue_for(id, Some(draft.email.clone()))?;

        let user = self
            .users
            .create(CreateUser {
                id,
                name: draft.name,
                email: draft.email,
                password_hash: draft.password_hash,
                phone_number: draft.phone_number,
            })
            .await?;

        Ok(ActivatedUser { user, tokens })
    }
}
