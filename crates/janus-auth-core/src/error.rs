//! Auth errors

use thiserror::Error;

use crate::token::TokenError;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Request is missing one or both session tokens
    #[error("unauthorized access")]
    Unauthenticated,

    /// Access token failed verification (malformed, tampered, expired)
    #[error("invalid access token")]
    InvalidAccessToken,

    /// Refresh token failed verification
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Supplied activation code does not match the token's code
    #[error("invalid activation code")]
    InvalidActivationCode,

    /// A user already exists for this email
    #[error("user already exists with this email")]
    UserAlreadyExists,

    /// No user found for the given identifier
    #[error("user not found")]
    UserNotFound,

    /// Activation or reset token is undecodable or past its expiry
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// Provider-side code exchange or identity verification failed
    #[error("failed to validate provider code")]
    InvalidProviderCode,

    /// Registration collides with an existing email or phone number
    #[error("{0}")]
    DuplicatePhoneOrEmail(String),

    /// Unknown email or wrong password; deliberately indistinct
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Unexpected store or signing failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated
            | Self::InvalidAccessToken
            | Self::InvalidRefreshToken
            | Self::InvalidCredentials => 401,
            Self::UserNotFound => 404,
            Self::InvalidActivationCode
            | Self::UserAlreadyExists
            | Self::InvalidOrExpiredToken
            | Self::InvalidProviderCode
            | Self::DuplicatePhoneOrEmail(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidAccessToken => "INVALID_ACCESS_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::InvalidActivationCode => "INVALID_ACTIVATION_CODE",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::InvalidProviderCode => "INVALID_PROVIDER_CODE",
            Self::DuplicatePhoneOrEmail(_) => "DUPLICATE_PHONE_OR_EMAIL",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<janus_db::DbError> for AuthError {
    fn from(err: janus_db::DbError) -> Self {
        match err {
            janus_db::DbError::NotFound => Self::UserNotFound,
            // The store's unique constraints are the backstop for racy
            // create paths; a conflict there means the user exists.
            janus_db::DbError::UniqueViolation(constraint) => {
                tracing::debug!("unique violation on {constraint}");
                Self::UserAlreadyExists
            }
            janus_db::DbError::Sqlx(e) => {
                tracing::error!("database error: {e}");
                Self::Internal("database failure".to_string())
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => {
                tracing::error!("token signing failed: {msg}");
                Self::Internal("token signing failed".to_string())
            }
            TokenError::Verification | TokenError::Undecodable => Self::InvalidOrExpiredToken,
        }
    }
}
