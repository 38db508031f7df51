//! Authentication types

use serde::{Deserialize, Serialize};

/// An access/refresh token pair minted for an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token, re-minted on every authenticated call
    pub access_token: String,
    /// Long-lived refresh token driving session renewal
    pub refresh_token: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Plaintext password, hashed before it leaves the core
    pub password: String,
    /// Phone number (unique when present)
    pub phone_number: Option<i64>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Activation completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationRequest {
    /// Token returned by registration
    pub activation_token: String,
    /// 4-digit code delivered by mail
    pub activation_code: String,
}

/// Password reset request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email address of the account to reset
    pub email: String,
}

/// Password reset submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    /// Token carried in the mailed reset link
    pub token: String,
    /// New plaintext password
    pub password: String,
}

/// Federated sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSignInRequest {
    /// Authorization code from the provider's redirect
    pub code: String,
}
