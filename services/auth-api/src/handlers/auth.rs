//! Authentication handlers (register, activate, login, google, reset, me)

use axum::extract::State;
use axum::Json;
use janus_auth_core::activation::Registration;
use janus_auth_core::google::ProviderTokens;
use janus_axum::AuthContext;
use janus_db::{AvatarRow, UserRow};
use janus_types::{
    ActivationRequest, ForgotPasswordRequest, GoogleSignInRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserInfo {
    fn from_user(user: &UserRow) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number,
            avatar_url: None,
        }
    }

    fn with_avatar(user: &UserRow, avatar: Option<&AvatarRow>) -> Self {
        Self {
            avatar_url: avatar.map(|a| a.url.clone()),
            ..Self::from_user(user)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub activation_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct GoogleSignInResponse {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
    pub provider_tokens: ProviderTokens,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/register
///
/// Start a registration. The activation code travels by mail; only the
/// token is returned to the client.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let started = state
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            phone_number: req.phone_number,
        })
        .await?;

    Ok(Json(RegisterResponse {
        activation_token: started.token,
    }))
}

/// POST /api/v1/auth/activate
///
/// Complete an activation with the mailed code; returns the created
/// user and its first session pair.
pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivationRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let activated = state
        .auth
        .activate(&req.activation_token, &req.activation_code)
        .await?;

    Ok(Json(SessionResponse {
        user: UserInfo::from_user(&activated.user),
        access_token: activated.tokens.access_token,
        refresh_token: activated.tokens.refresh_token,
    }))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (user, tokens) = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(SessionResponse {
        user: UserInfo::from_user(&user),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /api/v1/auth/google
///
/// Exchange a Google authorization code for a local session.
pub async fn google(
    State(state): State<AppState>,
    Json(req): Json<GoogleSignInRequest>,
) -> ApiResult<Json<GoogleSignInResponse>> {
    let signed_in = state.auth.sign_in_with_google(&req.code).await?;

    Ok(Json(GoogleSignInResponse {
        user: UserInfo::with_avatar(&signed_in.user, signed_in.avatar.as_ref()),
        access_token: signed_in.tokens.access_token,
        refresh_token: signed_in.tokens.refresh_token,
        provider_tokens: signed_in.provider_tokens,
    }))
}

/// POST /api/v1/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.request_password_reset(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Forgot password request successful".to_string(),
    }))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.auth.reset_password(&req.token, &req.password).await?;

    Ok(Json(MessageResponse {
        message: format!("Password updated for {}", user.email),
    }))
}

/// GET /api/v1/auth/me
///
/// Current user plus the rotated pair the renewal layer attached.
pub async fn me(context: AuthContext) -> ApiResult<Json<SessionResponse>> {
    Ok(Json(SessionResponse {
        user: UserInfo::from_user(&context.user),
        access_token: context.access_token,
        refresh_token: context.refresh_token,
    }))
}

/// POST /api/v1/auth/logout
///
/// Sessions are stateless; logout just confirms so clients drop their
/// pair.
pub async fn logout(_context: AuthContext) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(MessageResponse {
        message: "Logged out successfully!".to_string(),
    }))
}
