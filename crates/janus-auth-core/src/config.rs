//! Configuration types for the auth core

/// Google OAuth client settings
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client ID (also the expected id-token audience)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
}

/// Auth core configuration
///
/// Built once at startup and handed to [`AuthService::new`](crate::AuthService::new);
/// no component reads configuration ambiently mid-request. Each token
/// purpose has its own secret so a token signed for one purpose can
/// never verify as another.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for access tokens
    pub access_token_secret: String,
    /// Secret for refresh tokens
    pub refresh_token_secret: String,
    /// Secret for activation tokens
    pub activation_secret: String,
    /// Secret for password-reset tokens
    pub forgot_password_secret: String,
    /// Default frontend base URL for reset links
    pub frontend_url: String,
    /// Admin frontend base URL; overrides `frontend_url` for reset links
    pub admin_fe_url: Option<String>,
    /// Google OAuth client settings
    pub google: GoogleConfig,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(
        access_token_secret: impl Into<String>,
        refresh_token_secret: impl Into<String>,
        activation_secret: impl Into<String>,
        forgot_password_secret: impl Into<String>,
        frontend_url: impl Into<String>,
        google: GoogleConfig,
    ) -> Self {
        Self {
            access_token_secret: access_token_secret.into(),
            refresh_token_secret: refresh_token_secret.into(),
            activation_secret: activation_secret.into(),
            forgot_password_secret: forgot_password_secret.into(),
            frontend_url: frontend_url.into(),
            admin_fe_url: None,
            google,
        }
    }

    /// Set the admin frontend base URL
    #[must_use]
    pub fn with_admin_fe_url(mut self, url: impl Into<String>) -> Self {
        self.admin_fe_url = Some(url.into());
        self
    }

    /// Base URL for password-reset links: the admin frontend when
    /// configured, the default frontend otherwise.
    pub fn reset_base_url(&self) -> &str {
        self.admin_fe_url.as_deref().unwrap_or(&self.frontend_url)
    }
}
