//! Configuration for the Auth API service.

use janus_auth_core::{AuthConfig, GoogleConfig};

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// SMTP relay settings
    pub smtp: SmtpConfig,
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let auth = AuthConfig::new(
            required("ACCESS_TOKEN_SECRET")?,
            required("REFRESH_TOKEN_SECRET")?,
            required("ACTIVATION_SECRET")?,
            required("FORGOT_PASSWORD_SECRET")?,
            required("FRONTEND_URL")?,
            GoogleConfig {
                client_id: required("GOOGLE_CLIENT_ID")?,
                client_secret: required("GOOGLE_CLIENT_SECRET")?,
                redirect_uri: required("GOOGLE_REDIRECT_URI")?,
            },
        );

        let auth = match std::env::var("ADMIN_FE_URL") {
            Ok(url) if !url.is_empty() => auth.with_admin_fe_url(url),
            _ => auth,
        };

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("SMTP_PORT"))?,
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@janus.dev".to_string()),
        };

        Ok(Self {
            http_port,
            database_url,
            auth,
            smtp,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
