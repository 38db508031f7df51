//! Application state

use std::sync::Arc;

use janus_auth_core::google::GoogleProvider;
use janus_auth_core::mailer::SmtpMailer;
use janus_auth_core::AuthService;
use janus_db::pg::PgUserRepository;

use crate::config::Config;

/// Type alias for the auth service with concrete collaborator types
pub type AuthServiceImpl = AuthService<PgUserRepository, GoogleProvider, SmtpMailer>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for every credential flow
    pub auth: Arc<AuthServiceImpl>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }
}
