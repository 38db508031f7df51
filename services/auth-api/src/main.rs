//! Janus Auth API
//!
//! Authentication service exposing the registration, session, reset,
//! and federation flows over REST.

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use janus_auth_core::google::GoogleProvider;
use janus_auth_core::mailer::SmtpMailer;
use janus_auth_core::AuthService;
use janus_axum::RenewalLayer;
use janus_db::pg::PgUserRepository;
use lettre::message::Mailbox;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Janus Auth API");

    let config = Config::from_env()?;

    let pool = janus_db::create_pool(&config.database_url).await?;
    let users = Arc::new(PgUserRepository::new(pool));

    let provider = Arc::new(GoogleProvider::new(config.auth.google.clone()));

    let from: Mailbox = config
        .smtp
        .from
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid MAIL_FROM: {e}"))?;
    let mailer = Arc::new(SmtpMailer::new(
        &config.smtp.host,
        config.smtp.port,
        config.smtp.username.as_deref(),
        config.smtp.password.as_deref(),
        from,
    )?);

    let auth = AuthService::new(config.auth.clone(), users, provider, mailer);
    let renewal = RenewalLayer::new(auth.renewal_guard());

    let http_port = config.http_port;
    let state = AppState::new(auth, config);
    tracing::info!(
        "Reset links will use {}",
        state.config.auth.reset_base_url()
    );

    // Routes behind the renewal guard rotate the pair on every call.
    let protected = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .layer(renewal);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/activate", post(handlers::auth::activate))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/google", post(handlers::auth::google))
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .merge(protected)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
