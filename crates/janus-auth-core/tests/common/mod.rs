//! Shared fixtures for integration tests

pub mod mock_mail;
pub mod mock_provider;
pub mod mock_repos;

use std::sync::Arc;
use std::time::Duration;

use janus_auth_core::{AuthConfig, AuthService, GoogleConfig, TokenCodec};

use self::mock_mail::CapturingMailer;
use self::mock_provider::ScriptedProvider;
use self::mock_repos::MockUserRepository;

/// Config used by most tests
pub fn test_config() -> AuthConfig {
    AuthConfig::new(
        "access-secret-for-integration-tests",
        "refresh-secret-for-integration-tests",
        "activation-secret-for-integration-tests",
        "forgot-secret-for-integration-tests",
        "https://app.example.com",
        GoogleConfig {
            client_id: "google-client-id".to_string(),
            client_secret: "google-client-secret".to_string(),
            redirect_uri: "https://app.example.com/oauth/callback".to_string(),
        },
    )
}

/// Everything a flow test needs: the service plus handles on its mocks.
pub struct Harness {
    pub auth: Arc<AuthService<MockUserRepository, ScriptedProvider, CapturingMailer>>,
    pub users: Arc<MockUserRepository>,
    pub mailer: Arc<CapturingMailer>,
    pub codec: TokenCodec,
}

/// Harness over [`test_config`], with the scripted provider accepting
/// `"good-code"` for `g@x.com`.
#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: AuthConfig) -> Harness {
    let users = Arc::new(MockUserRepository::new());
    let mailer = Arc::new(CapturingMailer::new());
    let provider = Arc::new(ScriptedProvider::accepting(
        "good-code",
        "g@x.com",
        "G",
        "http://img",
    ));
    let codec = TokenCodec::new(&config);

    let auth = AuthService::new(
        config,
        Arc::clone(&users),
        provider,
        Arc::clone(&mailer),
    );

    Harness {
        auth: Arc::new(auth),
        users,
        mailer,
        codec,
    }
}

/// Poll until `done` holds; mail dispatch runs on a spawned task.
#[allow(dead_code)]
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
