//! Scripted identity provider for testing

use async_trait::async_trait;
use janus_auth_core::google::{IdentityProvider, ProviderIdentity, ProviderTokens};
use janus_auth_core::AuthError;

/// Accepts exactly one authorization code and returns a fixed identity;
/// everything else fails the way the real provider does.
pub struct ScriptedProvider {
    accepted_code: String,
    email: String,
    name: String,
    picture: String,
}

impl ScriptedProvider {
    pub fn accepting(code: &str, email: &str, name: &str, picture: &str) -> Self {
        Self {
            accepted_code: code.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            picture: picture.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, AuthError> {
        if code != self.accepted_code {
            return Err(AuthError::InvalidProviderCode);
        }

        Ok(ProviderIdentity {
            tokens: ProviderTokens {
                access_token: "ya29.test-access".to_string(),
                refresh_token: Some("1//test-refresh".to_string()),
                id_token: "test-id-token".to_string(),
                expires_in: 3599,
            },
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
        })
    }
}
