//! Google sign-in
//!
//! Exchanges an authorization code for Google tokens, validates the
//! returned id token against Google's JWKS, and resolves a local user.
//! Every provider-side failure collapses into
//! [`AuthError::InvalidProviderCode`]; the caller learns nothing about
//! which step rejected the code.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use janus_db::{AvatarRow, CreateAvatar, CreateUser, UserRepository, UserRow};
use janus_types::TokenPair;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::GoogleConfig;
use crate::error::AuthError;
use crate::password;
use crate::session::SessionIssuer;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const JWKS_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Tokens returned by the provider's code exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub id_token: String,
    pub expires_in: i64,
}

/// Identity assertion extracted from the provider
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub tokens: ProviderTokens,
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Exchanges an authorization code for an identity assertion
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange `code`; any provider-side failure is
    /// [`AuthError::InvalidProviderCode`].
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, AuthError>;
}

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Individual JWK
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// Claims Google embeds in its id token (the subset Janus reads)
#[derive(Debug, Clone, Deserialize)]
struct GoogleIdClaims {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google OAuth provider with JWKS caching
///
/// Security features:
/// - Caches the full JWKS to prevent fetch flooding attacks
/// - Rejects unknown key IDs without triggering a refetch
/// - Uses constant-time comparison for the audience check
pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
    /// Cache of kid -> DecodingKey
    key_cache: Cache<String, Arc<DecodingKey>>,
    /// Cache of known valid key IDs (prevents fetch flooding)
    jwks_kids_cache: Cache<String, Arc<Vec<String>>>,
}

impl GoogleProvider {
    const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

    /// Create a provider with an HTTP client tuned for fast failure
    pub fn new(config: GoogleConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            http,
            key_cache: Cache::builder()
                .time_to_live(Self::CACHE_TTL)
                .max_capacity(16)
                .build(),
            jwks_kids_cache: Cache::builder()
                .time_to_live(Self::CACHE_TTL)
                .max_capacity(1)
                .build(),
        }
    }

    async fn fetch_tokens(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("google token exchange failed: {e}");
                AuthError::InvalidProviderCode
            })?;

        if !response.status().is_success() {
            tracing::debug!("google token exchange returned {}", response.status());
            return Err(AuthError::InvalidProviderCode);
        }

        response.json::<ProviderTokens>().await.map_err(|e| {
            tracing::debug!("google token response unparsable: {e}");
            AuthError::InvalidProviderCode
        })
    }

    async fn validate_id_token(&self, id_token: &str) -> Result<GoogleIdClaims, AuthError> {
        let header = decode_header(id_token).map_err(|e| {
            tracing::debug!("failed to decode id token header: {e}");
            AuthError::InvalidProviderCode
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("id token missing kid");
            AuthError::InvalidProviderCode
        })?;

        let decoding_key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&["https://accounts.google.com", "accounts.google.com"]);
        // Audience is checked manually below in constant time.
        validation.validate_aud = false;

        let token_data =
            decode::<GoogleIdClaims>(id_token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!("id token validation failed: {e}");
                AuthError::InvalidProviderCode
            })?;

        let claims = token_data.claims;

        let audience_ok: bool = claims
            .aud
            .as_bytes()
            .ct_eq(self.config.client_id.as_bytes())
            .into();
        if !audience_ok {
            tracing::debug!("id token audience mismatch");
            return Err(AuthError::InvalidProviderCode);
        }

        Ok(claims)
    }

    /// Get a decoding key for the given kid.
    ///
    /// If a cached list of known key IDs exists and `kid` is not in it,
    /// the token is rejected immediately without refetching the JWKS.
    async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.key_cache.get(kid).await {
            return Ok(key);
        }

        if let Some(known_kids) = self.jwks_kids_cache.get("jwks").await {
            if !known_kids.contains(&kid.to_string()) {
                tracing::debug!("unknown key id '{kid}' not in cached JWKS");
                return Err(AuthError::InvalidProviderCode);
            }
        }

        let jwks = self.fetch_jwks().await?;

        let kids: Vec<String> = jwks.keys.iter().map(|k| k.kid.clone()).collect();
        self.jwks_kids_cache
            .insert("jwks".to_string(), Arc::new(kids))
            .await;

        let jwk = jwks.keys.iter().find(|k| k.kid == kid).ok_or_else(|| {
            tracing::debug!("key not found in JWKS: {kid}");
            AuthError::InvalidProviderCode
        })?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            tracing::error!("failed to create decoding key: {e}");
            AuthError::InvalidProviderCode
        })?;

        let key = Arc::new(decoding_key);

        for k in &jwks.keys {
            if let Ok(dk) = DecodingKey::from_rsa_components(&k.n, &k.e) {
                self.key_cache.insert(k.kid.clone(), Arc::new(dk)).await;
            }
        }

        Ok(key)
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        tracing::debug!("fetching JWKS from {JWKS_ENDPOINT}");

        let response = self.http.get(JWKS_ENDPOINT).send().await.map_err(|e| {
            tracing::error!("failed to fetch JWKS: {e}");
            AuthError::InvalidProviderCode
        })?;

        if !response.status().is_success() {
            tracing::error!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::InvalidProviderCode);
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!("failed to parse JWKS: {e}");
            AuthError::InvalidProviderCode
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, AuthError> {
        let tokens = self.fetch_tokens(code).await?;
        let claims = self.validate_id_token(&tokens.id_token).await?;

        Ok(ProviderIdentity {
            email: claims.email,
            name: claims.name.unwrap_or_default(),
            picture: claims.picture.unwrap_or_default(),
            tokens,
        })
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

/// Result of a federated sign-in
#[derive(Debug, Clone)]
pub struct FederatedSignIn {
    pub user: UserRow,
    pub avatar: Option<AvatarRow>,
    pub tokens: TokenPair,
    pub provider_tokens: ProviderTokens,
}

/// Federated sign-in flow: exchange, find-or-create, issue
pub struct GoogleSignInFlow<U, P> {
    issuer: SessionIssuer,
    users: Arc<U>,
    provider: Arc<P>,
}

impl<U: UserRepository, P: IdentityProvider> GoogleSignInFlow<U, P> {
    pub fn new(issuer: SessionIssuer, users: Arc<U>, provider: Arc<P>) -> Self {
        Self {
            issuer,
            users,
            provider,
        }
    }

    /// Exchange the code and resolve a local user, creating one (with a
    /// throwaway password and the provider picture as avatar) when none
    /// exists, backfilling the avatar when missing.
    pub async fn sign_in(&self, code: &str) -> Result<FederatedSignIn, AuthError> {
        let identity = self.provider.exchange_code(code).await?;

        let (user, avatar) = self.find_or_create(&identity).await?;
        let tokens = self.issuer.issue(&user)?;

        Ok(FederatedSignIn {
            user,
            avatar,
            tokens,
            provider_tokens: identity.tokens,
        })
    }

    async fn find_or_create(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<(UserRow, Option<AvatarRow>), AuthError> {
        let new_avatar = || CreateAvatar {
            public_id: format!("google_{}", Utc::now().timestamp_millis()),
            url: identity.picture.clone(),
        };

        match self.users.find_by_email(&identity.email).await? {
            None => {
                let password_hash =
                    password::hash_password(&password::generate_throwaway_password())?;

                let user = self
                    .users
                    .create_with_avatar(
                        CreateUser {
                            id: Uuid::new_v4(),
                            name: identity.name.clone(),
                            email: identity.email.clone(),
                            password_hash,
                            phone_number: None,
                        },
                        new_avatar(),
                    )
                    .await?;

                // Reload so the caller sees the avatar the transaction
                // just wrote.
                let avatar = self.users.find_avatar(user.id).await?;
                Ok((user, avatar))
            }
            Some(user) => {
                let avatar = match self.users.find_avatar(user.id).await? {
                    Some(avatar) => Some(avatar),
                    None => Some(self.users.attach_avatar(user.id, new_avatar()).await?),
                };
                Ok((user, avatar))
            }
        }
    }
}
