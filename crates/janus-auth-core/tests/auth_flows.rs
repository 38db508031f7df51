//! Integration tests for the credential-lifecycle flows
//!
//! Exercises the activation, login, renewal, reset, and federation
//! flows against in-memory mocks, including the regression pins for the
//! rotated-access-token claims and the reset decode-not-verify path.

mod common;

use std::sync::Arc;

use chrono::Duration;
use janus_auth_core::activation::{ActivationClaims, DraftUser, Registration};
use janus_auth_core::mailer::MailTemplate;
use janus_auth_core::reset::{ResetClaims, UserSnapshot};
use janus_auth_core::session::{AccessClaims, RefreshClaims};
use janus_auth_core::{password, AuthError, TokenCodec, TokenPurpose};
use janus_db::{CreateAvatar, UserRepository, UserRow};
use uuid::Uuid;

use common::mock_repos::MockUserRepository;
use common::{harness, harness_with, test_config, wait_until, Harness};

fn registration() -> Registration {
    Registration {
        name: "A".to_string(),
        email: "a@x.com".to_string(),
        password: "pw12345".to_string(),
        phone_number: Some(5551234),
    }
}

fn different_code(code: &str) -> String {
    if code == "1234" {
        "5678".to_string()
    } else {
        "1234".to_string()
    }
}

fn insert_user(h: &Harness, email: &str, password: &str) -> UserRow {
    let user = MockUserRepository::test_user(email, &password::hash_password(password).unwrap());
    h.users.insert_user(user.clone());
    user
}

// ============================================================================
// Registration & activation
// ============================================================================

#[tokio::test]
async fn register_returns_token_and_mails_code() {
    let h = harness();

    let started = h.auth.register(registration()).await.unwrap();

    assert!(!started.token.is_empty());
    assert_eq!(started.activation_code.len(), 4);
    let code: u32 = started.activation_code.parse().unwrap();
    assert!((1000..=9999).contains(&code));

    // Nothing is persisted until activation.
    assert_eq!(h.users.user_count(), 0);

    wait_until(|| h.mailer.sent_count() == 1).await;
    let mail = &h.mailer.sent()[0];
    assert_eq!(mail.to, "a@x.com");
    assert_eq!(mail.template, MailTemplate::Activation);
    assert_eq!(mail.payload, started.activation_code);
}

#[tokio::test]
async fn activation_scenario_wrong_then_right_code() {
    let h = harness();
    let started = h.auth.register(registration()).await.unwrap();

    let wrong = h
        .auth
        .activate(&started.token, &different_code(&started.activation_code))
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidActivationCode)));
    assert_eq!(h.users.user_count(), 0);

    let activated = h
        .auth
        .activate(&started.token, &started.activation_code)
        .await
        .unwrap();

    assert_eq!(activated.user.email, "a@x.com");
    assert_eq!(activated.user.phone_number, Some(5551234));
    assert_eq!(h.users.user_count(), 1);

    // The pair is live: the renewal guard accepts and rotates it.
    let renewed = h
        .auth
        .renew(
            &activated.tokens.access_token,
            &activated.tokens.refresh_token,
        )
        .await
        .unwrap();
    assert_eq!(renewed.user.id, activated.user.id);
}

#[tokio::test]
async fn register_survives_mail_failure() {
    // Mail is fire-and-forget: a dead transport never aborts the flow,
    // it only shows up in the failure counter.
    let h = harness();
    h.mailer.set_failing(true);

    let started = h.auth.register(registration()).await.unwrap();
    assert!(!started.token.is_empty());

    wait_until(|| h.auth.mail_failure_count() == 1).await;
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let h = harness();
    insert_user(&h, "a@x.com", "other-pw");

    let result = h.auth.register(registration()).await;
    assert!(matches!(result, Err(AuthError::DuplicatePhoneOrEmail(_))));
}

#[tokio::test]
async fn register_rejects_duplicate_phone() {
    let h = harness();
    let mut user = MockUserRepository::test_user(
        "other@x.com",
        &password::hash_password("other-pw").unwrap(),
    );
    user.phone_number = Some(5551234);
    h.users.insert_user(user);

    let result = h.auth.register(registration()).await;
    assert!(matches!(result, Err(AuthError::DuplicatePhoneOrEmail(_))));
}

#[tokio::test]
async fn activation_rejects_expired_token() {
    let h = harness();

    let claims = ActivationClaims {
        user: DraftUser {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password_hash: password::hash_password("pw12345").unwrap(),
            phone_number: Some(5551234),
            is_google_user: false,
        },
        activation_code: "1234".to_string(),
    };
    let expired = h
        .codec
        .sign(&claims, TokenPurpose::Activation, Duration::seconds(-30))
        .unwrap();

    let result = h.auth.activate(&expired, "1234").await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    assert_eq!(h.users.user_count(), 0);
}

#[tokio::test]
async fn activation_rejects_garbage_token() {
    let h = harness();
    let result = h.auth.activate("not-a-token", "1234").await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn second_activation_hits_duplicate_guard() {
    let h = harness();
    let started = h.auth.register(registration()).await.unwrap();

    h.auth
        .activate(&started.token, &started.activation_code)
        .await
        .unwrap();

    // The token is still within its window; replay is stopped by the
    // duplicate check, not by a consumption record.
    let replay = h
        .auth
        .activate(&started.token, &started.activation_code)
        .await;
    assert!(matches!(replay, Err(AuthError::UserAlreadyExists)));
    assert_eq!(h.users.user_count(), 1);
}

#[tokio::test]
async fn concurrent_activations_create_at_most_one_user() {
    let h = harness();
    let started = h.auth.register(registration()).await.unwrap();

    let spawn_activate = |h: &Harness| {
        let auth = Arc::clone(&h.auth);
        let token = started.token.clone();
        let code = started.activation_code.clone();
        tokio::spawn(async move { auth.activate(&token, &code).await })
    };

    let first = spawn_activate(&h);
    let second = spawn_activate(&h);

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(successes, 1);
    assert_eq!(h.users.user_count(), 1);
    for result in results {
        if let Err(err) = result {
            assert!(matches!(err, AuthError::UserAlreadyExists));
        }
    }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_issues_pair_with_email_claim() {
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let (logged_in, tokens) = h.auth.login("a@x.com", "pw12345").await.unwrap();
    assert_eq!(logged_in.id, user.id);

    let access: AccessClaims = h
        .codec
        .verify(&tokens.access_token, TokenPurpose::Access)
        .unwrap();
    assert_eq!(access.id, user.id);
    assert_eq!(access.email.as_deref(), Some("a@x.com"));

    let refresh: RefreshClaims = h
        .codec
        .verify(&tokens.refresh_token, TokenPurpose::Refresh)
        .unwrap();
    assert_eq!(refresh.id, user.id);
}

#[tokio::test]
async fn login_failures_are_indistinct() {
    let h = harness();
    insert_user(&h, "a@x.com", "pw12345");

    let wrong_password = h.auth.login("a@x.com", "wrong").await;
    let unknown_email = h.auth.login("nobody@x.com", "pw12345").await;

    assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
    assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
}

// ============================================================================
// Session renewal
// ============================================================================

#[tokio::test]
async fn renewal_rotates_both_tokens() {
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    // Sign the submitted pair with slightly shorter TTLs so the rotated
    // pair necessarily differs byte-for-byte.
    let access = h
        .codec
        .sign(
            &AccessClaims {
                id: user.id,
                email: Some(user.email.clone()),
            },
            TokenPurpose::Access,
            Duration::minutes(14),
        )
        .unwrap();
    let refresh = h
        .codec
        .sign(
            &RefreshClaims { id: user.id },
            TokenPurpose::Refresh,
            Duration::days(6),
        )
        .unwrap();

    let renewed = h.auth.renew(&access, &refresh).await.unwrap();

    assert_eq!(renewed.user.id, user.id);
    assert_ne!(renewed.tokens.access_token, access);
    assert_ne!(renewed.tokens.refresh_token, refresh);

    // The rotated pair verifies under the right purposes.
    h.codec
        .verify::<AccessClaims>(&renewed.tokens.access_token, TokenPurpose::Access)
        .unwrap();
    h.codec
        .verify::<RefreshClaims>(&renewed.tokens.refresh_token, TokenPurpose::Refresh)
        .unwrap();
}

#[tokio::test]
async fn rotated_access_token_omits_email() {
    // Pins the claims asymmetry: sign-in pairs carry {id, email}, pairs
    // minted by the guard carry only {id}.
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let (_, tokens) = h.auth.login("a@x.com", "pw12345").await.unwrap();
    let initial: AccessClaims = h
        .codec
        .verify(&tokens.access_token, TokenPurpose::Access)
        .unwrap();
    assert!(initial.email.is_some());

    let renewed = h
        .auth
        .renew(&tokens.access_token, &tokens.refresh_token)
        .await
        .unwrap();
    let rotated: AccessClaims = h
        .codec
        .verify(&renewed.tokens.access_token, TokenPurpose::Access)
        .unwrap();

    assert_eq!(rotated.id, user.id);
    assert!(rotated.email.is_none());
}

#[tokio::test]
async fn renewal_rejects_expired_access_token() {
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let expired_access = h
        .codec
        .sign(
            &AccessClaims {
                id: user.id,
                email: None,
            },
            TokenPurpose::Access,
            Duration::seconds(-30),
        )
        .unwrap();
    let valid_refresh = h
        .codec
        .sign(
            &RefreshClaims { id: user.id },
            TokenPurpose::Refresh,
            Duration::days(7),
        )
        .unwrap();

    let result = h.auth.renew(&expired_access, &valid_refresh).await;
    assert!(matches!(result, Err(AuthError::InvalidAccessToken)));
}

#[tokio::test]
async fn renewal_rejects_bad_refresh_token() {
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let access = h
        .codec
        .sign(
            &AccessClaims {
                id: user.id,
                email: None,
            },
            TokenPurpose::Access,
            Duration::minutes(15),
        )
        .unwrap();

    // An access token replayed in the refresh slot must not verify:
    // the purposes use independent secrets.
    let result = h.auth.renew(&access, &access).await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));

    let result = h.auth.renew(&access, "garbage").await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn renewal_rejects_unknown_subject() {
    let h = harness();

    let ghost = Uuid::new_v4();
    let access = h
        .codec
        .sign(
            &AccessClaims {
                id: ghost,
                email: None,
            },
            TokenPurpose::Access,
            Duration::minutes(15),
        )
        .unwrap();
    let refresh = h
        .codec
        .sign(
            &RefreshClaims { id: ghost },
            TokenPurpose::Refresh,
            Duration::days(7),
        )
        .unwrap();

    let result = h.auth.renew(&access, &refresh).await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn reset_request_rejects_unknown_email() {
    let h = harness();
    let result = h.auth.request_password_reset("nobody@x.com").await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn reset_flow_updates_password() {
    let h = harness();
    insert_user(&h, "a@x.com", "old-password");

    h.auth.request_password_reset("a@x.com").await.unwrap();

    wait_until(|| h.mailer.sent_count() == 1).await;
    let mail = &h.mailer.sent()[0];
    assert_eq!(mail.template, MailTemplate::PasswordReset);
    assert!(mail
        .payload
        .starts_with("https://app.example.com/reset-password?verify="));

    let token = mail.payload.split("verify=").nth(1).unwrap().to_string();
    h.auth.reset_password(&token, "new-password").await.unwrap();

    assert!(h.auth.login("a@x.com", "new-password").await.is_ok());
    assert!(matches!(
        h.auth.login("a@x.com", "old-password").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn reset_link_prefers_admin_frontend() {
    let h = harness_with(test_config().with_admin_fe_url("https://admin.example.com"));
    insert_user(&h, "a@x.com", "pw12345");

    h.auth.request_password_reset("a@x.com").await.unwrap();

    wait_until(|| h.mailer.sent_count() == 1).await;
    assert!(h.mailer.sent()[0]
        .payload
        .starts_with("https://admin.example.com/reset-password?verify="));
}

#[tokio::test]
async fn reset_rejects_expired_token() {
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let expired = h
        .codec
        .sign(
            &ResetClaims {
                user: UserSnapshot::from(&user),
            },
            TokenPurpose::PasswordReset,
            Duration::seconds(-30),
        )
        .unwrap();

    let result = h.auth.reset_password(&expired, "new-password").await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn reset_accepts_foreign_signature_before_expiry() {
    // Pins the decode-not-verify gap: the applying side checks only the
    // embedded expiry, so a token signed under the wrong secret is
    // accepted while unexpired. Deliberate; see TokenCodec::decode_unverified.
    let h = harness();
    let user = insert_user(&h, "a@x.com", "pw12345");

    let mut foreign_config = test_config();
    foreign_config.forgot_password_secret = "a-completely-different-secret".to_string();
    let foreign_codec = TokenCodec::new(&foreign_config);

    let forged = foreign_codec
        .sign(
            &ResetClaims {
                user: UserSnapshot::from(&user),
            },
            TokenPurpose::PasswordReset,
            Duration::minutes(5),
        )
        .unwrap();

    h.auth.reset_password(&forged, "new-password").await.unwrap();
    assert!(h.auth.login("a@x.com", "new-password").await.is_ok());
}

// ============================================================================
// Federated sign-in
// ============================================================================

#[tokio::test]
async fn google_sign_in_creates_user_with_avatar() {
    let h = harness();

    let signed_in = h.auth.sign_in_with_google("good-code").await.unwrap();

    assert_eq!(signed_in.user.email, "g@x.com");
    assert_eq!(signed_in.user.name, "G");
    assert_eq!(signed_in.user.phone_number, None);
    assert_eq!(
        signed_in.avatar.as_ref().map(|a| a.url.as_str()),
        Some("http://img")
    );
    assert_eq!(signed_in.provider_tokens.access_token, "ya29.test-access");
    assert_eq!(h.users.user_count(), 1);

    // The throwaway password is a real bcrypt digest.
    assert!(signed_in.user.password_hash.starts_with("$2b$10$"));

    // The pair is live.
    h.auth
        .renew(
            &signed_in.tokens.access_token,
            &signed_in.tokens.refresh_token,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn google_sign_in_backfills_missing_avatar() {
    let h = harness();
    let existing = insert_user(&h, "g@x.com", "pw12345");

    let signed_in = h.auth.sign_in_with_google("good-code").await.unwrap();

    assert_eq!(signed_in.user.id, existing.id);
    assert_eq!(
        signed_in.avatar.as_ref().map(|a| a.url.as_str()),
        Some("http://img")
    );
    assert_eq!(h.users.user_count(), 1);
}

#[tokio::test]
async fn google_sign_in_keeps_existing_avatar() {
    let h = harness();
    let existing = insert_user(&h, "g@x.com", "pw12345");
    h.users
        .attach_avatar(
            existing.id,
            CreateAvatar {
                public_id: "google_0".to_string(),
                url: "http://old".to_string(),
            },
        )
        .await
        .unwrap();

    let signed_in = h.auth.sign_in_with_google("good-code").await.unwrap();

    assert_eq!(
        signed_in.avatar.as_ref().map(|a| a.url.as_str()),
        Some("http://old")
    );
}

#[tokio::test]
async fn google_sign_in_rejects_bad_code() {
    let h = harness();
    let result = h.auth.sign_in_with_google("bad-code").await;
    assert!(matches!(result, Err(AuthError::InvalidProviderCode)));
    assert_eq!(h.users.user_count(), 0);
}
