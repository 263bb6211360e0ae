//! Engine-level tests for the token lifecycle and session validation,
//! run against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use authgate::auth::{sha256_hex, Authenticator, SessionManager, TokenCodec};
use authgate::configuration::TokenSettings;
use authgate::error::AppError;
use authgate::store::{MemoryStore, SharedStore, Store};

struct TestEngine {
    store: Arc<MemoryStore>,
    codec: Arc<TokenCodec>,
    manager: SessionManager,
    authenticator: Authenticator,
}

fn test_engine() -> TestEngine {
    let store = Arc::new(MemoryStore::new());
    let codec = Arc::new(
        TokenCodec::from_settings(&TokenSettings {
            access_secret: "flow-test-access-secret-32-characters".to_string(),
            refresh_secret: "flow-test-refresh-secret-32-charactr".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .expect("Failed to build codec"),
    );

    let shared: SharedStore = store.clone();
    TestEngine {
        store,
        codec: codec.clone(),
        manager: SessionManager::new(shared.clone(), codec.clone()),
        authenticator: Authenticator::new(shared, codec),
    }
}

#[tokio::test]
async fn full_lifecycle_register_authenticate_logout() {
    let engine = test_engine();

    let pair = engine
        .manager
        .register("A", "a@example.com", "password1")
        .await
        .expect("registration failed");

    // Bearer fast path: resolves without touching the session row.
    let resolved = engine
        .authenticator
        .authenticate(Some(&pair.access_token), None)
        .await
        .expect("bearer authentication failed");
    assert!(resolved.new_access_token.is_none());

    // Cookie fallback path: resolves and reissues an access token.
    let resolved = engine
        .authenticator
        .authenticate(None, Some(&pair.refresh_token))
        .await
        .expect("cookie authentication failed");
    let reissued = resolved.new_access_token.expect("expected reissued token");
    assert_eq!(
        engine
            .codec
            .verify_access(&reissued)
            .unwrap()
            .user_id()
            .unwrap(),
        resolved.user_id
    );

    // Logout revokes the session even though the refresh token is still
    // cryptographically valid.
    engine.manager.logout(&pair.refresh_token).await.unwrap();
    assert!(engine.codec.verify_refresh(&pair.refresh_token).is_ok());

    let result = engine
        .authenticator
        .authenticate(None, Some(&pair.refresh_token))
        .await;
    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn expired_session_row_is_dead_even_if_still_stored() {
    let engine = test_engine();

    let pair = engine
        .manager
        .register("A", "a@example.com", "password1")
        .await
        .unwrap();

    let digest = sha256_hex(pair.refresh_token.as_bytes());
    engine
        .store
        .expire_session(&digest, Utc::now() - Duration::minutes(1));
    assert!(engine.store.session_row_exists(&digest));

    let result = engine.manager.refresh_access(&pair.refresh_token).await;
    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn concurrent_refresh_calls_both_succeed() {
    let engine = test_engine();

    let pair = engine
        .manager
        .register("A", "a@example.com", "password1")
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.manager.refresh_access(&pair.refresh_token),
        engine.manager.refresh_access(&pair.refresh_token),
    );

    let first = first.expect("first refresh failed");
    let second = second.expect("second refresh failed");

    // Both minted tokens are independently verifiable, each with its
    // own identity.
    let first_claims = engine.codec.verify_access(&first).unwrap();
    let second_claims = engine.codec.verify_access(&second).unwrap();
    assert_ne!(first_claims.jti, second_claims.jti);

    // The session row was reused, not rotated: the refresh token still
    // works afterwards.
    assert!(engine.manager.refresh_access(&pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn second_registration_with_same_email_fails() {
    let engine = test_engine();

    engine
        .manager
        .register("A", "a@x.com", "password1")
        .await
        .expect("first registration failed");

    let result = engine.manager.register("B", "a@x.com", "password2").await;
    assert!(matches!(result, Err(AppError::AlreadyExists)));

    // The first user is intact, with a digested password.
    let user = engine
        .store
        .find_user_by_email("a@x.com")
        .await
        .unwrap()
        .expect("user missing");
    assert_eq!(user.name, "A");
    assert_ne!(user.password_digest, "password1");
}

#[tokio::test]
async fn login_issues_fresh_independent_grants() {
    let engine = test_engine();

    engine
        .manager
        .register("A", "a@x.com", "password1")
        .await
        .unwrap();

    let first = engine.manager.login("a@x.com", "password1").await.unwrap();
    let second = engine.manager.login("a@x.com", "password1").await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    // Revoking one grant leaves the other alive.
    engine.manager.logout(&first.refresh_token).await.unwrap();
    assert!(matches!(
        engine.manager.refresh_access(&first.refresh_token).await,
        Err(AppError::Unauthenticated)
    ));
    assert!(engine.manager.refresh_access(&second.refresh_token).await.is_ok());
}
