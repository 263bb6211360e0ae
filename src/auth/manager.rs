/// Session Lifecycle Manager
///
/// Orchestrates registration, login, logout, and access-token refresh:
/// issues the token pair, persists the session row keyed by the
/// refresh-token digest, and revokes sessions on logout.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::authenticator::Authenticator;
use crate::auth::digest::sha256_hex;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{TokenCodec, TokenKind};
use crate::error::AppError;
use crate::store::{NewUser, SharedStore, StoreError};

/// Both credentials issued at login/registration. The access token goes
/// to the client directly; the refresh token must travel via a channel
/// inaccessible to script (the HTTP layer uses an HttpOnly cookie).
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    store: SharedStore,
    codec: Arc<TokenCodec>,
    authenticator: Authenticator,
}

impl SessionManager {
    pub fn new(store: SharedStore, codec: Arc<TokenCodec>) -> Self {
        let authenticator = Authenticator::new(store.clone(), codec.clone());
        Self {
            store,
            codec,
            authenticator,
        }
    }

    /// Register a new user and start their first session.
    ///
    /// # Errors
    /// `AlreadyExists` if the email is taken. The pre-check keeps the
    /// common case cheap; the store's unique constraint settles the
    /// concurrent-registration race.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AppError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AppError::AlreadyExists);
        }

        let password_digest = hash_password(password)?;
        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                password_digest,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AppError::AlreadyExists,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue_token_pair(user.id).await
    }

    /// Authenticate credentials and start a session.
    ///
    /// # Errors
    /// `InvalidCredentials` for unknown email and wrong password alike;
    /// digest comparison is constant-time inside the verifier.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_digest)? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue_token_pair(user.id).await
    }

    /// Revoke the session behind a refresh token.
    ///
    /// Idempotent and deliberately uninformative: an expired, forged, or
    /// already-revoked token logs out exactly like a live one. Only a
    /// store fault is an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let digest = sha256_hex(refresh_token.as_bytes());
        let removed = self.store.delete_sessions_by_digest(&digest).await?;

        tracing::info!(sessions_removed = removed, "Logout processed");
        Ok(())
    }

    /// Mint a new access token for a live refresh session.
    ///
    /// Delegates the cryptographic and liveness checks to the
    /// Authenticator; the session row is reused, not rotated.
    ///
    /// # Errors
    /// `Unauthenticated` if any check fails.
    pub async fn refresh_access(&self, refresh_token: &str) -> Result<String, AppError> {
        let record = self
            .authenticator
            .resolve_refresh_session(refresh_token)
            .await?;

        self.codec.issue(TokenKind::Access, record.user.id)
    }

    /// Delete a user account, revoking every outstanding refresh grant
    /// with it.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        let revoked = self.store.delete_sessions_for_user(user_id).await?;
        self.store.delete_user(user_id).await?;

        tracing::info!(user_id = %user_id, sessions_revoked = revoked, "Account deleted");
        Ok(())
    }

    /// Lifetime of issued access tokens, for `expires_in` fields.
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.codec.access_ttl().num_seconds()
    }

    /// Lifetime of issued refresh tokens, for cookie max-age.
    pub fn refresh_token_expiry_seconds(&self) -> i64 {
        self.codec.refresh_ttl().num_seconds()
    }

    async fn issue_token_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        let access_token = self.codec.issue(TokenKind::Access, user_id)?;
        let refresh_token = self.codec.issue(TokenKind::Refresh, user_id)?;

        let expires_at = chrono::Utc::now() + self.codec.refresh_ttl();
        self.store
            .create_session(user_id, &sha256_hex(refresh_token.as_bytes()), expires_at)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
