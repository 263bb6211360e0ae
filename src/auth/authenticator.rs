/// Request Authentication
///
/// Resolves an inbound request's identity from either a bearer access
/// token or a cookie-backed refresh token. The bearer path is purely
/// cryptographic; the refresh path additionally requires a live session
/// row, which is what makes logout effective against a token whose
/// signature is still valid.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::digest::sha256_hex;
use crate::auth::token::{TokenCodec, TokenKind};
use crate::error::AppError;
use crate::store::{SessionRecord, SharedStore};

/// A resolved identity. `new_access_token` is set when the refresh path
/// minted a replacement; the HTTP layer is responsible for surfacing it
/// to the client.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub new_access_token: Option<String>,
}

#[derive(Clone)]
pub struct Authenticator {
    store: SharedStore,
    codec: Arc<TokenCodec>,
}

impl Authenticator {
    pub fn new(store: SharedStore, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Resolve an identity from the request's credentials.
    ///
    /// Order is strict and short-circuiting:
    /// 1. A valid bearer access token wins; no store access.
    /// 2. Otherwise fall back to the refresh cookie; absent means
    ///    unauthenticated.
    /// 3. The refresh token must verify cryptographically.
    /// 4. Its session row must exist and be unexpired.
    /// 5. A fresh access token is issued for the session's user.
    ///
    /// # Errors
    /// `Unauthenticated` for every rejected credential; the reason is
    /// logged, never surfaced.
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
        refresh_cookie: Option<&str>,
    ) -> Result<AuthenticatedUser, AppError> {
        if let Some(token) = bearer {
            match self.codec.verify_access(token) {
                Ok(claims) => {
                    return Ok(AuthenticatedUser {
                        user_id: claims.user_id()?,
                        new_access_token: None,
                    });
                }
                Err(e) => {
                    // An invalid or expired access token is not fatal:
                    // the refresh cookie may still re-establish identity.
                    tracing::debug!(reason = %e, "Access token rejected, trying refresh cookie");
                }
            }
        }

        let refresh_token = refresh_cookie.ok_or(AppError::Unauthenticated)?;
        let record = self.resolve_refresh_session(refresh_token).await?;

        let new_access_token = self.codec.issue(TokenKind::Access, record.user.id)?;
        tracing::debug!(user_id = %record.user.id, "Access token reissued from refresh session");

        Ok(AuthenticatedUser {
            user_id: record.user.id,
            new_access_token: Some(new_access_token),
        })
    }

    /// Steps 3–4: cryptographic check, then store liveness check.
    ///
    /// The session row is only read here; rotation reuses it rather than
    /// replacing it, so concurrent calls on the same token are benign.
    pub(crate) async fn resolve_refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<SessionRecord, AppError> {
        self.codec.verify_refresh(refresh_token)?;

        let digest = sha256_hex(refresh_token.as_bytes());
        let record = self
            .store
            .find_session_by_digest(&digest)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Refresh token has no live session");
                AppError::Unauthenticated
            })?;

        if chrono::Utc::now() >= record.session.expires_at {
            tracing::warn!(user_id = %record.user.id, "Refresh session expired");
            return Err(AppError::Unauthenticated);
        }

        Ok(record)
    }
}
