/// Token Codec
///
/// Creates and verifies the two signed token kinds. Access and refresh
/// tokens share a claim shape but are signed with independent secrets,
/// and the two verify entry points are kept separate so a token can
/// never be checked against the wrong kind's key.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::TokenSettings;
use crate::error::AppError;

/// The two token kinds. The claim set does not self-describe its kind;
/// only the signing secret and expiry policy differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Typed verification failure. Pure data; callers decide how much of
/// the distinction to surface (the HTTP layer surfaces none of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not a parseable three-part token.
    Malformed,
    /// Parseable but signed with the wrong secret or tampered with.
    Signature,
    /// Signature fine, expiry in the past (or exactly now).
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::Signature => write!(f, "invalid signature"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }
}

/// Signs and verifies both token kinds. Built once at startup from
/// validated settings and shared behind an `Arc`.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenCodec {
    /// Build the codec from settings, validating them first. Fails at
    /// startup, not at first use.
    pub fn from_settings(settings: &TokenSettings) -> Result<Self, config::ConfigError> {
        settings.validate()?;

        Ok(Self {
            access: KeyPair::new(&settings.access_secret, settings.access_token_expiry),
            refresh: KeyPair::new(&settings.refresh_secret, settings.refresh_token_expiry),
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of newly issued access tokens.
    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    /// Lifetime of newly issued refresh tokens (and of the session rows
    /// that mirror them).
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    /// Issue a signed token of `kind` for `user_id` with a fresh unique
    /// token id.
    ///
    /// # Errors
    /// Returns error only if claim serialization fails.
    pub fn issue(&self, kind: TokenKind, user_id: Uuid) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let claims = Claims::new(user_id, keys.ttl);

        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify an access token. Pure CPU work; no store access.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Access, token)
    }

    /// Verify a refresh token cryptographically. Liveness of the backing
    /// session is the Authenticator's job, not the codec's.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Refresh, token)
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::Signature,
                _ => TokenError::Malformed,
            })?;

        // A token whose expiry equals the current second is already dead;
        // the library treats exp == now as live.
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
