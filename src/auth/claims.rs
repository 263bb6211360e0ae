/// Token Claims
///
/// The claim set carried by both token kinds: a subject, an expiry, an
/// issued-at stamp, and a unique token id. The claims do not self-describe
/// their kind; which secret signed them is what distinguishes an access
/// token from a refresh token.

use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Length of the random unique-id claim.
const TOKEN_ID_LENGTH: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token id. Two tokens minted for the same subject in the
    /// same instant still differ here.
    pub jti: String,
}

impl Claims {
    /// Create claims for `user_id` expiring `ttl` from now.
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + ttl.num_seconds(),
            iat: now,
            jti: fresh_token_id(),
        }
    }

    /// Extract the subject as a UUID.
    ///
    /// # Errors
    /// Returns error if the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in token".to_string()))
    }
}

/// Generate a fresh random token id.
fn fresh_token_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::seconds(900));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp, claims.iat + 900);
        assert_eq!(claims.jti.len(), TOKEN_ID_LENGTH);
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::seconds(900));

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::seconds(900));
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_err());
    }

    #[test]
    fn test_token_ids_are_unique() {
        let user_id = Uuid::new_v4();
        let first = Claims::new(user_id, Duration::seconds(900));
        let second = Claims::new(user_id, Duration::seconds(900));

        // Same subject, same instant: only jti tells them apart.
        assert_ne!(first.jti, second.jti);
    }
}
