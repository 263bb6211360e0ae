/// Persistent Store Contract
///
/// The engine never talks to a database directly; it is handed an
/// `Arc<dyn Store>` at startup. Sessions are keyed by the digest of the
/// signed refresh token, so the store never holds a usable bearer
/// credential.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Identity record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_digest: String,
}

/// Fields for creating a user. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_digest: String,
}

/// One active refresh-token grant. Valid only while `now < expires_at`;
/// expired rows are treated as absent (lazy expiry, no sweeper).
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_digest: String,
    pub expires_at: DateTime<Utc>,
}

/// A session joined with its owning user, so refresh-path callers avoid
/// a second lookup.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session: Session,
    pub user: User,
}

/// Store failure modes. `Duplicate` is only meaningful for
/// `create_user`; everything transient or unexpected is `Unavailable`.
#[derive(Debug, Clone)]
pub enum StoreError {
    Duplicate,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "duplicate record"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// The injected store handle. Implementations must be safe to share
/// across requests; all session operations are row-scoped, so no
/// cross-request coordination is required of them.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user. Fails with `StoreError::Duplicate` if the email is
    /// already taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Exact-match lookup by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Exact-match lookup by id.
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Update a user's display name. `None` if the user does not exist.
    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError>;

    /// Delete a user and all of their sessions.
    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError>;

    /// Insert a session row for an issued refresh token. The caller
    /// guarantees one session per issued token; digest collisions are
    /// not checked.
    async fn create_session(
        &self,
        user_id: Uuid,
        refresh_token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Exact-match lookup by refresh-token digest, joined with the
    /// owning user.
    async fn find_session_by_digest(
        &self,
        digest: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Delete sessions matching a digest. Idempotent: deleting zero
    /// rows is success. Returns the number of rows removed.
    async fn delete_sessions_by_digest(&self, digest: &str) -> Result<u64, StoreError>;

    /// Delete every session belonging to a user.
    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

/// Shared store handle, built once in `main` and injected everywhere.
pub type SharedStore = Arc<dyn Store>;
