/// In-memory store.
///
/// Backs the test suites and local development. Semantics mirror
/// `PgStore`: unique email, sessions cascade on user deletion,
/// digest-keyed session lookup.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{NewUser, Session, SessionRecord, Store, StoreError, User};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    sessions: Vec<Session>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }

    /// Test hook: overwrite a session's expiry to simulate a stale row
    /// that lazy expiry must treat as absent.
    pub fn expire_session(&self, digest: &str, expires_at: DateTime<Utc>) {
        let mut inner = self.lock();
        for session in inner
            .sessions
            .iter_mut()
            .filter(|s| s.refresh_token_digest == digest)
        {
            session.expires_at = expires_at;
        }
    }

    /// Test hook: whether any session row matches a digest, regardless
    /// of expiry.
    pub fn session_row_exists(&self, digest: &str) -> bool {
        self.lock()
            .sessions
            .iter()
            .any(|s| s.refresh_token_digest == digest)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_digest: user.password_digest,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();
        Ok(inner.users.get_mut(&id).map(|user| {
            user.name = name.to_string();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.users.remove(&id);
        inner.sessions.retain(|s| s.user_id != id);
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        refresh_token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_digest: refresh_token_digest.to_string(),
            expires_at,
        };
        self.lock().sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session_by_digest(
        &self,
        digest: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.lock();
        let session = match inner
            .sessions
            .iter()
            .find(|s| s.refresh_token_digest == digest)
        {
            Some(session) => session.clone(),
            None => return Ok(None),
        };
        let user = inner
            .users
            .get(&session.user_id)
            .cloned()
            .ok_or_else(|| StoreError::Unavailable("session row without user".to_string()))?;

        Ok(Some(SessionRecord { session, user }))
    }

    async fn delete_sessions_by_digest(&self, digest: &str) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| s.refresh_token_digest != digest);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|s| s.user_id != user_id);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test User".to_string(),
            password_digest: "digest".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let result = store.create_user(new_user("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn test_session_lookup_includes_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        store
            .create_session(user.id, "digest-1", Utc::now() + Duration::days(7))
            .await
            .unwrap();

        let record = store
            .find_session_by_digest("digest-1")
            .await
            .unwrap()
            .expect("session not found");
        assert_eq!(record.user.id, user.id);
        assert_eq!(record.session.refresh_token_digest, "digest-1");
    }

    #[tokio::test]
    async fn test_delete_sessions_is_idempotent() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        store
            .create_session(user.id, "digest-1", Utc::now() + Duration::days(7))
            .await
            .unwrap();

        assert_eq!(store.delete_sessions_by_digest("digest-1").await.unwrap(), 1);
        assert_eq!(store.delete_sessions_by_digest("digest-1").await.unwrap(), 0);
        assert_eq!(store.delete_sessions_by_digest("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_deletion_cascades_to_sessions() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        store
            .create_session(user.id, "digest-1", Utc::now() + Duration::days(7))
            .await
            .unwrap();
        store
            .create_session(user.id, "digest-2", Utc::now() + Duration::days(7))
            .await
            .unwrap();

        store.delete_user(user.id).await.unwrap();

        assert!(store.find_user_by_id(user.id).await.unwrap().is_none());
        assert!(store
            .find_session_by_digest("digest-1")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_session_by_digest("digest-2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_user_name() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        let updated = store
            .update_user_name(user.id, "Renamed")
            .await
            .unwrap()
            .expect("user not found");
        assert_eq!(updated.name, "Renamed");

        let missing = store.update_user_name(Uuid::new_v4(), "Nobody").await.unwrap();
        assert!(missing.is_none());
    }
}
